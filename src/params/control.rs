//! Control parameter identifiers
//!
//! Closed set of rig parameters this crate can drive. The string form is the
//! renderer's parameter id.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ParamError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ControlParam {
    #[serde(rename = "ParamEyeLOpen")]
    EyeLOpen,
    #[serde(rename = "ParamEyeROpen")]
    EyeROpen,
    #[serde(rename = "ParamMouthOpenY")]
    MouthOpenY,
    #[serde(rename = "ParamMouthForm")]
    MouthForm,
    #[serde(rename = "ParamAngleX")]
    AngleX,
    #[serde(rename = "ParamAngleY")]
    AngleY,
    #[serde(rename = "ParamAngleZ")]
    AngleZ,
    #[serde(rename = "ParamBodyAngleX")]
    BodyAngleX,
    #[serde(rename = "ParamBodyAngleZ")]
    BodyAngleZ,
    #[serde(rename = "ParamBrowLY")]
    BrowLY,
    #[serde(rename = "ParamBrowRY")]
    BrowRY,
    #[serde(rename = "ParamEyeBallX")]
    EyeBallX,
    #[serde(rename = "ParamEyeBallY")]
    EyeBallY,
    #[serde(rename = "ParamCheek")]
    Cheek,
}

impl ControlParam {
    pub const ALL: [ControlParam; 14] = [
        Self::EyeLOpen,
        Self::EyeROpen,
        Self::MouthOpenY,
        Self::MouthForm,
        Self::AngleX,
        Self::AngleY,
        Self::AngleZ,
        Self::BodyAngleX,
        Self::BodyAngleZ,
        Self::BrowLY,
        Self::BrowRY,
        Self::EyeBallX,
        Self::EyeBallY,
        Self::Cheek,
    ];

    /// Renderer parameter id
    pub fn id(&self) -> &'static str {
        match self {
            Self::EyeLOpen => "ParamEyeLOpen",
            Self::EyeROpen => "ParamEyeROpen",
            Self::MouthOpenY => "ParamMouthOpenY",
            Self::MouthForm => "ParamMouthForm",
            Self::AngleX => "ParamAngleX",
            Self::AngleY => "ParamAngleY",
            Self::AngleZ => "ParamAngleZ",
            Self::BodyAngleX => "ParamBodyAngleX",
            Self::BodyAngleZ => "ParamBodyAngleZ",
            Self::BrowLY => "ParamBrowLY",
            Self::BrowRY => "ParamBrowRY",
            Self::EyeBallX => "ParamEyeBallX",
            Self::EyeBallY => "ParamEyeBallY",
            Self::Cheek => "ParamCheek",
        }
    }

    /// Value range the rig accepts for this parameter
    pub fn range(&self) -> (f32, f32) {
        match self {
            Self::EyeLOpen | Self::EyeROpen | Self::MouthOpenY | Self::Cheek => (0.0, 1.0),
            Self::MouthForm
            | Self::BrowLY
            | Self::BrowRY
            | Self::EyeBallX
            | Self::EyeBallY => (-1.0, 1.0),
            Self::AngleX | Self::AngleY | Self::AngleZ => (-30.0, 30.0),
            Self::BodyAngleX | Self::BodyAngleZ => (-10.0, 10.0),
        }
    }

    /// Clamp a value into this parameter's range
    pub fn clamp_value(&self, value: f32) -> f32 {
        let (min, max) = self.range();
        value.clamp(min, max)
    }
}

impl FromStr for ControlParam {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.id() == s)
            .ok_or_else(|| ParamError::UnknownControl(s.to_string()))
    }
}

impl std::fmt::Display for ControlParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}
