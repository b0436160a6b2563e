//! UI events and display options

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::config::AnimationConfig;
use crate::error::ParamError;
use crate::params::ControlParam;

/// Events delivered to the session task between ticks
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    /// User pressed the calibration button
    AdvanceCalibration,
    /// Display lost focus
    FocusLost,
    /// Display regained focus
    FocusGained,
    Pause,
    Resume,
    SetOption { option: LoopOption, enabled: bool },
    /// Manual slider value, wins over tracking until cleared
    SetOverride { param: ControlParam, value: f32 },
    ClearOverride(ControlParam),
    /// Load (or switch to) another avatar model
    SwapModel(String),
    Shutdown,
}

/// A toggleable loop option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopOption {
    AutoPause,
    ShowFacePoints,
    ShowPose,
}

impl FromStr for LoopOption {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto_pause" => Ok(Self::AutoPause),
            "show_face_points" => Ok(Self::ShowFacePoints),
            "show_pose" => Ok(Self::ShowPose),
            other => Err(ParamError::UnknownOption(other.to_string())),
        }
    }
}

impl std::fmt::Display for LoopOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AutoPause => write!(f, "auto_pause"),
            Self::ShowFacePoints => write!(f, "show_face_points"),
            Self::ShowPose => write!(f, "show_pose"),
        }
    }
}

/// Current option values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoopOptions {
    pub auto_pause: bool,
    pub show_face_points: bool,
    pub show_pose: bool,
}

impl LoopOptions {
    pub fn from_config(config: &AnimationConfig) -> Self {
        Self {
            auto_pause: config.auto_pause,
            show_face_points: config.show_face_points,
            show_pose: config.show_pose,
        }
    }

    pub fn set(&mut self, option: LoopOption, enabled: bool) {
        match option {
            LoopOption::AutoPause => self.auto_pause = enabled,
            LoopOption::ShowFacePoints => self.show_face_points = enabled,
            LoopOption::ShowPose => self.show_pose = enabled,
        }
    }
}
