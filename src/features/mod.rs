//! Geometric feature extraction
//!
//! Turns landmark and pose frames into scale-invariant ratios and angles.

pub mod extractor;

pub use extractor::{EyeMouthFeatures, FeatureExtractor, HeadAngles};

/// A calibrated feature, one (min, max) pair each in the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    EyeLeft,
    EyeRight,
    Mouth,
    Smile,
}

impl Feature {
    pub const COUNT: usize = 4;

    pub const ALL: [Feature; Self::COUNT] =
        [Self::EyeLeft, Self::EyeRight, Self::Mouth, Self::Smile];

    pub(crate) fn slot(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Feature::EyeLeft => write!(f, "eye-left"),
            Feature::EyeRight => write!(f, "eye-right"),
            Feature::Mouth => write!(f, "mouth"),
            Feature::Smile => write!(f, "smile"),
        }
    }
}
