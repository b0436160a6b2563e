//! Baseline normalization

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationBaseline;
use crate::error::NormalizeError;
use crate::features::Feature;

/// Map `raw` onto the calibrated range: `min` gives 0, `max` gives 1.
///
/// Not clamped. Callers must not pass `max == min`.
pub fn normalize(raw: f32, min: f32, max: f32) -> f32 {
    (raw - min) / (max - min)
}

/// What to do with values beyond the calibrated extremes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClampPolicy {
    /// Pass through values outside [0, 1]
    #[default]
    Unclamped,
    /// Clamp to [0, 1]
    Unit,
}

/// Normalizer over a validated calibration baseline
#[derive(Debug, Clone)]
pub struct Normalizer {
    baseline: CalibrationBaseline,
    policy: ClampPolicy,
}

impl Normalizer {
    /// Take ownership of a finished baseline.
    ///
    /// Rejects baselines with missing extremes or with a flat range for any
    /// feature.
    pub fn new(baseline: CalibrationBaseline, policy: ClampPolicy) -> Result<Self, NormalizeError> {
        let missing = baseline.missing();
        if !missing.is_empty() {
            return Err(NormalizeError::Incomplete { features: missing });
        }
        let degenerate = baseline.degenerate();
        if !degenerate.is_empty() {
            return Err(NormalizeError::DegenerateBaseline {
                features: degenerate,
            });
        }
        Ok(Self { baseline, policy })
    }

    pub fn baseline(&self) -> &CalibrationBaseline {
        &self.baseline
    }

    /// Normalize a raw feature value
    pub fn apply(&self, feature: Feature, raw: f32) -> f32 {
        // Construction guarantees every pair is set.
        let (min, max) = self.baseline.get(feature).pair().unwrap_or((0.0, 1.0));
        let value = normalize(raw, min, max);
        match self.policy {
            ClampPolicy::Unclamped => value,
            ClampPolicy::Unit => value.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> CalibrationBaseline {
        CalibrationBaseline::new()
            .with(Feature::EyeLeft, 0.10, 0.30)
            .with(Feature::EyeRight, 0.10, 0.30)
            .with(Feature::Mouth, 0.05, 0.40)
            .with(Feature::Smile, 1.0, 1.3)
    }

    #[test]
    fn test_endpoints_and_monotonic() {
        for (min, max) in [(0.1, 0.3), (0.05, 0.4), (1.0, 1.3), (2.0, -1.0)] {
            assert!(normalize(min, min, max).abs() < 1e-6);
            assert!((normalize(max, min, max) - 1.0).abs() < 1e-6);
        }
        let (min, max) = (0.05, 0.4);
        let mut prev = f32::NEG_INFINITY;
        for i in 0..50 {
            let raw = -0.5 + i as f32 * 0.03;
            let v = normalize(raw, min, max);
            assert!(v > prev);
            prev = v;
        }
    }

    #[test]
    fn test_reference_midpoints() {
        let n = Normalizer::new(baseline(), ClampPolicy::Unclamped).unwrap();
        assert!((n.apply(Feature::EyeLeft, 0.20) - 0.5).abs() < 1e-5);
        assert!((n.apply(Feature::Mouth, 0.225) - 0.5).abs() < 1e-5);
        assert!((n.apply(Feature::Smile, 1.15) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_unclamped_by_default() {
        let n = Normalizer::new(baseline(), ClampPolicy::default()).unwrap();
        assert!(n.apply(Feature::EyeLeft, 0.40) > 1.0);
        assert!(n.apply(Feature::EyeLeft, 0.0) < 0.0);
    }

    #[test]
    fn test_unit_policy_clamps() {
        let n = Normalizer::new(baseline(), ClampPolicy::Unit).unwrap();
        assert_eq!(n.apply(Feature::EyeLeft, 0.40), 1.0);
        assert_eq!(n.apply(Feature::EyeLeft, 0.0), 0.0);
    }

    #[test]
    fn test_rejects_incomplete() {
        let partial = CalibrationBaseline::new().with(Feature::EyeLeft, 0.1, 0.3);
        let err = Normalizer::new(partial, ClampPolicy::Unclamped).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::Incomplete {
                features: vec![Feature::EyeRight, Feature::Mouth, Feature::Smile]
            }
        );
    }

    #[test]
    fn test_rejects_degenerate() {
        let flat = baseline().with(Feature::Mouth, 0.2, 0.2);
        let err = Normalizer::new(flat, ClampPolicy::Unclamped).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::DegenerateBaseline {
                features: vec![Feature::Mouth]
            }
        );
    }
}
