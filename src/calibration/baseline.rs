//! Per-user feature extremes

use crate::features::Feature;

/// Observed (min, max) for one feature. Either side may still be unset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Extremes {
    pub min: Option<f32>,
    pub max: Option<f32>,
}

impl Extremes {
    pub fn is_complete(&self) -> bool {
        self.min.is_some() && self.max.is_some()
    }

    /// Both ends set but unusable as a normalization range
    pub fn is_degenerate(&self) -> bool {
        match (self.min, self.max) {
            (Some(min), Some(max)) => !min.is_finite() || !max.is_finite() || min == max,
            _ => false,
        }
    }

    /// (min, max) once both are set
    pub fn pair(&self) -> Option<(f32, f32)> {
        Some((self.min?, self.max?))
    }
}

/// One `Extremes` per calibrated feature
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CalibrationBaseline {
    extremes: [Extremes; Feature::COUNT],
}

impl CalibrationBaseline {
    /// Empty baseline, nothing recorded
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used when extremes are already known
    pub fn with(mut self, feature: Feature, min: f32, max: f32) -> Self {
        self.set_min(feature, min);
        self.set_max(feature, max);
        self
    }

    pub fn get(&self, feature: Feature) -> Extremes {
        self.extremes[feature.slot()]
    }

    pub fn set_min(&mut self, feature: Feature, value: f32) {
        self.extremes[feature.slot()].min = Some(value);
    }

    pub fn set_max(&mut self, feature: Feature, value: f32) {
        self.extremes[feature.slot()].max = Some(value);
    }

    /// Forget both ends of a feature
    pub fn clear(&mut self, feature: Feature) {
        self.extremes[feature.slot()] = Extremes::default();
    }

    /// Features still missing a min or max
    pub fn missing(&self) -> Vec<Feature> {
        Feature::ALL
            .into_iter()
            .filter(|f| !self.get(*f).is_complete())
            .collect()
    }

    /// Features whose min and max coincide (or are not finite)
    pub fn degenerate(&self) -> Vec<Feature> {
        Feature::ALL
            .into_iter()
            .filter(|f| self.get(*f).is_degenerate())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}
