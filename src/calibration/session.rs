//! Calibration state machine
//!
//! Walks the user through an extreme pose (eyes and mouth wide open), a
//! neutral pose and a smile, one advance event per step. Each evaluation
//! issues exactly one landmark request; a miss re-prompts the same pose.

use crate::calibration::CalibrationBaseline;
use crate::error::CalibrationError;
use crate::features::{Feature, FeatureExtractor};
use crate::landmarks::LandmarkFrame;
use crate::output::StatusSink;
use crate::tracking::LandmarkSource;

/// Pose requested from the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationPose {
    /// Eyes and mouth as wide open as possible
    Extreme,
    /// Relaxed face
    Neutral,
    /// Widest smile
    Smile,
}

impl CalibrationPose {
    fn await_phase(self) -> CalibrationPhase {
        match self {
            Self::Extreme => CalibrationPhase::AwaitExtremePose,
            Self::Neutral => CalibrationPhase::AwaitNeutralPose,
            Self::Smile => CalibrationPhase::AwaitSmilePose,
        }
    }
}

impl std::fmt::Display for CalibrationPose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extreme => write!(f, "extreme"),
            Self::Neutral => write!(f, "neutral"),
            Self::Smile => write!(f, "smile"),
        }
    }
}

/// Calibration phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationPhase {
    Idle,
    AwaitExtremePose,
    Evaluating(CalibrationPose),
    AwaitNeutralPose,
    AwaitSmilePose,
    Done,
}

impl CalibrationPhase {
    /// Instruction shown on entering the phase
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::Idle => "Press advance to start calibration",
            Self::AwaitExtremePose => {
                "Open your eyes and mouth as wide as you can, then press advance"
            }
            Self::Evaluating(_) => "Hold still, evaluating...",
            Self::AwaitNeutralPose => "Relax your face, then press advance",
            Self::AwaitSmilePose => "Smile as widely as you can, then press advance",
            Self::Done => "Calibration complete",
        }
    }
}

impl std::fmt::Display for CalibrationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::AwaitExtremePose => write!(f, "await-extreme-pose"),
            Self::Evaluating(pose) => write!(f, "evaluating({})", pose),
            Self::AwaitNeutralPose => write!(f, "await-neutral-pose"),
            Self::AwaitSmilePose => write!(f, "await-smile-pose"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Drives one user through calibration and owns the baseline until done
#[derive(Debug)]
pub struct CalibrationSession {
    phase: CalibrationPhase,
    baseline: CalibrationBaseline,
    extractor: FeatureExtractor,
    min_confidence: f32,
}

impl CalibrationSession {
    pub fn new(extractor: FeatureExtractor, min_confidence: f32) -> Self {
        Self {
            phase: CalibrationPhase::Idle,
            baseline: CalibrationBaseline::new(),
            extractor,
            min_confidence,
        }
    }

    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    pub fn baseline(&self) -> &CalibrationBaseline {
        &self.baseline
    }

    pub fn is_done(&self) -> bool {
        self.phase == CalibrationPhase::Done
    }

    /// Handle one advance event and return the resulting phase.
    pub async fn advance<S, T>(&mut self, source: &mut S, status: &mut T) -> CalibrationPhase
    where
        S: LandmarkSource,
        T: StatusSink,
    {
        match self.phase {
            CalibrationPhase::Idle => {
                self.enter(CalibrationPhase::AwaitExtremePose, status);
            }
            CalibrationPhase::AwaitExtremePose => {
                self.evaluate(CalibrationPose::Extreme, source, status).await;
            }
            CalibrationPhase::AwaitNeutralPose => {
                self.evaluate(CalibrationPose::Neutral, source, status).await;
            }
            CalibrationPhase::AwaitSmilePose => {
                self.evaluate(CalibrationPose::Smile, source, status).await;
            }
            CalibrationPhase::Evaluating(_) | CalibrationPhase::Done => {}
        }
        self.phase
    }

    /// Hand over the finished baseline.
    pub fn finish(self) -> Result<CalibrationBaseline, CalibrationError> {
        if self.is_done() {
            Ok(self.baseline)
        } else {
            Err(CalibrationError::Incomplete {
                phase: self.phase.to_string(),
            })
        }
    }

    fn enter<T: StatusSink>(&mut self, phase: CalibrationPhase, status: &mut T) {
        tracing::info!("Calibration: {} -> {}", self.phase, phase);
        self.phase = phase;
        status.phase(&phase.to_string());
        status.status(phase.prompt());
    }

    /// Go back to an earlier phase with a retry message
    fn retry<T: StatusSink>(&mut self, phase: CalibrationPhase, reason: &str, status: &mut T) {
        self.phase = phase;
        status.phase(&phase.to_string());
        status.status(&format!("{} {}", reason, phase.prompt()));
    }

    async fn evaluate<S, T>(&mut self, pose: CalibrationPose, source: &mut S, status: &mut T)
    where
        S: LandmarkSource,
        T: StatusSink,
    {
        self.enter(CalibrationPhase::Evaluating(pose), status);

        let Some(frame) = self.usable_frame(source).await else {
            tracing::debug!("Calibration: no usable face for {} pose", pose);
            self.retry(pose.await_phase(), "No face detected, try again.", status);
            return;
        };

        self.record(pose, &frame);

        let next = match pose {
            CalibrationPose::Extreme => CalibrationPhase::AwaitNeutralPose,
            CalibrationPose::Neutral => CalibrationPhase::AwaitSmilePose,
            CalibrationPose::Smile => match self.reset_degenerate() {
                Some(phase) => {
                    return self.retry(phase, "Poses were too similar to tell apart.", status);
                }
                None => CalibrationPhase::Done,
            },
        };
        self.enter(next, status);
    }

    async fn usable_frame<S: LandmarkSource>(&self, source: &mut S) -> Option<LandmarkFrame> {
        match source.request_landmark_frame().await {
            Ok(Some(frame))
                if self.extractor.supports(&frame) && frame.is_confident(self.min_confidence) =>
            {
                Some(frame)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Calibration: landmark request failed: {}", e);
                None
            }
        }
    }

    fn record(&mut self, pose: CalibrationPose, frame: &LandmarkFrame) {
        match pose {
            CalibrationPose::Extreme => {
                let f = self.extractor.eye_mouth_features(frame);
                self.baseline.set_max(Feature::EyeLeft, f.eye_left);
                self.baseline.set_max(Feature::EyeRight, f.eye_right);
                self.baseline.set_max(Feature::Mouth, f.mouth);
            }
            CalibrationPose::Neutral => {
                let f = self.extractor.eye_mouth_features(frame);
                self.baseline.set_min(Feature::EyeLeft, f.eye_left);
                self.baseline.set_min(Feature::EyeRight, f.eye_right);
                self.baseline.set_min(Feature::Mouth, f.mouth);
                self.baseline
                    .set_min(Feature::Smile, self.extractor.smile_feature(frame));
            }
            CalibrationPose::Smile => {
                self.baseline
                    .set_max(Feature::Smile, self.extractor.smile_feature(frame));
            }
        }
    }

    /// Clear degenerate features and return the phase that re-captures them.
    fn reset_degenerate(&mut self) -> Option<CalibrationPhase> {
        let degenerate = self.baseline.degenerate();
        if degenerate.is_empty() {
            return None;
        }
        tracing::warn!("Calibration: flat range for {:?}, recalibrating", degenerate);
        for feature in &degenerate {
            self.baseline.clear(*feature);
        }
        // Eye/mouth maxima come from the extreme pose; the smile minimum from
        // the neutral pose.
        if degenerate.iter().any(|f| *f != Feature::Smile) {
            Some(CalibrationPhase::AwaitExtremePose)
        } else {
            Some(CalibrationPhase::AwaitNeutralPose)
        }
    }
}
