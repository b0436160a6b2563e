//! Per-user calibration
//!
//! Raw geometric ratios are not comparable across faces or camera setups, so
//! each user records extreme and neutral expressions before animation starts.

pub mod baseline;
pub mod session;

pub use baseline::{CalibrationBaseline, Extremes};
pub use session::{CalibrationPhase, CalibrationPose, CalibrationSession};
