//! Output module
//!
//! Outbound collaborators of the animation core:
//! - The renderer that consumes parameter maps
//! - The status display that shows human-readable progress
//! - Browser delivery of both over Server-Sent Events

pub mod broadcast;
pub mod sse;

use std::future::Future;

use crate::error::ModelError;
use crate::landmarks::{LandmarkFrame, PoseFrame};
use crate::params::ParameterMap;

/// Display-only data for the debug overlay
#[derive(Debug, Clone, Copy, Default)]
pub struct Overlay<'a> {
    /// Face mesh points, when face point display is enabled
    pub face: Option<&'a LandmarkFrame>,
    /// Pose keypoints, when pose display is enabled
    pub pose: Option<&'a PoseFrame>,
}

/// Avatar renderer
pub trait Renderer {
    /// Apply one tick's parameters. `auto_blink` lets the rig run its own
    /// eyelid animation.
    fn publish(&mut self, params: &ParameterMap, auto_blink: bool);

    /// Refresh the debug overlay
    fn overlay(&mut self, _overlay: Overlay<'_>) {}

    /// Load (or switch to) an avatar model
    fn load_model(&mut self, name: &str) -> impl Future<Output = Result<(), ModelError>> + Send;
}

/// Receives status strings for the user
pub trait StatusSink {
    fn status(&mut self, message: &str);

    /// Machine-readable phase name (`await-smile-pose`, `running`, ...)
    fn phase(&mut self, _phase: &str) {}
}

impl<T: StatusSink + ?Sized> StatusSink for &mut T {
    fn status(&mut self, message: &str) {
        (**self).status(message);
    }

    fn phase(&mut self, phase: &str) {
        (**self).phase(phase);
    }
}

impl StatusSink for Vec<String> {
    fn status(&mut self, message: &str) {
        self.push(message.to_string());
    }
}
