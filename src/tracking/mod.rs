//! Inference collaborators
//!
//! The face mesh and pose models run outside this process. Their frames are
//! pulled on demand through the traits below; `udp` provides the JSON-over-UDP
//! adapter used by the binary.

pub mod udp;

use std::future::Future;

use crate::error::TrackingError;
use crate::landmarks::{LandmarkFrame, PoseFrame};

/// Produces one face mesh frame per request.
///
/// `Ok(None)` means no face was found; callers hold their previous state.
pub trait LandmarkSource {
    fn request_landmark_frame(
        &mut self,
    ) -> impl Future<Output = Result<Option<LandmarkFrame>, TrackingError>> + Send;
}

/// Produces one pose frame per request.
pub trait PoseSource {
    fn request_pose_frame(
        &mut self,
        flip_horizontal: bool,
    ) -> impl Future<Output = Result<Option<PoseFrame>, TrackingError>> + Send;
}
