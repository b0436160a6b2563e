//! Frame contracts produced by the inference collaborators
//!
//! - Face mesh frames (3D points in a fixed topology)
//! - Body pose frames (named 2D keypoints with scores)

pub mod mesh;
pub mod pose;

pub use mesh::{FaceLandmark, LandmarkFrame, MeshTopology};
pub use pose::{Keypoint, PoseFrame, PoseKeypoint};
