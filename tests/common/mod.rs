//! Shared fakes and synthetic frames for the integration tests

#![allow(dead_code)]

use glam::Vec3;
use std::collections::VecDeque;

use pose2rig::error::{ModelError, TrackingError};
use pose2rig::landmarks::{FaceLandmark, LandmarkFrame, MeshTopology, PoseFrame};
use pose2rig::output::Renderer;
use pose2rig::params::ParameterMap;
use pose2rig::tracking::{LandmarkSource, PoseSource};

/// A face whose feature ratios are known exactly.
///
/// The face is 100 px tall (forehead to chin) with brows 100 px apart, in a
/// 300 px wide frame.
pub struct Face {
    pub eye_left: f32,
    pub eye_right: f32,
    pub mouth: f32,
    /// Cheek distance over brow distance
    pub smile: f32,
    pub confidence: f32,
}

impl Default for Face {
    fn default() -> Self {
        Self {
            eye_left: 0.2,
            eye_right: 0.2,
            mouth: 0.1,
            smile: 1.2,
            confidence: 0.99,
        }
    }
}

impl Face {
    pub fn build(&self) -> LandmarkFrame {
        let topo = MeshTopology::FACEMESH_468;
        let mut points = vec![Vec3::new(150.0, 150.0, 0.0); topo.point_count()];
        let mut set = |landmark: FaceLandmark, x: f32, y: f32| {
            points[topo.index(landmark)] = Vec3::new(x, y, 0.0);
        };

        set(FaceLandmark::Forehead, 150.0, 100.0);
        set(FaceLandmark::Chin, 150.0, 200.0);
        set(FaceLandmark::LeftBrow, 100.0, 120.0);
        set(FaceLandmark::RightBrow, 200.0, 120.0);
        set(FaceLandmark::LeftEyeUpper, 180.0, 140.0);
        set(FaceLandmark::LeftEyeLower, 180.0, 140.0 + self.eye_left * 100.0);
        set(FaceLandmark::RightEyeUpper, 120.0, 140.0);
        set(FaceLandmark::RightEyeLower, 120.0, 140.0 + self.eye_right * 100.0);
        set(FaceLandmark::UpperLipInner, 150.0, 180.0);
        set(FaceLandmark::LowerLipInner, 150.0, 180.0 + self.mouth * 100.0);
        let half = self.smile * 50.0;
        set(FaceLandmark::LeftCheek, 150.0 - half, 180.0);
        set(FaceLandmark::RightCheek, 150.0 + half, 180.0);

        LandmarkFrame::new(points, self.confidence, 300.0).unwrap()
    }
}

/// Replays queued results, then reports no face
#[derive(Default)]
pub struct ScriptedFaces {
    pub queue: VecDeque<Result<Option<LandmarkFrame>, TrackingError>>,
    pub calls: usize,
}

impl ScriptedFaces {
    pub fn push(&mut self, result: Result<Option<LandmarkFrame>, TrackingError>) {
        self.queue.push_back(result);
    }
}

impl LandmarkSource for ScriptedFaces {
    async fn request_landmark_frame(&mut self) -> Result<Option<LandmarkFrame>, TrackingError> {
        self.calls += 1;
        self.queue.pop_front().unwrap_or(Ok(None))
    }
}

/// Never sees a body
#[derive(Default)]
pub struct NoPoses {
    pub calls: usize,
}

impl PoseSource for NoPoses {
    async fn request_pose_frame(
        &mut self,
        _flip_horizontal: bool,
    ) -> Result<Option<PoseFrame>, TrackingError> {
        self.calls += 1;
        Ok(None)
    }
}

#[derive(Default)]
pub struct Recorder {
    pub published: Vec<(ParameterMap, bool)>,
}

impl Renderer for Recorder {
    fn publish(&mut self, params: &ParameterMap, auto_blink: bool) {
        self.published.push((params.clone(), auto_blink));
    }

    async fn load_model(&mut self, _name: &str) -> Result<(), ModelError> {
        Ok(())
    }
}

pub fn assert_close(actual: Option<f32>, expected: f32) {
    let actual = actual.expect("parameter was published");
    assert!(
        (actual - expected).abs() < 1e-4,
        "expected {expected}, got {actual}"
    );
}
