//! Per-frame animation loop
//!
//! Each tick pulls one face frame and one pose frame, turns them into
//! calibrated rig parameters and hands the result to the renderer. UI events
//! are applied between ticks.

pub mod event;

pub use event::{ControlEvent, LoopOption, LoopOptions};

use serde::Serialize;
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace, warn};

use crate::config::{Config, TrackingConfig};
use crate::features::{Feature, FeatureExtractor};
use crate::landmarks::LandmarkFrame;
use crate::normalize::Normalizer;
use crate::output::{Overlay, Renderer, StatusSink};
use crate::params::{ControlParam, ParameterBus};
use crate::tracking::{LandmarkSource, PoseSource};

/// Whether ticks issue inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Running,
    Paused,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
        }
    }
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Paused, nothing requested or published
    Skipped,
    Published { auto_blink: bool },
}

/// Loop tuning taken from the configuration
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub tracking: TrackingConfig,
    pub options: LoopOptions,
    pub frame_rate: u32,
}

impl LoopSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            tracking: config.tracking.clone(),
            options: LoopOptions::from_config(&config.animation),
            frame_rate: config.animation.frame_rate,
        }
    }
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Drives the avatar from live tracking once calibration is done
pub struct AnimationLoop<L, P, R, S> {
    landmarks: L,
    poses: P,
    renderer: R,
    status: S,
    normalizer: Normalizer,
    extractor: FeatureExtractor,
    bus: ParameterBus,
    settings: LoopSettings,
    state: RunState,
}

impl<L, P, R, S> AnimationLoop<L, P, R, S>
where
    L: LandmarkSource + Send,
    P: PoseSource + Send,
    R: Renderer + Send,
    S: StatusSink + Send,
{
    pub fn new(
        landmarks: L,
        poses: P,
        renderer: R,
        status: S,
        normalizer: Normalizer,
        extractor: FeatureExtractor,
        settings: LoopSettings,
    ) -> Self {
        Self {
            landmarks,
            poses,
            renderer,
            status,
            normalizer,
            extractor,
            bus: ParameterBus::new(),
            settings,
            state: RunState::Running,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn landmarks(&self) -> &L {
        &self.landmarks
    }

    pub fn poses(&self) -> &P {
        &self.poses
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn status_sink(&self) -> &S {
        &self.status
    }

    /// Run one frame
    pub async fn tick(&mut self) -> TickOutcome {
        if self.state == RunState::Paused {
            trace!("Tick skipped while paused");
            return TickOutcome::Skipped;
        }

        let face = match self.landmarks.request_landmark_frame().await {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Landmark request failed: {}", e);
                None
            }
        };
        let pose = match self
            .poses
            .request_pose_frame(self.settings.tracking.flip_horizontal)
            .await
        {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Pose request failed: {}", e);
                None
            }
        };

        let tracking = &self.settings.tracking;
        if let Some(lean) = pose
            .as_ref()
            .and_then(|p| self.extractor.body_lean_angle(p, tracking.pose_confidence))
        {
            self.bus.set(
                ControlParam::BodyAngleZ,
                lean.to_degrees() * tracking.body_sensitivity,
            );
        }

        let options = self.settings.options;
        self.renderer.overlay(Overlay {
            face: face.as_ref().filter(|_| options.show_face_points),
            pose: pose.as_ref().filter(|_| options.show_pose),
        });

        let usable = face.as_ref().filter(|frame| {
            self.extractor.supports(frame) && frame.is_confident(tracking.face_confidence)
        });
        let auto_blink = match usable {
            Some(frame) => self.apply_face(frame),
            None => {
                debug!("No usable face this tick, holding face controls");
                true
            }
        };

        let params = self.bus.flush();
        trace!(?params, auto_blink, "Publishing parameters");
        self.renderer.publish(&params, auto_blink);
        TickOutcome::Published { auto_blink }
    }

    /// Write face-driven controls; returns the auto-blink flag
    fn apply_face(&mut self, frame: &LandmarkFrame) -> bool {
        let tracking = &self.settings.tracking;
        let angles = self.extractor.head_angles(frame);
        self.bus.set(
            ControlParam::AngleX,
            angles.yaw.to_degrees() * tracking.head_sensitivity,
        );
        self.bus.set(
            ControlParam::AngleY,
            angles.pitch.to_degrees() * tracking.head_sensitivity,
        );
        self.bus.set(
            ControlParam::MouthForm,
            self.normalizer
                .apply(Feature::Smile, self.extractor.smile_feature(frame)),
        );

        // Eyelid distances are noise when the face is small in frame
        if self.extractor.cheek_span_fraction(frame) > tracking.blink_sync_span_fraction {
            let f = self.extractor.eye_mouth_features(frame);
            self.bus.set(
                ControlParam::EyeLOpen,
                self.normalizer.apply(Feature::EyeLeft, f.eye_left),
            );
            self.bus.set(
                ControlParam::EyeROpen,
                self.normalizer.apply(Feature::EyeRight, f.eye_right),
            );
            self.bus.set(
                ControlParam::MouthOpenY,
                self.normalizer.apply(Feature::Mouth, f.mouth),
            );
            false
        } else {
            let mouth = self.extractor.mouth_only_feature(frame);
            self.bus.set(
                ControlParam::MouthOpenY,
                self.normalizer.apply(Feature::Mouth, mouth),
            );
            true
        }
    }

    /// Stop issuing inference. Returns false if already paused.
    pub fn pause(&mut self) -> bool {
        self.transition(RunState::Paused)
    }

    /// Resume ticking. Returns false if already running.
    pub fn resume(&mut self) -> bool {
        self.transition(RunState::Running)
    }

    fn transition(&mut self, next: RunState) -> bool {
        if self.state == next {
            return false;
        }
        info!("Animation {}", next);
        self.state = next;
        self.status.phase(&next.to_string());
        self.status.status(match next {
            RunState::Running => "Tracking resumed",
            RunState::Paused => "Tracking paused",
        });
        true
    }

    /// Switch models, keeping the old one if loading fails
    pub async fn swap_model(&mut self, name: &str) {
        let was_running = self.pause();

        match self.renderer.load_model(name).await {
            Ok(()) => {
                info!("Switched model to {}", name);
                self.status.status(&format!("Loaded model {}", name));
            }
            Err(e) => {
                error!("Failed to load model {}: {}", name, e);
                self.status
                    .status(&format!("Could not load model {}: {}", name, e));
            }
        }

        if was_running {
            self.resume();
        }
    }

    /// Apply one event. `Break` means the loop should stop.
    pub async fn handle_event(&mut self, event: ControlEvent) -> ControlFlow<()> {
        debug!("Event: {:?}", event);
        match event {
            ControlEvent::FocusLost => {
                if self.settings.options.auto_pause {
                    self.pause();
                }
            }
            ControlEvent::FocusGained => {
                self.resume();
            }
            ControlEvent::Pause => {
                self.pause();
            }
            ControlEvent::Resume => {
                self.resume();
            }
            ControlEvent::SetOption { option, enabled } => {
                info!("Option {} = {}", option, enabled);
                self.settings.options.set(option, enabled);
            }
            ControlEvent::SetOverride { param, value } => {
                self.bus.set_override(param, param.clamp_value(value));
            }
            ControlEvent::ClearOverride(param) => {
                self.bus.clear_override(param);
            }
            ControlEvent::SwapModel(name) => {
                self.swap_model(&name).await;
            }
            ControlEvent::AdvanceCalibration => {
                debug!("Calibration already finished, ignoring advance");
            }
            ControlEvent::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// Tick at the configured frame rate until shutdown
    pub async fn run(
        &mut self,
        mut events: mpsc::Receiver<ControlEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let period = Duration::from_secs_f64(1.0 / self.settings.frame_rate.max(1) as f64);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Animation loop started at {} fps", self.settings.frame_rate);
        self.status.phase(&self.state.to_string());

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick().await;
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        info!("Event channel closed");
                        break;
                    };
                    if self.handle_event(event).await.is_break() {
                        break;
                    }
                }
                _ = shutdown.recv() => {
                    break;
                }
            }
        }

        info!("Animation loop stopped");
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::calibration::CalibrationBaseline;
    use crate::features::extractor::testing::FaceBuilder;
    use crate::landmarks::{Keypoint, PoseFrame, PoseKeypoint};
    use crate::normalize::ClampPolicy;

    const EPS: f32 = 1e-4;

    type TestLoop = AnimationLoop<FakeFaces, FakePoses, RecordingRenderer, Vec<String>>;

    fn normalizer() -> Normalizer {
        let baseline = CalibrationBaseline::new()
            .with(Feature::EyeLeft, 0.1, 0.3)
            .with(Feature::EyeRight, 0.1, 0.3)
            .with(Feature::Mouth, 0.05, 0.4)
            .with(Feature::Smile, 1.0, 1.3);
        Normalizer::new(baseline, ClampPolicy::Unclamped).unwrap()
    }

    fn make_loop(faces: FakeFaces, poses: FakePoses) -> TestLoop {
        AnimationLoop::new(
            faces,
            poses,
            RecordingRenderer::default(),
            Vec::new(),
            normalizer(),
            FeatureExtractor::default(),
            LoopSettings::default(),
        )
    }

    fn with_face(frame: LandmarkFrame) -> FakeFaces {
        FakeFaces {
            fallback: Some(frame),
            ..Default::default()
        }
    }

    fn last(l: &TestLoop) -> &(crate::params::ParameterMap, bool) {
        l.renderer().published.last().unwrap()
    }

    #[tokio::test]
    async fn test_close_face_drives_eyes_and_mouth() {
        let frame = FaceBuilder::new().eyes(0.2, 0.2).mouth(0.225).smile(1.15).build();
        let mut l = make_loop(with_face(frame), FakePoses::default());

        assert_eq!(l.tick().await, TickOutcome::Published { auto_blink: false });
        let (params, _) = last(&l);
        assert!((params.get(ControlParam::EyeLOpen).unwrap() - 0.5).abs() < EPS);
        assert!((params.get(ControlParam::EyeROpen).unwrap() - 0.5).abs() < EPS);
        assert!((params.get(ControlParam::MouthOpenY).unwrap() - 0.5).abs() < EPS);
        assert!((params.get(ControlParam::MouthForm).unwrap() - 0.5).abs() < EPS);
        assert!(params.get(ControlParam::AngleX).unwrap().abs() < EPS);
    }

    #[tokio::test]
    async fn test_small_face_holds_eyes() {
        let close = FaceBuilder::new().eyes(0.3, 0.3).build();
        // Cheeks 60 px apart in a 300 px frame
        let far = FaceBuilder::new().eyes(0.1, 0.1).mouth(0.4).smile(0.6).build();
        let faces = FakeFaces {
            queue: vec![Some(close), Some(far)].into(),
            ..Default::default()
        };
        let mut l = make_loop(faces, FakePoses::default());

        l.tick().await;
        assert_eq!(l.tick().await, TickOutcome::Published { auto_blink: true });
        let (params, _) = last(&l);
        assert!((params.get(ControlParam::EyeLOpen).unwrap() - 1.0).abs() < EPS);
        assert!((params.get(ControlParam::MouthOpenY).unwrap() - 1.0).abs() < EPS);
    }

    #[tokio::test]
    async fn test_low_confidence_holds_face_controls() {
        let good = FaceBuilder::new().eyes(0.3, 0.3).build();
        let faces = FakeFaces {
            queue: vec![Some(good), Some(FaceBuilder::new().confidence(0.2).build()), None].into(),
            ..Default::default()
        };
        let mut l = make_loop(faces, FakePoses::default());

        l.tick().await;
        let first = last(&l).0.clone();
        assert_eq!(l.tick().await, TickOutcome::Published { auto_blink: true });
        assert_eq!(last(&l).0, first);
        assert_eq!(l.tick().await, TickOutcome::Published { auto_blink: true });
        assert_eq!(last(&l).0, first);
    }

    #[tokio::test]
    async fn test_pose_updates_body_without_face() {
        let poses = FakePoses {
            frame: Some(PoseFrame::new(
                0.9,
                300.0,
                vec![
                    Keypoint::new(PoseKeypoint::LeftShoulder, 200.0, 100.0, 0.95),
                    Keypoint::new(PoseKeypoint::RightShoulder, 100.0, 100.0, 0.95),
                ],
            )),
            ..Default::default()
        };
        let mut l = make_loop(FakeFaces::default(), poses);
        l.tick().await;

        let (params, auto_blink) = last(&l);
        assert!(*auto_blink);
        assert!(params.get(ControlParam::BodyAngleZ).unwrap().abs() < EPS);
        assert!(params.get(ControlParam::EyeLOpen).is_none());
        assert_eq!(l.poses().flips, vec![true]);
    }

    #[tokio::test]
    async fn test_paused_tick_issues_no_inference() {
        let mut l = make_loop(with_face(FaceBuilder::new().build()), FakePoses::default());
        l.handle_event(ControlEvent::Pause).await;
        for _ in 0..5 {
            assert_eq!(l.tick().await, TickOutcome::Skipped);
        }
        assert_eq!(l.landmarks().calls, 0);
        assert_eq!(l.poses().calls, 0);
        assert!(l.renderer().published.is_empty());

        l.handle_event(ControlEvent::Resume).await;
        l.tick().await;
        assert_eq!(l.landmarks().calls, 1);
        assert_eq!(l.status_sink().len(), 2);
    }

    #[tokio::test]
    async fn test_focus_loss_respects_auto_pause() {
        let mut l = make_loop(FakeFaces::default(), FakePoses::default());
        l.handle_event(ControlEvent::FocusLost).await;
        assert_eq!(l.state(), RunState::Running);

        l.handle_event(ControlEvent::SetOption {
            option: LoopOption::AutoPause,
            enabled: true,
        })
        .await;
        l.handle_event(ControlEvent::FocusLost).await;
        assert_eq!(l.state(), RunState::Paused);
        l.handle_event(ControlEvent::FocusGained).await;
        assert_eq!(l.state(), RunState::Running);
    }

    #[tokio::test]
    async fn test_overlay_follows_options() {
        let poses = FakePoses {
            frame: Some(PoseFrame::new(0.9, 300.0, Vec::new())),
            ..Default::default()
        };
        let mut l = make_loop(with_face(FaceBuilder::new().build()), poses);
        l.tick().await;
        l.handle_event(ControlEvent::SetOption {
            option: LoopOption::ShowFacePoints,
            enabled: true,
        })
        .await;
        l.tick().await;
        l.handle_event(ControlEvent::SetOption {
            option: LoopOption::ShowPose,
            enabled: true,
        })
        .await;
        l.tick().await;
        assert_eq!(
            l.renderer().overlays,
            vec![(false, false), (true, false), (true, true)]
        );
    }

    #[tokio::test]
    async fn test_override_is_clamped_and_wins() {
        let mut l = make_loop(with_face(FaceBuilder::new().build()), FakePoses::default());
        l.handle_event(ControlEvent::SetOverride {
            param: ControlParam::MouthOpenY,
            value: 4.0,
        })
        .await;
        l.tick().await;
        assert_eq!(last(&l).0.get(ControlParam::MouthOpenY), Some(1.0));

        l.handle_event(ControlEvent::ClearOverride(ControlParam::MouthOpenY))
            .await;
        l.tick().await;
        assert!(last(&l).0.get(ControlParam::MouthOpenY).unwrap() < 1.0);
    }

    #[tokio::test]
    async fn test_swap_model_resumes_and_survives_failure() {
        let mut l = make_loop(FakeFaces::default(), FakePoses::default());
        l.swap_model("mao").await;
        assert_eq!(l.renderer().loaded, vec!["mao".to_string()]);
        assert_eq!(l.state(), RunState::Running);

        l.renderer.fail_loads = true;
        l.swap_model("ghost").await;
        assert_eq!(l.state(), RunState::Running);
        assert!(l
            .status_sink()
            .iter()
            .any(|s| s.starts_with("Could not load model ghost")));

        l.pause();
        l.renderer.fail_loads = false;
        l.swap_model("hiyori").await;
        assert_eq!(l.state(), RunState::Paused);
    }

    #[tokio::test]
    async fn test_advance_ignored_and_shutdown_breaks() {
        let mut l = make_loop(FakeFaces::default(), FakePoses::default());
        assert!(l
            .handle_event(ControlEvent::AdvanceCalibration)
            .await
            .is_continue());
        assert!(l.handle_event(ControlEvent::Shutdown).await.is_break());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown_event() {
        let (tx, rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let mut l = make_loop(with_face(FaceBuilder::new().build()), FakePoses::default());

        tx.send(ControlEvent::Shutdown).await.unwrap();
        l.run(rx, shutdown_rx).await;
        assert!(l.renderer().published.len() <= 1);
    }
}
