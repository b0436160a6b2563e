//! Pure geometry over landmark and pose frames

use glam::Vec3;

use crate::landmarks::{FaceLandmark, LandmarkFrame, MeshTopology, PoseFrame, PoseKeypoint};

/// Eye and mouth openness ratios, normalized by face height
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeMouthFeatures {
    pub eye_left: f32,
    pub eye_right: f32,
    pub mouth: f32,
}

/// Head orientation in radians
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeadAngles {
    pub yaw: f32,
    pub pitch: f32,
}

/// Stateless feature extractor bound to one mesh topology.
///
/// Every method indexes the frame through the topology table; frames that do
/// not pass [`FeatureExtractor::supports`] must not be handed in.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    topology: MeshTopology,
}

impl FeatureExtractor {
    pub fn new(topology: MeshTopology) -> Self {
        Self { topology }
    }

    /// Whether the frame carries every point this topology refers to
    pub fn supports(&self, frame: &LandmarkFrame) -> bool {
        frame.points().len() >= self.topology.point_count()
    }

    fn point(&self, frame: &LandmarkFrame, landmark: FaceLandmark) -> Vec3 {
        frame.points()[self.topology.index(landmark)]
    }

    fn distance(&self, frame: &LandmarkFrame, a: FaceLandmark, b: FaceLandmark) -> f32 {
        self.point(frame, a).distance(self.point(frame, b))
    }

    /// Forehead-to-chin distance; cancels camera distance and head size
    fn face_scale(&self, frame: &LandmarkFrame) -> f32 {
        self.distance(frame, FaceLandmark::Forehead, FaceLandmark::Chin)
    }

    /// Left eye, right eye and mouth openness as ratios of face height.
    pub fn eye_mouth_features(&self, frame: &LandmarkFrame) -> EyeMouthFeatures {
        let scale = self.face_scale(frame);
        EyeMouthFeatures {
            eye_left: self.distance(frame, FaceLandmark::LeftEyeUpper, FaceLandmark::LeftEyeLower)
                / scale,
            eye_right: self
                .distance(frame, FaceLandmark::RightEyeUpper, FaceLandmark::RightEyeLower)
                / scale,
            mouth: self.mouth_only_feature(frame),
        }
    }

    /// Mouth openness alone, for frames where the eye signal is not trusted.
    pub fn mouth_only_feature(&self, frame: &LandmarkFrame) -> f32 {
        self.distance(frame, FaceLandmark::UpperLipInner, FaceLandmark::LowerLipInner)
            / self.face_scale(frame)
    }

    /// Cheek-to-cheek stretch relative to brow width.
    pub fn smile_feature(&self, frame: &LandmarkFrame) -> f32 {
        self.distance(frame, FaceLandmark::LeftCheek, FaceLandmark::RightCheek)
            / self.distance(frame, FaceLandmark::LeftBrow, FaceLandmark::RightBrow)
    }

    /// Head yaw and pitch from the brow line.
    ///
    /// The brow vector is read as (sideways = x, vertical = y, depth = z).
    /// `acos` only covers [0, π]; the sign is recovered from the vertical
    /// component for yaw and from the depth component for pitch.
    pub fn head_angles(&self, frame: &LandmarkFrame) -> HeadAngles {
        let v = self.point(frame, FaceLandmark::RightBrow) - self.point(frame, FaceLandmark::LeftBrow);
        let length = v.length();
        let horizontal = (v.x * v.x + v.z * v.z).sqrt();
        if length <= f32::EPSILON {
            return HeadAngles::default();
        }

        let mut yaw = (horizontal / length).clamp(-1.0, 1.0).acos();
        if v.y > 0.0 {
            yaw = -yaw;
        }

        // A vertical brow line has no horizontal direction to measure pitch from
        let mut pitch = if horizontal <= f32::EPSILON {
            0.0
        } else {
            (v.x / horizontal).clamp(-1.0, 1.0).acos()
        };
        if v.z < 0.0 {
            pitch = -pitch;
        }

        HeadAngles { yaw, pitch }
    }

    /// Shoulder-line lean in radians, or `None` when either shoulder is
    /// missing or scored below `min_confidence`.
    pub fn body_lean_angle(&self, pose: &PoseFrame, min_confidence: f32) -> Option<f32> {
        let left = pose.keypoint(PoseKeypoint::LeftShoulder)?;
        let right = pose.keypoint(PoseKeypoint::RightShoulder)?;
        if !left.is_valid(min_confidence) || !right.is_valid(min_confidence) {
            return None;
        }

        let d = right.position - left.position;
        let length = d.length();
        if length <= f32::EPSILON {
            return Some(0.0);
        }

        let angle = (d.x.abs() / length).clamp(0.0, 1.0).acos();
        // Image y grows downward: the left shoulder is higher when its y is smaller.
        if left.position.y < right.position.y {
            Some(-angle)
        } else {
            Some(angle)
        }
    }

    /// Horizontal cheek span as a fraction of the source frame width.
    pub fn cheek_span_fraction(&self, frame: &LandmarkFrame) -> f32 {
        let span = (self.point(frame, FaceLandmark::RightCheek).x
            - self.point(frame, FaceLandmark::LeftCheek).x)
            .abs();
        span / frame.image_width()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FaceBuilder;
    use super::*;
    use crate::landmarks::Keypoint;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    const EPS: f32 = 1e-5;

    #[test]
    fn test_eye_mouth_ratios() {
        let frame = FaceBuilder::new().eyes(0.2, 0.25).mouth(0.3).build();
        let ex = FeatureExtractor::default();
        let f = ex.eye_mouth_features(&frame);
        assert!((f.eye_left - 0.2).abs() < EPS);
        assert!((f.eye_right - 0.25).abs() < EPS);
        assert!((f.mouth - 0.3).abs() < EPS);
        assert!((ex.mouth_only_feature(&frame) - f.mouth).abs() < EPS);
    }

    #[test]
    fn test_ratios_are_scale_invariant() {
        let frame = FaceBuilder::new().eyes(0.17, 0.23).mouth(0.31).smile(1.2).build();
        let ex = FeatureExtractor::default();
        let base = ex.eye_mouth_features(&frame);
        for k in [0.25, 0.5, 3.0, 17.0] {
            let scaled = frame.scaled(k);
            let f = ex.eye_mouth_features(&scaled);
            assert!((f.eye_left - base.eye_left).abs() < 1e-4);
            assert!((f.eye_right - base.eye_right).abs() < 1e-4);
            assert!((f.mouth - base.mouth).abs() < 1e-4);
            assert!((ex.mouth_only_feature(&scaled) - base.mouth).abs() < 1e-4);
            assert!((ex.smile_feature(&scaled) - ex.smile_feature(&frame)).abs() < 1e-4);
        }
    }

    #[test]
    fn test_smile_ratio() {
        let frame = FaceBuilder::new().smile(1.3).build();
        let ex = FeatureExtractor::default();
        assert!((ex.smile_feature(&frame) - 1.3).abs() < EPS);
    }

    #[test]
    fn test_frontal_head_is_zero() {
        let ex = FeatureExtractor::default();
        let angles = ex.head_angles(&FaceBuilder::new().build());
        assert!(angles.yaw.abs() < EPS);
        assert!(angles.pitch.abs() < EPS);
    }

    #[test]
    fn test_head_tilt_sign_correction() {
        let ex = FeatureExtractor::default();
        // Brow line rising to the right vs. falling to the right
        let left = FaceBuilder::new()
            .at(FaceLandmark::LeftBrow, Vec3::new(100.0, 120.0, 0.0))
            .at(FaceLandmark::RightBrow, Vec3::new(200.0, 20.0, 0.0))
            .build();
        let right = FaceBuilder::new()
            .at(FaceLandmark::LeftBrow, Vec3::new(100.0, 120.0, 0.0))
            .at(FaceLandmark::RightBrow, Vec3::new(200.0, 220.0, 0.0))
            .build();

        let a = ex.head_angles(&left);
        let b = ex.head_angles(&right);
        assert!((a.yaw - FRAC_PI_4).abs() < EPS);
        assert!((b.yaw + FRAC_PI_4).abs() < EPS);
        assert!((a.yaw + b.yaw).abs() < EPS);
    }

    #[test]
    fn test_head_pitch_sign_from_depth() {
        let ex = FeatureExtractor::default();
        let toward = FaceBuilder::new()
            .at(FaceLandmark::RightBrow, Vec3::new(200.0, 120.0, 100.0))
            .build();
        let away = FaceBuilder::new()
            .at(FaceLandmark::RightBrow, Vec3::new(200.0, 120.0, -100.0))
            .build();
        let a = ex.head_angles(&toward);
        let b = ex.head_angles(&away);
        assert!((a.pitch - FRAC_PI_4).abs() < EPS);
        assert!((b.pitch + FRAC_PI_4).abs() < EPS);
        assert!(a.yaw.abs() < EPS);
    }

    #[test]
    fn test_vertical_brow_line_has_full_yaw() {
        let ex = FeatureExtractor::default();
        let rising = FaceBuilder::new()
            .at(FaceLandmark::LeftBrow, Vec3::new(150.0, 120.0, 0.0))
            .at(FaceLandmark::RightBrow, Vec3::new(150.0, 20.0, 0.0))
            .build();
        let falling = FaceBuilder::new()
            .at(FaceLandmark::LeftBrow, Vec3::new(150.0, 120.0, 0.0))
            .at(FaceLandmark::RightBrow, Vec3::new(150.0, 220.0, 0.0))
            .build();

        let a = ex.head_angles(&rising);
        let b = ex.head_angles(&falling);
        assert!((a.yaw - FRAC_PI_2).abs() < EPS);
        assert!((b.yaw + FRAC_PI_2).abs() < EPS);
        assert_eq!(a.pitch, 0.0);
        assert_eq!(b.pitch, 0.0);
    }

    #[test]
    fn test_coincident_brows_give_zero_angles() {
        let ex = FeatureExtractor::default();
        let frame = FaceBuilder::new()
            .at(FaceLandmark::RightBrow, Vec3::new(100.0, 120.0, 0.0))
            .build();
        assert_eq!(ex.head_angles(&frame), HeadAngles::default());
    }

    #[test]
    fn test_body_lean_requires_confidence() {
        let ex = FeatureExtractor::default();
        let pose = PoseFrame::new(
            0.9,
            300.0,
            vec![
                Keypoint::new(PoseKeypoint::LeftShoulder, 100.0, 300.0, 0.95),
                Keypoint::new(PoseKeypoint::RightShoulder, 200.0, 300.0, 0.85),
            ],
        );
        assert_eq!(ex.body_lean_angle(&pose, 0.9), None);
        assert_eq!(ex.body_lean_angle(&pose, 0.8), Some(0.0));
    }

    #[test]
    fn test_body_lean_sign() {
        let ex = FeatureExtractor::default();
        let pose = |ly: f32, ry: f32| {
            PoseFrame::new(
                1.0,
                300.0,
                vec![
                    Keypoint::new(PoseKeypoint::LeftShoulder, 100.0, ly, 0.99),
                    Keypoint::new(PoseKeypoint::RightShoulder, 200.0, ry, 0.99),
                ],
            )
        };
        let up = ex.body_lean_angle(&pose(200.0, 300.0), 0.9).unwrap();
        let down = ex.body_lean_angle(&pose(300.0, 200.0), 0.9).unwrap();
        assert!((up + FRAC_PI_4).abs() < EPS);
        assert!((down - FRAC_PI_4).abs() < EPS);
    }

    #[test]
    fn test_body_lean_missing_shoulder() {
        let ex = FeatureExtractor::default();
        let pose = PoseFrame::new(
            1.0,
            300.0,
            vec![Keypoint::new(PoseKeypoint::LeftShoulder, 100.0, 300.0, 0.99)],
        );
        assert_eq!(ex.body_lean_angle(&pose, 0.9), None);
    }

    #[test]
    fn test_cheek_span_fraction() {
        let ex = FeatureExtractor::default();
        // 120 px cheek span in a 300 px frame
        let frame = FaceBuilder::new().build();
        assert!((ex.cheek_span_fraction(&frame) - 0.4).abs() < EPS);
        let wide = FaceBuilder::new().image_width(600.0).build();
        assert!((ex.cheek_span_fraction(&wide) - 0.2).abs() < EPS);
    }
}
