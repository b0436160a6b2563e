//! Body pose keypoints

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// The 17 named body keypoints of the pose model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PoseKeypoint {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl PoseKeypoint {
    /// Mirror partner, used when flipping a frame horizontally
    pub fn mirrored(self) -> Self {
        use PoseKeypoint::*;
        match self {
            Nose => Nose,
            LeftEye => RightEye,
            RightEye => LeftEye,
            LeftEar => RightEar,
            RightEar => LeftEar,
            LeftShoulder => RightShoulder,
            RightShoulder => LeftShoulder,
            LeftElbow => RightElbow,
            RightElbow => LeftElbow,
            LeftWrist => RightWrist,
            RightWrist => LeftWrist,
            LeftHip => RightHip,
            RightHip => LeftHip,
            LeftKnee => RightKnee,
            RightKnee => LeftKnee,
            LeftAnkle => RightAnkle,
            RightAnkle => LeftAnkle,
        }
    }
}

/// Single body keypoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub part: PoseKeypoint,
    /// Pixel position in the source image
    #[serde(with = "vec2_array")]
    pub position: Vec2,
    /// Confidence score (0.0 - 1.0)
    pub score: f32,
}

impl Keypoint {
    pub fn new(part: PoseKeypoint, x: f32, y: f32, score: f32) -> Self {
        Self {
            part,
            position: Vec2::new(x, y),
            score,
        }
    }

    /// Score at or above the threshold
    pub fn is_valid(&self, threshold: f32) -> bool {
        self.score >= threshold
    }
}

/// One pose inference result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    /// Overall pose score
    #[serde(default)]
    pub score: f32,
    /// Source image width in pixels
    pub image_width: f32,
    #[serde(default)]
    pub keypoints: Vec<Keypoint>,
}

impl PoseFrame {
    pub fn new(score: f32, image_width: f32, keypoints: Vec<Keypoint>) -> Self {
        Self {
            score,
            image_width,
            keypoints,
        }
    }

    /// Look up a keypoint by name
    pub fn keypoint(&self, part: PoseKeypoint) -> Option<&Keypoint> {
        self.keypoints.iter().find(|k| k.part == part)
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    /// Mirror the frame around the vertical image axis.
    ///
    /// Left/right keypoint names swap so they keep describing the mirrored body.
    pub fn flipped(&self) -> Self {
        let keypoints = self
            .keypoints
            .iter()
            .map(|k| Keypoint {
                part: k.part.mirrored(),
                position: Vec2::new(self.image_width - k.position.x, k.position.y),
                score: k.score,
            })
            .collect();
        Self {
            score: self.score,
            image_width: self.image_width,
            keypoints,
        }
    }
}

mod vec2_array {
    use glam::Vec2;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(v: &Vec2, s: S) -> Result<S::Ok, S::Error> {
        v.to_array().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec2, D::Error> {
        <[f32; 2]>::deserialize(d).map(Vec2::from_array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pose_packet() {
        let json = serde_json::json!({
            "score": 0.8,
            "image_width": 300.0,
            "keypoints": [
                {"part": "leftShoulder", "position": [200.0, 300.0], "score": 0.95},
                {"part": "rightShoulder", "position": [100.0, 310.0], "score": 0.92}
            ]
        })
        .to_string();

        let frame: PoseFrame = serde_json::from_str(&json).unwrap();
        let left = frame.keypoint(PoseKeypoint::LeftShoulder).unwrap();
        assert_eq!(left.position, Vec2::new(200.0, 300.0));
        assert!(left.is_valid(0.9));
        assert!(frame.keypoint(PoseKeypoint::Nose).is_none());
    }

    #[test]
    fn test_flip_mirrors_and_swaps() {
        let frame = PoseFrame::new(
            1.0,
            300.0,
            vec![Keypoint::new(PoseKeypoint::LeftShoulder, 200.0, 300.0, 0.9)],
        );
        let flipped = frame.flipped();
        let k = flipped.keypoint(PoseKeypoint::RightShoulder).unwrap();
        assert_eq!(k.position, Vec2::new(100.0, 300.0));
        assert!(flipped.keypoint(PoseKeypoint::LeftShoulder).is_none());
    }
}
