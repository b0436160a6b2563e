//! Face mesh frames and the landmark index table

use glam::Vec3;
use serde::Deserialize;

use crate::error::TrackingError;

/// Semantic landmark identities used by feature extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceLandmark {
    UpperLipInner,
    LowerLipInner,
    LeftEyeUpper,
    LeftEyeLower,
    RightEyeUpper,
    RightEyeLower,
    Forehead,
    Chin,
    LeftCheek,
    RightCheek,
    LeftBrow,
    RightBrow,
}

impl FaceLandmark {
    pub const COUNT: usize = 12;

    pub const ALL: [FaceLandmark; Self::COUNT] = [
        Self::UpperLipInner,
        Self::LowerLipInner,
        Self::LeftEyeUpper,
        Self::LeftEyeLower,
        Self::RightEyeUpper,
        Self::RightEyeLower,
        Self::Forehead,
        Self::Chin,
        Self::LeftCheek,
        Self::RightCheek,
        Self::LeftBrow,
        Self::RightBrow,
    ];

    fn slot(self) -> usize {
        self as usize
    }
}

/// Maps semantic landmarks onto indices of a concrete mesh topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshTopology {
    /// Number of points every frame of this topology carries
    point_count: usize,
    /// Mesh index per `FaceLandmark`, in declaration order
    indices: [usize; FaceLandmark::COUNT],
}

impl MeshTopology {
    /// The standard 468-point face mesh.
    pub const FACEMESH_468: MeshTopology = MeshTopology {
        point_count: 468,
        indices: [
            13,  // UpperLipInner
            14,  // LowerLipInner
            386, // LeftEyeUpper
            374, // LeftEyeLower
            159, // RightEyeUpper
            145, // RightEyeLower
            10,  // Forehead
            9,   // Chin
            205, // LeftCheek
            425, // RightCheek
            108, // LeftBrow
            337, // RightBrow
        ],
    };

    /// Build a custom topology. Every index must fall inside `point_count`.
    pub fn new(
        point_count: usize,
        indices: [usize; FaceLandmark::COUNT],
    ) -> Result<Self, TrackingError> {
        if let Some(bad) = indices.iter().find(|&&i| i >= point_count) {
            return Err(TrackingError::Parse(format!(
                "landmark index {} out of range for {}-point mesh",
                bad, point_count
            )));
        }
        Ok(Self {
            point_count,
            indices,
        })
    }

    /// Mesh index of a landmark
    pub fn index(&self, landmark: FaceLandmark) -> usize {
        self.indices[landmark.slot()]
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }
}

impl Default for MeshTopology {
    fn default() -> Self {
        Self::FACEMESH_468
    }
}

/// One face mesh inference result.
///
/// x/y are in source-image pixels, z is mesh depth in the same units.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkFrame {
    points: Vec<Vec3>,
    face_in_view_confidence: f32,
    image_width: f32,
}

impl LandmarkFrame {
    /// Build a frame for the standard mesh.
    pub fn new(
        points: Vec<Vec3>,
        face_in_view_confidence: f32,
        image_width: f32,
    ) -> Result<Self, TrackingError> {
        Self::with_topology(
            points,
            face_in_view_confidence,
            image_width,
            &MeshTopology::FACEMESH_468,
        )
    }

    /// Build a frame, checking the point count against `topology`.
    pub fn with_topology(
        points: Vec<Vec3>,
        face_in_view_confidence: f32,
        image_width: f32,
        topology: &MeshTopology,
    ) -> Result<Self, TrackingError> {
        if points.len() != topology.point_count() {
            return Err(TrackingError::Parse(format!(
                "expected {} mesh points, got {}",
                topology.point_count(),
                points.len()
            )));
        }
        if !(image_width > 0.0) {
            return Err(TrackingError::Parse(format!(
                "image width must be positive, got {}",
                image_width
            )));
        }
        Ok(Self {
            points,
            face_in_view_confidence,
            image_width,
        })
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn face_in_view_confidence(&self) -> f32 {
        self.face_in_view_confidence
    }

    pub fn image_width(&self) -> f32 {
        self.image_width
    }

    /// Whether the detector considers the face present at `threshold`
    pub fn is_confident(&self, threshold: f32) -> bool {
        self.face_in_view_confidence >= threshold
    }

    /// Same frame with every coordinate multiplied by `k`
    #[cfg(test)]
    pub(crate) fn scaled(&self, k: f32) -> Self {
        Self {
            points: self.points.iter().map(|p| *p * k).collect(),
            face_in_view_confidence: self.face_in_view_confidence,
            image_width: self.image_width * k,
        }
    }
}

/// Wire form of a face frame sent by the inference helper
#[derive(Debug, Clone, Deserialize)]
pub struct LandmarkPacket {
    #[serde(default)]
    pub face_in_view_confidence: f32,
    pub image_width: f32,
    #[serde(default)]
    pub points: Vec<[f32; 3]>,
}

impl LandmarkPacket {
    /// Convert to a frame. An empty point list means no face was found.
    pub fn into_frame(self, topology: &MeshTopology) -> Result<Option<LandmarkFrame>, TrackingError> {
        if self.points.is_empty() {
            return Ok(None);
        }
        let points = self.points.into_iter().map(Vec3::from_array).collect();
        LandmarkFrame::with_topology(
            points,
            self.face_in_view_confidence,
            self.image_width,
            topology,
        )
        .map(Some)
    }
}
