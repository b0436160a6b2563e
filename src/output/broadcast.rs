//! Renderer and status sink backed by the shared broadcast channels
//!
//! The actual Live2D rig runs in the browser; this side publishes what it
//! needs over SSE.

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::avatar::{ModelManifest, ModelRegistry};
use crate::error::ModelError;
use crate::landmarks::Keypoint;
use crate::output::{Overlay, Renderer, StatusSink};
use crate::params::ParameterMap;
use crate::AppState;

/// One published tick
#[derive(Debug, Clone, Serialize)]
pub struct RenderFrame {
    pub params: ParameterMap,
    pub auto_blink: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay: Option<OverlayData>,
}

/// Debug overlay contents in source-image pixels
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverlayData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face: Option<Vec<[f32; 3]>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pose: Option<Vec<Keypoint>>,
}

impl OverlayData {
    fn from_overlay(overlay: &Overlay<'_>) -> Option<Self> {
        if overlay.face.is_none() && overlay.pose.is_none() {
            return None;
        }
        Some(Self {
            face: overlay
                .face
                .map(|frame| frame.points().iter().map(|p| p.to_array()).collect()),
            pose: overlay.pose.map(|frame| frame.keypoints.clone()),
        })
    }
}

/// Latest status for polling clients
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusSnapshot {
    /// Calibration phase, then `running` / `paused`
    pub phase: String,
    /// Last human-readable status
    pub message: String,
    /// Current model
    pub model: Option<ModelManifest>,
}

/// Publishes parameter frames and model manifests to SSE subscribers
pub struct BroadcastRenderer {
    state: Arc<AppState>,
    registry: ModelRegistry,
    pending_overlay: Option<OverlayData>,
}

impl BroadcastRenderer {
    pub fn new(state: Arc<AppState>, registry: ModelRegistry) -> Self {
        Self {
            state,
            registry,
            pending_overlay: None,
        }
    }

    pub fn current_model(&self) -> Option<&ModelManifest> {
        self.registry.current()
    }
}

impl Renderer for BroadcastRenderer {
    fn publish(&mut self, params: &ParameterMap, auto_blink: bool) {
        let frame = RenderFrame {
            params: params.clone(),
            auto_blink,
            overlay: self.pending_overlay.take(),
        };
        // No subscribers is fine
        let _ = self.state.frame_tx.send(frame);
    }

    fn overlay(&mut self, overlay: Overlay<'_>) {
        self.pending_overlay = OverlayData::from_overlay(&overlay);
    }

    async fn load_model(&mut self, name: &str) -> Result<(), ModelError> {
        let manifest = self.registry.load(name)?.clone();
        self.state
            .update_snapshot(|s| s.model = Some(manifest.clone()));
        let _ = self.state.model_tx.send(manifest);
        Ok(())
    }
}

/// Logs status messages and mirrors them into the snapshot and SSE stream
#[derive(Clone)]
pub struct BroadcastStatus {
    state: Arc<AppState>,
}

impl BroadcastStatus {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

impl StatusSink for BroadcastStatus {
    fn status(&mut self, message: &str) {
        info!("Status: {}", message);
        self.state
            .update_snapshot(|s| s.message = message.to_string());
        let _ = self.state.status_tx.send(message.to_string());
    }

    fn phase(&mut self, phase: &str) {
        self.state.update_snapshot(|s| s.phase = phase.to_string());
    }
}
