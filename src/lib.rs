//! pose2rig - Webcam face and pose tracking to Live2D rig parameters
//!
//! A headless service that:
//! - Receives face mesh and pose inference over UDP
//! - Calibrates eye, mouth and smile ranges per user
//! - Drives rig parameters at a fixed frame rate
//! - Streams parameters to a browser renderer over HTTP/SSE

pub mod animation;
pub mod avatar;
pub mod calibration;
pub mod config;
pub mod error;
pub mod features;
pub mod landmarks;
pub mod normalize;
pub mod output;
pub mod params;
pub mod session;
pub mod tracking;
pub mod web;

pub use config::Config;
pub use error::{Pose2RigError, Result};

use std::sync::{Arc, PoisonError};
use tokio::sync::{broadcast, mpsc, RwLock};

use animation::ControlEvent;
use avatar::ModelManifest;
use output::broadcast::{RenderFrame, StatusSnapshot};

/// Capacity of the UI event queue
const EVENT_QUEUE: usize = 64;

/// Application state shared between the session task and HTTP handlers
#[derive(Debug)]
pub struct AppState {
    /// Current configuration
    pub config: RwLock<Config>,
    /// Latest status, for polling clients
    pub snapshot: std::sync::RwLock<StatusSnapshot>,
    /// Published parameter frames
    pub frame_tx: broadcast::Sender<RenderFrame>,
    /// Model announcements
    pub model_tx: broadcast::Sender<ModelManifest>,
    /// Status messages
    pub status_tx: broadcast::Sender<String>,
    /// UI events for the session task
    pub events_tx: mpsc::Sender<ControlEvent>,
    /// Shutdown signal
    pub shutdown_tx: broadcast::Sender<()>,
}

impl AppState {
    /// Create the shared state and the receiving end of the event queue
    pub fn new(config: Config) -> (Arc<Self>, mpsc::Receiver<ControlEvent>) {
        let (frame_tx, _) = broadcast::channel(16);
        let (model_tx, _) = broadcast::channel(4);
        let (status_tx, _) = broadcast::channel(32);
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE);
        let (shutdown_tx, _) = broadcast::channel(1);

        let state = Arc::new(Self {
            config: RwLock::new(config),
            snapshot: std::sync::RwLock::new(StatusSnapshot::default()),
            frame_tx,
            model_tx,
            status_tx,
            events_tx,
            shutdown_tx,
        });
        (state, events_rx)
    }

    /// Queue an event for the session task
    pub async fn send_event(&self, event: ControlEvent) -> Result<()> {
        self.events_tx
            .send(event)
            .await
            .map_err(|_| error::WebError::ChannelClosed.into())
    }

    /// Copy of the current status
    pub fn snapshot(&self) -> StatusSnapshot {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Modify the status snapshot in place
    pub fn update_snapshot(&self, f: impl FnOnce(&mut StatusSnapshot)) {
        let mut snapshot = self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut snapshot);
    }

    pub fn subscribe_frames(&self) -> broadcast::Receiver<RenderFrame> {
        self.frame_tx.subscribe()
    }

    pub fn subscribe_models(&self) -> broadcast::Receiver<ModelManifest> {
        self.model_tx.subscribe()
    }

    pub fn subscribe_status(&self) -> broadcast::Receiver<String> {
        self.status_tx.subscribe()
    }

    /// Subscribe to shutdown signal
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signal shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
