//! Configuration parsing and management for pose2rig

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Pose2RigError};
use crate::normalize::ClampPolicy;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tracking: TrackingConfig,
    pub animation: AnimationConfig,
    pub inference: InferenceConfig,
    pub http: HttpConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Pose2RigError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(s: &str) -> Result<Self, Pose2RigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from default paths
    pub fn load() -> Result<Self, Pose2RigError> {
        let paths = [
            PathBuf::from("config.toml"),
            PathBuf::from("config/default.toml"),
            dirs_path().join("config.toml"),
        ];

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Pose2RigError> {
        let unit = |field: &str, value: f32| -> Result<(), Pose2RigError> {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, "Must be between 0.0 and 1.0"));
            }
            Ok(())
        };

        unit("tracking.face_confidence", self.tracking.face_confidence)?;
        unit("tracking.pose_confidence", self.tracking.pose_confidence)?;

        let span = self.tracking.blink_sync_span_fraction;
        if !(span > 0.0 && span < 1.0) {
            return Err(invalid(
                "tracking.blink_sync_span_fraction",
                "Must be strictly between 0.0 and 1.0",
            ));
        }

        if self.animation.frame_rate == 0 || self.animation.frame_rate > 240 {
            return Err(invalid("animation.frame_rate", "Must be between 1 and 240"));
        }

        if self.animation.model.is_empty() {
            return Err(invalid("animation.model", "Model name must not be empty"));
        }

        if !self.animation.models_dir.exists() {
            tracing::warn!(
                "Models directory not found: {}",
                self.animation.models_dir.display()
            );
        }

        if self.inference.landmark_port != 0
            && self.inference.landmark_port == self.inference.pose_port
        {
            return Err(invalid(
                "inference.pose_port",
                "Landmark and pose receivers need different ports",
            ));
        }

        if self.http.port == 0 {
            return Err(invalid("http.port", "Port must be greater than 0"));
        }

        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> Pose2RigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
    .into()
}

/// Feature gating and scaling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Minimum face-in-view confidence for face features
    pub face_confidence: f32,
    /// Minimum score for each shoulder keypoint
    pub pose_confidence: f32,
    /// Cheek span (fraction of frame width) above which eyes are trusted
    pub blink_sync_span_fraction: f32,
    /// Mirror pose frames horizontally
    pub flip_horizontal: bool,
    /// Degrees of head rotation per degree measured
    pub head_sensitivity: f32,
    /// Degrees of body lean per degree measured
    pub body_sensitivity: f32,
    /// Behaviour beyond the calibrated extremes
    pub clamp: ClampPolicy,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            face_confidence: 0.9,
            pose_confidence: 0.9,
            // 100 px on the 300 px reference capture
            blink_sync_span_fraction: 1.0 / 3.0,
            flip_horizontal: true,
            head_sensitivity: 1.0,
            body_sensitivity: 1.0,
            clamp: ClampPolicy::Unclamped,
        }
    }
}

/// Animation loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Ticks per second
    pub frame_rate: u32,
    /// Pause when the display loses focus
    pub auto_pause: bool,
    /// Draw face mesh points in the overlay
    pub show_face_points: bool,
    /// Draw pose keypoints in the overlay
    pub show_pose: bool,
    /// Avatar model loaded at startup
    pub model: String,
    /// Directory holding `<name>/<name>.model3.json` model folders
    pub models_dir: PathBuf,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60,
            auto_pause: false,
            show_face_points: false,
            show_pose: false,
            model: "hiyori".to_string(),
            models_dir: PathBuf::from("models"),
        }
    }
}

/// Inference helper endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Listen address for both UDP sockets
    pub listen_address: String,
    /// UDP port for face mesh packets
    pub landmark_port: u16,
    /// UDP port for pose packets
    pub pose_port: u16,
    /// How long one request waits for a fresh packet
    pub request_timeout_ms: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            listen_address: "127.0.0.1".to_string(),
            landmark_port: 12346,
            pose_port: 12347,
            request_timeout_ms: 100,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Enable HTTP server
    pub enabled: bool,
    /// HTTP server host
    pub host: String,
    /// HTTP server port
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_enabled: true,
        }
    }
}

/// Get the platform-specific configuration directory
fn dirs_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        if let Some(config_dir) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(config_dir).join("pose2rig");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config/pose2rig");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join("Library/Application Support/pose2rig");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("pose2rig");
        }
    }

    PathBuf::from(".")
}
