//! Error types for pose2rig

use thiserror::Error;

use crate::avatar::model::ModelStage;
use crate::features::Feature;

/// Main error type for pose2rig
#[derive(Error, Debug)]
pub enum Pose2RigError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Tracking error: {0}")]
    Tracking(#[from] TrackingError),

    #[error("Calibration error: {0}")]
    Calibration(#[from] CalibrationError),

    #[error("Normalization error: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("Parameter error: {0}")]
    Param(#[from] ParamError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Web server error: {0}")]
    Web(#[from] WebError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors raised by the inference collaborators and their adapters
#[derive(Error, Debug)]
pub enum TrackingError {
    /// The capture/inference endpoint could not be brought up. Fatal at startup.
    #[error("Capture unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("Receive error: {0}")]
    Receive(String),

    #[error("Frame parse error: {0}")]
    Parse(String),
}

/// Calibration protocol errors
#[derive(Error, Debug, PartialEq)]
pub enum CalibrationError {
    #[error("Calibration is not finished (current phase: {phase})")]
    Incomplete { phase: String },
}

/// Errors raised when building a normalizer from a baseline
#[derive(Error, Debug, PartialEq)]
pub enum NormalizeError {
    #[error("Baseline is missing extremes for: {}", feature_list(.features))]
    Incomplete { features: Vec<Feature> },

    #[error("Baseline has min == max for: {}", feature_list(.features))]
    DegenerateBaseline { features: Vec<Feature> },
}

/// Control parameter errors
#[derive(Error, Debug, PartialEq)]
pub enum ParamError {
    #[error("Unknown control parameter: {0}")]
    UnknownControl(String),

    #[error("Unknown option: {0}")]
    UnknownOption(String),
}

/// Avatar model pipeline errors
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model '{model}' failed at {stage} stage: {message}")]
    Stage {
        stage: ModelStage,
        model: String,
        message: String,
    },

    #[error("Invalid model name: {0}")]
    InvalidName(String),
}

/// Web server errors
#[derive(Error, Debug)]
pub enum WebError {
    #[error("Failed to bind to address: {0}")]
    Bind(String),

    #[error("Event channel closed")]
    ChannelClosed,
}

fn feature_list(features: &[Feature]) -> String {
    features
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for pose2rig operations
pub type Result<T> = std::result::Result<T, Pose2RigError>;
