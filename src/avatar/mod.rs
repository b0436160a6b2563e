//! Avatar model management
//!
//! Resolves and caches the model assets the renderer loads.

pub mod model;

pub use model::{ModelManifest, ModelPipeline, ModelRegistry, ModelStage};
