//! Avatar model asset pipeline
//!
//! Resolves a model folder into a manifest the renderer can fetch, one named
//! stage at a time, and caches the result by model name.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ModelError;

/// Pipeline stage, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStage {
    Settings,
    Moc,
    Pose,
    Physics,
    Textures,
}

impl std::fmt::Display for ModelStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelStage::Settings => write!(f, "settings"),
            ModelStage::Moc => write!(f, "moc"),
            ModelStage::Pose => write!(f, "pose"),
            ModelStage::Physics => write!(f, "physics"),
            ModelStage::Textures => write!(f, "textures"),
        }
    }
}

/// The `FileReferences` block of a `.model3.json` settings file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FileReferences {
    moc: String,
    #[serde(default)]
    textures: Vec<String>,
    #[serde(default)]
    physics: Option<String>,
    #[serde(default)]
    pose: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ModelSettings {
    file_references: FileReferences,
}

/// Everything the renderer needs to fetch a model. Paths are URL paths
/// under the served models directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelManifest {
    pub name: String,
    pub settings: String,
    pub moc: String,
    pub textures: Vec<String>,
    pub pose: Option<String>,
    pub physics: Option<String>,
}

/// Runs the load stages for one model folder
pub struct ModelPipeline<'a> {
    name: &'a str,
    dir: PathBuf,
}

impl<'a> ModelPipeline<'a> {
    pub fn new(models_dir: &Path, name: &'a str) -> Self {
        Self {
            name,
            dir: models_dir.join(name),
        }
    }

    fn fail(&self, stage: ModelStage, message: impl Into<String>) -> ModelError {
        ModelError::Stage {
            stage,
            model: self.name.to_string(),
            message: message.into(),
        }
    }

    fn url(&self, file: &str) -> String {
        format!("/models/{}/{}", self.name, file)
    }

    /// Require `file` to exist inside the model folder
    fn require(&self, stage: ModelStage, file: &str) -> Result<String, ModelError> {
        let path = self.dir.join(file);
        if !path.is_file() {
            return Err(self.fail(stage, format!("missing {}", path.display())));
        }
        tracing::debug!("Model {}: {} stage ok ({})", self.name, stage, file);
        Ok(self.url(file))
    }

    /// Read and parse `<name>.model3.json`
    pub fn settings(&self) -> Result<FileReferencesView, ModelError> {
        let file = format!("{}.model3.json", self.name);
        let path = self.dir.join(&file);
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| self.fail(ModelStage::Settings, format!("{}: {}", path.display(), e)))?;
        let settings: ModelSettings = serde_json::from_str(&contents)
            .map_err(|e| self.fail(ModelStage::Settings, e.to_string()))?;
        Ok(FileReferencesView {
            settings_url: self.url(&file),
            refs: settings.file_references,
        })
    }

    pub fn moc(&self, refs: &FileReferencesView) -> Result<String, ModelError> {
        self.require(ModelStage::Moc, &refs.refs.moc)
    }

    pub fn pose(&self, refs: &FileReferencesView) -> Result<Option<String>, ModelError> {
        refs.refs
            .pose
            .as_deref()
            .map(|file| self.require(ModelStage::Pose, file))
            .transpose()
    }

    pub fn physics(&self, refs: &FileReferencesView) -> Result<Option<String>, ModelError> {
        refs.refs
            .physics
            .as_deref()
            .map(|file| self.require(ModelStage::Physics, file))
            .transpose()
    }

    pub fn textures(&self, refs: &FileReferencesView) -> Result<Vec<String>, ModelError> {
        if refs.refs.textures.is_empty() {
            return Err(self.fail(ModelStage::Textures, "no textures listed"));
        }
        refs.refs
            .textures
            .iter()
            .map(|file| self.require(ModelStage::Textures, file))
            .collect()
    }

    /// Run every stage in order
    pub fn run(&self) -> Result<ModelManifest, ModelError> {
        let refs = self.settings()?;
        let moc = self.moc(&refs)?;
        let pose = self.pose(&refs)?;
        let physics = self.physics(&refs)?;
        let textures = self.textures(&refs)?;

        Ok(ModelManifest {
            name: self.name.to_string(),
            settings: refs.settings_url,
            moc,
            textures,
            pose,
            physics,
        })
    }
}

/// Parsed settings, passed between stages
#[derive(Debug, Clone)]
pub struct FileReferencesView {
    settings_url: String,
    refs: FileReferences,
}

/// Loaded models by name
#[derive(Debug)]
pub struct ModelRegistry {
    models_dir: PathBuf,
    cache: HashMap<String, ModelManifest>,
    current: Option<String>,
}

impl ModelRegistry {
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
            cache: HashMap::new(),
            current: None,
        }
    }

    /// Load a model, or switch to it if it was loaded before
    pub fn load(&mut self, name: &str) -> Result<&ModelManifest, ModelError> {
        if name.is_empty()
            || name.contains(['/', '\\'])
            || name.starts_with('.')
        {
            return Err(ModelError::InvalidName(name.to_string()));
        }

        if !self.cache.contains_key(name) {
            let manifest = ModelPipeline::new(&self.models_dir, name).run()?;
            tracing::info!("Loaded model: {}", name);
            self.cache.insert(name.to_string(), manifest);
        } else {
            tracing::debug!("Model {} already loaded, switching", name);
        }

        self.current = Some(name.to_string());
        self.cache
            .get(name)
            .ok_or_else(|| ModelError::InvalidName(name.to_string()))
    }

    pub fn current(&self) -> Option<&ModelManifest> {
        self.current.as_ref().and_then(|name| self.cache.get(name))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::write_model;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_pipeline_builds_manifest() {
        let dir = TempDir::new().unwrap();
        write_model(dir.path(), "hiyori", true);

        let manifest = ModelPipeline::new(dir.path(), "hiyori").run().unwrap();
        assert_eq!(manifest.settings, "/models/hiyori/hiyori.model3.json");
        assert_eq!(manifest.moc, "/models/hiyori/hiyori.moc3");
        assert_eq!(manifest.textures, vec!["/models/hiyori/textures/texture_00.png"]);
        assert_eq!(manifest.pose.as_deref(), Some("/models/hiyori/hiyori.pose3.json"));
        assert!(manifest.physics.is_some());
    }

    #[test]
    fn test_pose_stage_is_optional() {
        let dir = TempDir::new().unwrap();
        write_model(dir.path(), "mao", false);
        let pipeline = ModelPipeline::new(dir.path(), "mao");
        let refs = pipeline.settings().unwrap();
        assert_eq!(pipeline.pose(&refs).unwrap(), None);
    }

    #[test]
    fn test_stage_failures_are_distinguishable() {
        let dir = TempDir::new().unwrap();

        let err = ModelPipeline::new(dir.path(), "ghost").run().unwrap_err();
        assert!(matches!(err, ModelError::Stage { stage: ModelStage::Settings, .. }));

        write_model(dir.path(), "broken", false);
        std::fs::remove_file(dir.path().join("broken/textures/texture_00.png")).unwrap();
        let err = ModelPipeline::new(dir.path(), "broken").run().unwrap_err();
        assert!(matches!(err, ModelError::Stage { stage: ModelStage::Textures, .. }));

        std::fs::remove_file(dir.path().join("broken/broken.moc3")).unwrap();
        let err = ModelPipeline::new(dir.path(), "broken").run().unwrap_err();
        assert!(matches!(err, ModelError::Stage { stage: ModelStage::Moc, .. }));
    }

    #[test]
    fn test_registry_caches_by_name() {
        let dir = TempDir::new().unwrap();
        write_model(dir.path(), "hiyori", false);
        write_model(dir.path(), "mao", false);

        let mut registry = ModelRegistry::new(dir.path());
        registry.load("hiyori").unwrap();
        registry.load("mao").unwrap();
        assert_eq!(registry.current().unwrap().name, "mao");

        // Cached entries survive their files disappearing
        std::fs::remove_dir_all(dir.path().join("hiyori")).unwrap();
        assert_eq!(registry.load("hiyori").unwrap().name, "hiyori");
        assert_eq!(registry.current().unwrap().name, "hiyori");
    }

    #[test]
    fn test_registry_rejects_path_names() {
        let mut registry = ModelRegistry::new("models");
        assert!(matches!(
            registry.load("../etc"),
            Err(ModelError::InvalidName(_))
        ));
        assert!(matches!(registry.load(""), Err(ModelError::InvalidName(_))));
    }
}
