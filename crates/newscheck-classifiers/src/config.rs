//! Detector configuration

use crate::artifact::{default_candidates, ArtifactLoader, ModelCandidate};
use newscheck_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where to look for a model and what to do when none loads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Candidate artifact paths, first existing file wins
    #[serde(default = "default_candidates")]
    pub model_paths: Vec<ModelCandidate>,

    #[serde(default)]
    pub fallback: FallbackConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Train the embedded fallback model when no artifact loads
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_paths: default_candidates(),
            fallback: FallbackConfig::default(),
        }
    }
}

impl DetectorConfig {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::config(format!("invalid detector config: {e}")))
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Try `path` before every other candidate
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_paths.insert(0, ModelCandidate::new(path));
        self
    }

    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback.enabled = enabled;
        self
    }

    pub fn loader(&self) -> ArtifactLoader {
        ArtifactLoader::new(self.model_paths.clone())
    }
}

fn default_true() -> bool {
    true
}
