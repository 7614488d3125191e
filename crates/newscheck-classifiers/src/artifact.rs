//! Persisted model artifacts
//!
//! An artifact file holds one JSON document, either plain or zstd-compressed.
//! The document is matched against three shapes:
//!
//! 1. a mapping with `model` and a non-null `vectorizer` is a **bundle**
//! 2. otherwise a `model` tagged `"type": "pipeline"` is a **pipeline**
//! 3. otherwise a `model` carrying an embedded `vectorizer` is split into a bundle
//!
//! Anything else is unrecognized. [`ArtifactLoader`] never fails: a missing,
//! unreadable or unrecognized file yields [`ModelArtifacts::Unavailable`].

use crate::linear::LinearClassifier;
use crate::pipeline::TextPipeline;
use crate::vectorizer::Vectorizer;
use newscheck_core::{Error, ModelMetadata, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Default artifact locations, tried in order
pub const DEFAULT_MODEL_PATHS: &[&str] = &[
    "models/fake_news_model.json.zst",
    "backend/models/fake_news_model.json.zst",
    "models/fake_news_model.json",
    "backend/models/fake_news_model.json",
];

/// On-disk encoding of an artifact document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    /// zstd-compressed JSON
    Compressed,
    /// JSON
    Plain,
}

impl ArtifactFormat {
    /// Infer from the file extension: `.zst` is compressed, anything else plain
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("zst") => Self::Compressed,
            _ => Self::Plain,
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Result<Value> {
        match self {
            Self::Plain => Ok(serde_json::from_slice(bytes)?),
            Self::Compressed => {
                let raw = zstd::decode_all(bytes)
                    .map_err(|e| Error::artifact(format!("zstd decompression failed: {e}")))?;
                Ok(serde_json::from_slice(&raw)?)
            }
        }
    }

    pub fn encode(self, value: &Value) -> Result<Vec<u8>> {
        let json = serde_json::to_vec_pretty(value)?;
        match self {
            Self::Plain => Ok(json),
            Self::Compressed => Ok(zstd::encode_all(json.as_slice(), zstd::DEFAULT_COMPRESSION_LEVEL)?),
        }
    }
}

impl FromStr for ArtifactFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "compressed" | "zst" | "zstd" => Ok(Self::Compressed),
            "plain" | "json" => Ok(Self::Plain),
            other => Err(Error::config(format!(
                "unknown artifact format '{other}', expected 'plain' or 'compressed'"
            ))),
        }
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compressed => write!(f, "compressed"),
            Self::Plain => write!(f, "plain"),
        }
    }
}

/// One candidate location with an optional explicit format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCandidate {
    pub path: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ArtifactFormat>,
}

impl ModelCandidate {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: None,
        }
    }

    pub fn with_format(mut self, format: ArtifactFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn resolved_format(&self) -> ArtifactFormat {
        self.format
            .unwrap_or_else(|| ArtifactFormat::from_path(&self.path))
    }
}

pub fn default_candidates() -> Vec<ModelCandidate> {
    DEFAULT_MODEL_PATHS.iter().map(ModelCandidate::new).collect()
}

/// The shape a loaded artifact took
#[derive(Debug, Clone)]
pub enum ModelArtifacts {
    Bundle {
        classifier: LinearClassifier,
        vectorizer: Vectorizer,
        metadata: ModelMetadata,
    },
    Pipeline {
        pipeline: TextPipeline,
        metadata: ModelMetadata,
    },
    Unavailable {
        reason: String,
    },
}

impl ModelArtifacts {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Detect whether a decoded document is a bundle or pipeline
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut root) = value else {
            return Err(Error::artifact("artifact is not a mapping"));
        };
        let model = root
            .remove("model")
            .ok_or_else(|| Error::artifact("artifact has no 'model' entry"))?;
        let metadata = parse_metadata(root.remove("metadata"))?;

        match root.remove("vectorizer") {
            Some(vectorizer) if !vectorizer.is_null() => {
                return bundle(model, vectorizer, metadata);
            }
            _ => {}
        }

        if TextPipeline::is_pipeline(&model) {
            let pipeline = TextPipeline::from_value(&model)?;
            pipeline.validate()?;
            warn_on_dimension_mismatch(pipeline.vectorizer(), pipeline.classifier());
            return Ok(Self::Pipeline { pipeline, metadata });
        }

        if let Value::Object(mut fields) = model {
            if let Some(embedded) = fields.remove("vectorizer").filter(|v| !v.is_null()) {
                debug!("Extracting vectorizer embedded in classifier");
                return bundle(Value::Object(fields), embedded, metadata);
            }
        }

        Err(Error::artifact(
            "unrecognized artifact: no vectorizer, pipeline, or embedded vectorizer found",
        ))
    }

    /// Read one artifact file and detect its shape
    pub fn read(path: &Path, format: ArtifactFormat) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_value(format.decode(&bytes)?)
    }

    /// Write this artifact, creating parent directories as needed
    pub fn write(&self, path: &Path, format: ArtifactFormat) -> Result<()> {
        let bytes = format.encode(&self.to_value()?)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
        Ok(())
    }

    pub fn to_value(&self) -> Result<Value> {
        let mut root = Map::new();
        match self {
            Self::Bundle {
                classifier,
                vectorizer,
                metadata,
            } => {
                root.insert("model".into(), serde_json::to_value(classifier)?);
                root.insert("vectorizer".into(), serde_json::to_value(vectorizer)?);
                root.insert("metadata".into(), serde_json::to_value(metadata)?);
            }
            Self::Pipeline { pipeline, metadata } => {
                root.insert("model".into(), pipeline.to_value()?);
                root.insert("metadata".into(), serde_json::to_value(metadata)?);
            }
            Self::Unavailable { .. } => {
                return Err(Error::artifact("an unavailable artifact cannot be serialized"));
            }
        }
        Ok(Value::Object(root))
    }

    pub fn metadata(&self) -> Option<&ModelMetadata> {
        match self {
            Self::Bundle { metadata, .. } | Self::Pipeline { metadata, .. } => Some(metadata),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn shape(&self) -> &'static str {
        match self {
            Self::Bundle { .. } => "bundle",
            Self::Pipeline { .. } => "pipeline",
            Self::Unavailable { .. } => "unavailable",
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable { .. })
    }

    /// Check vocabulary indices, label encoding and classifier shape
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Bundle {
                classifier,
                vectorizer,
                ..
            } => {
                vectorizer.validate()?;
                classifier.validate()
            }
            Self::Pipeline { pipeline, .. } => pipeline.validate(),
            Self::Unavailable { .. } => Ok(()),
        }
    }
}

fn bundle(model: Value, vectorizer: Value, metadata: ModelMetadata) -> Result<ModelArtifacts> {
    let classifier: LinearClassifier = serde_json::from_value(model)
        .map_err(|e| Error::artifact(format!("unsupported classifier: {e}")))?;
    let vectorizer: Vectorizer = serde_json::from_value(vectorizer)
        .map_err(|e| Error::artifact(format!("unsupported vectorizer: {e}")))?;

    vectorizer.validate()?;
    classifier.validate()?;
    warn_on_dimension_mismatch(&vectorizer, &classifier);

    Ok(ModelArtifacts::Bundle {
        classifier,
        vectorizer,
        metadata,
    })
}

fn parse_metadata(value: Option<Value>) -> Result<ModelMetadata> {
    match value {
        None | Some(Value::Null) => Ok(ModelMetadata::new()),
        Some(Value::Object(map)) => Ok(map.into()),
        Some(_) => Err(Error::artifact("artifact 'metadata' must be a mapping")),
    }
}

/// Mismatches surface as inference errors per request, not at load time
fn warn_on_dimension_mismatch(vectorizer: &Vectorizer, classifier: &LinearClassifier) {
    if vectorizer.num_features() != classifier.num_features() {
        warn!(
            vectorizer_features = vectorizer.num_features(),
            classifier_features = classifier.num_features(),
            "Vectorizer and classifier disagree on feature count; predictions will use the default result"
        );
    }
}

/// Re-encode an artifact, inferring both formats from the file extensions.
///
/// The document shape is detected before writing, so only loadable artifacts convert.
pub fn convert_artifact(input: &Path, output: &Path) -> Result<ModelArtifacts> {
    let artifacts = ModelArtifacts::read(input, ArtifactFormat::from_path(input))?;
    artifacts.write(output, ArtifactFormat::from_path(output))?;
    info!(
        input = %input.display(),
        output = %output.display(),
        shape = artifacts.shape(),
        "Converted artifact"
    );
    Ok(artifacts)
}

/// Resolves the first existing candidate into [`ModelArtifacts`]
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    candidates: Vec<ModelCandidate>,
}

impl ArtifactLoader {
    pub fn new(candidates: Vec<ModelCandidate>) -> Self {
        Self { candidates }
    }

    pub fn with_defaults() -> Self {
        Self::new(default_candidates())
    }

    pub fn candidates(&self) -> &[ModelCandidate] {
        &self.candidates
    }

    /// Load the first existing candidate. Never fails.
    pub fn load(&self) -> ModelArtifacts {
        let Some(candidate) = self.candidates.iter().find(|c| {
            let exists = c.path.is_file();
            if !exists {
                debug!(path = %c.path.display(), "Model candidate not found");
            }
            exists
        }) else {
            warn!(
                candidates = self.candidates.len(),
                "No model artifact found at any candidate path"
            );
            return ModelArtifacts::unavailable("no model artifact found");
        };

        let format = candidate.resolved_format();
        match ModelArtifacts::read(&candidate.path, format) {
            Ok(artifacts) => {
                info!(
                    path = %candidate.path.display(),
                    format = %format,
                    shape = artifacts.shape(),
                    "✓ Loaded model artifact"
                );
                artifacts
            }
            Err(e) => {
                warn!(
                    path = %candidate.path.display(),
                    format = %format,
                    error = %e,
                    "✗ Failed to load model artifact"
                );
                ModelArtifacts::unavailable(format!("{}: {e}", candidate.path.display()))
            }
        }
    }
}

impl Default for ArtifactLoader {
    fn default() -> Self {
        Self::with_defaults()
    }
}
