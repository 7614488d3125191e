//! Fake news detector
//!
//! Owns the active model, the preprocessor and the model metadata. Built once
//! at startup and read-only afterwards, so a shared reference can serve
//! concurrent requests without locking.

use crate::artifact::ModelArtifacts;
use crate::config::DetectorConfig;
use crate::fallback::FallbackSynthesizer;
use crate::linear::{LinearClassifier, Prediction};
use crate::pipeline::TextPipeline;
use crate::preprocess::TextPreprocessor;
use crate::vectorizer::Vectorizer;
use newscheck_core::{Error, ModelMetadata, PredictionResult, Result};
use tracing::{error, info, warn};

/// Whether the detector serves a persisted model or the synthesized fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorMode {
    Loaded,
    Fallback,
}

/// Inference path, fixed at construction
#[derive(Debug, Clone)]
enum ActiveModel {
    Bundle {
        classifier: LinearClassifier,
        vectorizer: Vectorizer,
    },
    Pipeline(TextPipeline),
}

impl ActiveModel {
    fn predict(&self, processed: &str) -> Result<Prediction> {
        match self {
            Self::Bundle {
                classifier,
                vectorizer,
            } => classifier.predict(&vectorizer.transform(processed)?),
            Self::Pipeline(pipeline) => pipeline.predict(processed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Detector {
    model: ActiveModel,
    metadata: ModelMetadata,
    preprocessor: TextPreprocessor,
    mode: DetectorMode,
}

impl Detector {
    /// Load from the configured candidates, training the fallback if allowed.
    ///
    /// Only fails when no artifact loads and the fallback is disabled or
    /// cannot be trained.
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        let artifacts = config.loader().load();
        let fallback = config.fallback.enabled.then(FallbackSynthesizer::new);
        Self::with_fallback(artifacts, fallback.as_ref())
    }

    /// Build from already-loaded artifacts with the default fallback
    pub fn from_artifacts(artifacts: ModelArtifacts) -> Result<Self> {
        Self::with_fallback(artifacts, Some(&FallbackSynthesizer::new()))
    }

    pub fn with_fallback(
        artifacts: ModelArtifacts,
        fallback: Option<&FallbackSynthesizer>,
    ) -> Result<Self> {
        let preprocessor = TextPreprocessor::english();

        let artifacts = match artifacts.validate() {
            Ok(()) => artifacts,
            Err(e) => {
                warn!(error = %e, shape = artifacts.shape(), "Rejecting invalid model artifacts");
                ModelArtifacts::unavailable(e.to_string())
            }
        };

        let (model, metadata, mode) = match artifacts {
            ModelArtifacts::Bundle {
                classifier,
                vectorizer,
                metadata,
            } => (
                ActiveModel::Bundle {
                    classifier,
                    vectorizer,
                },
                metadata,
                DetectorMode::Loaded,
            ),
            ModelArtifacts::Pipeline { pipeline, metadata } => {
                (ActiveModel::Pipeline(pipeline), metadata, DetectorMode::Loaded)
            }
            ModelArtifacts::Unavailable { reason } => {
                let Some(synthesizer) = fallback else {
                    error!(%reason, "No model available and fallback is disabled");
                    return Err(Error::artifact(format!(
                        "no model available ({reason}) and fallback is disabled"
                    )));
                };

                warn!(%reason, "Entering fallback mode");
                let trained = synthesizer.train(&preprocessor).map_err(|e| {
                    error!(error = %e, "Fallback model training failed");
                    e
                })?;

                (
                    ActiveModel::Bundle {
                        classifier: trained.classifier,
                        vectorizer: trained.vectorizer,
                    },
                    trained.metadata,
                    DetectorMode::Fallback,
                )
            }
        };

        info!(
            mode = ?mode,
            model_type = metadata.model_type().unwrap_or("unknown"),
            "Detector ready"
        );

        Ok(Self {
            model,
            metadata,
            preprocessor,
            mode,
        })
    }

    /// Classify `text`, propagating inference failures
    pub fn try_predict(&self, text: &str) -> Result<PredictionResult> {
        let processed = self.preprocessor.preprocess(text);
        self.model.predict(&processed)?.into_result()
    }

    /// Classify `text`. Inference failures yield the default 50/50 result.
    pub fn predict(&self, text: &str) -> PredictionResult {
        self.try_predict(text).unwrap_or_else(|e| {
            warn!(error = %e, "Prediction failed, returning default result");
            PredictionResult::default_result()
        })
    }

    /// Classify each text independently, preserving input order
    pub fn predict_batch<T: AsRef<str>>(&self, texts: &[T]) -> Vec<PredictionResult> {
        texts.iter().map(|text| self.predict(text.as_ref())).collect()
    }

    pub fn model_info(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn mode(&self) -> DetectorMode {
        self.mode
    }

    pub fn is_fallback(&self) -> bool {
        self.mode == DetectorMode::Fallback
    }

    /// `bundle` or `pipeline`
    pub fn shape(&self) -> &'static str {
        match self.model {
            ActiveModel::Bundle { .. } => "bundle",
            ActiveModel::Pipeline(_) => "pipeline",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linear::LogisticRegression;
    use crate::vectorizer::CountVectorizer;
    use newscheck_core::NewsClass;
    use std::collections::HashMap;

    fn bundle(coef: Vec<f64>) -> ModelArtifacts {
        let vocabulary: HashMap<String, usize> =
            [("shock".to_string(), 0), ("studi".to_string(), 1)].into_iter().collect();
        ModelArtifacts::Bundle {
            classifier: LogisticRegression::new(coef, 0.0).into(),
            vectorizer: CountVectorizer::new(vocabulary, (1, 1)).into(),
            metadata: ModelMetadata::new().with("model_type", "Test"),
        }
    }

    #[test]
    fn test_bundle_prediction() {
        let detector = Detector::from_artifacts(bundle(vec![2.0, -2.0])).unwrap();
        assert_eq!(detector.mode(), DetectorMode::Loaded);
        assert_eq!(detector.shape(), "bundle");

        let result = detector.predict("SHOCKING!!!");
        assert_eq!(result.class, NewsClass::Fake);
        assert_eq!(result.prediction, 1);

        let result = detector.predict("A careful study");
        assert_eq!(result.class, NewsClass::Real);
    }

    #[test]
    fn test_unavailable_trains_fallback() {
        let detector = Detector::from_artifacts(ModelArtifacts::unavailable("test")).unwrap();
        assert!(detector.is_fallback());
        assert_eq!(detector.model_info().model_type(), Some("Fallback Model"));
    }

    #[test]
    fn test_unavailable_without_fallback_fails() {
        let err = Detector::with_fallback(ModelArtifacts::unavailable("test"), None).unwrap_err();
        assert!(matches!(err, Error::Artifact(_)));
    }

    #[test]
    fn test_dimension_mismatch_yields_default() {
        let detector = Detector::from_artifacts(bundle(vec![1.0, 1.0, 1.0])).unwrap();
        assert!(detector.try_predict("shocking").is_err());
        assert_eq!(detector.predict("shocking"), PredictionResult::default_result());
    }

    #[test]
    fn test_invalid_bundle_enters_fallback() {
        let vocabulary: HashMap<String, usize> = [("shock".to_string(), 5)].into_iter().collect();
        let artifacts = ModelArtifacts::Bundle {
            classifier: LogisticRegression::new(vec![1.0], 0.0).into(),
            vectorizer: CountVectorizer::new(vocabulary, (1, 1)).into(),
            metadata: ModelMetadata::new().with("model_type", "Broken"),
        };

        let detector = Detector::from_artifacts(artifacts.clone()).unwrap();
        assert!(detector.is_fallback());
        let result = detector.predict("shocking");
        assert!((result.probabilities.real + result.probabilities.fake - 1.0).abs() < 1e-9);

        assert!(Detector::with_fallback(artifacts, None).is_err());
    }

    #[test]
    fn test_empty_text_uses_intercept() {
        let detector = Detector::from_artifacts(bundle(vec![2.0, -2.0])).unwrap();
        let result = detector.predict("the and of");
        assert_eq!(result.probabilities.real, 0.5);
        assert_eq!(result.class, NewsClass::Real);
    }
}
