//! newscheck Classifiers
//!
//! Everything between raw article text and a [`PredictionResult`]:
//! - Text preprocessing (cleaning, stop-word removal, Porter stemming)
//! - Count and TF-IDF vectorizers producing sparse feature vectors
//! - Linear classifiers (logistic regression, multinomial naive Bayes)
//! - Artifact loading in plain or zstd-compressed JSON, detected as a bundle or pipeline
//! - A fallback model trained on an embedded corpus when no artifact loads
//!
//! [`Detector`] ties these together and never fails a prediction: inference
//! errors degrade to a 50/50 default result.
//!
//! [`PredictionResult`]: newscheck_core::PredictionResult

pub mod artifact;
pub mod config;
pub mod detector;
pub mod fallback;
pub mod linear;
pub mod pipeline;
pub mod preprocess;
pub mod stemmer;
pub mod stopwords;
pub mod vectorizer;

pub use artifact::{
    convert_artifact, default_candidates, ArtifactFormat, ArtifactLoader, ModelArtifacts,
    ModelCandidate, DEFAULT_MODEL_PATHS,
};
pub use config::{DetectorConfig, FallbackConfig};
pub use detector::{Detector, DetectorMode};
pub use fallback::{FallbackModel, FallbackSynthesizer, FALLBACK_CORPUS};
pub use linear::{LinearClassifier, LogisticRegression, MultinomialNb, Prediction, TrainingParams};
pub use pipeline::TextPipeline;
pub use preprocess::TextPreprocessor;
pub use stemmer::PorterStemmer;
pub use vectorizer::{
    dot_weights, CountVectorizer, FeatureVector, Norm, TfidfVectorizer, Vectorizer,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::artifact::{ArtifactFormat, ModelArtifacts};
    pub use crate::config::DetectorConfig;
    pub use crate::detector::{Detector, DetectorMode};
    pub use crate::preprocess::TextPreprocessor;
    pub use newscheck_core::prelude::*;
}
