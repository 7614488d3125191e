//! Single-object text pipelines
//!
//! A pipeline owns both the feature extraction and the classifier, so raw
//! preprocessed text goes in and a [`Prediction`] comes out. Persisted as:
//!
//! ```json
//! {"type": "pipeline", "steps": [["tfidf", {...}], ["clf", {...}]]}
//! ```

use crate::linear::{LinearClassifier, Prediction};
use crate::vectorizer::Vectorizer;
use newscheck_core::{Error, Result};
use serde::Deserialize;
use serde_json::{json, Value};

/// Value of the `type` tag identifying a pipeline object
pub const PIPELINE_TYPE: &str = "pipeline";

#[derive(Deserialize)]
struct RawPipeline {
    steps: Vec<(String, Value)>,
}

/// Vectorizer step followed by a final classifier step
#[derive(Debug, Clone, PartialEq)]
pub struct TextPipeline {
    step_names: [String; 2],
    vectorizer: Vectorizer,
    classifier: LinearClassifier,
}

impl TextPipeline {
    pub fn new(vectorizer: Vectorizer, classifier: LinearClassifier) -> Self {
        Self {
            step_names: ["vectorizer".to_string(), "classifier".to_string()],
            vectorizer,
            classifier,
        }
    }

    /// Whether `value` is tagged as a pipeline object
    pub fn is_pipeline(value: &Value) -> bool {
        value.get("type").and_then(Value::as_str) == Some(PIPELINE_TYPE)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        if !Self::is_pipeline(value) {
            return Err(Error::artifact("object is not tagged as a pipeline"));
        }
        let raw = RawPipeline::deserialize(value)
            .map_err(|e| Error::artifact(format!("malformed pipeline: {e}")))?;
        Self::from_steps(raw.steps)
    }

    /// Build from named steps. The last step is the classifier and exactly
    /// one vectorizer step must precede it.
    pub fn from_steps(mut steps: Vec<(String, Value)>) -> Result<Self> {
        let Some((classifier_name, classifier)) = steps.pop() else {
            return Err(Error::artifact("pipeline has no steps"));
        };
        let [(vectorizer_name, vectorizer)]: [(String, Value); 1] = steps.try_into().map_err(
            |rest: Vec<(String, Value)>| {
                Error::artifact(format!(
                    "pipeline needs exactly one vectorizer step before the classifier, found {}",
                    rest.len()
                ))
            },
        )?;

        let vectorizer: Vectorizer = serde_json::from_value(vectorizer).map_err(|e| {
            Error::artifact(format!("pipeline step '{vectorizer_name}' is not a vectorizer: {e}"))
        })?;
        let classifier: LinearClassifier = serde_json::from_value(classifier).map_err(|e| {
            Error::artifact(format!("pipeline step '{classifier_name}' is not a classifier: {e}"))
        })?;

        Ok(Self {
            step_names: [vectorizer_name, classifier_name],
            vectorizer,
            classifier,
        })
    }

    pub fn vectorizer(&self) -> &Vectorizer {
        &self.vectorizer
    }

    pub fn classifier(&self) -> &LinearClassifier {
        &self.classifier
    }

    pub fn step_names(&self) -> [&str; 2] {
        [&self.step_names[0], &self.step_names[1]]
    }

    pub fn validate(&self) -> Result<()> {
        self.vectorizer.validate()?;
        self.classifier.validate()
    }

    /// Predict on already-preprocessed text
    pub fn predict(&self, text: &str) -> Result<Prediction> {
        self.classifier.predict(&self.vectorizer.transform(text)?)
    }

    pub fn to_value(&self) -> Result<Value> {
        let vectorizer = serde_json::to_value(&self.vectorizer)?;
        let classifier = serde_json::to_value(&self.classifier)?;
        Ok(json!({
            "type": PIPELINE_TYPE,
            "steps": [
                [&self.step_names[0], vectorizer],
                [&self.step_names[1], classifier],
            ],
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline_value() -> Value {
        json!({
            "type": "pipeline",
            "steps": [
                ["tfidf", {
                    "type": "tfidf",
                    "vocabulary": {"shock": 0, "studi": 1},
                    "idf": [1.0, 1.0]
                }],
                ["clf", {
                    "type": "logistic_regression",
                    "coef": [[3.0, -3.0]],
                    "intercept": [0.0],
                    "classes": [0, 1]
                }]
            ]
        })
    }

    #[test]
    fn test_pipeline_from_value() {
        let pipeline = TextPipeline::from_value(&pipeline_value()).unwrap();
        assert_eq!(pipeline.step_names(), ["tfidf", "clf"]);
        assert_eq!(pipeline.vectorizer().kind(), "tfidf");
        assert_eq!(pipeline.classifier().kind(), "logistic_regression");
        assert!(pipeline.validate().is_ok());

        assert_eq!(pipeline.predict("shock").unwrap().label, 1);
        assert_eq!(pipeline.predict("studi").unwrap().label, 0);
    }

    #[test]
    fn test_pipeline_value_round_trip() {
        let pipeline = TextPipeline::from_value(&pipeline_value()).unwrap();
        let restored = TextPipeline::from_value(&pipeline.to_value().unwrap()).unwrap();
        assert_eq!(pipeline, restored);
    }

    #[test]
    fn test_rejects_wrong_step_count() {
        let value = json!({"type": "pipeline", "steps": []});
        assert!(TextPipeline::from_value(&value).is_err());

        let mut value = pipeline_value();
        let steps = value["steps"].as_array_mut().unwrap();
        steps.insert(0, steps[0].clone());
        assert!(TextPipeline::from_value(&value).is_err());
    }

    #[test]
    fn test_rejects_untagged_object() {
        let value = json!({"steps": []});
        assert!(!TextPipeline::is_pipeline(&value));
        assert!(TextPipeline::from_value(&value).is_err());
    }
}
