//! Core types for newscheck

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Binary news class predicted by the detector.
///
/// The label encoding is fixed: `0` is [`NewsClass::Real`] and `1` is
/// [`NewsClass::Fake`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NewsClass {
    Real,
    Fake,
}

impl NewsClass {
    /// Map a classifier label onto a class, `None` for anything but 0 or 1
    pub fn from_label(label: u8) -> Option<Self> {
        match label {
            0 => Some(Self::Real),
            1 => Some(Self::Fake),
            _ => None,
        }
    }

    /// Numeric label of this class
    pub fn label(self) -> u8 {
        match self {
            Self::Real => 0,
            Self::Fake => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Real => "REAL",
            Self::Fake => "FAKE",
        }
    }
}

impl fmt::Display for NewsClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Probability pair over the two classes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probabilities {
    pub real: f64,
    pub fake: f64,
}

impl Probabilities {
    pub fn new(real: f64, fake: f64) -> Self {
        Self { real, fake }
    }

    /// Uniform 50/50 split
    pub fn uniform() -> Self {
        Self::new(0.5, 0.5)
    }

    /// Largest of the two probabilities
    pub fn max(&self) -> f64 {
        self.real.max(self.fake)
    }
}

/// Result of a single prediction.
///
/// Created fresh per call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Numeric label (0 = REAL, 1 = FAKE)
    pub prediction: u8,

    /// Confidence score, always `max(real, fake)`
    pub confidence: f64,

    /// Predicted class
    pub class: NewsClass,

    /// Per-class probabilities
    pub probabilities: Probabilities,

    /// Operator-facing note for degraded responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl PredictionResult {
    /// Build a result from a predicted class and its probability pair
    pub fn new(class: NewsClass, probabilities: Probabilities) -> Self {
        Self {
            prediction: class.label(),
            confidence: probabilities.max(),
            class,
            probabilities,
            note: None,
        }
    }

    /// Last-resort result used when inference fails
    pub fn default_result() -> Self {
        Self::new(NewsClass::Real, Probabilities::uniform())
    }

    /// Attach an operator-facing note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn is_fake(&self) -> bool {
        self.class == NewsClass::Fake
    }
}

/// Free-form key/value description of the active model.
///
/// Typical keys are `model_type`, `version`, `accuracy` and `features`, but
/// nothing beyond "a JSON object" is enforced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelMetadata(Map<String, Value>);

impl ModelMetadata {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// `model_type` entry, if it is a string
    pub fn model_type(&self) -> Option<&str> {
        self.get("model_type").and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Well-known record reported when no detector is available
    pub fn no_model() -> Self {
        Self::new()
            .with("model_type", "No Model")
            .with("version", "1.0.0")
            .with("status", "Fallback mode")
            .with("accuracy", 0.0)
    }
}

impl From<Map<String, Value>> for ModelMetadata {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
