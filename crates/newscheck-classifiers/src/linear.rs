//! Linear binary classifiers over sparse feature vectors

use crate::vectorizer::{dot_weights, FeatureVector};
use newscheck_core::{Error, NewsClass, PredictionResult, Probabilities, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// The only label encoding accepted: index 0 is REAL, index 1 is FAKE
pub const EXPECTED_CLASSES: [i64; 2] = [0, 1];

/// Raw classifier output: a label and `[p_real, p_fake]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: u8,
    pub probabilities: [f64; 2],
}

impl Prediction {
    /// Convert into the API result, rejecting labels outside {0, 1}
    pub fn into_result(self) -> Result<PredictionResult> {
        let class = NewsClass::from_label(self.label)
            .ok_or_else(|| Error::inference(format!("unexpected class label {}", self.label)))?;
        let [real, fake] = self.probabilities;
        Ok(PredictionResult::new(class, Probabilities::new(real, fake)))
    }
}

/// Gradient descent settings for [`LogisticRegression::fit`]
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingParams {
    /// Inverse regularization strength
    pub c: f64,
    pub learning_rate: f64,
    pub max_iter: usize,
    /// Stop once the gradient norm drops below this
    pub tol: f64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            learning_rate: 0.1,
            max_iter: 2_000,
            tol: 1e-6,
        }
    }
}

/// Binary logistic regression. `p_fake = sigmoid(w·x + b)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    #[serde(deserialize_with = "deserialize_coef")]
    coef: Vec<f64>,

    #[serde(deserialize_with = "deserialize_intercept")]
    intercept: f64,

    #[serde(default = "default_classes")]
    classes: Vec<i64>,
}

impl LogisticRegression {
    pub fn new(coef: Vec<f64>, intercept: f64) -> Self {
        Self {
            coef,
            intercept,
            classes: EXPECTED_CLASSES.to_vec(),
        }
    }

    pub fn with_classes(mut self, classes: Vec<i64>) -> Self {
        self.classes = classes;
        self
    }

    pub fn coef(&self) -> &[f64] {
        &self.coef
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn decision_function(&self, x: &FeatureVector) -> Result<f64> {
        Ok(dot_weights(x, &self.coef)? + self.intercept)
    }

    pub fn predict(&self, x: &FeatureVector) -> Result<Prediction> {
        let z = self.decision_function(x)?;
        if !z.is_finite() {
            return Err(Error::inference(format!("non-finite decision value {z}")));
        }
        let fake = sigmoid(z);
        Ok(Prediction {
            label: u8::from(z > 0.0),
            probabilities: [1.0 - fake, fake],
        })
    }

    /// Fit an L2-regularized model by full-batch gradient descent.
    ///
    /// Minimizes `0.5·|w|² + C·Σ logloss`; the intercept is not regularized.
    /// Deterministic for a given input.
    pub fn fit(samples: &[FeatureVector], labels: &[u8], params: &TrainingParams) -> Result<Self> {
        if samples.is_empty() || samples.len() != labels.len() {
            return Err(Error::training(format!(
                "expected one label per sample, got {} samples and {} labels",
                samples.len(),
                labels.len()
            )));
        }
        if labels.iter().any(|&y| y > 1) || !labels.contains(&0) || !labels.contains(&1) {
            return Err(Error::training(
                "training labels must contain both class 0 and class 1 and nothing else",
            ));
        }

        let dim = samples[0].dim();
        if dim == 0 {
            return Err(Error::training("cannot fit on an empty vocabulary"));
        }
        if samples.iter().any(|x| x.dim() != dim) {
            return Err(Error::training("samples have inconsistent feature dimensions"));
        }

        let mut weights = vec![0.0; dim];
        let mut bias = 0.0;

        for iteration in 0..params.max_iter {
            let mut grad_w = weights.clone();
            let mut grad_b = 0.0;

            for (x, &y) in samples.iter().zip(labels) {
                let p_fake = sigmoid(dot_weights(x, &weights)? + bias);
                let residual = params.c * (p_fake - f64::from(y));
                for (index, &value) in x.iter() {
                    grad_w[index] += residual * value;
                }
                grad_b += residual;
            }

            let grad_norm = (grad_w.iter().map(|g| g * g).sum::<f64>() + grad_b * grad_b).sqrt();
            if !grad_norm.is_finite() {
                return Err(Error::training(format!(
                    "gradient diverged at iteration {iteration}"
                )));
            }

            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= params.learning_rate * g;
            }
            bias -= params.learning_rate * grad_b;

            if grad_norm < params.tol {
                debug!(iteration, grad_norm, "Logistic regression converged");
                break;
            }
        }

        if !bias.is_finite() || weights.iter().any(|w| !w.is_finite()) {
            return Err(Error::training("fitted weights are not finite"));
        }

        Ok(Self::new(weights, bias))
    }
}

/// Multinomial naive Bayes, evaluated as a linear model in log space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultinomialNb {
    class_log_prior: Vec<f64>,

    /// One row of per-feature log probabilities per class
    feature_log_prob: Vec<Vec<f64>>,

    #[serde(default = "default_classes")]
    classes: Vec<i64>,
}

impl MultinomialNb {
    pub fn new(class_log_prior: [f64; 2], feature_log_prob: [Vec<f64>; 2]) -> Self {
        Self {
            class_log_prior: class_log_prior.to_vec(),
            feature_log_prob: feature_log_prob.to_vec(),
            classes: EXPECTED_CLASSES.to_vec(),
        }
    }

    pub fn num_features(&self) -> usize {
        self.feature_log_prob.first().map_or(0, Vec::len)
    }

    pub fn predict(&self, x: &FeatureVector) -> Result<Prediction> {
        let real = self.class_log_prior[0] + dot_weights(x, &self.feature_log_prob[0])?;
        let fake = self.class_log_prior[1] + dot_weights(x, &self.feature_log_prob[1])?;
        if !real.is_finite() || !fake.is_finite() {
            return Err(Error::inference("non-finite joint log likelihood"));
        }

        let max = real.max(fake);
        let (e_real, e_fake) = ((real - max).exp(), (fake - max).exp());
        let total = e_real + e_fake;

        Ok(Prediction {
            label: u8::from(fake > real),
            probabilities: [e_real / total, e_fake / total],
        })
    }

    fn validate_shape(&self) -> Result<()> {
        if self.class_log_prior.len() != 2 || self.feature_log_prob.len() != 2 {
            return Err(Error::artifact("multinomial_nb must describe exactly two classes"));
        }
        if self.feature_log_prob[0].len() != self.feature_log_prob[1].len() {
            return Err(Error::artifact(
                "multinomial_nb feature_log_prob rows differ in length",
            ));
        }
        Ok(())
    }
}

/// Any supported classifier, tagged by `type` in persisted artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LinearClassifier {
    LogisticRegression(LogisticRegression),
    MultinomialNb(MultinomialNb),
}

impl LinearClassifier {
    pub fn predict(&self, x: &FeatureVector) -> Result<Prediction> {
        match self {
            Self::LogisticRegression(model) => model.predict(x),
            Self::MultinomialNb(model) => model.predict(x),
        }
    }

    pub fn num_features(&self) -> usize {
        match self {
            Self::LogisticRegression(model) => model.coef.len(),
            Self::MultinomialNb(model) => model.num_features(),
        }
    }

    pub fn classes(&self) -> &[i64] {
        match self {
            Self::LogisticRegression(model) => &model.classes,
            Self::MultinomialNb(model) => &model.classes,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::LogisticRegression(_) => "logistic_regression",
            Self::MultinomialNb(_) => "multinomial_nb",
        }
    }

    /// Reject label encodings other than `[0, 1]` and malformed shapes
    pub fn validate(&self) -> Result<()> {
        if self.classes() != EXPECTED_CLASSES {
            return Err(Error::artifact(format!(
                "unsupported label encoding {:?}, expected {:?} (0 = REAL, 1 = FAKE)",
                self.classes(),
                EXPECTED_CLASSES
            )));
        }
        match self {
            Self::LogisticRegression(_) => Ok(()),
            Self::MultinomialNb(model) => model.validate_shape(),
        }
    }
}

impl From<LogisticRegression> for LinearClassifier {
    fn from(model: LogisticRegression) -> Self {
        Self::LogisticRegression(model)
    }
}

impl From<MultinomialNb> for LinearClassifier {
    fn from(model: MultinomialNb) -> Self {
        Self::MultinomialNb(model)
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn default_classes() -> Vec<i64> {
    EXPECTED_CLASSES.to_vec()
}

/// Accept `coef` either flat or as a single-row matrix
fn deserialize_coef<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Coef {
        Flat(Vec<f64>),
        Rows(Vec<Vec<f64>>),
    }

    match Coef::deserialize(deserializer)? {
        Coef::Flat(coef) => Ok(coef),
        Coef::Rows(mut rows) if rows.len() == 1 => Ok(rows.remove(0)),
        Coef::Rows(rows) => Err(D::Error::custom(format!(
            "expected a single coefficient row for a binary model, got {}",
            rows.len()
        ))),
    }
}

/// Accept `intercept` either as a scalar or a one-element array
fn deserialize_intercept<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Intercept {
        Scalar(f64),
        Array(Vec<f64>),
    }

    match Intercept::deserialize(deserializer)? {
        Intercept::Scalar(value) => Ok(value),
        Intercept::Array(values) if values.len() == 1 => Ok(values[0]),
        Intercept::Array(values) => Err(D::Error::custom(format!(
            "expected a single intercept for a binary model, got {}",
            values.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sprs::CsVec;

    fn x(dim: usize, entries: &[(usize, f64)]) -> FeatureVector {
        let (indices, data): (Vec<usize>, Vec<f64>) = entries.iter().copied().unzip();
        CsVec::new(dim, indices, data)
    }

    #[test]
    fn test_logistic_probabilities_sum_to_one() {
        let model = LogisticRegression::new(vec![2.0, -1.0], 0.5);
        let prediction = model.predict(&x(2, &[(0, 1.0)])).unwrap();
        assert_eq!(prediction.label, 1);
        let [real, fake] = prediction.probabilities;
        assert!((real + fake - 1.0).abs() < 1e-12);
        assert!(fake > 0.9);
    }

    #[test]
    fn test_zero_vector_uses_intercept() {
        let model = LogisticRegression::new(vec![1.0, 1.0], -2.0);
        let prediction = model.predict(&CsVec::empty(2)).unwrap();
        assert_eq!(prediction.label, 0);
        assert!(prediction.probabilities[0] > 0.85);
    }

    #[test]
    fn test_dimension_mismatch_is_inference_error() {
        let model = LogisticRegression::new(vec![1.0, 1.0], 0.0);
        let err = model.predict(&x(3, &[(2, 1.0)])).unwrap_err();
        assert!(matches!(err, Error::Inference(_)));
    }

    #[test]
    fn test_fit_separates_classes() {
        let samples = vec![
            x(3, &[(0, 1.0)]),
            x(3, &[(0, 1.0), (2, 1.0)]),
            x(3, &[(1, 1.0)]),
            x(3, &[(1, 1.0), (2, 1.0)]),
        ];
        let labels = [1, 1, 0, 0];
        let model = LogisticRegression::fit(&samples, &labels, &TrainingParams::default()).unwrap();

        assert!(model.coef()[0] > 0.0);
        assert!(model.coef()[1] < 0.0);
        assert_eq!(model.predict(&x(3, &[(0, 1.0)])).unwrap().label, 1);
        assert_eq!(model.predict(&x(3, &[(1, 1.0)])).unwrap().label, 0);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let samples = vec![x(2, &[(0, 1.0)]), x(2, &[(1, 1.0)])];
        let params = TrainingParams::default();
        let a = LogisticRegression::fit(&samples, &[1, 0], &params).unwrap();
        let b = LogisticRegression::fit(&samples, &[1, 0], &params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fit_requires_both_classes() {
        let samples = vec![x(2, &[(0, 1.0)]), x(2, &[(1, 1.0)])];
        let err = LogisticRegression::fit(&samples, &[1, 1], &TrainingParams::default()).unwrap_err();
        assert!(matches!(err, Error::Training(_)));
    }

    #[test]
    fn test_naive_bayes_prediction() {
        let model = MultinomialNb::new(
            [0.5f64.ln(), 0.5f64.ln()],
            [vec![0.8f64.ln(), 0.2f64.ln()], vec![0.2f64.ln(), 0.8f64.ln()]],
        );
        let prediction = model.predict(&x(2, &[(1, 2.0)])).unwrap();
        assert_eq!(prediction.label, 1);
        let [real, fake] = prediction.probabilities;
        assert!((real + fake - 1.0).abs() < 1e-12);
        assert!((fake - 16.0 / 17.0).abs() < 1e-9);
    }

    #[test]
    fn test_deserialize_matrix_shaped_logistic_regression() {
        let model: LinearClassifier = serde_json::from_value(json!({
            "type": "logistic_regression",
            "coef": [[0.5, -0.5]],
            "intercept": [0.1],
            "classes": [0, 1]
        }))
        .unwrap();
        assert_eq!(model.num_features(), 2);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_other_label_encodings() {
        let model: LinearClassifier =
            LogisticRegression::new(vec![1.0], 0.0).with_classes(vec![1, 0]).into();
        assert!(matches!(model.validate(), Err(Error::Artifact(_))));
    }

    #[test]
    fn test_prediction_into_result() {
        let result = Prediction {
            label: 1,
            probabilities: [0.3, 0.7],
        }
        .into_result()
        .unwrap();
        assert_eq!(result.class, NewsClass::Fake);
        assert_eq!(result.confidence, 0.7);

        let bad = Prediction {
            label: 2,
            probabilities: [0.5, 0.5],
        };
        assert!(bad.into_result().is_err());
    }
}
