//! Bag-of-words vectorizers
//!
//! Both vectorizers tokenize with the word pattern `\b\w\w+\b` (tokens of two
//! or more word characters), build space-joined n-grams over the configured
//! range, and look each n-gram up in a fixed vocabulary. Unknown n-grams are
//! ignored, so empty or fully out-of-vocabulary text maps to the all-zero
//! vector.

use newscheck_core::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sprs::CsVec;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::OnceLock;

/// Sparse feature vector with an explicit dimension
pub type FeatureVector = CsVec<f64>;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("token pattern is a valid regex"))
}

/// Assemble a feature vector, rejecting indices outside `dim`
fn feature_vector(dim: usize, entries: BTreeMap<usize, f64>) -> Result<FeatureVector> {
    let (indices, data): (Vec<usize>, Vec<f64>) = entries.into_iter().unzip();
    CsVec::new_from_unsorted(dim, indices, data)
        .map_err(|(_, _, e)| Error::inference(format!("invalid feature vector: {e}")))
}

/// Dot product against dense weights of the same dimension
pub fn dot_weights(x: &FeatureVector, weights: &[f64]) -> Result<f64> {
    if weights.len() != x.dim() {
        return Err(Error::inference(format!(
            "feature dimension mismatch: vector has {} features, weights expect {}",
            x.dim(),
            weights.len()
        )));
    }
    Ok(x.dot_dense(weights))
}

/// Term-count vectorizer over a fixed vocabulary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountVectorizer {
    /// N-gram to feature index
    vocabulary: HashMap<String, usize>,

    /// Inclusive `(min, max)` n-gram sizes
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),

    #[serde(default = "default_true")]
    lowercase: bool,

    /// Record presence (1.0) instead of counts
    #[serde(default)]
    binary: bool,
}

impl CountVectorizer {
    pub fn new(vocabulary: HashMap<String, usize>, ngram_range: (usize, usize)) -> Self {
        Self {
            vocabulary,
            ngram_range,
            lowercase: true,
            binary: false,
        }
    }

    /// Build a vocabulary from `texts`. Feature indices follow the sorted
    /// order of the n-grams.
    pub fn fit<T: AsRef<str>>(texts: &[T], ngram_range: (usize, usize)) -> Self {
        let mut vectorizer = Self::new(HashMap::new(), ngram_range);
        let terms: BTreeSet<String> = texts
            .iter()
            .flat_map(|text| vectorizer.ngrams(text.as_ref()))
            .collect();
        vectorizer.vocabulary = terms
            .into_iter()
            .enumerate()
            .map(|(index, term)| (term, index))
            .collect();
        vectorizer
    }

    pub fn with_binary(mut self, binary: bool) -> Self {
        self.binary = binary;
        self
    }

    pub fn num_features(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn vocabulary(&self) -> &HashMap<String, usize> {
        &self.vocabulary
    }

    pub fn ngram_range(&self) -> (usize, usize) {
        self.ngram_range
    }

    /// Check the vocabulary indices are dense and the n-gram range is sane
    pub fn validate(&self) -> Result<()> {
        let (min, max) = self.ngram_range;
        if min == 0 || min > max {
            return Err(Error::artifact(format!(
                "invalid ngram_range ({min}, {max})"
            )));
        }
        let n = self.vocabulary.len();
        let mut seen = vec![false; n];
        for (term, &index) in &self.vocabulary {
            if index >= n || std::mem::replace(&mut seen[index], true) {
                return Err(Error::artifact(format!(
                    "vocabulary index {index} for '{term}' is out of range or duplicated"
                )));
            }
        }
        Ok(())
    }

    pub fn transform(&self, text: &str) -> Result<FeatureVector> {
        feature_vector(self.num_features(), self.term_counts(text))
    }

    /// Per-index term frequencies of in-vocabulary n-grams
    fn term_counts(&self, text: &str) -> BTreeMap<usize, f64> {
        let mut counts = BTreeMap::new();
        for index in self
            .ngrams(text)
            .filter_map(|term| self.vocabulary.get(&term).copied())
        {
            let count = counts.entry(index).or_insert(0.0);
            *count = if self.binary { 1.0 } else { *count + 1.0 };
        }
        counts
    }

    fn ngrams<'a>(&self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        let tokens: Vec<String> = token_pattern()
            .find_iter(&text)
            .map(|m| m.as_str().to_string())
            .collect();
        let (min, max) = self.ngram_range;

        (min..=max).flat_map(move |n| {
            let grams: Vec<String> = if n == 0 || n > tokens.len() {
                Vec::new()
            } else {
                tokens.windows(n).map(|window| window.join(" ")).collect()
            };
            grams
        })
    }
}

/// Normalization applied to TF-IDF rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

/// TF-IDF vectorizer: counts re-weighted by inverse document frequency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    #[serde(flatten)]
    counts: CountVectorizer,

    /// Inverse document frequency per feature index
    idf: Vec<f64>,

    #[serde(default = "default_norm")]
    norm: Option<Norm>,

    /// Use `1 + ln(tf)` instead of raw term frequency
    #[serde(default)]
    sublinear_tf: bool,
}

impl TfidfVectorizer {
    pub fn new(counts: CountVectorizer, idf: Vec<f64>) -> Self {
        Self {
            counts,
            idf,
            norm: Some(Norm::L2),
            sublinear_tf: false,
        }
    }

    pub fn num_features(&self) -> usize {
        self.counts.num_features()
    }

    pub fn validate(&self) -> Result<()> {
        self.counts.validate()?;
        if self.idf.len() != self.counts.num_features() {
            return Err(Error::artifact(format!(
                "idf has {} weights for a vocabulary of {}",
                self.idf.len(),
                self.counts.num_features()
            )));
        }
        Ok(())
    }

    pub fn transform(&self, text: &str) -> Result<FeatureVector> {
        let mut weighted: BTreeMap<usize, f64> = self
            .counts
            .term_counts(text)
            .into_iter()
            .map(|(index, tf)| {
                let tf = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
                (index, tf * self.idf.get(index).copied().unwrap_or(0.0))
            })
            .collect();

        let norm = match self.norm {
            Some(Norm::L1) => weighted.values().map(|v| v.abs()).sum::<f64>(),
            Some(Norm::L2) => weighted.values().map(|v| v * v).sum::<f64>().sqrt(),
            None => 1.0,
        };
        if norm > 0.0 {
            weighted.values_mut().for_each(|v| *v /= norm);
        }

        feature_vector(self.num_features(), weighted)
    }
}

/// Any supported vectorizer, tagged by `type` in persisted artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Vectorizer {
    Count(CountVectorizer),
    Tfidf(TfidfVectorizer),
}

impl Vectorizer {
    pub fn transform(&self, text: &str) -> Result<FeatureVector> {
        match self {
            Self::Count(v) => v.transform(text),
            Self::Tfidf(v) => v.transform(text),
        }
    }

    pub fn num_features(&self) -> usize {
        match self {
            Self::Count(v) => v.num_features(),
            Self::Tfidf(v) => v.num_features(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Count(v) => v.validate(),
            Self::Tfidf(v) => v.validate(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Count(_) => "count",
            Self::Tfidf(_) => "tfidf",
        }
    }
}

impl From<CountVectorizer> for Vectorizer {
    fn from(v: CountVectorizer) -> Self {
        Self::Count(v)
    }
}

impl From<TfidfVectorizer> for Vectorizer {
    fn from(v: TfidfVectorizer) -> Self {
        Self::Tfidf(v)
    }
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_true() -> bool {
    true
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vocab(terms: &[&str]) -> HashMap<String, usize> {
        terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), i))
            .collect()
    }

    fn entries(x: &FeatureVector) -> Vec<(usize, f64)> {
        x.iter().map(|(index, &value)| (index, value)).collect()
    }

    #[test]
    fn test_fit_sorts_vocabulary() {
        let v = CountVectorizer::fit(&["shock news", "break news"], (1, 1));
        assert_eq!(v.num_features(), 3);
        assert_eq!(v.vocabulary()["break"], 0);
        assert_eq!(v.vocabulary()["news"], 1);
        assert_eq!(v.vocabulary()["shock"], 2);
    }

    #[test]
    fn test_transform_counts_repeated_terms() {
        let v = CountVectorizer::new(vocab(&["news", "shock"]), (1, 1));
        let x = v.transform("news shock news unknown").unwrap();
        assert_eq!(x.dim(), 2);
        assert_eq!(entries(&x), vec![(0, 2.0), (1, 1.0)]);
    }

    #[test]
    fn test_binary_counts() {
        let v = CountVectorizer::new(vocab(&["news"]), (1, 1)).with_binary(true);
        assert_eq!(entries(&v.transform("news news").unwrap()), vec![(0, 1.0)]);
    }

    #[test]
    fn test_single_letter_tokens_are_ignored() {
        let v = CountVectorizer::new(vocab(&["a", "ab"]), (1, 1));
        assert_eq!(entries(&v.transform("a ab").unwrap()), vec![(1, 1.0)]);
    }

    #[test]
    fn test_bigrams() {
        let v = CountVectorizer::new(vocab(&["break", "break news", "news"]), (1, 2));
        let x = v.transform("break news").unwrap();
        assert_eq!(entries(&x), vec![(0, 1.0), (1, 1.0), (2, 1.0)]);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let v = CountVectorizer::new(vocab(&["news"]), (1, 1));
        let x = v.transform("").unwrap();
        assert_eq!(x.dim(), 1);
        assert_eq!(x.nnz(), 0);
    }

    #[test]
    fn test_validate_rejects_sparse_indices() {
        let mut vocabulary = vocab(&["news"]);
        vocabulary.insert("shock".to_string(), 5);
        let v = CountVectorizer::new(vocabulary, (1, 1));
        assert!(v.validate().is_err());
    }

    #[test]
    fn test_out_of_range_index_is_inference_error() {
        let vocabulary: HashMap<String, usize> = [("shock".to_string(), 5)].into_iter().collect();
        let v = CountVectorizer::new(vocabulary, (1, 1));
        assert!(matches!(v.transform("shock"), Err(Error::Inference(_))));
        assert_eq!(v.transform("calm").unwrap().nnz(), 0);
    }

    #[test]
    fn test_tfidf_l2_normalized() {
        let counts = CountVectorizer::new(vocab(&["news", "shock"]), (1, 1));
        let v = TfidfVectorizer::new(counts, vec![1.0, 2.0]);
        let x = entries(&v.transform("news shock").unwrap());
        let norm: f64 = x.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-12);
        assert!(x[1].1 > x[0].1);
    }

    #[test]
    fn test_tfidf_sublinear_without_norm() {
        let tfidf: Vectorizer = serde_json::from_value(json!({
            "type": "tfidf",
            "vocabulary": {"news": 0},
            "idf": [2.0],
            "norm": null,
            "sublinear_tf": true
        }))
        .unwrap();
        let x = entries(&tfidf.transform("news news news").unwrap());
        assert_eq!(x.len(), 1);
        assert!((x[0].1 - 2.0 * (1.0 + 3f64.ln())).abs() < 1e-12);
    }

    #[test]
    fn test_tfidf_validate_checks_idf_length() {
        let counts = CountVectorizer::new(vocab(&["news", "shock"]), (1, 1));
        assert!(TfidfVectorizer::new(counts, vec![1.0]).validate().is_err());
    }

    #[test]
    fn test_deserialize_tagged_vectorizers() {
        let count: Vectorizer = serde_json::from_value(json!({
            "type": "count",
            "vocabulary": {"news": 0}
        }))
        .unwrap();
        assert_eq!(count.kind(), "count");
        assert_eq!(count.num_features(), 1);

        let tfidf: Vectorizer = serde_json::from_value(json!({
            "type": "tfidf",
            "vocabulary": {"news": 0, "shock": 1},
            "ngram_range": [1, 2],
            "idf": [1.0, 1.5],
            "norm": null,
            "sublinear_tf": true
        }))
        .unwrap();
        assert_eq!(tfidf.kind(), "tfidf");
        assert!(tfidf.validate().is_ok());
    }

    #[test]
    fn test_dot_dimension_mismatch() {
        let x = CsVec::new(3, vec![0], vec![1.0]);
        assert!(matches!(dot_weights(&x, &[1.0, 2.0]), Err(Error::Inference(_))));
        assert_eq!(dot_weights(&x, &[2.0, 0.0, 0.0]).unwrap(), 2.0);
    }
}
