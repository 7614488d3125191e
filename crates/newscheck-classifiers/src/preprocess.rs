//! Text preprocessing
//!
//! Normalizes raw article text into the stemmed token string the classifiers
//! were trained on:
//!
//! 1. drop every character that is not an ASCII letter or whitespace
//! 2. lowercase and trim
//! 3. split on whitespace
//! 4. drop stop words and tokens of two characters or fewer
//! 5. Porter-stem the survivors
//! 6. join with single spaces

use crate::stemmer::PorterStemmer;
use crate::stopwords;
use std::collections::HashSet;

/// Tokens this short or shorter are discarded
pub const MAX_DISCARDED_TOKEN_LEN: usize = 2;

/// Pure, deterministic text normalizer
#[derive(Debug, Clone)]
pub struct TextPreprocessor {
    stop_words: &'static HashSet<&'static str>,
    stemmer: PorterStemmer,
}

impl TextPreprocessor {
    /// Preprocessor using the English stop-word list and the Porter stemmer
    pub fn english() -> Self {
        Self {
            stop_words: stopwords::english(),
            stemmer: PorterStemmer::new(),
        }
    }

    /// Normalize `text`. Returns an empty string when no token survives.
    pub fn preprocess(&self, text: &str) -> String {
        let cleaned: String = text
            .chars()
            .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();

        cleaned
            .split_whitespace()
            .filter(|token| token.len() > MAX_DISCARDED_TOKEN_LEN && !self.stop_words.contains(token))
            .map(|token| self.stemmer.stem(token))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for TextPreprocessor {
    fn default() -> Self {
        Self::english()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_punctuation_and_digits() {
        let pre = TextPreprocessor::english();
        assert_eq!(pre.preprocess("Breaking: 5 SHOCKING discoveries!!!"), "break shock discoveri");
    }

    #[test]
    fn test_removes_stop_words_and_short_tokens() {
        let pre = TextPreprocessor::english();
        assert_eq!(pre.preprocess("the cat is on an ox farm"), "cat farm");
    }

    #[test]
    fn test_empty_when_everything_is_filtered() {
        let pre = TextPreprocessor::english();
        assert_eq!(pre.preprocess("it is at the of"), "");
        assert_eq!(pre.preprocess("   "), "");
        assert_eq!(pre.preprocess("42 !!"), "");
    }

    #[test]
    fn test_non_ascii_letters_are_dropped() {
        let pre = TextPreprocessor::english();
        assert_eq!(pre.preprocess("café résumé news"), "caf rsum news");
    }

    #[test]
    fn test_collapses_whitespace() {
        let pre = TextPreprocessor::english();
        assert_eq!(pre.preprocess("  research\t\tstudy \n confirms  "), "research studi confirm");
    }
}
