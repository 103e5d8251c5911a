//! Bag-of-words count vectorization
//!
//! A small counterpart of scikit-learn's `CountVectorizer`, restricted to the
//! two configurations the preprocessing pipeline uses: an explicit fixed
//! vocabulary, or a frequency-bounded vocabulary with English stop-word
//! removal. Both share the same token-acceptance rule.

use anyhow::{ensure, Result};
use regex::Regex;
use std::collections::{HashMap, HashSet};

use super::stopwords::ENGLISH_STOP_WORDS;
use crate::sparse::CsrMatrix;

/// Token-acceptance pattern: alphabetic tokens of 3 to 30 characters, no
/// digits. Matches the reference tooling's vectorizer configuration.
pub const TOKEN_PATTERN: &str = r"\b[^\d\W]{3,30}\b";

enum VocabularyMode {
    /// Vocabulary supplied up front; indices follow list position.
    Fixed,
    /// Vocabulary learned from the corpus, optionally capped at
    /// `max_features` terms by corpus-wide count.
    Bounded { max_features: Option<usize> },
}

/// Count vectorizer over whitespace-joined token strings.
pub struct CountVectorizer {
    token_re: Regex,
    mode: VocabularyMode,
    stop_words: HashSet<&'static str>,
    vocabulary: Vec<String>,
    index: HashMap<String, usize>,
    fitted: bool,
}

impl CountVectorizer {
    /// Fixed-vocabulary vectorizer. The fitted vocabulary is exactly the
    /// given list; [`CountVectorizer::fit`] is a no-op in this mode.
    pub fn with_vocabulary(vocabulary: Vec<String>) -> Result<Self> {
        let mut index = HashMap::with_capacity(vocabulary.len());
        for (ix, term) in vocabulary.iter().enumerate() {
            ensure!(
                index.insert(term.clone(), ix).is_none(),
                "duplicate vocabulary entry: {term}"
            );
        }
        Ok(Self {
            token_re: Regex::new(TOKEN_PATTERN).expect("token pattern is valid"),
            mode: VocabularyMode::Fixed,
            stop_words: HashSet::new(),
            vocabulary,
            index,
            fitted: true,
        })
    }

    /// Frequency-bounded vectorizer with English stop-word removal.
    ///
    /// With `max_features = Some(n)` the fitted vocabulary keeps the `n`
    /// highest-count terms (ties broken alphabetically); `None` keeps every
    /// accepted term. The final vocabulary is sorted alphabetically either
    /// way.
    pub fn bounded(max_features: Option<usize>) -> Self {
        Self {
            token_re: Regex::new(TOKEN_PATTERN).expect("token pattern is valid"),
            mode: VocabularyMode::Bounded { max_features },
            stop_words: ENGLISH_STOP_WORDS.iter().copied().collect(),
            vocabulary: Vec::new(),
            index: HashMap::new(),
            fitted: false,
        }
    }

    /// Lowercase and scan one document into accepted tokens.
    fn analyze(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.token_re
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Learn the vocabulary from `docs`. No-op in fixed-vocabulary mode.
    pub fn fit(&mut self, docs: &[String]) {
        let max_features = match self.mode {
            VocabularyMode::Fixed => return,
            VocabularyMode::Bounded { max_features } => max_features,
        };

        let mut counts: HashMap<String, i64> = HashMap::new();
        for doc in docs {
            for token in self.analyze(doc) {
                if self.stop_words.contains(token.as_str()) {
                    continue;
                }
                *counts.entry(token).or_insert(0) += 1;
            }
        }

        let mut terms: Vec<(String, i64)> = counts.into_iter().collect();
        if let Some(cap) = max_features {
            terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            terms.truncate(cap);
        }
        let mut vocabulary: Vec<String> = terms.into_iter().map(|(term, _)| term).collect();
        vocabulary.sort_unstable();

        self.index = vocabulary
            .iter()
            .enumerate()
            .map(|(ix, term)| (term.clone(), ix))
            .collect();
        self.vocabulary = vocabulary;
        self.fitted = true;
    }

    /// Count tokens per document against the fitted vocabulary. Tokens
    /// outside the vocabulary are dropped.
    pub fn transform(&self, docs: &[String]) -> Result<CsrMatrix> {
        ensure!(self.fitted, "transform called before fit");
        let mut rows = Vec::with_capacity(docs.len());
        for doc in docs {
            let mut counts: HashMap<usize, i64> = HashMap::new();
            for token in self.analyze(doc) {
                if let Some(&ix) = self.index.get(&token) {
                    *counts.entry(ix).or_insert(0) += 1;
                }
            }
            let mut row: Vec<(usize, i64)> = counts.into_iter().collect();
            row.sort_unstable_by_key(|&(col, _)| col);
            rows.push(row);
        }
        Ok(CsrMatrix::from_rows(self.vocabulary.len(), &rows))
    }

    pub fn fit_transform(&mut self, docs: &[String]) -> Result<CsrMatrix> {
        self.fit(docs);
        self.transform(docs)
    }

    /// Fitted vocabulary in column order.
    pub fn feature_names(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn vocabulary_contains(&self, term: &str) -> bool {
        self.index.contains_key(term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bounded_fit_sorts_vocabulary_alphabetically() {
        let mut v = CountVectorizer::bounded(Some(10));
        v.fit(&docs(&["cat dog", "dog bird"]));
        assert_eq!(v.feature_names(), &["bird", "cat", "dog"]);
    }

    #[test]
    fn transform_counts_tokens_per_row() {
        let mut v = CountVectorizer::bounded(Some(10));
        let m = v.fit_transform(&docs(&["cat dog", "dog bird"])).unwrap();
        // columns: bird, cat, dog
        assert_eq!(m.to_dense(), vec![vec![0, 1, 1], vec![1, 0, 1]]);
    }

    #[test]
    fn token_pattern_rejects_digits_and_length_outliers() {
        let mut v = CountVectorizer::bounded(None);
        v.fit(&docs(&["ab cat c3po 12345 supercalifragilisticexpialidocious"]));
        assert_eq!(v.feature_names(), &["cat"]);
    }

    #[test]
    fn analysis_lowercases_before_matching() {
        let mut v = CountVectorizer::bounded(None);
        v.fit(&docs(&["Cat CAT cat"]));
        assert_eq!(v.feature_names(), &["cat"]);
        let m = v.transform(&docs(&["CaT"])).unwrap();
        assert_eq!(m.to_dense(), vec![vec![1]]);
    }

    #[test]
    fn stop_words_are_removed_in_bounded_mode() {
        let mut v = CountVectorizer::bounded(None);
        v.fit(&docs(&["the cat and the dog"]));
        assert_eq!(v.feature_names(), &["cat", "dog"]);
    }

    #[test]
    fn max_features_keeps_highest_count_terms() {
        let mut v = CountVectorizer::bounded(Some(2));
        v.fit(&docs(&["dog dog dog cat cat bird"]));
        // dog (3) and cat (2) survive; vocabulary stays alphabetical.
        assert_eq!(v.feature_names(), &["cat", "dog"]);
    }

    #[test]
    fn max_features_ties_break_alphabetically() {
        let mut v = CountVectorizer::bounded(Some(2));
        v.fit(&docs(&["zebra yak xerus"]));
        assert_eq!(v.feature_names(), &["xerus", "yak"]);
    }

    #[test]
    fn fixed_vocabulary_preserves_order_and_size() {
        let v = CountVectorizer::with_vocabulary(docs(&["dog", "cat", "bird"])).unwrap();
        assert_eq!(v.feature_names(), &["dog", "cat", "bird"]);
        let m = v.transform(&docs(&["cat dog fox"])).unwrap();
        assert_eq!(m.to_dense(), vec![vec![1, 1, 0]]);
    }

    #[test]
    fn fixed_vocabulary_rejects_duplicates() {
        assert!(CountVectorizer::with_vocabulary(docs(&["cat", "cat"])).is_err());
    }

    #[test]
    fn transform_before_fit_fails() {
        let v = CountVectorizer::bounded(None);
        assert!(v.transform(&docs(&["cat"])).is_err());
    }

    #[test]
    fn stop_words_do_not_apply_to_fixed_vocabularies() {
        let v = CountVectorizer::with_vocabulary(docs(&["the", "cat"])).unwrap();
        let m = v.transform(&docs(&["the cat"])).unwrap();
        assert_eq!(m.to_dense(), vec![vec![1, 1]]);
    }
}
