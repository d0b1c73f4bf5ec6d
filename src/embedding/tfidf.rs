//! TF-IDF vectorizer with a vocabulary learned at fit time.
//!
//! Vocabulary: at most `dimensions` terms, most frequent first with ties
//! broken alphabetically, then indexed in alphabetical order. Weights are raw
//! term counts times smoothed idf `ln((1 + n) / (1 + df)) + 1`, L2-normalized,
//! and zero-padded to `dimensions`.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{l2_normalize, tokenize, EmbeddingError, TextVectorizer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    dimensions: usize,
    /// term → column, alphabetical. Empty until fitted.
    vocabulary: BTreeMap<String, usize>,
    /// idf weight per column.
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            vocabulary: BTreeMap::new(),
            idf: Vec::new(),
        }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.vocabulary.contains_key(term)
    }
}

impl TextVectorizer for TfidfVectorizer {
    fn fit(&mut self, texts: &[&str]) -> Result<(), EmbeddingError> {
        let mut term_counts: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for text in texts {
            let tokens = tokenize(text);
            let unique: HashSet<&String> = tokens.iter().collect();
            for term in unique {
                *doc_freq.entry(term.clone()).or_default() += 1;
            }
            for term in tokens {
                *term_counts.entry(term).or_default() += 1;
            }
        }
        if term_counts.is_empty() {
            return Err(EmbeddingError::EmptyVocabulary);
        }

        let mut ranked: Vec<(String, usize)> = term_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.dimensions);

        let mut terms: Vec<String> = ranked.into_iter().map(|(t, _)| t).collect();
        terms.sort();

        let n = texts.len() as f64;
        self.idf = terms
            .iter()
            .map(|t| {
                let df = doc_freq.get(t).copied().unwrap_or(0) as f64;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        self.vocabulary = terms.into_iter().enumerate().map(|(i, t)| (t, i)).collect();
        Ok(())
    }

    fn is_fitted(&self) -> bool {
        !self.vocabulary.is_empty()
    }

    fn transform(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if !self.is_fitted() {
            return Err(EmbeddingError::NotFitted);
        }
        let mut counts = vec![0usize; self.vocabulary.len()];
        for token in tokenize(text) {
            if let Some(&col) = self.vocabulary.get(&token) {
                counts[col] += 1;
            }
        }
        let mut vector = vec![0.0f32; self.dimensions];
        for (col, &count) in counts.iter().enumerate() {
            if count > 0 {
                vector[col] = (count as f64 * self.idf[col]) as f32;
            }
        }
        l2_normalize(&mut vector);
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
