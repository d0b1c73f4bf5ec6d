//! FNV-1a feature-hashing vectorizer: no fitted state, stable across corpora.

use serde::{Deserialize, Serialize};

use super::{l2_normalize, tokenize, EmbeddingError, TextVectorizer};

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x00000100000001B3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashingVectorizer {
    dimensions: usize,
}

impl HashingVectorizer {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

impl TextVectorizer for HashingVectorizer {
    fn fit(&mut self, _texts: &[&str]) -> Result<(), EmbeddingError> {
        Ok(())
    }

    fn is_fitted(&self) -> bool {
        true
    }

    fn transform(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0f32; self.dimensions];
        if self.dimensions == 0 {
            return Ok(vector);
        }
        for token in tokenize(text) {
            let h = fnv1a(token.as_bytes());
            let bucket = (h % self.dimensions as u64) as usize;
            let sign = if (h >> 32) & 1 == 0 { 1.0f32 } else { -1.0f32 };
            vector[bucket] += sign;
        }
        l2_normalize(&mut vector);
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
