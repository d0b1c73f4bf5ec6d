//! In-memory profile embedding table with whole-file JSON persistence.
//!
//! Entries keep insertion order; re-indexing an id overwrites it in place.
//! Queries are a linear cosine scan with a stable descending sort, so ties
//! rank by insertion order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{cosine_similarity, EmbeddingError, TextVectorizer, Vectorizer};
use crate::dataset::{Profile, ValueRange};
use crate::ocean::OceanRegion;

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("index io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("index serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported index format version {0}")]
    Version(u32),
}

/// Profile metadata stored alongside each vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub platform_number: String,
    pub ocean_region: OceanRegion,
    pub latitude: f64,
    pub longitude: f64,
    pub profile_date: DateTime<Utc>,
    pub temperature_range: ValueRange,
    pub salinity_range: ValueRange,
}

impl From<&Profile> for ProfileSnapshot {
    fn from(p: &Profile) -> Self {
        Self {
            platform_number: p.platform_number.clone(),
            ocean_region: p.ocean_region,
            latitude: p.latitude,
            longitude: p.longitude,
            profile_date: p.profile_date,
            temperature_range: p.temperature_range,
            salinity_range: p.salinity_range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct IndexEntry {
    profile_id: String,
    vector: Vec<f32>,
    metadata: ProfileSnapshot,
    text: String,
}

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarProfile {
    pub profile_id: String,
    pub similarity: f64,
    pub metadata: ProfileSnapshot,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingIndex {
    version: u32,
    vectorizer: Vectorizer,
    entries: Vec<IndexEntry>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl EmbeddingIndex {
    pub fn new(vectorizer: Vectorizer) -> Self {
        Self {
            version: FORMAT_VERSION,
            vectorizer,
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn vectorizer(&self) -> &Vectorizer {
        &self.vectorizer
    }

    /// Ids in insertion order.
    pub fn profile_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.profile_id.as_str())
    }

    pub fn vector(&self, profile_id: &str) -> Option<&[f32]> {
        self.positions
            .get(profile_id)
            .map(|&i| self.entries[i].vector.as_slice())
    }

    fn zero_vector(&self) -> Vec<f32> {
        vec![0.0; self.vectorizer.dimensions()]
    }

    /// Vectorize `text`, fitting the vectorizer on it first if it has never
    /// been fitted. Never fails: any error yields a zero vector.
    pub fn embed(&mut self, text: &str) -> Vec<f32> {
        if !self.vectorizer.is_fitted() {
            match self.vectorizer.fit(&[text]) {
                Ok(()) => debug!(strategy = self.vectorizer.strategy(), "vectorizer fitted"),
                Err(e) => {
                    warn!(error = %e, "failed to fit vectorizer, using zero vector");
                    return self.zero_vector();
                }
            }
        }
        self.vectorizer.transform(text).unwrap_or_else(|e| {
            warn!(error = %e, "failed to embed text, using zero vector");
            self.zero_vector()
        })
    }

    /// Embed and store a profile summary, replacing any previous entry for the
    /// same id in place. Returns the stored vector.
    pub fn index(&mut self, profile_id: &str, text: &str, metadata: ProfileSnapshot) -> Vec<f32> {
        let vector = self.embed(text);
        self.insert(profile_id, text, metadata, vector.clone());
        vector
    }

    /// Store an already computed vector, replacing any previous entry for the
    /// same id in place.
    pub fn insert(&mut self, profile_id: &str, text: &str, metadata: ProfileSnapshot, vector: Vec<f32>) {
        let entry = IndexEntry {
            profile_id: profile_id.to_string(),
            vector,
            metadata,
            text: text.to_string(),
        };
        match self.positions.get(profile_id) {
            Some(&i) => self.entries[i] = entry,
            None => {
                self.positions.insert(profile_id.to_string(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    /// Rank stored entries by cosine similarity to `text`, best first.
    pub fn query(&mut self, text: &str, top_k: usize) -> Vec<SimilarProfile> {
        if self.entries.is_empty() {
            return Vec::new();
        }
        let query = self.embed(text);
        let mut scored: Vec<(usize, f64)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(&query, &e.vector)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
            .into_iter()
            .take(top_k)
            .map(|(i, similarity)| {
                let e = &self.entries[i];
                SimilarProfile {
                    profile_id: e.profile_id.clone(),
                    similarity,
                    metadata: e.metadata.clone(),
                    text: e.text.clone(),
                }
            })
            .collect()
    }

    /// Refit the vectorizer on every stored text and recompute all vectors.
    /// Returns the number of entries re-embedded.
    pub fn refit(&mut self) -> Result<usize, EmbeddingError> {
        if self.entries.is_empty() {
            return Ok(0);
        }
        let texts: Vec<&str> = self.entries.iter().map(|e| e.text.as_str()).collect();
        self.vectorizer.fit(&texts)?;
        for i in 0..self.entries.len() {
            let vector = self.vectorizer.transform(&self.entries[i].text)?;
            self.entries[i].vector = vector;
        }
        info!(entries = self.entries.len(), "embedding index refitted");
        Ok(self.entries.len())
    }

    /// Write the whole table atomically (temp file, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), IndexError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = temp_path(path);
        std::fs::write(&tmp, serde_json::to_vec(self)?)?;
        std::fs::rename(&tmp, path)?;
        info!(path = %path.display(), entries = self.entries.len(), "embedding index saved");
        Ok(())
    }

    /// Load a saved table. A missing file yields an empty index using
    /// `default_vectorizer`. A saved index keeps its own vectorizer, since its
    /// vectors were produced by it.
    pub fn load(path: impl AsRef<Path>, default_vectorizer: Vectorizer) -> Result<Self, IndexError> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "no embedding index found, starting empty");
            return Ok(Self::new(default_vectorizer));
        }
        let mut index: Self = serde_json::from_slice(&std::fs::read(path)?)?;
        if index.version != FORMAT_VERSION {
            return Err(IndexError::Version(index.version));
        }
        if index.vectorizer.strategy() != default_vectorizer.strategy()
            || index.vectorizer.dimensions() != default_vectorizer.dimensions()
        {
            warn!(
                saved = index.vectorizer.strategy(),
                configured = default_vectorizer.strategy(),
                "saved index uses a different vectorizer than configured; keeping the saved one"
            );
        }
        index.positions = index
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.profile_id.clone(), i))
            .collect();
        info!(path = %path.display(), entries = index.entries.len(), "embedding index loaded");
        Ok(index)
    }
}

/// Sibling of `path` with `.tmp` appended to the full file name.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
