//! Directory ingestion: decode → upsert → index, one file at a time.
//!
//! The pipeline owns the store connection and the embedding index. A failing
//! file is logged and recorded in the [`DirectoryReport`]; the run always
//! moves on to the next file.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use rusqlite::Connection;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ArgoConfig;
use crate::dataset::{decode_file, DecodeError};
use crate::db;
use crate::embedding::{create_vectorizer, EmbeddingIndex, ProfileSnapshot, SimilarProfile};
use crate::store::{self, MeasurementFilter, MeasurementRow, StoreStats};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("failed to list {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a single file was not ingested.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("store failed: {0:#}")]
    Store(anyhow::Error),
    #[error("embedding write-back failed: {0:#}")]
    Index(anyhow::Error),
}

impl FileError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::Store(_) => "store",
            Self::Index(_) => "index",
        }
    }
}

#[derive(Debug)]
pub enum FileOutcome {
    Ingested { measurements: usize, profiles: usize },
    /// Decoded cleanly but held no valid levels.
    Empty,
    Failed(FileError),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FileFailure {
    pub file: String,
    pub kind: &'static str,
    pub error: String,
}

/// Per-directory totals, folded from each file's [`FileOutcome`].
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DirectoryReport {
    pub files_seen: usize,
    pub files_ingested: usize,
    pub files_empty: usize,
    pub files_failed: usize,
    pub measurements: usize,
    pub profiles: usize,
    pub cancelled: bool,
    pub failures: Vec<FileFailure>,
}

impl DirectoryReport {
    pub fn record(&mut self, path: &Path, outcome: &FileOutcome) {
        self.files_seen += 1;
        match outcome {
            FileOutcome::Ingested {
                measurements,
                profiles,
            } => {
                self.files_ingested += 1;
                self.measurements += measurements;
                self.profiles += profiles;
            }
            FileOutcome::Empty => self.files_empty += 1,
            FileOutcome::Failed(e) => {
                self.files_failed += 1;
                self.failures.push(FileFailure {
                    file: path.display().to_string(),
                    kind: e.kind(),
                    error: e.to_string(),
                });
            }
        }
    }
}

pub struct IngestionPipeline {
    conn: Connection,
    index: EmbeddingIndex,
    extension: String,
    query_limit: usize,
    cancel: Option<Arc<AtomicBool>>,
}

impl IngestionPipeline {
    pub fn new(conn: Connection, index: EmbeddingIndex) -> Self {
        Self {
            conn,
            index,
            extension: "nc".into(),
            query_limit: 1000,
            cancel: None,
        }
    }

    /// Open the configured database and load (or start) the persisted index.
    pub fn from_config(config: &ArgoConfig) -> anyhow::Result<Self> {
        let conn = db::open_database(config.resolved_db_path())?;
        let vectorizer = create_vectorizer(&config.embedding)?;
        let index_path = config.resolved_index_path();
        let index = EmbeddingIndex::load(&index_path, vectorizer)
            .with_context(|| format!("failed to load embedding index {}", index_path.display()))?;

        Ok(Self::new(conn, index)
            .with_extension(&config.ingest.file_extension)
            .with_query_limit(config.ingest.query_limit))
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn with_query_limit(mut self, limit: usize) -> Self {
        self.query_limit = limit;
        self
    }

    /// Checked between files; setting it stops the run before the next file.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }

    pub fn into_index(self) -> EmbeddingIndex {
        self.index
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Matching files directly inside `dir`, sorted by name.
    pub fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
        if !dir.is_dir() {
            return Err(PipelineError::DirectoryNotFound(dir.to_path_buf()));
        }
        let io_err = |source: std::io::Error| PipelineError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            let matches = path
                .extension()
                .is_some_and(|ext| ext == self.extension.as_str());
            if matches && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn process_directory(&mut self, dir: &Path) -> Result<DirectoryReport, PipelineError> {
        self.process_directory_with(dir, |_, _| {})
    }

    /// Like [`process_directory`](Self::process_directory), calling `on_file`
    /// after each file.
    pub fn process_directory_with<F>(
        &mut self,
        dir: &Path,
        mut on_file: F,
    ) -> Result<DirectoryReport, PipelineError>
    where
        F: FnMut(&Path, &FileOutcome),
    {
        let files = self.list_files(dir)?;
        info!(dir = %dir.display(), files = files.len(), extension = %self.extension, "processing directory");

        let mut report = DirectoryReport::default();
        for path in &files {
            if self.is_cancelled() {
                warn!(processed = report.files_seen, remaining = files.len() - report.files_seen, "run cancelled");
                report.cancelled = true;
                break;
            }
            let outcome = self.process_file(path);
            report.record(path, &outcome);
            on_file(path, &outcome);
        }

        info!(
            ingested = report.files_ingested,
            empty = report.files_empty,
            failed = report.files_failed,
            measurements = report.measurements,
            profiles = report.profiles,
            "directory processed"
        );
        Ok(report)
    }

    /// Decode, store, and index one file.
    pub fn process_file(&mut self, path: &Path) -> FileOutcome {
        match self.try_process_file(path) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(file = %path.display(), kind = e.kind(), error = %e, "file not ingested");
                FileOutcome::Failed(e)
            }
        }
    }

    fn try_process_file(&mut self, path: &Path) -> Result<FileOutcome, FileError> {
        let decoded = decode_file(path)?;
        if decoded.measurements.is_empty() {
            info!(file = %path.display(), "no valid measurements");
            return Ok(FileOutcome::Empty);
        }

        store::upsert_file(&mut self.conn, &decoded.measurements, &decoded.profiles)
            .map_err(FileError::Store)?;

        // Vectors are written back in one transaction before the index
        // changes, so a failed write-back leaves neither side half-updated.
        let vectors: Vec<Vec<f32>> = decoded
            .profiles
            .iter()
            .map(|profile| self.index.embed(&profile.summary_text))
            .collect();
        store::set_profile_embeddings(
            &mut self.conn,
            decoded
                .profiles
                .iter()
                .zip(&vectors)
                .map(|(profile, vector)| (profile.id.as_str(), vector.as_slice())),
        )
        .map_err(FileError::Index)?;

        for (profile, vector) in decoded.profiles.iter().zip(vectors) {
            self.index.insert(
                &profile.id,
                &profile.summary_text,
                ProfileSnapshot::from(profile),
                vector,
            );
        }

        Ok(FileOutcome::Ingested {
            measurements: decoded.measurements.len(),
            profiles: decoded.profiles.len(),
        })
    }

    pub fn query_measurements(&self, filter: &MeasurementFilter) -> anyhow::Result<Vec<MeasurementRow>> {
        store::query_measurements(&self.conn, filter, self.query_limit)
    }

    pub fn semantic_search(&mut self, text: &str, top_k: usize) -> Vec<SimilarProfile> {
        self.index.query(text, top_k)
    }

    pub fn stats(&self) -> anyhow::Result<StoreStats> {
        store::store_stats(&self.conn)
    }

    /// Refit the vectorizer on every indexed summary and write the new
    /// vectors back to their profile rows.
    pub fn refit(&mut self) -> anyhow::Result<usize> {
        let count = self.index.refit().context("failed to refit vectorizer")?;

        let tx = self.conn.transaction()?;
        for id in self.index.profile_ids() {
            if let Some(vector) = self.index.vector(id) {
                if !store::set_profile_embedding(&tx, id, vector)? {
                    warn!(profile_id = id, "indexed profile has no stored row");
                }
            }
        }
        tx.commit()?;
        Ok(count)
    }
}
