//! `process-directory` command: ingest every matching file in a directory.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{json, Value};

use argo_ingest::config::ArgoConfig;
use argo_ingest::pipeline::{DirectoryReport, IngestionPipeline};

pub async fn run(config: ArgoConfig, dir: PathBuf) -> Result<Value> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping after the current file");
            flag.store(true, Ordering::Relaxed);
        }
    });

    let display_dir = dir.display().to_string();
    let report = tokio::task::spawn_blocking(move || ingest(&config, &dir, cancel))
        .await
        .context("ingestion task panicked")??;
    interrupt.abort();

    let message = if report.cancelled {
        format!("Cancelled after {} file(s) in {display_dir}", report.files_seen)
    } else {
        format!(
            "Processed {} file(s) in {display_dir}: {} ingested, {} empty, {} failed",
            report.files_seen, report.files_ingested, report.files_empty, report.files_failed
        )
    };
    Ok(json!({ "message": message, "report": report }))
}

fn ingest(config: &ArgoConfig, dir: &std::path::Path, cancel: Arc<AtomicBool>) -> Result<DirectoryReport> {
    let mut pipeline = IngestionPipeline::from_config(config)?.with_cancel_flag(cancel);

    let total = pipeline.list_files(dir)?.len();
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );

    let report = pipeline.process_directory_with(dir, |path, _| {
        if let Some(name) = path.file_name() {
            pb.set_message(name.to_string_lossy().into_owned());
        }
        pb.inc(1);
    })?;
    pb.finish_and_clear();

    let index_path = config.resolved_index_path();
    pipeline
        .index()
        .save(&index_path)
        .with_context(|| format!("failed to save embedding index {}", index_path.display()))?;
    Ok(report)
}
