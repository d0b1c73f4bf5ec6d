//! `refit` command: rebuild the vocabulary from every indexed summary.

use anyhow::{Context, Result};
use serde_json::{json, Value};

use argo_ingest::config::ArgoConfig;
use argo_ingest::pipeline::IngestionPipeline;

pub fn run(config: &ArgoConfig) -> Result<Value> {
    let mut pipeline = IngestionPipeline::from_config(config)?;
    let refitted = pipeline.refit()?;

    let index_path = config.resolved_index_path();
    pipeline
        .index()
        .save(&index_path)
        .with_context(|| format!("failed to save embedding index {}", index_path.display()))?;

    Ok(json!({ "refitted": refitted }))
}
