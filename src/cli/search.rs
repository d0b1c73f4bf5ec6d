//! `semantic-search` command: rank indexed profiles against free text.

use anyhow::Result;
use serde::Deserialize;
use serde_json::{json, Value};

use argo_ingest::config::ArgoConfig;
use argo_ingest::pipeline::IngestionPipeline;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchParams {
    pub query: String,
    /// Falls back to `ingest.default_top_k`.
    pub top_k: Option<usize>,
}

pub fn run(config: &ArgoConfig, raw_params: &str) -> Result<Value> {
    let params: SearchParams = super::parse_params(raw_params)?;
    let top_k = params.top_k.unwrap_or(config.ingest.default_top_k);

    let mut pipeline = IngestionPipeline::from_config(config)?;
    let results = pipeline.semantic_search(&params.query, top_k);
    tracing::debug!(query = %params.query, top_k, hits = results.len(), "semantic search");

    Ok(json!({ "query": params.query, "results": results }))
}
