use anyhow::Result;
use serde_json::Value;

use argo_ingest::config::ArgoConfig;

/// Summary counts of the configured store.
pub fn run(config: &ArgoConfig) -> Result<Value> {
    let conn = argo_ingest::db::open_database(config.resolved_db_path())?;
    let stats = argo_ingest::store::store_stats(&conn)?;
    Ok(serde_json::to_value(stats)?)
}
