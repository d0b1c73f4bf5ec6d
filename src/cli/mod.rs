pub mod process;
pub mod query;
pub mod refit;
pub mod search;
pub mod stats;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

/// Merge `payload` (an object) into `{"success": true}`.
pub fn success(payload: Value) -> Value {
    let mut out = Map::new();
    out.insert("success".into(), Value::Bool(true));
    match payload {
        Value::Object(fields) => out.extend(fields),
        other => {
            out.insert("result".into(), other);
        }
    }
    Value::Object(out)
}

pub fn failure(err: &anyhow::Error) -> Value {
    json!({ "success": false, "error": format!("{err:#}") })
}

/// Parse a command's JSON argument; blank input means `{}`.
pub fn parse_params<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let raw = raw.trim();
    let raw = if raw.is_empty() { "{}" } else { raw };
    serde_json::from_str(raw).context("invalid JSON parameters")
}
