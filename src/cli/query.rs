//! `query` command: filter stored measurements.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::{json, Value};

use argo_ingest::config::ArgoConfig;
use argo_ingest::db;
use argo_ingest::ocean::OceanRegion;
use argo_ingest::store::{self, parse_date, MeasurementFilter};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryParams {
    pub region: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub temperature_range: Option<[f64; 2]>,
    pub salinity_range: Option<[f64; 2]>,
}

impl QueryParams {
    pub fn into_filter(self) -> Result<MeasurementFilter> {
        let region = self
            .region
            .map(|r| r.parse::<OceanRegion>().map_err(|e| anyhow!(e)))
            .transpose()?;
        Ok(MeasurementFilter {
            region,
            start: self.start_date.as_deref().map(parse_date).transpose()?,
            end: self.end_date.as_deref().map(parse_date).transpose()?,
            temperature_range: self.temperature_range.map(|[lo, hi]| (lo, hi)),
            salinity_range: self.salinity_range.map(|[lo, hi]| (lo, hi)),
        })
    }
}

pub fn run(config: &ArgoConfig, raw_params: &str) -> Result<Value> {
    let filter = super::parse_params::<QueryParams>(raw_params)?.into_filter()?;
    let conn = db::open_database(config.resolved_db_path())?;
    let rows = store::query_measurements(&conn, &filter, config.ingest.query_limit)?;
    Ok(json!({ "count": rows.len(), "data": rows }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::parse_params;

    #[test]
    fn params_convert_to_filter() {
        let params: QueryParams = parse_params(
            r#"{"region": "Indian Ocean", "start_date": "2024-01-01",
                "temperature_range": [2.0, 8.5]}"#,
        )
        .unwrap();
        let filter = params.into_filter().unwrap();
        assert_eq!(filter.region, Some(OceanRegion::IndianOcean));
        assert_eq!(filter.start, Some(parse_date("2024-01-01").unwrap()));
        assert_eq!(filter.end, None);
        assert_eq!(filter.temperature_range, Some((2.0, 8.5)));
        assert_eq!(filter.salinity_range, None);
    }

    #[test]
    fn bad_region_and_date_are_errors() {
        let params: QueryParams = parse_params(r#"{"region": "Lake Erie"}"#).unwrap();
        assert!(params.into_filter().is_err());
        let params: QueryParams = parse_params(r#"{"end_date": "yesterday"}"#).unwrap();
        assert!(params.into_filter().is_err());
        assert!(parse_params::<QueryParams>(r#"{"depth": 3}"#).is_err());
    }

    #[test]
    fn run_against_empty_store() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = ArgoConfig::default();
        config.storage.db_path = tmp.path().join("argo.db").to_string_lossy().into_owned();

        let out = run(&config, "").unwrap();
        assert_eq!(out, json!({ "count": 0, "data": [] }));
    }
}
