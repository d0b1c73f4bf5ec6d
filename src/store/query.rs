use anyhow::{bail, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use serde::Serialize;

use super::format_time;
use crate::ocean::OceanRegion;

/// Conjunctive filter over stored measurements. Absent fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementFilter {
    /// `Some(OceanRegion::Unknown)` is treated as no region filter.
    pub region: Option<OceanRegion>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Inclusive `(min, max)` in °C.
    pub temperature_range: Option<(f64, f64)>,
    /// Inclusive `(min, max)` in PSU.
    pub salinity_range: Option<(f64, f64)>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MeasurementRow {
    pub time: String,
    pub latitude: f64,
    pub longitude: f64,
    pub temperature: f64,
    pub salinity: f64,
    pub depth: f64,
    pub platform_number: String,
    pub ocean_region: String,
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(t) = d.and_hms_opt(0, 0, 0) {
            return Ok(t.and_utc());
        }
    }
    bail!("invalid date '{s}': expected YYYY-MM-DD or RFC 3339")
}

/// Return up to `limit` measurements matching `filter`, oldest first.
pub fn query_measurements(
    conn: &Connection,
    filter: &MeasurementFilter,
    limit: usize,
) -> Result<Vec<MeasurementRow>> {
    let mut clauses: Vec<&str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(region) = filter.region.filter(|r| *r != OceanRegion::Unknown) {
        clauses.push("ocean_region = ?");
        values.push(Value::Text(region.as_str().to_string()));
    }
    if let Some(start) = &filter.start {
        clauses.push("measurement_time >= ?");
        values.push(Value::Text(format_time(start)));
    }
    if let Some(end) = &filter.end {
        clauses.push("measurement_time <= ?");
        values.push(Value::Text(format_time(end)));
    }
    if let Some((min, max)) = filter.temperature_range {
        clauses.push("temperature >= ? AND temperature <= ?");
        values.push(Value::Real(min));
        values.push(Value::Real(max));
    }
    if let Some((min, max)) = filter.salinity_range {
        clauses.push("salinity >= ? AND salinity <= ?");
        values.push(Value::Real(min));
        values.push(Value::Real(max));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    values.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));

    let sql = format!(
        "SELECT measurement_time, latitude, longitude, temperature, salinity, depth, \
         platform_number, ocean_region \
         FROM measurements {where_clause} \
         ORDER BY measurement_time, id LIMIT ?"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(values), |row| {
            Ok(MeasurementRow {
                time: row.get(0)?,
                latitude: row.get(1)?,
                longitude: row.get(2)?,
                temperature: row.get(3)?,
                salinity: row.get(4)?,
                depth: row.get(5)?,
                platform_number: row.get(6)?,
                ocean_region: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(count = rows.len(), "measurement query");
    Ok(rows)
}
