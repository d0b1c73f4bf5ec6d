//! Write path: idempotent upsert of decoded measurements and profiles.
//!
//! [`upsert_file`] writes one file's rows inside a single transaction; any
//! failure rolls the whole file back. Rows are keyed by their synthesized
//! ids, so re-ingesting a file overwrites instead of duplicating. The first
//! insert's `created_at` is kept and a profile's stored embedding survives a
//! re-upsert that carries none.

pub mod query;
pub mod stats;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Transaction};

use crate::dataset::{Measurement, Profile};

pub use query::{parse_date, query_measurements, MeasurementFilter, MeasurementRow};
pub use stats::{store_stats, DateRange, RegionCount, StoreStats};

/// Fixed-width UTC timestamp so stored times sort and compare as text.
pub fn format_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Upsert all rows decoded from one file in one transaction.
pub fn upsert_file(
    conn: &mut Connection,
    measurements: &[Measurement],
    profiles: &[Profile],
) -> Result<()> {
    let tx = conn.transaction()?;
    let now = format_time(&Utc::now());

    for m in measurements {
        upsert_measurement(&tx, m, &now)
            .with_context(|| format!("failed to upsert measurement {}", m.id))?;
    }
    for p in profiles {
        upsert_profile(&tx, p, &now).with_context(|| format!("failed to upsert profile {}", p.id))?;
    }

    tx.commit()?;
    tracing::debug!(
        measurements = measurements.len(),
        profiles = profiles.len(),
        "file rows committed"
    );
    Ok(())
}

fn upsert_measurement(tx: &Transaction, m: &Measurement, now: &str) -> Result<()> {
    tx.execute(
        "INSERT INTO measurements (id, platform_number, cycle_number, level_index, latitude, longitude, \
         measurement_time, temperature, salinity, pressure, depth, quality_flag, ocean_region, source_file, \
         created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15) \
         ON CONFLICT(id) DO UPDATE SET \
         platform_number = excluded.platform_number, cycle_number = excluded.cycle_number, \
         level_index = excluded.level_index, latitude = excluded.latitude, longitude = excluded.longitude, \
         measurement_time = excluded.measurement_time, temperature = excluded.temperature, \
         salinity = excluded.salinity, pressure = excluded.pressure, depth = excluded.depth, \
         quality_flag = excluded.quality_flag, ocean_region = excluded.ocean_region, \
         source_file = excluded.source_file, updated_at = excluded.updated_at",
        params![
            m.id,
            m.platform_number,
            m.cycle_number,
            m.level_index as i64,
            m.latitude,
            m.longitude,
            format_time(&m.measurement_time),
            m.temperature,
            m.salinity,
            m.pressure,
            m.depth,
            m.quality_flag,
            m.ocean_region.as_str(),
            m.source_file,
            now,
        ],
    )?;
    Ok(())
}

fn upsert_profile(tx: &Transaction, p: &Profile, now: &str) -> Result<()> {
    let embedding = p
        .vector_embedding
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    tx.execute(
        "INSERT INTO profiles (id, platform_number, cycle_number, profile_date, latitude, longitude, \
         max_depth, measurement_count, temperature_range, salinity_range, pressure_range, ocean_region, \
         data_quality_score, summary_text, vector_embedding, source_file, processing_metadata, \
         created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?18) \
         ON CONFLICT(id) DO UPDATE SET \
         platform_number = excluded.platform_number, cycle_number = excluded.cycle_number, \
         profile_date = excluded.profile_date, latitude = excluded.latitude, longitude = excluded.longitude, \
         max_depth = excluded.max_depth, measurement_count = excluded.measurement_count, \
         temperature_range = excluded.temperature_range, salinity_range = excluded.salinity_range, \
         pressure_range = excluded.pressure_range, ocean_region = excluded.ocean_region, \
         data_quality_score = excluded.data_quality_score, summary_text = excluded.summary_text, \
         vector_embedding = COALESCE(excluded.vector_embedding, profiles.vector_embedding), \
         source_file = excluded.source_file, processing_metadata = excluded.processing_metadata, \
         updated_at = excluded.updated_at",
        params![
            p.id,
            p.platform_number,
            p.cycle_number,
            format_time(&p.profile_date),
            p.latitude,
            p.longitude,
            p.max_depth,
            p.measurement_count as i64,
            serde_json::to_string(&p.temperature_range)?,
            serde_json::to_string(&p.salinity_range)?,
            serde_json::to_string(&p.pressure_range)?,
            p.ocean_region.as_str(),
            p.data_quality_score,
            p.summary_text,
            embedding,
            p.source_file,
            serde_json::to_string(&p.processing_metadata)?,
            now,
        ],
    )?;
    Ok(())
}

/// Store a profile's embedding as a JSON array. Returns `false` if no such profile exists.
pub fn set_profile_embedding(conn: &Connection, profile_id: &str, vector: &[f32]) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE profiles SET vector_embedding = ?1, updated_at = ?2 WHERE id = ?3",
        params![
            serde_json::to_string(vector)?,
            format_time(&Utc::now()),
            profile_id
        ],
    )?;
    Ok(updated > 0)
}

/// Store several profiles' embeddings in one transaction. Every id must
/// already have a row; otherwise nothing is written.
pub fn set_profile_embeddings<'a>(
    conn: &mut Connection,
    vectors: impl IntoIterator<Item = (&'a str, &'a [f32])>,
) -> Result<usize> {
    let tx = conn.transaction()?;
    let mut written = 0;
    for (profile_id, vector) in vectors {
        let found = set_profile_embedding(&tx, profile_id, vector)
            .with_context(|| format!("failed to store embedding for profile {profile_id}"))?;
        if !found {
            anyhow::bail!("profile {profile_id} has no stored row");
        }
        written += 1;
    }
    tx.commit().context("failed to commit embeddings")?;
    Ok(written)
}

/// Read back a profile's stored embedding, if any.
pub fn profile_embedding(conn: &Connection, profile_id: &str) -> Result<Option<Vec<f32>>> {
    use rusqlite::OptionalExtension;

    let raw: Option<Option<String>> = conn
        .query_row(
            "SELECT vector_embedding FROM profiles WHERE id = ?1",
            params![profile_id],
            |row| row.get(0),
        )
        .optional()?;
    raw.flatten()
        .map(|s| serde_json::from_str(&s).context("corrupt stored embedding"))
        .transpose()
}
