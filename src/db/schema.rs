//! SQL DDL for the measurement and profile tables.
//!
//! Defines `measurements` (one row per valid depth level), `profiles` (one row
//! per cast, with JSON range columns and the serialized embedding), and
//! `schema_meta`. All DDL uses `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

pub const SCHEMA_VERSION: &str = "1";

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS measurements (
    id TEXT PRIMARY KEY,
    platform_number TEXT NOT NULL,
    cycle_number INTEGER NOT NULL,
    level_index INTEGER NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    measurement_time TEXT NOT NULL,
    temperature REAL NOT NULL,
    salinity REAL NOT NULL,
    pressure REAL NOT NULL,
    depth REAL NOT NULL,
    quality_flag TEXT NOT NULL,
    ocean_region TEXT NOT NULL,
    source_file TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(platform_number, cycle_number, level_index)
);

CREATE INDEX IF NOT EXISTS idx_measurements_location ON measurements(latitude, longitude);
CREATE INDEX IF NOT EXISTS idx_measurements_time_location ON measurements(measurement_time, latitude, longitude);
CREATE INDEX IF NOT EXISTS idx_measurements_region ON measurements(ocean_region);
CREATE INDEX IF NOT EXISTS idx_measurements_platform ON measurements(platform_number);

CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    platform_number TEXT NOT NULL,
    cycle_number INTEGER NOT NULL,
    profile_date TEXT NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    max_depth REAL NOT NULL,
    measurement_count INTEGER NOT NULL,
    temperature_range TEXT NOT NULL,
    salinity_range TEXT NOT NULL,
    pressure_range TEXT NOT NULL,
    ocean_region TEXT NOT NULL,
    data_quality_score REAL NOT NULL CHECK(data_quality_score >= 0.0 AND data_quality_score <= 1.0),
    summary_text TEXT NOT NULL,
    vector_embedding TEXT,
    source_file TEXT NOT NULL,
    processing_metadata TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(platform_number, cycle_number)
);

CREATE INDEX IF NOT EXISTS idx_profiles_location_date ON profiles(latitude, longitude, profile_date);
CREATE INDEX IF NOT EXISTS idx_profiles_region ON profiles(ocean_region);
CREATE INDEX IF NOT EXISTS idx_profiles_platform ON profiles(platform_number);

CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION],
    )?;
    Ok(())
}
