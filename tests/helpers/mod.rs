#![allow(dead_code)]

use std::path::{Path, PathBuf};

use argo_ingest::db;
use argo_ingest::embedding::{EmbeddingIndex, HashingVectorizer, TfidfVectorizer, Vectorizer};
use argo_ingest::pipeline::IngestionPipeline;

/// JULD for 2024-01-01T00:00:00Z.
pub const JULD_2024_01_01: f64 = 27028.0;

/// One cast in a synthetic ARGO file. Every cast in a file must have the
/// same number of levels.
#[derive(Debug, Clone)]
pub struct Cast {
    pub cycle: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub juld: f64,
    pub temperature: Vec<f64>,
    pub salinity: Vec<f64>,
    pub pressure: Vec<f64>,
}

impl Cast {
    /// A cast with the given `(temp, psal, pres)` levels on 2024-01-01.
    pub fn new(cycle: i32, latitude: f64, longitude: f64, levels: &[(f64, f64, f64)]) -> Self {
        Self {
            cycle,
            latitude,
            longitude,
            juld: JULD_2024_01_01,
            temperature: levels.iter().map(|l| l.0).collect(),
            salinity: levels.iter().map(|l| l.1).collect(),
            pressure: levels.iter().map(|l| l.2).collect(),
        }
    }

    pub fn on_day(mut self, days_after_2024_01_01: f64) -> Self {
        self.juld = JULD_2024_01_01 + days_after_2024_01_01;
        self
    }
}

/// Write an ARGO-shaped file: platform number as a global attribute,
/// `N_PROF × N_LEVELS` grids, one entry per cast in the per-profile variables.
pub fn write_argo_file_with(
    path: &Path,
    platform: &str,
    casts: &[Cast],
    options: netcdf::Options,
) -> Result<(), netcdf::Error> {
    let n_levels = casts.first().map_or(0, |c| c.temperature.len());
    let mut temperature = Vec::new();
    let mut salinity = Vec::new();
    let mut pressure = Vec::new();
    for c in casts {
        temperature.extend_from_slice(&c.temperature);
        salinity.extend_from_slice(&c.salinity);
        pressure.extend_from_slice(&c.pressure);
    }
    let latitude: Vec<f64> = casts.iter().map(|c| c.latitude).collect();
    let longitude: Vec<f64> = casts.iter().map(|c| c.longitude).collect();
    let juld: Vec<f64> = casts.iter().map(|c| c.juld).collect();
    let cycles: Vec<i32> = casts.iter().map(|c| c.cycle).collect();

    let mut file = netcdf::create_with(path, options)?;
    file.add_dimension("N_PROF", casts.len())?;
    file.add_dimension("N_LEVELS", n_levels)?;
    file.add_attribute("platform_number", platform)?;

    let dims = ["N_PROF", "N_LEVELS"];
    for name in ["TEMP", "PSAL", "PRES"] {
        file.add_variable::<f64>(name, &dims)?;
    }
    for name in ["LATITUDE", "LONGITUDE", "JULD"] {
        file.add_variable::<f64>(name, &["N_PROF"])?;
    }
    file.add_variable::<i32>("CYCLE_NUMBER", &["N_PROF"])?;
    // Classic files only accept data outside define mode.
    file.enddef()?;

    let columns = [
        ("TEMP", &temperature),
        ("PSAL", &salinity),
        ("PRES", &pressure),
        ("LATITUDE", &latitude),
        ("LONGITUDE", &longitude),
        ("JULD", &juld),
    ];
    for (name, values) in columns {
        if let Some(mut var) = file.variable_mut(name) {
            var.put_values(values, ..)?;
        }
    }
    if let Some(mut var) = file.variable_mut("CYCLE_NUMBER") {
        var.put_values(&cycles, ..)?;
    }
    Ok(())
}

/// Write a NetCDF-4 ARGO file to `dir/name` and return its path.
pub fn write_argo_file(dir: &Path, name: &str, platform: &str, casts: &[Cast]) -> PathBuf {
    let path = dir.join(name);
    write_argo_file_with(&path, platform, casts, netcdf::Options::NETCDF4).unwrap();
    path
}

/// Same as [`write_argo_file`] in the 64-bit-offset classic format.
pub fn write_classic_argo_file(dir: &Path, name: &str, platform: &str, casts: &[Cast]) -> PathBuf {
    let path = dir.join(name);
    write_argo_file_with(&path, platform, casts, netcdf::Options::_64BIT_OFFSET).unwrap();
    path
}

/// The end-to-end fixture: one cast at 45°N 100°W, three levels, the middle
/// temperature missing.
pub fn north_atlantic_cast() -> Cast {
    Cast::new(
        1,
        45.0,
        -100.0,
        &[(20.0, 35.0, 5.0), (f64::NAN, 34.9, 100.0), (4.0, 34.8, 500.0)],
    )
}

pub fn tfidf_pipeline() -> IngestionPipeline {
    let conn = db::open_memory_database().unwrap();
    IngestionPipeline::new(conn, EmbeddingIndex::new(Vectorizer::Tfidf(TfidfVectorizer::new(1000))))
}

pub fn hashing_pipeline() -> IngestionPipeline {
    let conn = db::open_memory_database().unwrap();
    IngestionPipeline::new(conn, EmbeddingIndex::new(Vectorizer::Hashing(HashingVectorizer::new(256))))
}

pub fn count_rows(conn: &rusqlite::Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .unwrap()
}
