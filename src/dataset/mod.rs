//! ARGO profile file decoding.
//!
//! [`decode_file`] opens a NetCDF file (classic or NetCDF-4), validates it into an
//! [`ArgoDataset`] (dimensions, shapes, fill-value masking, integral cycle
//! numbers), then flattens it into [`Measurement`]s and [`Profile`]s:
//!
//! - levels with any non-finite temperature, salinity or pressure are dropped
//! - casts with no valid level produce nothing
//! - unreadable JULD timestamps fall back to the current time

pub mod aggregate;
mod reader;
pub mod types;

use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use ndarray::{Array1, Array2};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ocean::{classify, pressure_to_depth};

pub use aggregate::{aggregate, summary_text};
pub use types::{DecodedFile, Measurement, ProcessingMetadata, Profile, ValueRange, QUALITY_GOOD};

/// Platform number used when the file carries none.
pub const UNKNOWN_PLATFORM: &str = "unknown";

/// Largest `N_PROF × N_LEVELS` grid a file may declare. Dimension lengths come
/// from the header, so they are checked before any variable is read.
pub const MAX_GRID_VALUES: usize = 1 << 24;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("netcdf error: {0}")]
    Netcdf(#[from] netcdf::Error),
    #[error("missing dimension {0}")]
    MissingDimension(&'static str),
    #[error("missing variable {0}")]
    MissingVariable(&'static str),
    #[error("variable {name} has unsupported type {found}")]
    UnsupportedType { name: &'static str, found: String },
    #[error("variable {name} has {found} values, expected {expected}")]
    Shape {
        name: &'static str,
        expected: usize,
        found: usize,
    },
    #[error(
        "declared grid of {n_prof} profiles by {n_levels} levels exceeds {limit} values",
        limit = MAX_GRID_VALUES
    )]
    GridTooLarge { n_prof: usize, n_levels: usize },
    #[error("profile {index}: cycle number {value} is not a finite integer")]
    InvalidCycle { index: usize, value: f64 },
}

/// Typed, validated contents of one ARGO profile file. Missing readings are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgoDataset {
    /// One entry per profile.
    pub platform_numbers: Vec<String>,
    pub cycle_numbers: Vec<i64>,
    pub latitude: Array1<f64>,
    pub longitude: Array1<f64>,
    /// Days since 1950-01-01T00:00:00Z.
    pub juld: Array1<f64>,
    /// `N_PROF × N_LEVELS`.
    pub temperature: Array2<f64>,
    pub salinity: Array2<f64>,
    pub pressure: Array2<f64>,
}

impl ArgoDataset {
    pub fn n_prof(&self) -> usize {
        self.cycle_numbers.len()
    }

    pub fn n_levels(&self) -> usize {
        self.temperature.ncols()
    }

    pub fn from_netcdf(file: &netcdf::File) -> Result<Self, DecodeError> {
        let n_prof = dimension_len(file, "N_PROF")?;
        let n_levels = dimension_len(file, "N_LEVELS")?;
        if n_prof
            .checked_mul(n_levels)
            .is_none_or(|cells| cells > MAX_GRID_VALUES)
        {
            return Err(DecodeError::GridTooLarge { n_prof, n_levels });
        }

        let temperature = read_matrix(file, "TEMP", n_prof, n_levels)?;
        let salinity = read_matrix(file, "PSAL", n_prof, n_levels)?;
        let pressure = read_matrix(file, "PRES", n_prof, n_levels)?;
        let latitude = read_vector(file, "LATITUDE", n_prof)?;
        let longitude = read_vector(file, "LONGITUDE", n_prof)?;
        let juld = read_vector(file, "JULD", n_prof)?;

        let cycle_numbers = read_vector(file, "CYCLE_NUMBER", n_prof)?
            .iter()
            .enumerate()
            .map(|(index, &value)| {
                if value.is_finite() && value.fract() == 0.0 {
                    Ok(value as i64)
                } else {
                    Err(DecodeError::InvalidCycle { index, value })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            platform_numbers: platform_numbers(file, n_prof),
            cycle_numbers,
            latitude,
            longitude,
            juld,
            temperature,
            salinity,
            pressure,
        })
    }
}

fn dimension_len(file: &netcdf::File, name: &'static str) -> Result<usize, DecodeError> {
    file.dimension(name)
        .map(|d| d.len())
        .ok_or(DecodeError::MissingDimension(name))
}

/// Look up a variable and check its declared size before reading anything.
fn sized_variable<'f>(
    file: &'f netcdf::File,
    name: &'static str,
    expected: usize,
) -> Result<netcdf::Variable<'f>, DecodeError> {
    let var = file
        .variable(name)
        .ok_or(DecodeError::MissingVariable(name))?;
    match reader::element_count(&var) {
        Some(found) if found == expected => Ok(var),
        found => Err(DecodeError::Shape {
            name,
            expected,
            found: found.unwrap_or(usize::MAX),
        }),
    }
}

fn read_vector(file: &netcdf::File, name: &'static str, len: usize) -> Result<Array1<f64>, DecodeError> {
    let var = sized_variable(file, name, len)?;
    Ok(Array1::from_vec(reader::read_masked(&var, name)?))
}

fn read_matrix(
    file: &netcdf::File,
    name: &'static str,
    rows: usize,
    cols: usize,
) -> Result<Array2<f64>, DecodeError> {
    let var = sized_variable(file, name, rows * cols)?;
    let values = reader::read_masked(&var, name)?;
    let found = values.len();
    Array2::from_shape_vec((rows, cols), values).map_err(|_| DecodeError::Shape {
        name,
        expected: rows * cols,
        found,
    })
}

/// Global `platform_number` attribute (text or numeric), else the per-profile
/// `PLATFORM_NUMBER` variable, else [`UNKNOWN_PLATFORM`].
fn platform_numbers(file: &netcdf::File, n_prof: usize) -> Vec<String> {
    let global = file
        .attribute("platform_number")
        .and_then(|a| a.value().ok())
        .and_then(|v| reader::text(&v).or_else(|| reader::first_f64(&v).map(format_numeric_platform)));
    if let Some(platform) = global.filter(|p| !p.is_empty()) {
        return vec![platform; n_prof];
    }

    let rows = file
        .variable("PLATFORM_NUMBER")
        .and_then(|var| reader::read_char_rows(&var));
    match rows {
        Some(rows) if rows.len() == n_prof => rows
            .into_iter()
            .map(|p| if p.is_empty() { UNKNOWN_PLATFORM.to_string() } else { p })
            .collect(),
        _ => vec![UNKNOWN_PLATFORM.to_string(); n_prof],
    }
}

fn format_numeric_platform(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Convert ARGO JULD (fractional days since 1950-01-01 UTC) to a timestamp with
/// microsecond resolution. `None` for non-finite or out-of-range input.
pub fn juld_to_datetime(days: f64) -> Option<DateTime<Utc>> {
    if !days.is_finite() {
        return None;
    }
    let micros = (days * 86_400_000_000.0).round();
    if micros.abs() >= i64::MAX as f64 {
        return None;
    }
    let epoch = Utc.with_ymd_and_hms(1950, 1, 1, 0, 0, 0).single()?;
    epoch.checked_add_signed(chrono::Duration::microseconds(micros as i64))
}

/// Flatten a validated dataset into measurements and per-cast profiles.
pub fn decode_dataset(dataset: &ArgoDataset, source_file: &str) -> DecodedFile {
    let mut decoded = DecodedFile::default();
    let total_levels = dataset.n_levels();

    for prof in 0..dataset.n_prof() {
        let platform = &dataset.platform_numbers[prof];
        let cycle = dataset.cycle_numbers[prof];
        let latitude = dataset.latitude[prof];
        let longitude = dataset.longitude[prof];
        let time = juld_to_datetime(dataset.juld[prof]).unwrap_or_else(|| {
            debug!(platform = %platform, cycle, juld = dataset.juld[prof], "unreadable JULD, using current time");
            Utc::now()
        });
        let region = classify(latitude, longitude);

        let levels = dataset
            .temperature
            .row(prof)
            .iter()
            .zip(dataset.salinity.row(prof).iter())
            .zip(dataset.pressure.row(prof).iter())
            .enumerate()
            .filter(|(_, ((t, s), p))| t.is_finite() && s.is_finite() && p.is_finite())
            .map(|(level_index, ((&temperature, &salinity), &pressure))| Measurement {
                id: Measurement::make_id(platform, cycle, level_index),
                platform_number: platform.clone(),
                cycle_number: cycle,
                level_index,
                measurement_time: time,
                latitude,
                longitude,
                temperature,
                salinity,
                pressure,
                depth: pressure_to_depth(pressure),
                quality_flag: QUALITY_GOOD.to_string(),
                ocean_region: region,
                source_file: source_file.to_string(),
            })
            .collect::<Vec<_>>();

        if let Some(profile) = aggregate(&levels, total_levels) {
            decoded.profiles.push(profile);
            decoded.measurements.extend(levels);
        }
    }
    decoded
}

/// Decode one file. Errors are typed so callers can record the failure kind.
pub fn decode_file(path: &Path) -> Result<DecodedFile, DecodeError> {
    let file = netcdf::open(path)?;
    let dataset = ArgoDataset::from_netcdf(&file)?;
    let decoded = decode_dataset(&dataset, &path.display().to_string());
    info!(
        file = %path.display(),
        measurements = decoded.measurements.len(),
        profiles = decoded.profiles.len(),
        "decoded ARGO file"
    );
    Ok(decoded)
}

/// Decode one file, logging any failure and returning an empty result instead.
pub fn decode_file_or_empty(path: &Path) -> DecodedFile {
    decode_file(path).unwrap_or_else(|e| {
        warn!(file = %path.display(), error = %e, "failed to decode ARGO file");
        DecodedFile::default()
    })
}
