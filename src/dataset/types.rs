//! Flat records produced by decoding: one [`Measurement`] per valid depth level
//! and one [`Profile`] summary per cast.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ocean::OceanRegion;

/// Quality flag carried by every stored measurement. Invalid levels are
/// dropped, so no other value is ever produced.
pub const QUALITY_GOOD: &str = "good";

/// One depth-level reading within a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// `"{platform_number}_{cycle_number}_{level_index}"`.
    pub id: String,
    pub platform_number: String,
    pub cycle_number: i64,
    pub level_index: usize,
    pub measurement_time: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    /// Degrees Celsius.
    pub temperature: f64,
    /// PSU.
    pub salinity: f64,
    /// Decibar.
    pub pressure: f64,
    /// Meters, derived from pressure.
    pub depth: f64,
    pub quality_flag: String,
    pub ocean_region: OceanRegion,
    pub source_file: String,
}

impl Measurement {
    pub fn make_id(platform_number: &str, cycle_number: i64, level_index: usize) -> String {
        format!("{platform_number}_{cycle_number}_{level_index}")
    }
}

/// min / max / mean over one variable's valid levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    pub processed_at: DateTime<Utc>,
    pub total_levels: usize,
    pub valid_levels: usize,
}

/// Summary of one vertical cast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// `"{platform_number}_{cycle_number}"`.
    pub id: String,
    pub platform_number: String,
    pub cycle_number: i64,
    pub profile_date: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub max_depth: f64,
    pub measurement_count: usize,
    pub temperature_range: ValueRange,
    pub salinity_range: ValueRange,
    pub pressure_range: ValueRange,
    pub ocean_region: OceanRegion,
    /// `valid_levels / total_levels`, in `[0, 1]`.
    pub data_quality_score: f64,
    pub summary_text: String,
    /// Filled in after indexing; `None` straight out of the decoder.
    pub vector_embedding: Option<Vec<f32>>,
    pub source_file: String,
    pub processing_metadata: ProcessingMetadata,
}

impl Profile {
    pub fn make_id(platform_number: &str, cycle_number: i64) -> String {
        format!("{platform_number}_{cycle_number}")
    }
}

/// Everything decoded from one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedFile {
    pub measurements: Vec<Measurement>,
    pub profiles: Vec<Profile>,
}

impl DecodedFile {
    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }
}
