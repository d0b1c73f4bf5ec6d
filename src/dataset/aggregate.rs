//! Fold a cast's valid measurements into a [`Profile`].
//!
//! The profile is derived from the measurements alone plus the total level
//! count of the cast; profile-level attributes (platform, cycle, position,
//! time, region, source) are taken from the measurements themselves, which
//! all carry the same values.

use chrono::Utc;
use ndarray::Array1;

use super::types::{Measurement, ProcessingMetadata, Profile, ValueRange};

/// Build the profile for one cast. Returns `None` when there are no valid
/// measurements: such casts produce nothing at all.
pub fn aggregate(measurements: &[Measurement], total_levels: usize) -> Option<Profile> {
    let first = measurements.first()?;
    let valid = measurements.len();

    let temperature = value_range(measurements.iter().map(|m| m.temperature));
    let salinity = value_range(measurements.iter().map(|m| m.salinity));
    let pressure = value_range(measurements.iter().map(|m| m.pressure));
    let max_depth = measurements
        .iter()
        .map(|m| m.depth)
        .fold(f64::NEG_INFINITY, f64::max);

    // A denominator below the valid count would push the score past 1.
    let denominator = total_levels.max(valid);
    let data_quality_score = valid as f64 / denominator as f64;

    let mut profile = Profile {
        id: Profile::make_id(&first.platform_number, first.cycle_number),
        platform_number: first.platform_number.clone(),
        cycle_number: first.cycle_number,
        profile_date: first.measurement_time,
        latitude: first.latitude,
        longitude: first.longitude,
        max_depth,
        measurement_count: valid,
        temperature_range: temperature,
        salinity_range: salinity,
        pressure_range: pressure,
        ocean_region: first.ocean_region,
        data_quality_score,
        summary_text: String::new(),
        vector_embedding: None,
        source_file: first.source_file.clone(),
        processing_metadata: ProcessingMetadata {
            processed_at: Utc::now(),
            total_levels: denominator,
            valid_levels: valid,
        },
    };
    profile.summary_text = summary_text(&profile);
    Some(profile)
}

fn value_range(values: impl Iterator<Item = f64>) -> ValueRange {
    let values: Array1<f64> = values.collect();
    let min = values.fold(f64::INFINITY, |acc, &v| acc.min(v));
    let max = values.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
    ValueRange {
        min,
        max,
        mean: values.mean().unwrap_or(f64::NAN),
    }
}

/// Fixed-template sentence used both for display and as the embedding input.
pub fn summary_text(profile: &Profile) -> String {
    format!(
        "ARGO float {} profile {} at {:.2}°N {:.2}°E in {} with {} measurements. \
         Temperature range: {:.2}-{:.2}°C, Salinity range: {:.2}-{:.2} PSU, Depth range: 0-{:.0}m",
        profile.platform_number,
        profile.cycle_number,
        profile.latitude,
        profile.longitude,
        profile.ocean_region,
        profile.measurement_count,
        profile.temperature_range.min,
        profile.temperature_range.max,
        profile.salinity_range.min,
        profile.salinity_range.max,
        profile.max_depth,
    )
}
