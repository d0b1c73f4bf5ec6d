//! Pure oceanographic helpers: pressure → depth conversion and coarse basin
//! classification.

pub mod region;

pub use region::{classify, OceanRegion};

/// Decibar → meters factor. Kept literal so stored depths stay numerically
/// comparable with previously ingested data.
pub const DBAR_TO_METERS: f64 = 1.019716;

/// Convert sea pressure (decibar) to depth (meters).
pub fn pressure_to_depth(pressure_dbar: f64) -> f64 {
    pressure_dbar * DBAR_TO_METERS
}
