//! Bounding-box ocean basin classification.
//!
//! The rules are evaluated in a fixed order and the first match wins. Several
//! boxes overlap (e.g. the South Pacific box covers most of the Indian Ocean
//! box), so the order is part of the contract.

use serde::{Deserialize, Serialize};

/// Coarse ocean basin label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OceanRegion {
    #[serde(rename = "North Atlantic")]
    NorthAtlantic,
    #[serde(rename = "North Pacific")]
    NorthPacific,
    #[serde(rename = "South Atlantic")]
    SouthAtlantic,
    #[serde(rename = "South Pacific")]
    SouthPacific,
    #[serde(rename = "Indian Ocean")]
    IndianOcean,
    #[serde(rename = "Arctic Ocean")]
    ArcticOcean,
    #[serde(rename = "Southern Ocean")]
    SouthernOcean,
    Unknown,
}

impl OceanRegion {
    pub const ALL: [OceanRegion; 8] = [
        Self::NorthAtlantic,
        Self::NorthPacific,
        Self::SouthAtlantic,
        Self::SouthPacific,
        Self::IndianOcean,
        Self::ArcticOcean,
        Self::SouthernOcean,
        Self::Unknown,
    ];

    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NorthAtlantic => "North Atlantic",
            Self::NorthPacific => "North Pacific",
            Self::SouthAtlantic => "South Atlantic",
            Self::SouthPacific => "South Pacific",
            Self::IndianOcean => "Indian Ocean",
            Self::ArcticOcean => "Arctic Ocean",
            Self::SouthernOcean => "Southern Ocean",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for OceanRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OceanRegion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("unknown ocean region: {s}"))
    }
}

/// (lon_min, lon_max, lat_min, lat_max, region), inclusive, in evaluation order.
const BOXES: [(f64, f64, f64, f64, OceanRegion); 5] = [
    (-180.0, -60.0, 10.0, 70.0, OceanRegion::NorthAtlantic),
    (60.0, 180.0, 10.0, 70.0, OceanRegion::NorthPacific),
    (-60.0, 20.0, -60.0, 10.0, OceanRegion::SouthAtlantic),
    (20.0, 180.0, -60.0, 10.0, OceanRegion::SouthPacific),
    (20.0, 120.0, -40.0, 30.0, OceanRegion::IndianOcean),
];

/// Classify a coordinate into an ocean region. Total: NaN coordinates fall
/// through to [`OceanRegion::Unknown`].
pub fn classify(lat: f64, lon: f64) -> OceanRegion {
    for (lon_min, lon_max, lat_min, lat_max, region) in BOXES {
        if (lon_min..=lon_max).contains(&lon) && (lat_min..=lat_max).contains(&lat) {
            return region;
        }
    }
    if lat > 70.0 {
        OceanRegion::ArcticOcean
    } else if lat < -60.0 {
        OceanRegion::SouthernOcean
    } else {
        OceanRegion::Unknown
    }
}
