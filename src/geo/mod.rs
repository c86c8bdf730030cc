pub mod polygon;
pub mod zone;
pub mod zones;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use polygon::{BBox, Polygon};
pub use zone::{ZoneChecker, ZoneComposer};

/// Mean Earth radius used by geo-enabled key-value stores for radius search.
const EARTH_RADIUS_M: f64 = 6_372_797.560_856;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lng: f64,
}

impl Point {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

pub fn haversine_m(a: &Point, b: &Point) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_M * central_angle
}

/// Units accepted by radius queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    M,
    Km,
    Mi,
    Ft,
}

impl DistanceUnit {
    pub fn to_meters(self, value: f64) -> f64 {
        match self {
            DistanceUnit::M => value,
            DistanceUnit::Km => value * 1_000.0,
            DistanceUnit::Mi => value * 1_609.34,
            DistanceUnit::Ft => value * 0.3048,
        }
    }

    pub fn from_meters(self, meters: f64) -> f64 {
        meters / self.to_meters(1.0)
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self {
            DistanceUnit::M => "m",
            DistanceUnit::Km => "km",
            DistanceUnit::Mi => "mi",
            DistanceUnit::Ft => "ft",
        };
        f.write_str(unit)
    }
}

impl FromStr for DistanceUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "m" => Ok(DistanceUnit::M),
            "km" => Ok(DistanceUnit::Km),
            "mi" => Ok(DistanceUnit::Mi),
            "ft" => Ok(DistanceUnit::Ft),
            other => Err(format!("unknown distance unit: {other}, expected m/km/mi/ft")),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("polygon needs at least 3 distinct vertices, got {count}")]
    TooFewVertices { count: usize },

    #[error("polygon vertex {index} has a non-finite coordinate")]
    NonFiniteVertex { index: usize },

    #[error("polygon has zero area")]
    ZeroArea,

    #[error("no point inside the polygon after {attempts} samples")]
    SamplingExhausted { attempts: usize },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ZoneError {
    #[error("allowed zone is flagged as exclusive")]
    AllowedZoneExcludes,

    #[error("disallowed zone {index} is flagged as inclusive")]
    DisallowedZoneAdmits { index: usize },

    #[error("no admissible point after {attempts} samples; disallowed zones may cover the allowed zone")]
    NoAdmissiblePoint { attempts: usize },

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}
