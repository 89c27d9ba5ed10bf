//! Route model returned by the routing provider

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Location;
use crate::TripcastError;

/// How the traveller moves along the route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Walking,
    #[serde(alias = "bicycling")]
    Cycling,
    #[default]
    Driving,
    Transit,
}

impl TransportMode {
    /// Modes where the traveller is exposed to the weather
    #[must_use]
    pub fn is_exposed(self) -> bool {
        matches!(self, TransportMode::Walking | TransportMode::Cycling)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TransportMode::Walking => "walking",
            TransportMode::Cycling => "cycling",
            TransportMode::Driving => "driving",
            TransportMode::Transit => "transit",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportMode {
    type Err = TripcastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "walking" => Ok(TransportMode::Walking),
            "cycling" | "bicycling" => Ok(TransportMode::Cycling),
            "driving" => Ok(TransportMode::Driving),
            "transit" => Ok(TransportMode::Transit),
            other => Err(TripcastError::validation(format!(
                "unknown transport mode '{other}', expected one of: walking, cycling, driving, transit"
            ))),
        }
    }
}

/// One turn-by-turn instruction
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RouteStep {
    pub instruction: String,
    /// Distance in meters
    pub distance: f64,
    /// Duration in seconds
    pub duration_seconds: u64,
    /// Encoded path for this step
    pub polyline: Option<String>,
}

/// Normalized route between two locations
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RouteSummary {
    pub origin: Location,
    pub destination: Location,
    pub transport_mode: TransportMode,
    /// Total distance in meters
    pub distance: f64,
    /// Total duration in minutes
    pub duration: u32,
    pub steps: Vec<RouteStep>,
    /// Encoded path for the whole route
    pub polyline: Option<String>,
}

impl RouteSummary {
    /// Convert provider seconds to whole minutes, rounding partial minutes up
    #[must_use]
    pub fn minutes_from_seconds(seconds: u64) -> u32 {
        u32::try_from(seconds.div_ceil(60)).unwrap_or(u32::MAX)
    }

    /// Distance in kilometers
    #[must_use]
    pub fn distance_km(&self) -> f64 {
        self.distance / 1000.0
    }
}
