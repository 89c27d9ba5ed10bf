//! Location model for geographic coordinates and metadata

use serde::{Deserialize, Serialize};

use crate::{Result, TripcastError};

/// Location coordinates
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Human-readable name or formatted address
    pub name: String,
    /// City the location belongs to, when the provider reports one
    pub city: Option<String>,
}

impl Location {
    /// Create a new location
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, name: String) -> Self {
        Self {
            latitude,
            longitude,
            name,
            city: None,
        }
    }

    /// Create location with city
    #[must_use]
    pub fn with_city(latitude: f64, longitude: f64, name: String, city: String) -> Self {
        Self {
            latitude,
            longitude,
            name,
            city: Some(city),
        }
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// `lng,lat` pair as expected by the map and weather providers
    #[must_use]
    pub fn lng_lat(&self) -> String {
        format!("{:.6},{:.6}", self.longitude, self.latitude)
    }

    /// Round coordinates for cache key generation
    #[must_use]
    pub fn rounded_coordinates(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(4));
        let lat = (self.latitude * multiplier).round() / multiplier;
        let lon = (self.longitude * multiplier).round() / multiplier;
        (lat, lon)
    }

    /// Generate cache key for this location
    #[must_use]
    pub fn cache_key(&self, scope: &str) -> String {
        let (lat, lon) = self.rounded_coordinates(2);
        format!("weather:{lat:.2}:{lon:.2}:{scope}")
    }
}

/// A location as typed by a user: either `lng,lat` or free text to geocode
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    Coordinates { longitude: f64, latitude: f64 },
    Address(String),
}

impl LocationInput {
    /// Parse user input. Two comma separated numbers within coordinate
    /// bounds are read as `longitude,latitude`; everything else is an address.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TripcastError::validation("location must not be empty"));
        }

        let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        if let [lng, lat] = parts.as_slice() {
            if let (Ok(longitude), Ok(latitude)) = (lng.parse::<f64>(), lat.parse::<f64>()) {
                if !(-180.0..=180.0).contains(&longitude) || !(-90.0..=90.0).contains(&latitude)
                {
                    return Err(TripcastError::validation(format!(
                        "coordinates out of range: {trimmed}"
                    )));
                }
                return Ok(Self::Coordinates {
                    longitude,
                    latitude,
                });
            }
        }

        Ok(Self::Address(trimmed.to_string()))
    }
}
