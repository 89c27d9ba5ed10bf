//! External collaborators
//!
//! The planner only talks to these traits; concrete HTTP clients, the static
//! outfit catalog and the caching decorator live in the submodules.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;
use crate::models::{ClothingItem, Location, RouteSummary, TransportMode, WeatherObservation};

pub mod amap;
pub mod cached;
pub mod http;
pub mod outfit;
pub mod qweather;

pub use amap::AMapClient;
pub use cached::CachedWeatherProvider;
pub use outfit::StaticOutfitCatalog;
pub use qweather::QWeatherClient;

/// Longest forecast any weather provider is asked for, in days
pub const MAX_FORECAST_DAYS: u8 = 7;

/// Geocoding and route planning
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    /// Resolve a free-text address
    async fn geocode(&self, address: &str) -> Result<Location>;

    /// Name and city for a coordinate pair; the coordinates are kept as given
    async fn reverse_geocode(&self, location: &Location) -> Result<Location>;

    /// Points of interest matching `keywords`, optionally within `city`
    async fn search_places(&self, keywords: &str, city: Option<&str>) -> Result<Vec<Location>>;

    async fn plan_route(
        &self,
        origin: &Location,
        destination: &Location,
        mode: TransportMode,
    ) -> Result<RouteSummary>;
}

/// Current conditions and daily forecasts
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current_weather(&self, location: &Location) -> Result<WeatherObservation>;

    /// One observation per day, `days` in `1..=MAX_FORECAST_DAYS`
    async fn forecast(&self, location: &Location, days: u8) -> Result<Vec<WeatherObservation>>;
}

/// Garment suggestions for the weather
#[async_trait]
pub trait OutfitCatalog: Send + Sync {
    async fn recommend(
        &self,
        weather: &WeatherObservation,
        preferences: &HashMap<String, Value>,
    ) -> Result<Vec<ClothingItem>>;
}
