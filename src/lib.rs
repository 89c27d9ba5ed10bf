//! `Tripcast` - weather-aware smart travel planning
//!
//! Combines a route, the weather at the destination and outfit suggestions
//! into a travel plan with a weather-adjusted departure time and travel tips.

pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod planner;
pub mod providers;
pub mod telemetry;

// Re-export core types for public API
pub use cache::PersistentCache;
pub use config::TripcastConfig;
pub use error::TripcastError;
pub use models::{
    ClothingItem, Location, LocationInput, RouteSummary, TransportMode, WeatherCondition,
    WeatherObservation,
};
pub use planner::{
    BatchReport, ImpactAssessment, PlanOutcome, PlanRequest, PlannerSettings, RouteForecast,
    Severity, TimingPlan, TravelPlan, TravelPlanner, WeatherSource,
};
pub use providers::{OutfitCatalog, RoutingProvider, WeatherProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TripcastError>;
