//! Data models for the Tripcast application
//!
//! This module contains the core domain models organized by concern:
//! - Location: Geographic coordinates and user location input
//! - Weather: Normalized weather observations
//! - Route: Routes, steps and transport modes
//! - Outfit: Clothing catalog items

pub mod location;
pub mod outfit;
pub mod route;
pub mod weather;

// Re-export all public types for convenient access
pub use location::{Location, LocationInput};
pub use outfit::{ClothingItem, OutfitType};
pub use route::{RouteStep, RouteSummary, TransportMode};
pub use weather::{WeatherCondition, WeatherObservation, WeatherReading};
