//! Plan orchestration
//!
//! Resolves locations, fetches route and weather from the providers, runs
//! the pure engine and assembles the final travel plan.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use futures::future::join_all;
use rand::RngExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::advisory::compose;
use super::impact::{ImpactAssessment, Severity, analyze};
use super::schedule::{TimingPlan, schedule};
use crate::models::{
    ClothingItem, Location, LocationInput, RouteSummary, TransportMode, WeatherObservation,
};
use crate::providers::{MAX_FORECAST_DAYS, OutfitCatalog, RoutingProvider, WeatherProvider};
use crate::{Result, TripcastError};

/// Tunables for the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerSettings {
    /// Largest batch accepted by `create_batch`
    pub max_batch_size: usize,
    /// Mode used when a request names none
    pub default_mode: TransportMode,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            max_batch_size: 10,
            default_mode: TransportMode::Driving,
        }
    }
}

/// A single planning request as supplied by a caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    /// `lng,lat` or a free-text address
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub transport_mode: Option<String>,
    /// Target arrival as `HH:MM`
    #[serde(default)]
    pub preferred_arrival_time: Option<String>,
    #[serde(default)]
    pub user_preferences: HashMap<String, Value>,
}

impl PlanRequest {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            transport_mode: None,
            preferred_arrival_time: None,
            user_preferences: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.transport_mode = Some(mode.into());
        self
    }

    #[must_use]
    pub fn arriving_at(mut self, arrival: impl Into<String>) -> Self {
        self.preferred_arrival_time = Some(arrival.into());
        self
    }

    /// Check the request and resolve its transport mode
    fn validate(&self, default_mode: TransportMode) -> Result<TransportMode> {
        if self.origin.trim().is_empty() {
            return Err(TripcastError::validation("origin must not be empty"));
        }
        if self.destination.trim().is_empty() {
            return Err(TripcastError::validation("destination must not be empty"));
        }
        match self.transport_mode.as_deref().map(str::trim) {
            None | Some("") => Ok(default_mode),
            Some(mode) => mode.parse(),
        }
    }
}

/// Where the plan's weather came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherSource {
    /// Reported by the weather provider
    Live,
    /// Provider failed; the default observation was substituted
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelPlan {
    pub id: String,
    pub origin: Location,
    pub destination: Location,
    pub transport_mode: TransportMode,
    pub route: RouteSummary,
    pub weather: WeatherObservation,
    pub outfit_recommendations: Vec<ClothingItem>,
    pub departure_time: NaiveDateTime,
    pub arrival_time: NaiveDateTime,
    /// Adjusted duration plus buffer, in minutes
    pub total_duration: u32,
    pub weather_impact: Severity,
    pub travel_tips: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A plan together with the intermediate results that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOutcome {
    pub travel_plan: TravelPlan,
    pub impact: ImpactAssessment,
    pub timing: TimingPlan,
    pub weather_source: WeatherSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFailure {
    /// Position of the request in the batch
    pub index: usize,
    pub request: PlanRequest,
    pub error_code: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub successful_plans: Vec<PlanOutcome>,
    pub failed_plans: Vec<BatchFailure>,
    pub total_requests: usize,
    pub success_count: usize,
    pub error_count: usize,
}

/// Daily forecasts for both ends of a trip. An end whose forecast could
/// not be fetched is left empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteForecast {
    pub origin: Location,
    pub destination: Location,
    pub days: u8,
    pub origin_forecast: Vec<WeatherObservation>,
    pub destination_forecast: Vec<WeatherObservation>,
}

/// Plan identifier: timestamp plus a random suffix so concurrent plans differ
fn plan_id(now: NaiveDateTime) -> String {
    let suffix: u16 = rand::rng().random();
    format!("plan_{}_{suffix:04x}", now.format("%Y%m%d_%H%M%S"))
}

pub struct TravelPlanner {
    routing: Arc<dyn RoutingProvider>,
    weather: Arc<dyn WeatherProvider>,
    outfits: Arc<dyn OutfitCatalog>,
    settings: PlannerSettings,
}

impl TravelPlanner {
    #[must_use]
    pub fn new(
        routing: Arc<dyn RoutingProvider>,
        weather: Arc<dyn WeatherProvider>,
        outfits: Arc<dyn OutfitCatalog>,
        settings: PlannerSettings,
    ) -> Self {
        Self {
            routing,
            weather,
            outfits,
            settings,
        }
    }

    async fn resolve(&self, input: &str) -> Result<Location> {
        match LocationInput::parse(input)? {
            LocationInput::Coordinates {
                longitude,
                latitude,
            } => {
                let bare = Location::new(latitude, longitude, input.trim().to_string());
                match self.routing.reverse_geocode(&bare).await {
                    Ok(named) => Ok(named),
                    Err(e) => {
                        tracing::warn!(coordinates = %bare.name, error = %e, "Reverse geocoding failed, using raw coordinates");
                        Ok(bare)
                    }
                }
            }
            LocationInput::Address(address) => self.routing.geocode(&address).await,
        }
    }

    async fn resolve_pair(&self, origin: &str, destination: &str) -> Result<(Location, Location)> {
        tokio::try_join!(self.resolve(origin), self.resolve(destination))
    }

    /// Build a complete travel plan for one request
    #[tracing::instrument(skip(self, request), fields(origin = %request.origin, destination = %request.destination))]
    pub async fn create_plan(&self, request: &PlanRequest, now: NaiveDateTime) -> Result<PlanOutcome> {
        let mode = request.validate(self.settings.default_mode)?;
        let (origin, destination) = self
            .resolve_pair(&request.origin, &request.destination)
            .await?;

        let (route, weather) = tokio::join!(
            self.routing.plan_route(&origin, &destination, mode),
            self.weather.current_weather(&destination)
        );
        let route = route?;
        let (weather, weather_source) = match weather {
            Ok(observation) => (observation, WeatherSource::Live),
            Err(e) => {
                tracing::warn!(error = %e, "Weather lookup failed, using default conditions");
                (WeatherObservation::fallback(Utc::now()), WeatherSource::Fallback)
            }
        };

        let outfit_recommendations = self
            .outfits
            .recommend(&weather, &request.user_preferences)
            .await?;

        let impact = analyze(&weather, &route);
        let timing = schedule(
            &route,
            &impact,
            request.preferred_arrival_time.as_deref(),
            now,
        );
        let travel_tips = compose(&weather, &route, &impact);

        let travel_plan = TravelPlan {
            id: plan_id(now),
            origin,
            destination,
            transport_mode: mode,
            route,
            weather,
            outfit_recommendations,
            departure_time: timing.departure,
            arrival_time: timing.arrival,
            total_duration: timing.total_duration,
            weather_impact: impact.severity,
            travel_tips,
            created_at: Utc::now(),
        };

        tracing::info!(
            plan_id = %travel_plan.id,
            mode = %mode,
            severity = %impact.severity,
            temperature = %travel_plan.weather.format_temperature(),
            departure = %timing.departure_hhmm(),
            arrival = %timing.arrival_hhmm(),
            "Travel plan created"
        );

        Ok(PlanOutcome {
            travel_plan,
            impact,
            timing,
            weather_source,
        })
    }

    /// Plan every request concurrently; failures are reported per index
    #[tracing::instrument(skip(self, requests), fields(count = requests.len()))]
    pub async fn create_batch(&self, requests: &[PlanRequest], now: NaiveDateTime) -> Result<BatchReport> {
        if requests.len() > self.settings.max_batch_size {
            return Err(TripcastError::validation(format!(
                "batch holds {} requests, the limit is {}",
                requests.len(),
                self.settings.max_batch_size
            )));
        }

        let results = join_all(requests.iter().map(|request| self.create_plan(request, now))).await;

        let mut successful_plans = Vec::new();
        let mut failed_plans = Vec::new();
        for (index, (request, result)) in requests.iter().zip(results).enumerate() {
            match result {
                Ok(outcome) => successful_plans.push(outcome),
                Err(e) => {
                    tracing::warn!(index, error = %e, "Batch request failed");
                    failed_plans.push(BatchFailure {
                        index,
                        request: request.clone(),
                        error_code: e.error_code().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let report = BatchReport {
            total_requests: requests.len(),
            success_count: successful_plans.len(),
            error_count: failed_plans.len(),
            successful_plans,
            failed_plans,
        };
        tracing::info!(
            succeeded = report.success_count,
            failed = report.error_count,
            "Batch planning finished"
        );
        Ok(report)
    }

    /// Places matching `keywords`, optionally restricted to `city`
    #[tracing::instrument(skip(self))]
    pub async fn search_places(&self, keywords: &str, city: Option<&str>) -> Result<Vec<Location>> {
        let keywords = keywords.trim();
        if keywords.is_empty() {
            return Err(TripcastError::validation("search keywords must not be empty"));
        }
        let city = city.map(str::trim).filter(|city| !city.is_empty());
        self.routing.search_places(keywords, city).await
    }

    /// Daily forecasts for both ends of a trip
    #[tracing::instrument(skip(self))]
    pub async fn route_forecast(&self, origin: &str, destination: &str, days: u8) -> Result<RouteForecast> {
        if !(1..=MAX_FORECAST_DAYS).contains(&days) {
            return Err(TripcastError::validation(format!(
                "forecast days must be between 1 and {MAX_FORECAST_DAYS}, got {days}"
            )));
        }

        let (origin, destination) = self.resolve_pair(origin, destination).await?;
        let (origin_forecast, destination_forecast) = tokio::join!(
            self.weather.forecast(&origin, days),
            self.weather.forecast(&destination, days)
        );

        Ok(RouteForecast {
            origin_forecast: forecast_or_empty(origin_forecast, &origin),
            destination_forecast: forecast_or_empty(destination_forecast, &destination),
            origin,
            destination,
            days,
        })
    }
}

fn forecast_or_empty(
    result: Result<Vec<WeatherObservation>>,
    location: &Location,
) -> Vec<WeatherObservation> {
    result.unwrap_or_else(|e| {
        tracing::warn!(location = %location.name, error = %e, "Forecast lookup failed");
        Vec::new()
    })
}
