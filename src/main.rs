use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info, warn};

use tripcast::config::TripcastConfig;
use tripcast::providers::{
    AMapClient, CachedWeatherProvider, QWeatherClient, StaticOutfitCatalog, WeatherProvider,
};
use tripcast::{
    PersistentCache, PlanRequest, PlannerSettings, TravelPlanner, TripcastError, telemetry,
};

#[derive(Parser)]
#[command(
    name = "tripcast",
    version,
    about = "Weather-aware travel planning",
    long_about = "Plan trips with routes from AMap, weather from QWeather and a departure time adjusted for the conditions. Output is JSON on stdout."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Build a travel plan for one trip
    Plan {
        /// Origin as `lng,lat` or an address
        #[arg(long)]
        origin: String,

        /// Destination as `lng,lat` or an address
        #[arg(long)]
        destination: String,

        /// walking, cycling, driving or transit
        #[arg(long)]
        mode: Option<String>,

        /// Desired arrival time (HH:MM)
        #[arg(long)]
        arrive_by: Option<String>,
    },

    /// Plan every request in a JSON file
    Batch {
        /// JSON array of plan requests
        #[arg(long)]
        file: PathBuf,
    },

    /// Daily forecasts for both ends of a trip
    Forecast {
        #[arg(long)]
        origin: String,

        #[arg(long)]
        destination: String,

        /// Number of days (1-7)
        #[arg(long)]
        days: Option<u8>,
    },

    /// Search points of interest by keyword
    Places {
        #[arg(long)]
        keywords: String,

        /// Restrict the search to this city
        #[arg(long)]
        city: Option<String>,
    },
}

fn build_planner(config: &TripcastConfig) -> Result<TravelPlanner> {
    let routing = Arc::new(AMapClient::new(&config.map).context("Failed to build AMap client")?);
    let live: Arc<dyn WeatherProvider> =
        Arc::new(QWeatherClient::new(&config.weather).context("Failed to build QWeather client")?);

    let weather: Arc<dyn WeatherProvider> = if config.cache.enabled {
        match PersistentCache::open(&config.cache.location) {
            Ok(cache) => Arc::new(CachedWeatherProvider::new(
                live,
                cache,
                Duration::from_secs(config.cache.ttl_seconds),
            )),
            Err(e) => {
                warn!(location = %config.cache.location, error = %e, "Cache unavailable, continuing without it");
                live
            }
        }
    } else {
        live
    };

    Ok(TravelPlanner::new(
        routing,
        weather,
        Arc::new(StaticOutfitCatalog::default()),
        PlannerSettings::from(&config.planner),
    ))
}

/// Log the user-facing explanation before handing the error to `main`
fn report(err: TripcastError) -> anyhow::Error {
    error!(code = err.error_code(), status = %err.status_code(), "{}", err.user_message());
    err.into()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let output = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{output}");
    Ok(())
}

async fn run(cli: Cli, config: TripcastConfig) -> Result<()> {
    let planner = build_planner(&config)?;
    let now = Local::now().naive_local();

    match cli.command {
        Command::Plan {
            origin,
            destination,
            mode,
            arrive_by,
        } => {
            let request = PlanRequest {
                transport_mode: mode,
                preferred_arrival_time: arrive_by,
                ..PlanRequest::new(origin, destination)
            };
            let outcome = planner.create_plan(&request, now).await.map_err(report)?;
            print_json(&outcome)
        }
        Command::Batch { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let requests: Vec<PlanRequest> = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse plan requests in {}", file.display()))?;
            let batch = planner.create_batch(&requests, now).await.map_err(report)?;
            print_json(&batch)
        }
        Command::Forecast {
            origin,
            destination,
            days,
        } => {
            let days = days.unwrap_or(config.planner.forecast_days);
            let forecast = planner
                .route_forecast(&origin, &destination, days)
                .await
                .map_err(report)?;
            print_json(&forecast)
        }
        Command::Places { keywords, city } => {
            let places = planner
                .search_places(&keywords, city.as_deref())
                .await
                .map_err(report)?;
            print_json(&places)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = TripcastConfig::load_from_path(cli.config.clone())?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }

    let telemetry = telemetry::init(&config.logging)?;
    info!(
        version = tripcast::VERSION,
        otlp = telemetry.exporting(),
        "Tripcast starting"
    );
    for provider in config.missing_api_keys() {
        warn!(provider, "API key not configured; requests to this provider will fail");
    }

    run(cli, config).await
}
