//! Configuration management for `Tripcast`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::TripcastError;
use crate::models::TransportMode;
use crate::planner::PlannerSettings;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for `Tripcast`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TripcastConfig {
    /// Weather provider (QWeather) settings
    pub weather: WeatherConfig,
    /// Map provider (AMap) settings
    pub map: MapConfig,
    /// Cache configuration
    pub cache: CacheConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Planner defaults
    pub planner: PlannerConfig,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Language of condition descriptions
    #[serde(default = "default_weather_lang")]
    pub lang: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Maximum number of retries for failed requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Map API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    pub api_key: Option<String>,
    /// Security code sent as `jscode`
    pub security_key: Option<String>,
    #[serde(default = "default_map_base_url")]
    pub base_url: String,
    /// City used for transit routing when the origin has none
    #[serde(default = "default_city")]
    pub default_city: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Weather cache TTL in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Planner defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub default_mode: TransportMode,
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// Days requested by `forecast` when none are given
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u8,
}

// Default value functions
fn default_weather_base_url() -> String {
    "https://devapi.qweather.com".to_string()
}

fn default_weather_lang() -> String {
    "en".to_string()
}

fn default_map_base_url() -> String {
    "https://restapi.amap.com".to_string()
}

fn default_city() -> String {
    "北京".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_cache_location() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("tripcast"))
        .unwrap_or_else(|| PathBuf::from(".tripcast-cache"))
        .to_string_lossy()
        .into_owned()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_max_batch_size() -> usize {
    10
}

fn default_forecast_days() -> u8 {
    3
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            lang: default_weather_lang(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            security_key: None,
            base_url: default_map_base_url(),
            default_city: default_city(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_seconds: default_cache_ttl(),
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_mode: TransportMode::default(),
            max_batch_size: default_max_batch_size(),
            forecast_days: default_forecast_days(),
        }
    }
}

impl From<&PlannerConfig> for PlannerSettings {
    fn from(config: &PlannerConfig) -> Self {
        Self {
            max_batch_size: config.max_batch_size,
            default_mode: config.default_mode,
        }
    }
}

/// Environment variables honoured when the matching key is unset
const LEGACY_WEATHER_KEY: &str = "HEFENG_API_KEY";
const LEGACY_MAP_KEY: &str = "AMAP_API_KEY";
const LEGACY_MAP_SECURITY_KEY: &str = "AMAP_SECURITY_KEY";

fn is_blank(value: Option<&String>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

impl TripcastConfig {
    /// Load configuration from `config_path`, the user config directory or
    /// `./config.toml`, then apply environment overrides
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let explicit = config_path.is_some();
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if explicit && !config_file.exists() {
            return Err(TripcastError::config(format!(
                "Config file not found: {}",
                config_file.display()
            ))
            .into());
        }

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // TRIPCAST__WEATHER__API_KEY and friends
        builder = builder.add_source(
            Environment::with_prefix("TRIPCAST")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: TripcastConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_legacy_env(|name| std::env::var(name).ok());
        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tripcast").join("config.toml"))
    }

    /// Fill unset API keys from the legacy variable names
    pub fn apply_legacy_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fill = |slot: &mut Option<String>, name: &str| {
            if is_blank(slot.as_ref()) {
                if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
                    *slot = Some(value);
                }
            }
        };
        fill(&mut self.weather.api_key, LEGACY_WEATHER_KEY);
        fill(&mut self.map.api_key, LEGACY_MAP_KEY);
        fill(&mut self.map.security_key, LEGACY_MAP_SECURITY_KEY);
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.lang.is_empty() {
            self.weather.lang = default_weather_lang();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_timeout();
        }
        if self.map.base_url.is_empty() {
            self.map.base_url = default_map_base_url();
        }
        if self.map.default_city.is_empty() {
            self.map.default_city = default_city();
        }
        if self.map.timeout_seconds == 0 {
            self.map.timeout_seconds = default_timeout();
        }
        if self.cache.ttl_seconds == 0 {
            self.cache.ttl_seconds = default_cache_ttl();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.planner.max_batch_size == 0 {
            self.planner.max_batch_size = default_max_batch_size();
        }
        if self.planner.forecast_days == 0 {
            self.planner.forecast_days = default_forecast_days();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Providers whose API key is not configured
    #[must_use]
    pub fn missing_api_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(self.weather.api_key.as_ref()) {
            missing.push("weather");
        }
        if is_blank(self.map.api_key.as_ref()) {
            missing.push("map");
        }
        missing
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds > 300 || self.map.timeout_seconds > 300 {
            return Err(TripcastError::config("API timeout cannot exceed 300 seconds").into());
        }

        if self.weather.max_retries > 10 || self.map.max_retries > 10 {
            return Err(TripcastError::config("API max retries cannot exceed 10").into());
        }

        if self.cache.ttl_seconds > 7 * 24 * 60 * 60 {
            return Err(TripcastError::config("Cache TTL cannot exceed one week").into());
        }

        if !(1..=50).contains(&self.planner.max_batch_size) {
            return Err(TripcastError::config("Batch size must be between 1 and 50").into());
        }

        if !(1..=crate::providers::MAX_FORECAST_DAYS).contains(&self.planner.forecast_days) {
            return Err(TripcastError::config(format!(
                "Forecast days must be between 1 and {}",
                crate::providers::MAX_FORECAST_DAYS
            ))
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TripcastError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TripcastError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [("Weather", &self.weather.base_url), ("Map", &self.map.base_url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(TripcastError::config(format!(
                    "{name} API base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = TripcastConfig::default();
        assert_eq!(config.weather.base_url, "https://devapi.qweather.com");
        assert_eq!(config.map.base_url, "https://restapi.amap.com");
        assert_eq!(config.map.default_city, "北京");
        assert_eq!(config.weather.timeout_seconds, 30);
        assert_eq!(config.cache.ttl_seconds, 300);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.planner.max_batch_size, 10);
        assert_eq!(config.planner.default_mode, TransportMode::Driving);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_api_keys_are_reported() {
        let mut config = TripcastConfig::default();
        assert_eq!(config.missing_api_keys(), vec!["weather", "map"]);

        config.weather.api_key = Some("qweather-key".to_string());
        config.map.api_key = Some("  ".to_string());
        assert_eq!(config.missing_api_keys(), vec!["map"]);
    }

    #[test]
    fn test_legacy_env_fills_only_unset_keys() {
        let env: HashMap<&str, &str> = [
            ("HEFENG_API_KEY", "legacy-weather"),
            ("AMAP_API_KEY", "legacy-map"),
            ("AMAP_SECURITY_KEY", "legacy-jscode"),
        ]
        .into_iter()
        .collect();

        let mut config = TripcastConfig::default();
        config.map.api_key = Some("configured-map".to_string());
        config.apply_legacy_env(|name| env.get(name).map(|v| (*v).to_string()));

        assert_eq!(config.weather.api_key.as_deref(), Some("legacy-weather"));
        assert_eq!(config.map.api_key.as_deref(), Some("configured-map"));
        assert_eq!(config.map.security_key.as_deref(), Some("legacy-jscode"));
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = TripcastConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = TripcastConfig::default();
        config.map.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));

        let mut config = TripcastConfig::default();
        config.planner.max_batch_size = 51;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_base_url() {
        let mut config = TripcastConfig::default();
        config.map.base_url = "restapi.amap.com".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Map API base URL"));
    }

    #[test]
    fn test_apply_defaults_fills_blanks() {
        let mut config = TripcastConfig::default();
        config.weather.base_url.clear();
        config.cache.ttl_seconds = 0;
        config.planner.max_batch_size = 0;
        config.apply_defaults();

        assert_eq!(config.weather.base_url, "https://devapi.qweather.com");
        assert_eq!(config.cache.ttl_seconds, 300);
        assert_eq!(config.planner.max_batch_size, 10);
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[weather]
api_key = "file-weather-key"
lang = "zh"

[map]
default_city = "上海"

[planner]
default_mode = "transit"
max_batch_size = 5
"#
        )
        .unwrap();

        let config = TripcastConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();

        assert_eq!(config.weather.api_key.as_deref(), Some("file-weather-key"));
        assert_eq!(config.weather.lang, "zh");
        assert_eq!(config.weather.timeout_seconds, 30);
        assert_eq!(config.map.default_city, "上海");
        assert_eq!(config.planner.default_mode, TransportMode::Transit);
        assert_eq!(PlannerSettings::from(&config.planner).max_batch_size, 5);
    }

    #[test]
    fn test_missing_explicit_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = TripcastConfig::load_from_path(Some(dir.path().join("absent.toml")));
        assert!(result.unwrap_err().to_string().contains("Config file not found"));
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = TripcastConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("tripcast"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
