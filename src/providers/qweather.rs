//! QWeather (HeFeng) weather client

use std::time::Duration;

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;

use super::http::{build_client, get_json};
use super::{MAX_FORECAST_DAYS, WeatherProvider};
use crate::config::WeatherConfig;
use crate::models::{Location, WeatherObservation};
use crate::{Result, TripcastError};

const PROVIDER: &str = "QWeather";

/// Client for the QWeather v7 API
pub struct QWeatherClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
    lang: String,
}

impl QWeatherClient {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(
                PROVIDER,
                Duration::from_secs(config.timeout_seconds),
                config.max_retries,
            )?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
            lang: config.lang.clone(),
        })
    }

    fn params(&self, location: &Location) -> Vec<(&'static str, String)> {
        vec![
            ("location", location.lng_lat()),
            ("key", self.api_key.clone()),
            ("lang", self.lang.clone()),
        ]
    }
}

/// Smallest forecast window covering `days`
fn forecast_window(days: u8) -> &'static str {
    if days <= 3 { "3d" } else { "7d" }
}

#[async_trait]
impl WeatherProvider for QWeatherClient {
    #[tracing::instrument(skip(self), fields(location = %location.name))]
    async fn current_weather(&self, location: &Location) -> Result<WeatherObservation> {
        let url = format!("{}/v7/weather/now", self.base_url);
        let response: qweather::NowResponse =
            get_json(&self.client, PROVIDER, &url, &self.params(location)).await?;

        qweather::check_code(&response.code)?;
        let now = response
            .now
            .ok_or_else(|| TripcastError::provider(PROVIDER, "response has no current conditions"))?;
        Ok(now.into_observation())
    }

    #[tracing::instrument(skip(self), fields(location = %location.name))]
    async fn forecast(&self, location: &Location, days: u8) -> Result<Vec<WeatherObservation>> {
        if !(1..=MAX_FORECAST_DAYS).contains(&days) {
            return Err(TripcastError::validation(format!(
                "forecast days must be between 1 and {MAX_FORECAST_DAYS}, got {days}"
            )));
        }

        let url = format!("{}/v7/weather/{}", self.base_url, forecast_window(days));
        let response: qweather::DailyResponse =
            get_json(&self.client, PROVIDER, &url, &self.params(location)).await?;

        qweather::check_code(&response.code)?;
        let observations: Vec<WeatherObservation> = response
            .daily
            .into_iter()
            .take(usize::from(days))
            .map(qweather::Daily::into_observation)
            .collect();

        tracing::debug!(days = observations.len(), "Parsed QWeather forecast");
        Ok(observations)
    }
}

/// QWeather wire format. Every number arrives as a string.
mod qweather {
    use chrono::{DateTime, NaiveDate, Utc};

    use super::{PROVIDER, TripcastError};
    use crate::models::{WeatherObservation, WeatherReading};
    use crate::providers::http::{lenient_number, lenient_text};
    use serde::Deserialize;

    const DEFAULT_VISIBILITY_KM: f64 = 10.0;
    const DEFAULT_PRESSURE_HPA: f64 = 1013.0;

    #[derive(Debug, Deserialize)]
    pub struct NowResponse {
        pub code: String,
        pub now: Option<Now>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Now {
        #[serde(default, deserialize_with = "lenient_text")]
        pub obs_time: Option<String>,
        #[serde(default, deserialize_with = "lenient_number")]
        pub temp: Option<f64>,
        #[serde(default, deserialize_with = "lenient_number")]
        pub feels_like: Option<f64>,
        #[serde(default, deserialize_with = "lenient_text")]
        pub text: Option<String>,
        #[serde(default, deserialize_with = "lenient_text")]
        pub wind_dir: Option<String>,
        #[serde(default, deserialize_with = "lenient_number")]
        pub wind_speed: Option<f64>,
        #[serde(default, deserialize_with = "lenient_number")]
        pub humidity: Option<f64>,
        #[serde(default, deserialize_with = "lenient_number")]
        pub pressure: Option<f64>,
        #[serde(default, deserialize_with = "lenient_number")]
        pub vis: Option<f64>,
    }

    #[derive(Debug, Deserialize)]
    pub struct DailyResponse {
        pub code: String,
        #[serde(default)]
        pub daily: Vec<Daily>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Daily {
        #[serde(default, deserialize_with = "lenient_text")]
        pub fx_date: Option<String>,
        #[serde(default, deserialize_with = "lenient_number")]
        pub temp_max: Option<f64>,
        #[serde(default, deserialize_with = "lenient_text")]
        pub text_day: Option<String>,
        #[serde(default, deserialize_with = "lenient_text")]
        pub wind_dir_day: Option<String>,
        #[serde(default, deserialize_with = "lenient_number")]
        pub wind_speed_day: Option<f64>,
        #[serde(default, deserialize_with = "lenient_number")]
        pub humidity: Option<f64>,
        #[serde(default, deserialize_with = "lenient_number")]
        pub pressure: Option<f64>,
        #[serde(default, deserialize_with = "lenient_number")]
        pub vis: Option<f64>,
    }

    /// Map the QWeather status code onto our error kinds
    pub fn check_code(code: &str) -> crate::Result<()> {
        match code {
            "200" => Ok(()),
            "400" | "404" => Err(TripcastError::invalid_location(format!(
                "QWeather rejected the location (code {code})"
            ))),
            other => Err(TripcastError::provider(PROVIDER, format!("API returned code {other}"))),
        }
    }

    fn humidity(value: Option<f64>) -> i64 {
        // clamped again when the observation is built
        #[allow(clippy::cast_possible_truncation)]
        let percent = value.unwrap_or(0.0).round().clamp(-1.0, 101.0) as i64;
        percent
    }

    fn parse_obs_time(value: Option<&str>) -> DateTime<Utc> {
        value
            .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
            .map_or_else(Utc::now, |time| time.with_timezone(&Utc))
    }

    fn parse_fx_date(value: Option<&str>) -> DateTime<Utc> {
        value
            .and_then(|text| NaiveDate::parse_from_str(text, "%Y-%m-%d").ok())
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map_or_else(Utc::now, |time| time.and_utc())
    }

    impl Now {
        pub fn into_observation(self) -> WeatherObservation {
            let temperature = self.temp.unwrap_or(0.0);
            WeatherReading {
                description: self.text.unwrap_or_else(|| "Unknown".to_string()),
                temperature,
                feels_like: self.feels_like.unwrap_or(temperature),
                humidity: humidity(self.humidity),
                wind_speed_kmh: self.wind_speed.unwrap_or(0.0),
                wind_direction: self.wind_dir.unwrap_or_default(),
                visibility_km: self.vis.unwrap_or(DEFAULT_VISIBILITY_KM),
                pressure_hpa: Some(self.pressure.unwrap_or(DEFAULT_PRESSURE_HPA)),
                observed_at: parse_obs_time(self.obs_time.as_deref()),
            }
            .into()
        }
    }

    impl Daily {
        /// Daytime conditions at the day's high
        pub fn into_observation(self) -> WeatherObservation {
            let temperature = self.temp_max.unwrap_or(0.0);
            WeatherReading {
                description: self.text_day.unwrap_or_else(|| "Unknown".to_string()),
                temperature,
                feels_like: temperature,
                humidity: humidity(self.humidity),
                wind_speed_kmh: self.wind_speed_day.unwrap_or(0.0),
                wind_direction: self.wind_dir_day.unwrap_or_default(),
                visibility_km: self.vis.unwrap_or(DEFAULT_VISIBILITY_KM),
                pressure_hpa: Some(self.pressure.unwrap_or(DEFAULT_PRESSURE_HPA)),
                observed_at: parse_fx_date(self.fx_date.as_deref()),
            }
            .into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::qweather::{DailyResponse, NowResponse, check_code};
    use super::*;
    use crate::models::WeatherCondition;

    const NOW_FIXTURE: &str = r#"{
        "code": "200",
        "updateTime": "2024-06-01T10:42+08:00",
        "now": {
            "obsTime": "2024-06-01T10:35:00+08:00",
            "temp": "22",
            "feelsLike": "24",
            "icon": "101",
            "text": "多云",
            "wind360": "225",
            "windDir": "西南风",
            "windScale": "3",
            "windSpeed": "12",
            "humidity": "65",
            "precip": "0.0",
            "pressure": "1008",
            "vis": "16",
            "cloud": "40",
            "dew": "15"
        }
    }"#;

    const DAILY_FIXTURE: &str = r#"{
        "code": "200",
        "daily": [
            {"fxDate": "2024-06-01", "tempMax": "25", "tempMin": "15", "textDay": "小雨",
             "windDirDay": "北风", "windSpeedDay": "15", "humidity": "70",
             "pressure": "1013", "vis": "8"},
            {"fxDate": "2024-06-02", "tempMax": "24", "tempMin": "14", "textDay": "晴",
             "windDirDay": "南风", "windSpeedDay": "9", "humidity": "55",
             "pressure": "1015", "vis": "25"},
            {"fxDate": "2024-06-03", "tempMax": "23", "textDay": "大雪"}
        ]
    }"#;

    #[test]
    fn test_parse_current_conditions() {
        let response: NowResponse = serde_json::from_str(NOW_FIXTURE).unwrap();
        check_code(&response.code).unwrap();
        let observation = response.now.unwrap().into_observation();

        assert!((observation.temperature - 22.0).abs() < f64::EPSILON);
        assert!((observation.feels_like - 24.0).abs() < f64::EPSILON);
        assert_eq!(observation.humidity, 65);
        assert!((observation.wind_speed - 12.0).abs() < f64::EPSILON);
        assert!((observation.visibility - 16.0).abs() < f64::EPSILON);
        assert_eq!(observation.pressure, Some(1008.0));
        assert_eq!(observation.wind_direction, "西南风");
        assert_eq!(observation.condition, WeatherCondition::Cloudy);
        assert_eq!(observation.observed_at.to_rfc3339(), "2024-06-01T02:35:00+00:00");
    }

    #[test]
    fn test_missing_values_use_defaults() {
        let response: NowResponse =
            serde_json::from_str(r#"{"code": "200", "now": {"text": "Sunny"}}"#).unwrap();
        let observation = response.now.unwrap().into_observation();

        assert!(observation.temperature.abs() < f64::EPSILON);
        assert_eq!(observation.humidity, 0);
        assert!((observation.visibility - 10.0).abs() < f64::EPSILON);
        assert_eq!(observation.pressure, Some(1013.0));
    }

    #[test]
    fn test_parse_daily_forecast() {
        let response: DailyResponse = serde_json::from_str(DAILY_FIXTURE).unwrap();
        let days: Vec<WeatherObservation> = response
            .daily
            .into_iter()
            .map(qweather::Daily::into_observation)
            .collect();

        assert_eq!(days.len(), 3);
        assert!((days[0].temperature - 25.0).abs() < f64::EPSILON);
        assert_eq!(days[0].condition, WeatherCondition::Rainy);
        assert!(days[0].mentions_rain());
        assert_eq!(days[1].condition, WeatherCondition::Sunny);
        assert_eq!(days[2].condition, WeatherCondition::Snowy);
        assert_eq!(days[2].observed_at.format("%Y-%m-%d").to_string(), "2024-06-03");
    }

    #[test]
    fn test_status_codes() {
        assert!(check_code("200").is_ok());
        assert!(matches!(
            check_code("404").unwrap_err(),
            TripcastError::InvalidLocation { .. }
        ));
        assert!(matches!(
            check_code("400").unwrap_err(),
            TripcastError::InvalidLocation { .. }
        ));
        assert!(matches!(
            check_code("401").unwrap_err(),
            TripcastError::ProviderUnavailable { .. }
        ));
        assert!(matches!(
            check_code("429").unwrap_err(),
            TripcastError::ProviderUnavailable { .. }
        ));
    }

    #[test]
    fn test_forecast_window() {
        assert_eq!(forecast_window(1), "3d");
        assert_eq!(forecast_window(3), "3d");
        assert_eq!(forecast_window(4), "7d");
        assert_eq!(forecast_window(7), "7d");
    }
}
