//! Weather observation model and condition classification

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const STORM_KEYWORDS: &[&str] = &["thunder", "storm", "雷", "暴雨"];
const SNOW_KEYWORDS: &[&str] = &["snow", "sleet", "雪"];
const RAIN_KEYWORDS: &[&str] = &["rain", "drizzle", "shower", "雨"];
const FOG_KEYWORDS: &[&str] = &["fog", "mist", "haze", "雾", "霾"];
const OVERCAST_KEYWORDS: &[&str] = &["overcast", "阴"];
const CLOUD_KEYWORDS: &[&str] = &["cloud", "多云"];

fn mentions_any(description: &str, keywords: &[&str]) -> bool {
    let lowered = description.to_lowercase();
    keywords.iter().any(|keyword| lowered.contains(keyword))
}

/// Discrete weather condition category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Sunny,
    Cloudy,
    Overcast,
    Rainy,
    Snowy,
    Foggy,
    Stormy,
}

impl WeatherCondition {
    /// Classify a free-text description. The most severe category whose
    /// keywords appear wins; unrecognized text is treated as sunny.
    #[must_use]
    pub fn from_description(description: &str) -> Self {
        let table: [(&[&str], WeatherCondition); 6] = [
            (STORM_KEYWORDS, WeatherCondition::Stormy),
            (SNOW_KEYWORDS, WeatherCondition::Snowy),
            (RAIN_KEYWORDS, WeatherCondition::Rainy),
            (FOG_KEYWORDS, WeatherCondition::Foggy),
            (OVERCAST_KEYWORDS, WeatherCondition::Overcast),
            (CLOUD_KEYWORDS, WeatherCondition::Cloudy),
        ];

        table
            .iter()
            .find(|(keywords, _)| mentions_any(description, keywords))
            .map_or(WeatherCondition::Sunny, |(_, condition)| *condition)
    }
}

/// Raw values as reported by a weather provider, before normalization
#[derive(Debug, Clone)]
pub struct WeatherReading {
    pub description: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: i64,
    pub wind_speed_kmh: f64,
    pub wind_direction: String,
    pub visibility_km: f64,
    pub pressure_hpa: Option<f64>,
    pub observed_at: DateTime<Utc>,
}

/// A single normalized weather reading
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherObservation {
    /// Temperature in Celsius
    pub temperature: f64,
    /// Apparent temperature in Celsius
    pub feels_like: f64,
    /// Relative humidity in percent (0-100)
    pub humidity: u8,
    /// Wind speed in km/h
    pub wind_speed: f64,
    /// Wind direction as reported by the provider
    pub wind_direction: String,
    /// Visibility in kilometers
    pub visibility: f64,
    /// Atmospheric pressure in hPa
    pub pressure: Option<f64>,
    /// Provider text, used for keyword matching
    pub description: String,
    /// Category derived from `description` when the observation was built
    pub condition: WeatherCondition,
    pub observed_at: DateTime<Utc>,
}

impl From<WeatherReading> for WeatherObservation {
    fn from(reading: WeatherReading) -> Self {
        let condition = WeatherCondition::from_description(&reading.description);
        Self {
            temperature: reading.temperature,
            feels_like: reading.feels_like,
            humidity: u8::try_from(reading.humidity.clamp(0, 100)).unwrap_or(100),
            wind_speed: reading.wind_speed_kmh.max(0.0),
            wind_direction: reading.wind_direction,
            visibility: reading.visibility_km.max(0.0),
            pressure: reading.pressure_hpa,
            description: reading.description,
            condition,
            observed_at: reading.observed_at,
        }
    }
}

impl WeatherObservation {
    /// Observation substituted when the weather provider cannot be reached
    #[must_use]
    pub fn fallback(observed_at: DateTime<Utc>) -> Self {
        WeatherReading {
            description: "Cloudy".to_string(),
            temperature: 20.0,
            feels_like: 20.0,
            humidity: 60,
            wind_speed_kmh: 15.0,
            wind_direction: "N".to_string(),
            visibility_km: 10.0,
            pressure_hpa: Some(1013.25),
            observed_at,
        }
        .into()
    }

    /// Whether the description mentions rain in any supported language
    #[must_use]
    pub fn mentions_rain(&self) -> bool {
        mentions_any(&self.description, RAIN_KEYWORDS)
    }

    /// Whether the description mentions snow in any supported language
    #[must_use]
    pub fn mentions_snow(&self) -> bool {
        mentions_any(&self.description, SNOW_KEYWORDS)
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C", self.temperature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn reading(description: &str) -> WeatherReading {
        WeatherReading {
            description: description.to_string(),
            temperature: 12.0,
            feels_like: 11.0,
            humidity: 55,
            wind_speed_kmh: 8.0,
            wind_direction: "NE".to_string(),
            visibility_km: 10.0,
            pressure_hpa: None,
            observed_at: Utc::now(),
        }
    }

    #[rstest]
    #[case("Sunny", WeatherCondition::Sunny)]
    #[case("晴", WeatherCondition::Sunny)]
    #[case("Partly Cloudy", WeatherCondition::Cloudy)]
    #[case("多云", WeatherCondition::Cloudy)]
    #[case("Overcast", WeatherCondition::Overcast)]
    #[case("阴", WeatherCondition::Overcast)]
    #[case("Light Rain", WeatherCondition::Rainy)]
    #[case("小雨", WeatherCondition::Rainy)]
    #[case("暴雨", WeatherCondition::Stormy)]
    #[case("Thundershower", WeatherCondition::Stormy)]
    #[case("Heavy Snow", WeatherCondition::Snowy)]
    #[case("雨夹雪", WeatherCondition::Snowy)]
    #[case("Foggy", WeatherCondition::Foggy)]
    #[case("霾", WeatherCondition::Foggy)]
    #[case("something else", WeatherCondition::Sunny)]
    fn test_condition_from_description(#[case] text: &str, #[case] expected: WeatherCondition) {
        assert_eq!(WeatherCondition::from_description(text), expected);
    }

    #[test]
    fn test_condition_is_derived_once_at_construction() {
        let mut observation: WeatherObservation = reading("Light rain").into();
        assert_eq!(observation.condition, WeatherCondition::Rainy);

        observation.description = "Sunny".to_string();
        assert_eq!(observation.condition, WeatherCondition::Rainy);
    }

    #[test]
    fn test_humidity_is_clamped() {
        let mut raw = reading("Sunny");
        raw.humidity = 140;
        let observation: WeatherObservation = raw.into();
        assert_eq!(observation.humidity, 100);

        let mut raw = reading("Sunny");
        raw.humidity = -5;
        let observation: WeatherObservation = raw.into();
        assert_eq!(observation.humidity, 0);
    }

    #[test]
    fn test_rain_and_snow_keywords() {
        let sleet: WeatherObservation = reading("雨夹雪").into();
        assert!(sleet.mentions_rain());
        assert!(sleet.mentions_snow());

        let drizzle: WeatherObservation = reading("Drizzle").into();
        assert!(drizzle.mentions_rain());
        assert!(!drizzle.mentions_snow());
    }

    #[test]
    fn test_fallback_observation() {
        let observation = WeatherObservation::fallback(Utc::now());
        assert_eq!(observation.temperature, 20.0);
        assert_eq!(observation.humidity, 60);
        assert_eq!(observation.visibility, 10.0);
        assert_eq!(observation.condition, WeatherCondition::Cloudy);
        assert_eq!(observation.format_temperature(), "20.0°C");
    }
}
