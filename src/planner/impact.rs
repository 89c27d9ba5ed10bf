//! Weather Impact Analysis
//!
//! Scores how a weather observation affects a route. The rules form a fixed,
//! ordered table; each rule can only raise the severity and the duration
//! multiplier, and appends its notes in table order.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{RouteSummary, TransportMode, WeatherObservation};

/// Qualitative risk level of the weather for a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        };
        f.write_str(label)
    }
}

/// Result of analyzing one (weather, route) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactAssessment {
    /// Overall severity
    pub severity: Severity,
    /// Factor (>= 1.0) applied to the base route duration
    pub duration_multiplier: f64,
    /// Advice, in rule order
    pub recommendations: Vec<String>,
    /// Safety warnings, in rule order
    pub warnings: Vec<String>,
}

impl Default for ImpactAssessment {
    fn default() -> Self {
        Self {
            severity: Severity::Low,
            duration_multiplier: 1.0,
            recommendations: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ImpactAssessment {
    /// Raise severity to at least `level`
    fn escalate(&mut self, level: Severity) {
        self.severity = self.severity.max(level);
    }

    /// Raise the multiplier to at least `factor`
    fn slow_down(&mut self, factor: f64) {
        self.duration_multiplier = self.duration_multiplier.max(factor);
    }

    fn recommend(&mut self, text: &str) {
        self.recommendations.push(text.to_string());
    }

    fn warn(&mut self, text: &str) {
        self.warnings.push(text.to_string());
    }
}

/// One entry of the rule table
struct ImpactRule {
    name: &'static str,
    applies: fn(&WeatherObservation) -> bool,
    apply: fn(&mut ImpactAssessment, TransportMode),
}

const HIGH_WIND_KMH: f64 = 50.0;
const HEAT_CELSIUS: f64 = 35.0;
const SEVERE_COLD_CELSIUS: f64 = -10.0;
const VERY_LOW_VISIBILITY_KM: f64 = 1.0;
const LOW_VISIBILITY_KM: f64 = 5.0;

static RULES: &[ImpactRule] = &[
    ImpactRule {
        name: "rain",
        applies: WeatherObservation::mentions_rain,
        apply: |impact, mode| {
            impact.escalate(Severity::Medium);
            impact.slow_down(1.2);
            impact.recommend("Roads are slippery in the rain: reduce speed and keep a longer following distance");
            match mode {
                TransportMode::Walking => {
                    impact.slow_down(1.3);
                    impact.recommend("Carry rain gear and prefer covered walkways");
                }
                TransportMode::Cycling => {
                    impact.slow_down(1.5);
                    impact.warn("Cycling in the rain is dangerous; consider another mode of transport");
                }
                TransportMode::Driving | TransportMode::Transit => {}
            }
        },
    },
    ImpactRule {
        name: "snow",
        applies: WeatherObservation::mentions_snow,
        apply: |impact, mode| {
            impact.escalate(Severity::High);
            impact.slow_down(1.5);
            impact.warn("Snow makes road surfaces slippery; travel with extra care");
            impact.recommend("Use snow chains or anti-slip footwear and carry emergency supplies");
            if mode.is_exposed() {
                impact.slow_down(2.0);
                impact.warn("Walking or cycling in snow is extremely dangerous; public transport is strongly recommended");
            }
        },
    },
    ImpactRule {
        name: "high_wind",
        applies: |weather| weather.wind_speed > HIGH_WIND_KMH,
        apply: |impact, mode| {
            impact.escalate(Severity::High);
            impact.warn("Strong winds: watch out for falling objects");
            if mode == TransportMode::Cycling {
                impact.slow_down(1.4);
                impact.warn("Cycling in strong winds is difficult and dangerous");
            }
        },
    },
    ImpactRule {
        name: "heat",
        applies: |weather| weather.temperature > HEAT_CELSIUS,
        apply: |impact, mode| {
            impact.recommend("Extreme heat: avoid long periods outdoors and drink water regularly");
            if mode.is_exposed() {
                impact.recommend("Choose shaded routes and bring sun protection");
            }
        },
    },
    ImpactRule {
        name: "severe_cold",
        applies: |weather| weather.temperature < SEVERE_COLD_CELSIUS,
        apply: |impact, mode| {
            impact.recommend("Severe cold: dress warmly and limit time outdoors");
            if mode.is_exposed() {
                impact.warn("Outdoor travel in severe cold carries a high risk");
            }
        },
    },
    ImpactRule {
        name: "very_low_visibility",
        applies: |weather| weather.visibility < VERY_LOW_VISIBILITY_KM,
        apply: |impact, _| {
            impact.escalate(Severity::High);
            impact.slow_down(1.6);
            impact.warn("Visibility is extremely low; travel with great caution");
        },
    },
    ImpactRule {
        name: "low_visibility",
        applies: |weather| {
            (VERY_LOW_VISIBILITY_KM..LOW_VISIBILITY_KM).contains(&weather.visibility)
        },
        apply: |impact, _| {
            impact.escalate(Severity::Medium);
            impact.slow_down(1.2);
            impact.recommend("Low visibility: switch on your lights and keep a safe distance");
        },
    },
];

/// Analyze how `weather` affects travel along `route`
#[must_use]
pub fn analyze(weather: &WeatherObservation, route: &RouteSummary) -> ImpactAssessment {
    let mut impact = ImpactAssessment::default();

    for rule in RULES {
        if (rule.applies)(weather) {
            tracing::trace!(rule = rule.name, "impact rule matched");
            (rule.apply)(&mut impact, route.transport_mode);
        }
    }

    tracing::debug!(
        severity = %impact.severity,
        multiplier = impact.duration_multiplier,
        warnings = impact.warnings.len(),
        "weather impact analyzed"
    );

    impact
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::test_support::{observation, route};
    use rstest::rstest;

    #[test]
    fn test_calm_weather_is_baseline() {
        let weather = observation("Sunny", 20.0, 10.0, 10.0);
        let impact = analyze(&weather, &route(TransportMode::Driving, 30));

        assert_eq!(impact, ImpactAssessment::default());
    }

    #[test]
    fn test_light_rain_walking() {
        let weather = observation("light rain", 15.0, 10.0, 10.0);
        let impact = analyze(&weather, &route(TransportMode::Walking, 30));

        assert_eq!(impact.severity, Severity::Medium);
        assert_eq!(impact.duration_multiplier, 1.3);
        assert_eq!(impact.recommendations.len(), 2);
        assert!(impact.recommendations[1].contains("rain gear"));
        assert!(impact.warnings.is_empty());
    }

    #[test]
    fn test_rain_cycling_warns() {
        let weather = observation("小雨", 15.0, 10.0, 10.0);
        let impact = analyze(&weather, &route(TransportMode::Cycling, 30));

        assert_eq!(impact.severity, Severity::Medium);
        assert_eq!(impact.duration_multiplier, 1.5);
        assert_eq!(impact.warnings.len(), 1);
        assert!(impact.warnings[0].contains("Cycling in the rain"));
    }

    #[test]
    fn test_heavy_snow_cycling() {
        let weather = observation("heavy snow", -2.0, 10.0, 10.0);
        let impact = analyze(&weather, &route(TransportMode::Cycling, 20));

        assert_eq!(impact.severity, Severity::High);
        assert!(impact.duration_multiplier >= 2.0);
        assert!(impact.warnings.iter().any(|w| w.contains("strongly recommended")));
    }

    #[test]
    fn test_sleet_keeps_highest_multiplier() {
        // rain sets 1.3 for walking, snow raises to 2.0, neither lowers the other
        let weather = observation("雨夹雪", 0.0, 10.0, 10.0);
        let impact = analyze(&weather, &route(TransportMode::Walking, 20));

        assert_eq!(impact.severity, Severity::High);
        assert_eq!(impact.duration_multiplier, 2.0);
        assert_eq!(impact.recommendations.len(), 3);
        assert_eq!(impact.warnings.len(), 2);
    }

    #[test]
    fn test_high_wind_driving_only_escalates_severity() {
        let weather = observation("Cloudy", 10.0, 60.0, 8.0);
        let impact = analyze(&weather, &route(TransportMode::Driving, 60));

        assert_eq!(impact.severity, Severity::High);
        assert_eq!(impact.duration_multiplier, 1.0);
        assert_eq!(impact.warnings.len(), 1);
        assert!(impact.recommendations.is_empty());
    }

    #[test]
    fn test_high_wind_cycling_slows_down() {
        let weather = observation("Cloudy", 10.0, 60.0, 8.0);
        let impact = analyze(&weather, &route(TransportMode::Cycling, 60));

        assert_eq!(impact.duration_multiplier, 1.4);
        assert_eq!(impact.warnings.len(), 2);
    }

    #[test]
    fn test_wind_does_not_lower_snow_multiplier() {
        let weather = observation("snow", -5.0, 70.0, 10.0);
        let impact = analyze(&weather, &route(TransportMode::Cycling, 60));

        assert_eq!(impact.duration_multiplier, 2.0);
        assert_eq!(impact.severity, Severity::High);
    }

    #[rstest]
    #[case(TransportMode::Walking, 2)]
    #[case(TransportMode::Cycling, 2)]
    #[case(TransportMode::Driving, 1)]
    #[case(TransportMode::Transit, 1)]
    fn test_heat_recommendations(#[case] mode: TransportMode, #[case] expected: usize) {
        let weather = observation("Sunny", 38.0, 5.0, 20.0);
        let impact = analyze(&weather, &route(mode, 15));

        assert_eq!(impact.recommendations.len(), expected);
        assert_eq!(impact.severity, Severity::Low);
        assert_eq!(impact.duration_multiplier, 1.0);
    }

    #[rstest]
    #[case(TransportMode::Walking, 1)]
    #[case(TransportMode::Driving, 0)]
    fn test_severe_cold(#[case] mode: TransportMode, #[case] warnings: usize) {
        let weather = observation("Sunny", -15.0, 5.0, 20.0);
        let impact = analyze(&weather, &route(mode, 15));

        assert_eq!(impact.recommendations.len(), 1);
        assert_eq!(impact.warnings.len(), warnings);
        assert_eq!(impact.severity, Severity::Low);
    }

    #[rstest]
    #[case(0.5, Severity::High, 1.6)]
    #[case(1.0, Severity::Medium, 1.2)]
    #[case(4.9, Severity::Medium, 1.2)]
    #[case(5.0, Severity::Low, 1.0)]
    fn test_visibility_bands(
        #[case] visibility: f64,
        #[case] severity: Severity,
        #[case] multiplier: f64,
    ) {
        let weather = observation("Foggy", 10.0, 5.0, visibility);
        let impact = analyze(&weather, &route(TransportMode::Driving, 30));

        assert_eq!(impact.severity, severity);
        assert_eq!(impact.duration_multiplier, multiplier);
    }

    #[test]
    fn test_low_visibility_does_not_downgrade_snow() {
        let weather = observation("snow", -1.0, 5.0, 3.0);
        let impact = analyze(&weather, &route(TransportMode::Driving, 30));

        assert_eq!(impact.severity, Severity::High);
        assert_eq!(impact.duration_multiplier, 1.5);
        assert!(impact.recommendations.last().unwrap().contains("switch on your lights"));
    }

    #[test]
    fn test_analyze_is_idempotent() {
        let weather = observation("thunderstorm with rain", 36.0, 55.0, 0.8);
        let route = route(TransportMode::Cycling, 45);

        assert_eq!(analyze(&weather, &route), analyze(&weather, &route));
    }

    #[test]
    fn test_invariants_hold_across_inputs() {
        let descriptions = ["Sunny", "rain", "snow", "fog", "雨夹雪", "storm"];
        let modes = [
            TransportMode::Walking,
            TransportMode::Cycling,
            TransportMode::Driving,
            TransportMode::Transit,
        ];

        for description in descriptions {
            for mode in modes {
                for (temperature, wind, visibility) in
                    [(-20.0, 0.0, 0.2), (10.0, 55.0, 3.0), (40.0, 20.0, 12.0)]
                {
                    let weather = observation(description, temperature, wind, visibility);
                    let impact = analyze(&weather, &route(mode, 30));
                    assert!(impact.duration_multiplier >= 1.0);

                    // Dropping every rule after the first match can never yield more
                    let mut partial = ImpactAssessment::default();
                    for rule in RULES {
                        if (rule.applies)(&weather) {
                            (rule.apply)(&mut partial, mode);
                            assert!(partial.severity <= impact.severity);
                            assert!(partial.duration_multiplier <= impact.duration_multiplier);
                        }
                    }
                }
            }
        }
    }
}
