//! Travel tips shown alongside a plan.

use super::impact::ImpactAssessment;
use super::schedule::buffer_minutes;
use crate::models::{RouteSummary, TransportMode, WeatherObservation};

/// Build the ordered list of travel tips for a plan
#[must_use]
pub fn compose(
    weather: &WeatherObservation,
    route: &RouteSummary,
    impact: &ImpactAssessment,
) -> Vec<String> {
    let mut tips = Vec::with_capacity(6 + impact.recommendations.len());

    tips.push(format!(
        "Estimated travel time {} minutes; set off {} minutes early",
        route.duration,
        buffer_minutes(route.duration)
    ));

    if weather.temperature > 30.0 {
        tips.push("Hot weather: bring plenty of water and sun protection".to_string());
    } else if weather.temperature < 0.0 {
        tips.push("Below freezing: dress warmly, roads may be icy".to_string());
    }

    if weather.humidity > 80 {
        tips.push("High humidity can feel stuffy; wear breathable clothing".to_string());
    }

    if weather.wind_speed > 30.0 {
        tips.push("Windy: keep your footing and beware of falling objects".to_string());
    }

    match route.transport_mode {
        TransportMode::Driving => {
            tips.push("Driving: follow traffic rules and drive safely".to_string());
            if weather.mentions_rain() || weather.mentions_snow() {
                tips.push("Wet roads: reduce speed and keep a longer following distance".to_string());
            }
        }
        TransportMode::Walking => {
            tips.push("Walking: mind the traffic and stay on the sidewalk".to_string());
            if weather.temperature > 25.0 {
                tips.push("It's warm out: pick shaded streets and take breaks".to_string());
            }
        }
        TransportMode::Cycling => {
            tips.push("Cycling: wear a helmet and mind the traffic".to_string());
            if weather.wind_speed > 40.0 {
                tips.push("Strong wind: take extra care on the bike".to_string());
            }
        }
        TransportMode::Transit => {
            tips.push("Public transport: check the timetable before you leave".to_string());
        }
    }

    tips.extend(impact.recommendations.iter().cloned());
    tips
}
