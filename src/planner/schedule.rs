//! Departure scheduling
//!
//! Turns a route and its weather impact into concrete departure and arrival
//! times. The current time is always passed in, never read from the clock,
//! and every computed time is whole minutes.

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use super::impact::ImpactAssessment;
use crate::models::RouteSummary;

/// Minimum buffer added on top of the adjusted duration, in minutes
pub const MIN_BUFFER_MINUTES: u32 = 10;
const BUFFER_RATIO: f64 = 0.1;
const ARRIVAL_FORMAT: &str = "%H:%M";

/// Departure/arrival times and the durations behind them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingPlan {
    pub departure: NaiveDateTime,
    pub arrival: NaiveDateTime,
    /// Route duration as reported by the provider, in minutes
    pub base_duration: u32,
    /// Base duration scaled by the weather multiplier
    pub adjusted_duration: u32,
    pub buffer_duration: u32,
    /// `adjusted_duration + buffer_duration`
    pub total_duration: u32,
}

impl TimingPlan {
    /// Departure as `HH:MM`
    #[must_use]
    pub fn departure_hhmm(&self) -> String {
        self.departure.format(ARRIVAL_FORMAT).to_string()
    }

    /// Arrival as `HH:MM`
    #[must_use]
    pub fn arrival_hhmm(&self) -> String {
        self.arrival.format(ARRIVAL_FORMAT).to_string()
    }
}

/// Buffer for a trip of `minutes`: ten percent, never less than ten minutes
#[must_use]
pub fn buffer_minutes(minutes: u32) -> u32 {
    round_minutes(f64::from(minutes) * BUFFER_RATIO).max(MIN_BUFFER_MINUTES)
}

fn round_minutes(value: f64) -> u32 {
    // saturates at both ends
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let minutes = value.round().max(0.0) as u32;
    minutes
}

/// Drop seconds and sub-seconds
fn whole_minute(time: NaiveDateTime) -> NaiveDateTime {
    time.with_second(0)
        .and_then(|time| time.with_nanosecond(0))
        .unwrap_or(time)
}

/// Resolve an `HH:MM` target against `now`: today, or tomorrow once passed
fn resolve_arrival(preferred: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let time = NaiveTime::parse_from_str(preferred.trim(), ARRIVAL_FORMAT).ok()?;
    let today = now.date().and_time(time);
    if today < now {
        Some(today + Duration::days(1))
    } else {
        Some(today)
    }
}

/// Compute the timing plan for `route` under `impact`
#[must_use]
pub fn schedule(
    route: &RouteSummary,
    impact: &ImpactAssessment,
    preferred_arrival: Option<&str>,
    now: NaiveDateTime,
) -> TimingPlan {
    let now = whole_minute(now);
    let base_duration = route.duration;
    let adjusted_duration = round_minutes(f64::from(base_duration) * impact.duration_multiplier);
    let buffer_duration = buffer_minutes(adjusted_duration);
    let total_duration = adjusted_duration.saturating_add(buffer_duration);
    let total = Duration::minutes(i64::from(total_duration));

    let departure = match preferred_arrival {
        Some(preferred) => match resolve_arrival(preferred, now) {
            Some(arrival) => arrival - total,
            None => {
                tracing::debug!(preferred, "unparseable preferred arrival, departing now");
                now
            }
        },
        None => now,
    };

    TimingPlan {
        departure,
        arrival: departure + total,
        base_duration,
        adjusted_duration,
        buffer_duration,
        total_duration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransportMode;
    use crate::planner::test_support::{at, route};
    use rstest::rstest;

    fn impact(multiplier: f64) -> ImpactAssessment {
        ImpactAssessment {
            duration_multiplier: multiplier,
            ..ImpactAssessment::default()
        }
    }

    #[test]
    fn test_light_rain_walking_durations() {
        let plan = schedule(&route(TransportMode::Walking, 30), &impact(1.3), None, at(12, 0));

        assert_eq!(plan.base_duration, 30);
        assert_eq!(plan.adjusted_duration, 39);
        assert_eq!(plan.buffer_duration, 10);
        assert_eq!(plan.total_duration, 49);
    }

    #[rstest]
    #[case(0, 1.0, 0, 10)]
    #[case(60, 1.0, 60, 10)]
    #[case(150, 1.0, 150, 15)]
    #[case(104, 1.0, 104, 10)]
    #[case(105, 1.0, 105, 11)]
    #[case(200, 1.5, 300, 30)]
    fn test_buffer_and_adjustment(
        #[case] base: u32,
        #[case] multiplier: f64,
        #[case] adjusted: u32,
        #[case] buffer: u32,
    ) {
        let plan = schedule(&route(TransportMode::Driving, base), &impact(multiplier), None, at(9, 0));

        assert_eq!(plan.adjusted_duration, adjusted);
        assert_eq!(plan.buffer_duration, buffer);
        assert_eq!(plan.total_duration, plan.adjusted_duration + plan.buffer_duration);
        assert!(plan.buffer_duration >= MIN_BUFFER_MINUTES);
    }

    #[test]
    fn test_without_preferred_arrival_departs_now() {
        let now = at(8, 0);
        let plan = schedule(&route(TransportMode::Driving, 60), &impact(1.4), None, now);

        assert_eq!(plan.departure, now);
        assert_eq!(plan.adjusted_duration, 84);
        assert_eq!(plan.total_duration, 94);
        assert_eq!(plan.arrival, now + Duration::minutes(94));
        assert_eq!(plan.arrival_hhmm(), "09:34");
    }

    #[test]
    fn test_preferred_arrival_later_today() {
        let now = at(7, 0);
        let plan = schedule(&route(TransportMode::Driving, 40), &impact(1.0), Some("09:00"), now);

        assert_eq!(plan.arrival, at(9, 0));
        assert_eq!(plan.departure, at(9, 0) - Duration::minutes(50));
        assert_eq!(plan.departure_hhmm(), "08:10");
    }

    #[test]
    fn test_passed_arrival_rolls_to_tomorrow() {
        let now = at(9, 0);
        let plan = schedule(&route(TransportMode::Walking, 30), &impact(1.3), Some("07:00"), now);

        let tomorrow_seven = at(7, 0) + Duration::days(1);
        assert_eq!(plan.arrival, tomorrow_seven);
        assert_eq!(plan.departure, tomorrow_seven - Duration::minutes(49));
    }

    #[test]
    fn test_arrival_equal_to_now_stays_today() {
        let now = at(9, 0);
        let plan = schedule(&route(TransportMode::Driving, 10), &impact(1.0), Some("09:00"), now);

        assert_eq!(plan.arrival, now);
    }

    #[rstest]
    #[case(37, 123_456_789)]
    #[case(59, 999_999_999)]
    #[case(0, 1)]
    fn test_times_are_whole_minutes(#[case] second: u32, #[case] nano: u32) {
        let now = at(8, 0).with_second(second).unwrap().with_nanosecond(nano).unwrap();
        let plan = schedule(&route(TransportMode::Driving, 60), &impact(1.0), None, now);

        assert_eq!(plan.departure, at(8, 0));
        assert_eq!(plan.arrival, at(9, 10));
    }

    #[test]
    fn test_arrival_in_the_current_minute_stays_today() {
        let now = at(8, 0).with_second(37).unwrap();
        let plan = schedule(&route(TransportMode::Driving, 10), &impact(1.0), Some("08:00"), now);

        assert_eq!(plan.arrival, at(8, 0));
        assert_eq!(plan.departure, at(7, 40));
    }

    #[test]
    fn test_huge_duration_saturates() {
        let plan = schedule(&route(TransportMode::Driving, u32::MAX), &impact(2.0), None, at(8, 0));

        assert_eq!(plan.adjusted_duration, u32::MAX);
        assert_eq!(plan.total_duration, u32::MAX);
        assert_eq!(plan.departure, at(8, 0));
        assert!(plan.arrival > plan.departure);
    }

    #[rstest]
    #[case("7 o'clock")]
    #[case("25:00")]
    #[case("")]
    fn test_malformed_arrival_departs_now(#[case] preferred: &str) {
        let now = at(10, 15);
        let plan = schedule(&route(TransportMode::Transit, 20), &impact(1.0), Some(preferred), now);

        assert_eq!(plan.departure, now);
        assert_eq!(plan.arrival, now + Duration::minutes(i64::from(plan.total_duration)));
    }
}
