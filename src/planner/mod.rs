//! Travel planning engine
//!
//! `impact`, `schedule` and `advisory` are pure functions over already
//! fetched data. `orchestrator` wires them to the external providers.

pub mod advisory;
pub mod impact;
pub mod orchestrator;
pub mod schedule;

pub use advisory::compose;
pub use impact::{ImpactAssessment, Severity, analyze};
pub use orchestrator::{
    BatchFailure, BatchReport, PlanOutcome, PlanRequest, PlannerSettings, RouteForecast,
    TravelPlan, TravelPlanner, WeatherSource,
};
pub use schedule::{TimingPlan, schedule};
