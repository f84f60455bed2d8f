use serde::{Deserialize, Serialize};

use crate::models::TrafficLevel;

/// Distance and duration for a pickup/dropoff pair, as reported by the
/// route-info collaborator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RouteInfo {
    pub distance_miles: f64,
    pub duration_minutes: f64,
}

/// Demand signals feeding the surge multiplier. Weather and special
/// events are upstream stubs today; `None` contributes a factor of 1.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurgeInputs {
    pub bad_weather: bool,
    pub special_event: bool,
}

/// Itemized fare quote. All amounts carry full float precision; they
/// are rounded to cents only at the persistence/display boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FareBreakdown {
    pub base_fare: f64,
    pub airport_fee: f64,
    pub time_fee: f64,
    pub passenger_fee: f64,
    pub surge_multiplier: f64,
    pub surge_fee: f64,
    pub dynamic_fare: f64,
    pub traffic: TrafficLevel,
    pub airport_rush: bool,
}

/// Round to 2 decimals. Applied when a monetary value crosses the
/// persistence or display boundary, never inside the policy math.
pub fn round_money(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
