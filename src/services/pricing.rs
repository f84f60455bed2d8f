//! Fare quote computation. Pure and deterministic: route info is
//! passed in, never fetched here, and invalid inputs are rejected by
//! the caller before this module is reached.

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};

use crate::config::PricingConfig;
use crate::models::{FareBreakdown, RouteInfo, SurgeInputs, TrafficLevel};

/// Policy list of airport names/codes, matched case-insensitively as
/// substrings of the dropoff location. Not a geocoding lookup.
const AIRPORT_NAMES: &[&str] = &[
    "airport",
    "jfk",
    "lga",
    "laguardia",
    "ewr",
    "newark liberty",
    "john f. kennedy",
    "intl",
    "international terminal",
];

/// Expected free-flow speed in mph; the traffic surge factor kicks in
/// below 70% of this.
const EXPECTED_SPEED_MPH: f64 = 30.0;
const TRAFFIC_TRIGGER_RATIO: f64 = 0.7;

pub fn is_airport_dropoff(dropoff_location: &str) -> bool {
    let needle = dropoff_location.to_lowercase();
    AIRPORT_NAMES.iter().any(|name| needle.contains(name))
}

/// Average trip speed implied by the route, in mph.
fn actual_speed_mph(route: &RouteInfo) -> f64 {
    if route.duration_minutes <= 0.0 {
        return EXPECTED_SPEED_MPH;
    }
    route.distance_miles / (route.duration_minutes / 60.0)
}

pub fn classify_traffic(route: &RouteInfo) -> TrafficLevel {
    let ratio = actual_speed_mph(route) / EXPECTED_SPEED_MPH;
    if ratio < 0.5 {
        TrafficLevel::High
    } else if ratio < 0.75 {
        TrafficLevel::Medium
    } else {
        TrafficLevel::Low
    }
}

/// Airport rush hour: weekday commute windows plus the Friday and
/// Sunday evening travel peaks.
pub fn is_airport_rush(pickup: &NaiveDateTime) -> bool {
    let weekday = pickup.date().weekday();
    let hour = pickup.time().hour();

    let commute = matches!(
        weekday,
        Weekday::Mon | Weekday::Tue | Weekday::Wed | Weekday::Thu | Weekday::Fri
    ) && ((6..=10).contains(&hour) || (16..=20).contains(&hour));

    commute
        || (weekday == Weekday::Fri && hour >= 16)
        || (weekday == Weekday::Sun && hour >= 16)
}

fn time_fee(pickup: &NaiveDateTime, config: &PricingConfig) -> f64 {
    let hour = pickup.time().hour();
    // Mutually exclusive, first match wins.
    if hour >= 22 || hour < 6 {
        config.late_night_fee
    } else if hour < 9 {
        config.early_morning_fee
    } else {
        0.0
    }
}

fn surge_multiplier(
    pickup: &NaiveDateTime,
    route: &RouteInfo,
    surge: &SurgeInputs,
    config: &PricingConfig,
) -> f64 {
    if !config.surge_enabled {
        return 1.0;
    }

    let mut multiplier = 1.0;
    if is_airport_rush(pickup) {
        multiplier *= config.rush_weight;
    }
    if surge.bad_weather {
        multiplier *= config.weather_weight;
    }
    if actual_speed_mph(route) < TRAFFIC_TRIGGER_RATIO * EXPECTED_SPEED_MPH {
        multiplier *= config.traffic_weight;
    }
    if surge.special_event {
        multiplier *= config.event_weight;
    }

    multiplier.min(config.max_surge)
}

/// Compute the itemized fare for a validated quote request.
pub fn quote(
    route: &RouteInfo,
    pickup: &NaiveDateTime,
    passengers: i32,
    airport_dropoff: bool,
    surge: &SurgeInputs,
    config: &PricingConfig,
) -> FareBreakdown {
    let base_fare = route.distance_miles * config.base_rate;
    let airport_fee = if airport_dropoff {
        config.airport_fee
    } else {
        0.0
    };
    let time_fee = time_fee(pickup, config);
    let extra_passengers = (passengers - 1).max(0) as f64;
    let passenger_fee = extra_passengers * config.per_passenger_fee;

    let surge_multiplier = surge_multiplier(pickup, route, surge, config);
    let subtotal = base_fare + airport_fee + time_fee + passenger_fee;
    let surge_fee = subtotal * (surge_multiplier - 1.0);
    let dynamic_fare = subtotal + surge_fee;

    FareBreakdown {
        base_fare,
        airport_fee,
        time_fee,
        passenger_fee,
        surge_multiplier,
        surge_fee,
        dynamic_fare,
        traffic: classify_traffic(route),
        airport_rush: is_airport_rush(pickup),
    }
}
