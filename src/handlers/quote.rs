use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::fare::round_money;
use crate::services::booking_flow::{self, QuoteRequest};
use crate::state::AppState;

#[derive(Serialize)]
pub struct QuoteResponse {
    pub distance_miles: f64,
    pub duration_minutes: f64,
    pub base_fare: f64,
    pub airport_fee: f64,
    pub time_fee: f64,
    pub passenger_fee: f64,
    pub surge_multiplier: f64,
    pub surge_fee: f64,
    pub dynamic_fare: f64,
    pub traffic: String,
    pub airport_rush: bool,
}

// POST /api/quote
pub async fn get_quote(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, AppError> {
    let quoted = booking_flow::quote(&state, &req).await?;
    let fare = quoted.fare;

    Ok(Json(QuoteResponse {
        distance_miles: quoted.route.distance_miles,
        duration_minutes: quoted.route.duration_minutes,
        base_fare: round_money(fare.base_fare),
        airport_fee: round_money(fare.airport_fee),
        time_fee: round_money(fare.time_fee),
        passenger_fee: round_money(fare.passenger_fee),
        surge_multiplier: fare.surge_multiplier,
        surge_fee: round_money(fare.surge_fee),
        dynamic_fare: round_money(fare.dynamic_fare),
        traffic: fare.traffic.as_str().to_string(),
        airport_rush: fare.airport_rush,
    }))
}
