use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::fare::round_money;
use crate::models::Booking;
use crate::services::booking_flow::{self, CreateBookingRequest};
use crate::state::AppState;

#[derive(Serialize)]
pub struct BookingResponse {
    pub id: String,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub pickup_datetime: String,
    pub passengers: i32,
    pub flight_number: Option<String>,
    pub notes: Option<String>,
    pub distance_miles: f64,
    pub duration_minutes: f64,
    pub base_fare: f64,
    pub surge_multiplier: f64,
    pub dynamic_fare: f64,
    pub traffic: String,
    pub airport_rush: bool,
    pub status: String,
    pub driver_id: Option<String>,
    pub driver_name: Option<String>,
    pub deposit_paid: bool,
    pub amount_paid: f64,
    pub balance_due: f64,
    pub tip_amount: Option<f64>,
    pub cancellation_fee: Option<f64>,
    pub payment_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        BookingResponse {
            id: b.id,
            customer_name: b.customer_name,
            email: b.email,
            phone: b.phone,
            pickup_location: b.pickup_location,
            dropoff_location: b.dropoff_location,
            pickup_datetime: b.pickup_datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
            passengers: b.passengers,
            flight_number: b.flight_number,
            notes: b.notes,
            distance_miles: b.distance_miles,
            duration_minutes: b.duration_minutes,
            base_fare: round_money(b.base_fare),
            surge_multiplier: b.surge_multiplier,
            dynamic_fare: round_money(b.dynamic_fare),
            traffic: b.traffic.as_str().to_string(),
            airport_rush: b.airport_rush,
            status: b.status.as_str().to_string(),
            driver_id: b.driver_id,
            driver_name: b.driver_name,
            deposit_paid: b.deposit_paid,
            amount_paid: round_money(b.amount_paid),
            balance_due: round_money(b.balance_due),
            tip_amount: b.tip_amount.map(round_money),
            cancellation_fee: b.cancellation_fee.map(round_money),
            payment_url: b.payment_url,
            created_at: b.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            updated_at: b.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let booking = booking_flow::create_booking(&state, req).await?;
    Ok((StatusCode::CREATED, Json(booking.into())))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_id(&db, &id)?
    }
    .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

    Ok(Json(booking.into()))
}

// POST /api/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    let cancelled = booking_flow::cancel_booking(&state, &id)?;
    Ok(Json(cancelled.into()))
}

// POST /api/bookings/:id/advance
pub async fn advance_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    let updated = booking_flow::advance_booking(&state, &id)?;
    Ok(Json(updated.into()))
}
