//! Orchestration between the pure engine, the document store, and the
//! route/payment collaborators. All store writes for a booking happen
//! under the single connection mutex, which serializes concurrent
//! webhook deliveries and status updates per booking.

use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::fare::round_money;
use crate::models::{Booking, BookingStatus, DriverStatus, FareBreakdown, PaymentKind, RouteInfo, SurgeInputs};
use crate::services::{assignment, lifecycle, pricing};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub pickup_location: String,
    pub dropoff_location: String,
    /// ISO-8601 local date-time, e.g. "2025-07-01T14:00:00".
    pub pickup_datetime: String,
    pub passengers: i32,
    #[serde(default)]
    pub bad_weather: bool,
    #[serde(default)]
    pub special_event: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    #[serde(flatten)]
    pub quote: QuoteRequest,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub flight_number: Option<String>,
    pub notes: Option<String>,
}

pub struct ValidatedQuote {
    pub pickup_location: String,
    pub dropoff_location: String,
    pub pickup_datetime: NaiveDateTime,
    pub passengers: i32,
    pub surge: SurgeInputs,
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

/// Reject malformed quote fields before they reach the pricing policy,
/// which assumes validated input.
pub fn validate_quote(req: &QuoteRequest) -> Result<ValidatedQuote, AppError> {
    let pickup_location = req.pickup_location.trim().to_string();
    let dropoff_location = req.dropoff_location.trim().to_string();

    if pickup_location.is_empty() {
        return Err(AppError::InvalidInput("pickup location is required".into()));
    }
    if dropoff_location.is_empty() {
        return Err(AppError::InvalidInput("dropoff location is required".into()));
    }
    if req.passengers < 1 {
        return Err(AppError::InvalidInput(format!(
            "passenger count must be at least 1, got {}",
            req.passengers
        )));
    }
    let pickup_datetime = parse_datetime(&req.pickup_datetime).ok_or_else(|| {
        AppError::InvalidInput(format!("unparsable pickup date-time: {}", req.pickup_datetime))
    })?;

    Ok(ValidatedQuote {
        pickup_location,
        dropoff_location,
        pickup_datetime,
        passengers: req.passengers,
        surge: SurgeInputs {
            bad_weather: req.bad_weather,
            special_event: req.special_event,
        },
    })
}

pub struct QuoteResult {
    pub route: RouteInfo,
    pub fare: FareBreakdown,
}

pub async fn quote(state: &Arc<AppState>, req: &QuoteRequest) -> Result<QuoteResult, AppError> {
    let validated = validate_quote(req)?;

    let route = state
        .routes
        .route_info(&validated.pickup_location, &validated.dropoff_location)
        .await
        .map_err(|e| AppError::Routing(e.to_string()))?;

    let airport_dropoff = pricing::is_airport_dropoff(&validated.dropoff_location);
    let fare = pricing::quote(
        &route,
        &validated.pickup_datetime,
        validated.passengers,
        airport_dropoff,
        &validated.surge,
        &state.config.pricing,
    );

    Ok(QuoteResult { route, fare })
}

pub async fn create_booking(
    state: &Arc<AppState>,
    req: CreateBookingRequest,
) -> Result<Booking, AppError> {
    let validated = validate_quote(&req.quote)?;
    if req.customer_name.trim().is_empty() {
        return Err(AppError::InvalidInput("customer name is required".into()));
    }
    if req.email.trim().is_empty() || !req.email.contains('@') {
        return Err(AppError::InvalidInput("a valid email is required".into()));
    }
    if req.phone.trim().is_empty() {
        return Err(AppError::InvalidInput("phone number is required".into()));
    }

    let quoted = quote(state, &req.quote).await?;

    let booking = lifecycle::create(
        lifecycle::NewBookingFields {
            customer_name: req.customer_name.trim().to_string(),
            email: req.email.trim().to_string(),
            phone: req.phone.trim().to_string(),
            pickup_location: validated.pickup_location,
            dropoff_location: validated.dropoff_location,
            pickup_datetime: validated.pickup_datetime,
            passengers: validated.passengers,
            flight_number: req.flight_number,
            notes: req.notes,
        },
        &quoted.route,
        &quoted.fare,
    );

    {
        let db = state.db.lock().unwrap();
        queries::create_booking(&db, &booking)?;
    }

    tracing::info!(
        booking_id = %booking.id,
        fare = booking.dynamic_fare,
        surge = booking.surge_multiplier,
        "booking created"
    );

    // Deposit link for the configured fraction of the fare. A payment
    // provider failure leaves the booking pending without a link; the
    // admin surface can retry.
    let deposit = round_money(state.config.pricing.deposit_fraction * booking.dynamic_fare);
    let deposit_cents = (deposit * 100.0).round() as i64;
    let description = format!(
        "Airport car deposit: {} to {}",
        booking.pickup_location, booking.dropoff_location
    );

    let mut booking = booking;
    match state
        .payments
        .create_link(deposit_cents, &description, &booking.id)
        .await
    {
        Ok(link) => {
            booking.payment_url = Some(link.payment_url);
            booking.provider_order_id = Some(link.provider_order_id);
            booking.updated_at = Utc::now().naive_utc();
            let db = state.db.lock().unwrap();
            queries::update_booking(&db, &booking)?;
        }
        Err(e) => {
            tracing::error!(booking_id = %booking.id, error = %e, "payment link creation failed");
        }
    }

    Ok(booking)
}

/// Apply a payment-webhook event. Idempotent per transaction id: the
/// ledger insert and the balance update share one critical section, so
/// two near-simultaneous deliveries cannot double-count.
pub fn apply_payment_event(
    state: &Arc<AppState>,
    booking_id: &str,
    amount: f64,
    kind: PaymentKind,
    transaction_id: &str,
) -> Result<Booking, AppError> {
    let db = state.db.lock().unwrap();

    let booking = queries::get_booking_by_id(&db, booking_id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?;

    let updated = lifecycle::apply_payment(booking, amount, kind, &state.config.pricing)?;

    let fresh = queries::record_payment(&db, transaction_id, booking_id, amount, kind.as_str())?;
    if !fresh {
        return Err(AppError::DuplicateTransaction(transaction_id.to_string()));
    }

    queries::update_booking(&db, &updated)?;

    tracing::info!(
        booking_id,
        transaction_id,
        amount,
        kind = kind.as_str(),
        status = updated.status.as_str(),
        balance_due = updated.balance_due,
        "payment applied"
    );

    Ok(updated)
}

/// Advance a booking to its next happy-path status. Moving into
/// `in_progress` first assigns the best available driver and flips
/// them busy; completing the trip releases the driver.
pub fn advance_booking(state: &Arc<AppState>, booking_id: &str) -> Result<Booking, AppError> {
    let db = state.db.lock().unwrap();

    let booking = queries::get_booking_by_id(&db, booking_id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?;

    if booking.status.is_terminal() {
        return Err(AppError::AlreadyTerminal(booking.status));
    }
    let next = lifecycle::next_status(booking.status).ok_or(AppError::InvalidTransition {
        from: booking.status,
        to: booking.status,
    })?;

    let mut booking = booking;
    if next == BookingStatus::InProgress {
        let drivers = queries::list_drivers(&db)?;
        let chosen = assignment::assign(
            &booking.pickup_datetime,
            &drivers,
            assignment::DEFAULT_CANDIDATE_POOL,
        )
        .ok_or(AppError::NoDriverAvailable)?;

        booking.driver_id = Some(chosen.id.clone());
        booking.driver_name = Some(chosen.name.clone());
        queries::update_driver_status(&db, &chosen.id, DriverStatus::Busy)?;
        tracing::info!(booking_id, driver_id = %chosen.id, "driver assigned");
    }

    let updated = lifecycle::update_status(booking, next)?;

    if next == BookingStatus::Completed {
        if let Some(driver_id) = &updated.driver_id {
            queries::update_driver_status(&db, driver_id, DriverStatus::Available)?;
        }
    }

    queries::update_booking(&db, &updated)?;
    Ok(updated)
}

pub fn cancel_booking(state: &Arc<AppState>, booking_id: &str) -> Result<Booking, AppError> {
    let db = state.db.lock().unwrap();

    let booking = queries::get_booking_by_id(&db, booking_id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?;

    let now = Utc::now().naive_utc();
    let cancelled = lifecycle::cancel(booking, &now)?;

    // Free the driver if one was already on the trip.
    if let Some(driver_id) = &cancelled.driver_id {
        queries::update_driver_status(&db, driver_id, DriverStatus::Available)?;
    }

    queries::update_booking(&db, &cancelled)?;

    tracing::info!(
        booking_id,
        fee = ?cancelled.cancellation_fee,
        "booking cancelled"
    );

    Ok(cancelled)
}
