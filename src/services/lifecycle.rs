//! Booking state machine and payment bookkeeping. Every operation
//! takes a booking value and returns it updated; persistence belongs
//! to the caller.

use chrono::{NaiveDateTime, Utc};

use crate::config::PricingConfig;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, FareBreakdown, PaymentKind, RouteInfo};

pub struct NewBookingFields {
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub pickup_datetime: NaiveDateTime,
    pub passengers: i32,
    pub flight_number: Option<String>,
    pub notes: Option<String>,
}

/// Construct a new pending booking from validated fields and a fare
/// computed atomically with creation.
pub fn create(fields: NewBookingFields, route: &RouteInfo, fare: &FareBreakdown) -> Booking {
    let now = Utc::now().naive_utc();
    Booking {
        id: uuid::Uuid::new_v4().to_string(),
        customer_name: fields.customer_name,
        email: fields.email,
        phone: fields.phone,
        pickup_location: fields.pickup_location,
        dropoff_location: fields.dropoff_location,
        pickup_datetime: fields.pickup_datetime,
        passengers: fields.passengers,
        flight_number: fields.flight_number,
        notes: fields.notes,
        distance_miles: route.distance_miles,
        duration_minutes: route.duration_minutes,
        base_fare: fare.base_fare,
        airport_fee: fare.airport_fee,
        time_fee: fare.time_fee,
        passenger_fee: fare.passenger_fee,
        surge_multiplier: fare.surge_multiplier,
        surge_fee: fare.surge_fee,
        dynamic_fare: fare.dynamic_fare,
        traffic: fare.traffic,
        airport_rush: fare.airport_rush,
        status: BookingStatus::Pending,
        driver_id: None,
        driver_name: None,
        deposit_paid: false,
        amount_paid: 0.0,
        balance_due: fare.dynamic_fare,
        tip_amount: None,
        cancellation_fee: None,
        provider_order_id: None,
        payment_url: None,
        reminder_sent: false,
        on_my_way_sent: false,
        customer_rating: None,
        driver_rating: None,
        feedback: None,
        created_at: now,
        updated_at: now,
    }
}

/// One-directional transition table, except that any non-terminal
/// state may move to cancelled (via `cancel`, which also computes the
/// fee).
fn transition_allowed(from: BookingStatus, to: BookingStatus) -> bool {
    matches!(
        (from, to),
        (BookingStatus::Pending, BookingStatus::Confirmed)
            | (BookingStatus::Confirmed, BookingStatus::InProgress)
            | (BookingStatus::InProgress, BookingStatus::Completed)
    )
}

/// The single happy-path successor of a state, if any.
pub fn next_status(from: BookingStatus) -> Option<BookingStatus> {
    match from {
        BookingStatus::Pending => Some(BookingStatus::Confirmed),
        BookingStatus::Confirmed => Some(BookingStatus::InProgress),
        BookingStatus::InProgress => Some(BookingStatus::Completed),
        BookingStatus::Completed | BookingStatus::Cancelled => None,
    }
}

pub fn update_status(mut booking: Booking, to: BookingStatus) -> Result<Booking, AppError> {
    if booking.status.is_terminal() {
        return Err(AppError::AlreadyTerminal(booking.status));
    }
    if !transition_allowed(booking.status, to) {
        return Err(AppError::InvalidTransition {
            from: booking.status,
            to,
        });
    }

    booking.status = to;
    if to == BookingStatus::Completed {
        // Trip done: freeze the balance at whatever remains unpaid.
        booking.balance_due = (booking.dynamic_fare - booking.amount_paid).max(0.0);
    }
    booking.updated_at = Utc::now().naive_utc();
    Ok(booking)
}

/// Record a payment and advance `pending -> confirmed` once the paid
/// total reaches the deposit threshold. Tips are tracked separately
/// and never reduce the balance.
pub fn apply_payment(
    mut booking: Booking,
    amount: f64,
    kind: PaymentKind,
    config: &PricingConfig,
) -> Result<Booking, AppError> {
    if amount <= 0.0 {
        return Err(AppError::InvalidPaymentAmount(amount));
    }

    if kind == PaymentKind::Tip {
        // Tip capture is allowed during and after the trip.
        if !matches!(
            booking.status,
            BookingStatus::InProgress | BookingStatus::Completed
        ) {
            return Err(AppError::InvalidInput(format!(
                "tip not accepted while booking is {}",
                booking.status.as_str()
            )));
        }
        booking.tip_amount = Some(booking.tip_amount.unwrap_or(0.0) + amount);
        booking.updated_at = Utc::now().naive_utc();
        return Ok(booking);
    }

    if booking.status.is_terminal() {
        return Err(AppError::AlreadyTerminal(booking.status));
    }

    booking.amount_paid += amount;
    booking.balance_due = (booking.dynamic_fare - booking.amount_paid).max(0.0);
    if matches!(kind, PaymentKind::Deposit | PaymentKind::Full) {
        booking.deposit_paid = true;
    }

    let required = config.deposit_fraction * booking.dynamic_fare;
    if booking.status == BookingStatus::Pending && booking.amount_paid >= required {
        booking.status = BookingStatus::Confirmed;
    }

    booking.updated_at = Utc::now().naive_utc();
    Ok(booking)
}

/// Cancellation fee as a share of the amount already paid, tiered by
/// time remaining until pickup: >24h free, 3-24h half, <3h full.
pub fn cancellation_fee(booking: &Booking, now: &NaiveDateTime) -> f64 {
    let until_pickup = booking.pickup_datetime.signed_duration_since(*now);
    let hours = until_pickup.num_minutes() as f64 / 60.0;

    if hours > 24.0 {
        0.0
    } else if hours >= 3.0 {
        booking.amount_paid * 0.5
    } else {
        booking.amount_paid
    }
}

pub fn cancel(mut booking: Booking, now: &NaiveDateTime) -> Result<Booking, AppError> {
    if booking.status.is_terminal() {
        return Err(AppError::AlreadyTerminal(booking.status));
    }

    booking.cancellation_fee = Some(cancellation_fee(&booking, now));
    booking.status = BookingStatus::Cancelled;
    booking.updated_at = Utc::now().naive_utc();
    Ok(booking)
}
