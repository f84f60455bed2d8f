use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One ride reservation. Created with a fare already computed; mutated
/// only through the lifecycle operations, never deleted (cancellation
/// is a status, not a removal).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub pickup_datetime: NaiveDateTime,
    pub passengers: i32,
    pub flight_number: Option<String>,
    pub notes: Option<String>,

    // Derived at creation from the route + pricing policy.
    pub distance_miles: f64,
    pub duration_minutes: f64,
    pub base_fare: f64,
    pub airport_fee: f64,
    pub time_fee: f64,
    pub passenger_fee: f64,
    pub surge_multiplier: f64,
    pub surge_fee: f64,
    pub dynamic_fare: f64,
    pub traffic: TrafficLevel,
    pub airport_rush: bool,

    // Lifecycle state.
    pub status: BookingStatus,
    pub driver_id: Option<String>,
    pub driver_name: Option<String>,
    pub deposit_paid: bool,
    pub amount_paid: f64,
    pub balance_due: f64,
    pub tip_amount: Option<f64>,
    pub cancellation_fee: Option<f64>,
    pub provider_order_id: Option<String>,
    pub payment_url: Option<String>,
    pub reminder_sent: bool,
    pub on_my_way_sent: bool,
    pub customer_rating: Option<f64>,
    pub driver_rating: Option<f64>,
    pub feedback: Option<String>,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "confirmed" => BookingStatus::Confirmed,
            "in_progress" => BookingStatus::InProgress,
            "completed" => BookingStatus::Completed,
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

/// Coarse congestion bucket derived from actual vs expected trip speed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrafficLevel {
    Low,
    Medium,
    High,
}

impl TrafficLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrafficLevel::Low => "low",
            TrafficLevel::Medium => "medium",
            TrafficLevel::High => "high",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "high" => TrafficLevel::High,
            "medium" => TrafficLevel::Medium,
            _ => TrafficLevel::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    Deposit,
    Balance,
    Full,
    Tip,
}

impl PaymentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentKind::Deposit => "deposit",
            PaymentKind::Balance => "balance",
            PaymentKind::Full => "full",
            PaymentKind::Tip => "tip",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "deposit" => Some(PaymentKind::Deposit),
            "balance" => Some(PaymentKind::Balance),
            "full" => Some(PaymentKind::Full),
            "tip" => Some(PaymentKind::Tip),
            _ => None,
        }
    }
}
