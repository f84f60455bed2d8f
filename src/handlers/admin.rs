use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::handlers::bookings::BookingResponse;
use crate::models::fare::round_money;
use crate::models::{Driver, DriverStatus, Vehicle};
use crate::state::AppState;

#[allow(clippy::result_large_err)]
fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), Response> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "unauthorized"})),
        )
            .into_response());
    }
    Ok(())
}

fn internal_error(e: impl std::fmt::Display) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": e.to_string()})),
    )
        .into_response()
}

// GET /api/admin/status
#[derive(Serialize)]
pub struct StatusResponse {
    pending_count: i64,
    upcoming_confirmed_count: i64,
    completed_count: i64,
    cancelled_count: i64,
    available_drivers: i64,
    revenue_collected: f64,
}

pub async fn get_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<StatusResponse>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let stats = {
        let db = state.db.lock().unwrap();
        queries::get_dashboard_stats(&db).map_err(internal_error)?
    };

    Ok(Json(StatusResponse {
        pending_count: stats.pending_count,
        upcoming_confirmed_count: stats.upcoming_confirmed_count,
        completed_count: stats.completed_count,
        cancelled_count: stats.cancelled_count,
        available_drivers: stats.available_drivers,
        revenue_collected: round_money(stats.revenue_collected),
    }))
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(50);
    let status_filter = query.status.as_deref();

    let bookings = {
        let db = state.db.lock().unwrap();
        queries::get_all_bookings(&db, status_filter, limit).map_err(internal_error)?
    };

    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}

// GET /api/admin/drivers
#[derive(Serialize)]
pub struct DriverResponse {
    id: String,
    name: String,
    phone: String,
    email: String,
    status: String,
    rating: f64,
    total_rides: i64,
    vehicle_make: String,
    vehicle_model: String,
    vehicle_year: i32,
    vehicle_color: String,
    vehicle_plate: String,
    start_time: String,
    end_time: String,
    days_of_week: Vec<u32>,
}

impl From<Driver> for DriverResponse {
    fn from(d: Driver) -> Self {
        DriverResponse {
            id: d.id,
            name: d.name,
            phone: d.phone,
            email: d.email,
            status: d.status.as_str().to_string(),
            rating: d.rating,
            total_rides: d.total_rides,
            vehicle_make: d.vehicle.make,
            vehicle_model: d.vehicle.model,
            vehicle_year: d.vehicle.year,
            vehicle_color: d.vehicle.color,
            vehicle_plate: d.vehicle.plate,
            start_time: d.start_time,
            end_time: d.end_time,
            days_of_week: d.days_of_week,
        }
    }
}

pub async fn get_drivers(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<DriverResponse>>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let drivers = {
        let db = state.db.lock().unwrap();
        queries::list_drivers(&db).map_err(internal_error)?
    };

    Ok(Json(drivers.into_iter().map(Into::into).collect()))
}

// POST /api/admin/drivers
#[derive(Deserialize)]
pub struct UpsertDriverRequest {
    pub id: Option<String>,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub status: Option<String>,
    pub rating: Option<f64>,
    pub vehicle_make: String,
    pub vehicle_model: String,
    pub vehicle_year: i32,
    pub vehicle_color: String,
    pub vehicle_plate: String,
    pub start_time: String,
    pub end_time: String,
    pub days_of_week: Vec<u32>,
}

pub async fn upsert_driver(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<UpsertDriverRequest>,
) -> Result<Json<DriverResponse>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    if body.days_of_week.iter().any(|d| *d > 6) {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({"error": "days_of_week entries must be 0-6"})),
        )
            .into_response());
    }

    let driver = Driver {
        id: body
            .id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        name: body.name,
        phone: body.phone,
        email: body.email,
        status: body
            .status
            .as_deref()
            .map(DriverStatus::parse)
            .unwrap_or(DriverStatus::Available),
        rating: body.rating.unwrap_or(5.0).clamp(0.0, 5.0),
        total_rides: 0,
        vehicle: Vehicle {
            make: body.vehicle_make,
            model: body.vehicle_model,
            year: body.vehicle_year,
            color: body.vehicle_color,
            plate: body.vehicle_plate,
        },
        start_time: body.start_time,
        end_time: body.end_time,
        days_of_week: body.days_of_week,
    };

    {
        let db = state.db.lock().unwrap();
        queries::upsert_driver(&db, &driver).map_err(internal_error)?;
    }

    Ok(Json(driver.into()))
}
