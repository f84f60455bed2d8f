pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the application router. Shared with the integration tests so
/// they exercise the same routing table as the binary.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/quote", post(handlers::quote::get_quote))
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route("/api/bookings/:id", get(handlers::bookings::get_booking))
        .route(
            "/api/bookings/:id/cancel",
            post(handlers::bookings::cancel_booking),
        )
        .route(
            "/api/bookings/:id/advance",
            post(handlers::bookings::advance_booking),
        )
        .route("/webhook/payment", post(handlers::webhook::payment_webhook))
        .route("/api/admin/status", get(handlers::admin::get_status))
        .route("/api/admin/bookings", get(handlers::admin::get_bookings))
        .route("/api/admin/drivers", get(handlers::admin::get_drivers))
        .route("/api/admin/drivers", post(handlers::admin::upsert_driver))
        .with_state(state)
}
