use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::errors::AppError;
use crate::models::PaymentKind;
use crate::services::booking_flow;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PaymentEvent {
    pub booking_id: String,
    pub amount_cents: i64,
    pub kind: String,
    pub transaction_id: String,
}

/// Verify a `t=<timestamp>,v1=<hex hmac>` signature over
/// `"{timestamp}.{payload}"`, the scheme used by the payment provider.
fn validate_signature(secret: &str, signature: &str, payload: &str) -> bool {
    let mut timestamp = "";
    let mut provided = "";
    for part in signature.split(',') {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            provided = v;
        }
    }
    if timestamp.is_empty() || provided.is_empty() {
        return false;
    }

    let signed_payload = format!("{timestamp}.{payload}");
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(signed_payload.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    expected == provided
}

// POST /webhook/payment
pub async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    // Verify the provider signature (skip if secret is empty — dev mode).
    if !state.config.payment_webhook_secret.is_empty() {
        let signature = headers
            .get("x-payment-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if signature.is_empty() {
            tracing::warn!("missing payment webhook signature header");
            return (StatusCode::FORBIDDEN, "Missing signature").into_response();
        }

        if !validate_signature(&state.config.payment_webhook_secret, signature, &body) {
            tracing::warn!("invalid payment webhook signature");
            return (StatusCode::FORBIDDEN, "Invalid signature").into_response();
        }
    }

    let event: PaymentEvent = match serde_json::from_str(&body) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(error = %e, "malformed payment event payload");
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({"error": "malformed payment event"})),
            )
                .into_response();
        }
    };

    let Some(kind) = PaymentKind::parse(&event.kind) else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({"error": format!("unknown payment kind: {}", event.kind)})),
        )
            .into_response();
    };

    let amount = event.amount_cents as f64 / 100.0;

    match booking_flow::apply_payment_event(
        &state,
        &event.booking_id,
        amount,
        kind,
        &event.transaction_id,
    ) {
        Ok(booking) => Json(serde_json::json!({
            "ok": true,
            "status": booking.status.as_str(),
            "balance_due": booking.balance_due,
        }))
        .into_response(),
        // Replayed delivery: acknowledge so the provider stops retrying.
        Err(AppError::DuplicateTransaction(txn)) => {
            tracing::info!(transaction_id = %txn, "duplicate payment delivery ignored");
            Json(serde_json::json!({"ok": true, "duplicate": true})).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, booking_id = %event.booking_id, "payment application failed");
            e.into_response()
        }
    }
}
