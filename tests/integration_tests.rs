use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tower::ServiceExt;

use curbline::config::{AppConfig, PricingConfig};
use curbline::db;
use curbline::models::RouteInfo;
use curbline::services::payments::{PaymentLink, PaymentLinkProvider};
use curbline::services::routing::RouteInfoProvider;
use curbline::state::AppState;

// ── Mock Providers ──

struct MockRoutes {
    distance_miles: f64,
    duration_minutes: f64,
}

#[async_trait]
impl RouteInfoProvider for MockRoutes {
    async fn route_info(&self, _pickup: &str, _dropoff: &str) -> anyhow::Result<RouteInfo> {
        Ok(RouteInfo {
            distance_miles: self.distance_miles,
            duration_minutes: self.duration_minutes,
        })
    }
}

struct MockPayments {
    links: Arc<Mutex<Vec<(i64, String)>>>,
}

#[async_trait]
impl PaymentLinkProvider for MockPayments {
    async fn create_link(
        &self,
        amount_cents: i64,
        _description: &str,
        booking_id: &str,
    ) -> anyhow::Result<PaymentLink> {
        self.links
            .lock()
            .unwrap()
            .push((amount_cents, booking_id.to_string()));
        Ok(PaymentLink {
            payment_url: format!("https://pay.example/session/{booking_id}"),
            provider_order_id: format!("order_{booking_id}"),
        })
    }
}

// ── Helpers ──

fn test_config(webhook_secret: &str) -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        admin_token: "test-token".to_string(),
        maps_api_key: String::new(),
        stripe_secret_key: String::new(),
        payment_webhook_secret: webhook_secret.to_string(),
        success_url: "http://localhost:3000/ok".to_string(),
        cancel_url: "http://localhost:3000/no".to_string(),
        pricing: PricingConfig {
            surge_enabled: false,
            ..PricingConfig::default()
        },
    }
}

fn test_state_with(
    webhook_secret: &str,
    route: MockRoutes,
) -> (Arc<AppState>, Arc<Mutex<Vec<(i64, String)>>>) {
    let conn = db::init_db(":memory:").unwrap();
    let links = Arc::new(Mutex::new(vec![]));
    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: test_config(webhook_secret),
        routes: Box::new(route),
        payments: Box::new(MockPayments {
            links: Arc::clone(&links),
        }),
    });
    (state, links)
}

fn test_state() -> Arc<AppState> {
    test_state_with(
        "",
        MockRoutes {
            distance_miles: 45.0,
            duration_minutes: 60.0,
        },
    )
    .0
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn admin_request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", "Bearer test-token");
    match body {
        Some(b) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// A pickup the given number of hours from now, formatted the way
/// clients submit it.
fn future_pickup(hours: i64) -> String {
    (Utc::now().naive_utc() + Duration::hours(hours))
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
}

fn booking_request_body(pickup_datetime: &str) -> serde_json::Value {
    serde_json::json!({
        "pickup_location": "452 Elm Street, Brooklyn",
        "dropoff_location": "JFK Airport",
        "pickup_datetime": pickup_datetime,
        "passengers": 2,
        "customer_name": "Jamie Rivera",
        "email": "jamie@example.com",
        "phone": "+15551234567",
        "flight_number": "DL 412"
    })
}

async fn create_booking(state: &Arc<AppState>, pickup_datetime: &str) -> serde_json::Value {
    let response = curbline::app(Arc::clone(state))
        .oneshot(json_request(
            "POST",
            "/api/bookings",
            booking_request_body(pickup_datetime),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await
}

fn pay_in_full_event(booking: &serde_json::Value, transaction_id: &str) -> serde_json::Value {
    let fare = booking["dynamic_fare"].as_f64().unwrap();
    serde_json::json!({
        "booking_id": booking["id"],
        "amount_cents": (fare * 100.0).round() as i64,
        "kind": "full",
        "transaction_id": transaction_id,
    })
}

async fn get_booking(state: &Arc<AppState>, id: &str) -> serde_json::Value {
    let response = curbline::app(Arc::clone(state))
        .oneshot(
            Request::builder()
                .uri(format!("/api/bookings/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response_json(response).await
}

async fn add_driver(state: &Arc<AppState>, name: &str, rating: f64) -> serde_json::Value {
    let response = curbline::app(Arc::clone(state))
        .oneshot(admin_request(
            "POST",
            "/api/admin/drivers",
            Some(serde_json::json!({
                "name": name,
                "phone": "+15550002222",
                "email": format!("{}@fleet.example.com", name.to_lowercase()),
                "rating": rating,
                "vehicle_make": "Toyota",
                "vehicle_model": "Sienna",
                "vehicle_year": 2022,
                "vehicle_color": "Black",
                "vehicle_plate": "FLT1234",
                "start_time": "00:00",
                "end_time": "23:00",
                "days_of_week": [0, 1, 2, 3, 4, 5, 6]
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response_json(response).await
}

// ── Tests ──

#[tokio::test]
async fn health_check() {
    let response = curbline::app(test_state())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn quote_returns_itemized_fare() {
    // 45 mi * 2.50 + 15 airport + 10 late night + 5 second passenger.
    let response = curbline::app(test_state())
        .oneshot(json_request(
            "POST",
            "/api/quote",
            serde_json::json!({
                "pickup_location": "452 Elm Street, Brooklyn",
                "dropoff_location": "JFK Airport",
                "pickup_datetime": "2030-07-02T23:00:00",
                "passengers": 2
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["base_fare"], 112.5);
    assert_eq!(body["airport_fee"], 15.0);
    assert_eq!(body["time_fee"], 10.0);
    assert_eq!(body["passenger_fee"], 5.0);
    assert_eq!(body["surge_multiplier"], 1.0);
    assert_eq!(body["dynamic_fare"], 142.5);
    assert_eq!(body["traffic"], "low");
}

#[tokio::test]
async fn quote_rejects_invalid_passengers() {
    let response = curbline::app(test_state())
        .oneshot(json_request(
            "POST",
            "/api/quote",
            serde_json::json!({
                "pickup_location": "A",
                "dropoff_location": "B",
                "pickup_datetime": "2030-07-02T23:00:00",
                "passengers": 0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn create_booking_persists_and_links_payment() {
    let (state, links) = test_state_with(
        "",
        MockRoutes {
            distance_miles: 45.0,
            duration_minutes: 60.0,
        },
    );

    let booking = create_booking(&state, &future_pickup(48)).await;
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["deposit_paid"], false);
    assert_eq!(booking["balance_due"], booking["dynamic_fare"]);

    let id = booking["id"].as_str().unwrap();
    assert_eq!(
        booking["payment_url"],
        format!("https://pay.example/session/{id}")
    );

    // Deposit link is 25% of the fare, in cents.
    let fare = booking["dynamic_fare"].as_f64().unwrap();
    let recorded = links.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].0, ((fare * 0.25) * 100.0).round() as i64);

    // Round-trips through the store.
    let fetched = get_booking(&state, id).await;
    assert_eq!(fetched["customer_name"], "Jamie Rivera");
    assert_eq!(fetched["dropoff_location"], "JFK Airport");
}

#[tokio::test]
async fn webhook_confirms_booking_and_is_idempotent() {
    let state = test_state();
    let booking = create_booking(&state, &future_pickup(48)).await;
    let id = booking["id"].as_str().unwrap().to_string();

    let event = pay_in_full_event(&booking, "txn_001");

    let response = curbline::app(Arc::clone(&state))
        .oneshot(json_request("POST", "/webhook/payment", event.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "confirmed");
    assert_eq!(body["balance_due"], 0.0);

    // Replay the same transaction: acknowledged, not double-counted.
    let response = curbline::app(Arc::clone(&state))
        .oneshot(json_request("POST", "/webhook/payment", event))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["duplicate"], true);

    let fetched = get_booking(&state, &id).await;
    assert_eq!(
        fetched["amount_paid"].as_f64().unwrap(),
        booking["dynamic_fare"].as_f64().unwrap()
    );
    assert_eq!(fetched["balance_due"], 0.0);
}

#[tokio::test]
async fn webhook_rejects_bad_signature() {
    let (state, _) = test_state_with(
        "whsec_test",
        MockRoutes {
            distance_miles: 45.0,
            duration_minutes: 60.0,
        },
    );

    let event = serde_json::json!({
        "booking_id": "nope",
        "amount_cents": 1000,
        "kind": "full",
        "transaction_id": "txn_x",
    });

    // No signature header at all.
    let response = curbline::app(Arc::clone(&state))
        .oneshot(json_request("POST", "/webhook/payment", event.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Wrong secret.
    let payload = event.to_string();
    let mut mac = Hmac::<Sha256>::new_from_slice(b"wrong-secret").unwrap();
    mac.update(format!("123.{payload}").as_bytes());
    let digest = hex::encode(mac.finalize().into_bytes());

    let response = curbline::app(Arc::clone(&state))
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook/payment")
                .header("Content-Type", "application/json")
                .header("x-payment-signature", format!("t=123,v1={digest}"))
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn webhook_accepts_valid_signature() {
    let (state, _) = test_state_with(
        "whsec_test",
        MockRoutes {
            distance_miles: 45.0,
            duration_minutes: 60.0,
        },
    );
    let booking = create_booking(&state, &future_pickup(48)).await;

    let payload = pay_in_full_event(&booking, "txn_signed").to_string();
    let mut mac = Hmac::<Sha256>::new_from_slice(b"whsec_test").unwrap();
    mac.update(format!("1719830000.{payload}").as_bytes());
    let digest = hex::encode(mac.finalize().into_bytes());

    let response = curbline::app(Arc::clone(&state))
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook/payment")
                .header("Content-Type", "application/json")
                .header("x-payment-signature", format!("t=1719830000,v1={digest}"))
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "confirmed");
}

#[tokio::test]
async fn webhook_rejects_unknown_kind_and_zero_amount() {
    let state = test_state();
    let booking = create_booking(&state, &future_pickup(48)).await;
    let id = booking["id"].as_str().unwrap();

    let response = curbline::app(Arc::clone(&state))
        .oneshot(json_request(
            "POST",
            "/webhook/payment",
            serde_json::json!({
                "booking_id": id,
                "amount_cents": 1000,
                "kind": "gift-card",
                "transaction_id": "txn_k",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = curbline::app(Arc::clone(&state))
        .oneshot(json_request(
            "POST",
            "/webhook/payment",
            serde_json::json!({
                "booking_id": id,
                "amount_cents": 0,
                "kind": "deposit",
                "transaction_id": "txn_z",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn cancel_far_out_is_free() {
    let state = test_state();
    let booking = create_booking(&state, &future_pickup(48)).await;
    let id = booking["id"].as_str().unwrap();

    let response = curbline::app(Arc::clone(&state))
        .oneshot(json_request(
            "POST",
            &format!("/api/bookings/{id}/cancel"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "cancelled");
    assert_eq!(body["cancellation_fee"], 0.0);
}

#[tokio::test]
async fn paid_cancel_close_to_pickup_charges_half() {
    let state = test_state();
    // Pickup in 10 hours: the 3-24h tier.
    let booking = create_booking(&state, &future_pickup(10)).await;
    let id = booking["id"].as_str().unwrap().to_string();

    let response = curbline::app(Arc::clone(&state))
        .oneshot(json_request(
            "POST",
            "/webhook/payment",
            pay_in_full_event(&booking, "txn_half"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = curbline::app(Arc::clone(&state))
        .oneshot(json_request(
            "POST",
            &format!("/api/bookings/{id}/cancel"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;

    let paid = booking["dynamic_fare"].as_f64().unwrap();
    assert_eq!(body["cancellation_fee"].as_f64().unwrap(), paid / 2.0);
}

#[tokio::test]
async fn cancelled_booking_is_terminal() {
    let state = test_state();
    let booking = create_booking(&state, &future_pickup(48)).await;
    let id = booking["id"].as_str().unwrap();

    let response = curbline::app(Arc::clone(&state))
        .oneshot(json_request(
            "POST",
            &format!("/api/bookings/{id}/cancel"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = curbline::app(Arc::clone(&state))
        .oneshot(json_request(
            "POST",
            &format!("/api/bookings/{id}/cancel"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn advance_walks_lifecycle_and_manages_driver() {
    let state = test_state();
    add_driver(&state, "Priya", 4.9).await;
    add_driver(&state, "Marcus", 4.5).await;

    // Fixed mid-afternoon pickup so the shift windows above apply.
    let booking = create_booking(&state, "2030-07-02T14:00:00").await;
    let id = booking["id"].as_str().unwrap().to_string();

    // Pay in full: pending -> confirmed via the webhook.
    curbline::app(Arc::clone(&state))
        .oneshot(json_request(
            "POST",
            "/webhook/payment",
            pay_in_full_event(&booking, "txn_adv"),
        ))
        .await
        .unwrap();

    // confirmed -> in_progress assigns the highest-rated driver.
    let response = curbline::app(Arc::clone(&state))
        .oneshot(json_request(
            "POST",
            &format!("/api/bookings/{id}/advance"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "in_progress");
    assert_eq!(body["driver_name"], "Priya");

    let drivers = response_json(
        curbline::app(Arc::clone(&state))
            .oneshot(admin_request("GET", "/api/admin/drivers", None))
            .await
            .unwrap(),
    )
    .await;
    let priya = drivers
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["name"] == "Priya")
        .unwrap();
    assert_eq!(priya["status"], "busy");

    // in_progress -> completed releases the driver.
    let response = curbline::app(Arc::clone(&state))
        .oneshot(json_request(
            "POST",
            &format!("/api/bookings/{id}/advance"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "completed");

    let drivers = response_json(
        curbline::app(Arc::clone(&state))
            .oneshot(admin_request("GET", "/api/admin/drivers", None))
            .await
            .unwrap(),
    )
    .await;
    let priya = drivers
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["name"] == "Priya")
        .unwrap();
    assert_eq!(priya["status"], "available");

    // completed is terminal.
    let response = curbline::app(Arc::clone(&state))
        .oneshot(json_request(
            "POST",
            &format!("/api/bookings/{id}/advance"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn advance_without_driver_pool_is_refused() {
    let state = test_state();
    let booking = create_booking(&state, &future_pickup(48)).await;
    let id = booking["id"].as_str().unwrap().to_string();

    curbline::app(Arc::clone(&state))
        .oneshot(json_request(
            "POST",
            "/webhook/payment",
            pay_in_full_event(&booking, "txn_nodriver"),
        ))
        .await
        .unwrap();

    // No drivers registered: the trip cannot start.
    let response = curbline::app(Arc::clone(&state))
        .oneshot(json_request(
            "POST",
            &format!("/api/bookings/{id}/advance"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The booking stays confirmed for a later retry.
    let fetched = get_booking(&state, &id).await;
    assert_eq!(fetched["status"], "confirmed");
}

#[tokio::test]
async fn admin_requires_bearer_token() {
    let response = curbline::app(test_state())
        .oneshot(
            Request::builder()
                .uri("/api/admin/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_status_counts_bookings() {
    let state = test_state();
    create_booking(&state, &future_pickup(48)).await;
    create_booking(&state, &future_pickup(72)).await;

    let response = curbline::app(Arc::clone(&state))
        .oneshot(admin_request("GET", "/api/admin/status", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["pending_count"], 2);
    assert_eq!(body["upcoming_confirmed_count"], 0);
}

#[tokio::test]
async fn admin_lists_bookings_with_status_filter() {
    let state = test_state();
    let booking = create_booking(&state, &future_pickup(48)).await;
    let id = booking["id"].as_str().unwrap();
    create_booking(&state, &future_pickup(72)).await;

    curbline::app(Arc::clone(&state))
        .oneshot(json_request(
            "POST",
            &format!("/api/bookings/{id}/cancel"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();

    let response = curbline::app(Arc::clone(&state))
        .oneshot(admin_request(
            "GET",
            "/api/admin/bookings?status=cancelled",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], *id);
}

#[tokio::test]
async fn booking_not_found_is_404() {
    let response = curbline::app(test_state())
        .oneshot(
            Request::builder()
                .uri("/api/bookings/does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
