use std::sync::{Arc, Mutex};

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use curbline::config::AppConfig;
use curbline::db;
use curbline::services::payments::stripe::StripeProvider;
use curbline::services::payments::PaymentLinkProvider;
use curbline::services::routing::estimate::FixedEstimateProvider;
use curbline::services::routing::google::GoogleRoutesProvider;
use curbline::services::routing::RouteInfoProvider;
use curbline::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let routes: Box<dyn RouteInfoProvider> = if config.maps_api_key.is_empty() {
        tracing::warn!("MAPS_API_KEY not set, using fixed-estimate route provider");
        Box::new(FixedEstimateProvider::default())
    } else {
        tracing::info!("using Google route-info provider");
        Box::new(GoogleRoutesProvider::new(config.maps_api_key.clone()))
    };

    anyhow::ensure!(
        !config.stripe_secret_key.is_empty() || config.payment_webhook_secret.is_empty(),
        "STRIPE_SECRET_KEY must be set when PAYMENT_WEBHOOK_SECRET is configured"
    );
    let payments: Box<dyn PaymentLinkProvider> = Box::new(StripeProvider::new(
        config.stripe_secret_key.clone(),
        config.success_url.clone(),
        config.cancel_url.clone(),
    ));

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        routes,
        payments,
    });

    let app = curbline::app(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
