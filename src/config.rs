use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub maps_api_key: String,
    pub stripe_secret_key: String,
    pub payment_webhook_secret: String,
    pub success_url: String,
    pub cancel_url: String,
    pub pricing: PricingConfig,
}

/// Pricing knobs, loaded once at startup and read-only thereafter.
#[derive(Clone, Debug)]
pub struct PricingConfig {
    /// Dollars per mile.
    pub base_rate: f64,
    /// Flat fee for airport dropoffs.
    pub airport_fee: f64,
    /// Pickup hour in [22,24) or [0,6).
    pub late_night_fee: f64,
    /// Pickup hour in [6,9).
    pub early_morning_fee: f64,
    /// Per passenger beyond the first.
    pub per_passenger_fee: f64,
    pub surge_enabled: bool,
    pub max_surge: f64,
    pub rush_weight: f64,
    pub weather_weight: f64,
    pub traffic_weight: f64,
    pub event_weight: f64,
    /// Fraction of the dynamic fare required to confirm a booking.
    pub deposit_fraction: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_rate: 2.50,
            airport_fee: 15.00,
            late_night_fee: 10.00,
            early_morning_fee: 7.50,
            per_passenger_fee: 5.00,
            surge_enabled: true,
            max_surge: 2.5,
            rush_weight: 1.5,
            weather_weight: 1.0,
            traffic_weight: 1.25,
            event_weight: 1.0,
            deposit_fraction: 0.25,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "curbline.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            maps_api_key: env::var("MAPS_API_KEY").unwrap_or_default(),
            stripe_secret_key: env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            payment_webhook_secret: env::var("PAYMENT_WEBHOOK_SECRET").unwrap_or_default(),
            success_url: env::var("PAYMENT_SUCCESS_URL")
                .unwrap_or_else(|_| "http://localhost:3000/booking/success".to_string()),
            cancel_url: env::var("PAYMENT_CANCEL_URL")
                .unwrap_or_else(|_| "http://localhost:3000/booking/cancelled".to_string()),
            pricing: PricingConfig::from_env(),
        }
    }
}

impl PricingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_rate: env_f64("PRICING_BASE_RATE", defaults.base_rate),
            airport_fee: env_f64("PRICING_AIRPORT_FEE", defaults.airport_fee),
            late_night_fee: env_f64("PRICING_LATE_NIGHT_FEE", defaults.late_night_fee),
            early_morning_fee: env_f64("PRICING_EARLY_MORNING_FEE", defaults.early_morning_fee),
            per_passenger_fee: env_f64("PRICING_PER_PASSENGER_FEE", defaults.per_passenger_fee),
            surge_enabled: env::var("PRICING_SURGE_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.surge_enabled),
            max_surge: env_f64("PRICING_MAX_SURGE", defaults.max_surge),
            rush_weight: env_f64("PRICING_RUSH_WEIGHT", defaults.rush_weight),
            weather_weight: env_f64("PRICING_WEATHER_WEIGHT", defaults.weather_weight),
            traffic_weight: env_f64("PRICING_TRAFFIC_WEIGHT", defaults.traffic_weight),
            event_weight: env_f64("PRICING_EVENT_WEIGHT", defaults.event_weight),
            deposit_fraction: env_f64("PRICING_DEPOSIT_FRACTION", defaults.deposit_fraction),
        }
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
