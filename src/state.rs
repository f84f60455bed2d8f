use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::payments::PaymentLinkProvider;
use crate::services::routing::RouteInfoProvider;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub routes: Box<dyn RouteInfoProvider>,
    pub payments: Box<dyn PaymentLinkProvider>,
}
