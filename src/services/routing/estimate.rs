use async_trait::async_trait;

use super::RouteInfoProvider;
use crate::models::RouteInfo;

/// Dev-mode route provider used when no maps API key is configured.
/// Returns a fixed metro-area estimate so quotes and bookings can be
/// exercised locally without network access.
pub struct FixedEstimateProvider {
    pub distance_miles: f64,
    pub duration_minutes: f64,
}

impl Default for FixedEstimateProvider {
    fn default() -> Self {
        Self {
            distance_miles: 18.0,
            duration_minutes: 35.0,
        }
    }
}

#[async_trait]
impl RouteInfoProvider for FixedEstimateProvider {
    async fn route_info(&self, _pickup: &str, _dropoff: &str) -> anyhow::Result<RouteInfo> {
        Ok(RouteInfo {
            distance_miles: self.distance_miles,
            duration_minutes: self.duration_minutes,
        })
    }
}
