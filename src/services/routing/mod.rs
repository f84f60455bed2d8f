pub mod estimate;
pub mod google;

use async_trait::async_trait;

use crate::models::RouteInfo;

#[async_trait]
pub trait RouteInfoProvider: Send + Sync {
    async fn route_info(&self, pickup: &str, dropoff: &str) -> anyhow::Result<RouteInfo>;
}
