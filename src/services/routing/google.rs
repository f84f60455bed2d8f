use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use super::RouteInfoProvider;
use crate::models::RouteInfo;

const METERS_PER_MILE: f64 = 1609.344;

/// Route lookup against the Google Distance Matrix API.
pub struct GoogleRoutesProvider {
    api_key: String,
    client: reqwest::Client,
}

impl GoogleRoutesProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct MatrixResponse {
    rows: Vec<MatrixRow>,
    status: String,
}

#[derive(Deserialize)]
struct MatrixRow {
    elements: Vec<MatrixElement>,
}

#[derive(Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<MatrixValue>,
    duration: Option<MatrixValue>,
}

#[derive(Deserialize)]
struct MatrixValue {
    value: f64,
}

#[async_trait]
impl RouteInfoProvider for GoogleRoutesProvider {
    async fn route_info(&self, pickup: &str, dropoff: &str) -> anyhow::Result<RouteInfo> {
        let response: MatrixResponse = self
            .client
            .get("https://maps.googleapis.com/maps/api/distancematrix/json")
            .query(&[
                ("origins", pickup),
                ("destinations", dropoff),
                ("units", "imperial"),
                ("key", &self.api_key),
            ])
            .send()
            .await
            .context("failed to reach distance matrix API")?
            .error_for_status()
            .context("distance matrix API returned error")?
            .json()
            .await
            .context("failed to decode distance matrix response")?;

        if response.status != "OK" {
            anyhow::bail!("distance matrix request rejected: {}", response.status);
        }

        let element = response
            .rows
            .first()
            .and_then(|r| r.elements.first())
            .context("distance matrix response missing elements")?;

        if element.status != "OK" {
            anyhow::bail!("no route between locations: {}", element.status);
        }

        let distance_meters = element
            .distance
            .as_ref()
            .context("element missing distance")?
            .value;
        let duration_seconds = element
            .duration
            .as_ref()
            .context("element missing duration")?
            .value;

        Ok(RouteInfo {
            distance_miles: distance_meters / METERS_PER_MILE,
            duration_minutes: duration_seconds / 60.0,
        })
    }
}
