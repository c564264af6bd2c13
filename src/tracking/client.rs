use anyhow::Context as AnyhowContext;
use async_trait::async_trait;
use reqwest::Client;

use super::models::{DriverLocationSnapshot, PhoneNumber, TrackOrderResponse};
use super::{DriverLocationSource, OrderSource};
use crate::geo::Coordinate;
use crate::weather::{WeatherReport, WeatherSnapshot, WeatherSource};

/// Client for this worker's public endpoints, used by the tracking widget.
#[derive(Clone)]
pub struct TrackApiClient {
    http: Client,
    base_url: String,
}

impl TrackApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait(?Send)]
impl OrderSource for TrackApiClient {
    async fn track_order(&self, phone: &PhoneNumber) -> anyhow::Result<TrackOrderResponse> {
        self.http
            .post(self.url("/track-order"))
            .json(&serde_json::json!({ "phone": phone.as_str() }))
            .send()
            .await
            .context("Failed to send order lookup")?
            .json()
            .await
            .context("Failed to read order lookup response")
    }
}

#[async_trait(?Send)]
impl DriverLocationSource for TrackApiClient {
    async fn driver_location(&self, route_id: &str) -> anyhow::Result<DriverLocationSnapshot> {
        self.http
            .get(self.url(&format!("/driver-location/{}", route_id)))
            .send()
            .await
            .context("Failed to request driver location")?
            .error_for_status()
            .context("Driver location request rejected")?
            .json()
            .await
            .context("Failed to read driver location")
    }
}

#[async_trait(?Send)]
impl WeatherSource for TrackApiClient {
    async fn current(&self, at: Coordinate) -> anyhow::Result<WeatherSnapshot> {
        let report: WeatherReport = self
            .http
            .get(self.url(&format!("/weather/{}/{}", at.lat, at.lng)))
            .send()
            .await
            .context("Failed to request weather")?
            .json()
            .await
            .context("Failed to read weather")?;

        if report.is_fallback() {
            log_info!(
                "Weather at {} fell back ({}), treating as dry",
                at,
                report.error.as_deref().unwrap_or("unknown")
            );
        }
        Ok(report.into_snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalised() {
        let client = TrackApiClient::new("https://track.example.workers.dev/");
        assert_eq!(client.base_url(), "https://track.example.workers.dev");
        assert_eq!(
            client.url("/driver-location/R1"),
            "https://track.example.workers.dev/driver-location/R1"
        );
    }
}
