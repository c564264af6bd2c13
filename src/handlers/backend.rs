use anyhow::Context as AnyhowContext;
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT},
    Client,
};
use serde_json::{json, Value};

use crate::auth;
use crate::config::Config;
use crate::error::ApiError;
use crate::logger::{phone_fingerprint, LogLevel};
use crate::tracking::models::{DriverLocationSnapshot, PhoneNumber};
use crate::tracking::DriverLocationSource;

/// Client for the delivery backend behind `BACKEND_URL`.
pub struct BackendClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    log_level: LogLevel,
}

impl BackendClient {
    pub fn from_config(config: &Config, log_level: LogLevel) -> Result<Self, ApiError> {
        let base_url = auth::require(&config.backend_url, "BACKEND_URL")?.to_string();
        Ok(Self {
            http: Client::new(),
            base_url,
            api_key: config.api_key.clone(),
            log_level,
        })
    }

    pub fn track_order_url(&self) -> String {
        format!("{}/api/delivery/public/track-order", self.base_url)
    }

    pub fn driver_location_url(&self, route_id: &str) -> String {
        format!("{}/api/delivery/routes/{}/driver-location", self.base_url, route_id)
    }

    fn headers(&self, with_key: bool) -> anyhow::Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("DeliveryTrack/3.0"));
        if with_key {
            let key = self.api_key.as_deref().unwrap_or_default();
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth::upstream_authorization(key))
                    .context("Invalid API key header value")?,
            );
        }
        Ok(headers)
    }

    /// Public order lookup. The backend body is returned untouched.
    pub async fn track_order(&self, phone: &PhoneNumber) -> anyhow::Result<Value> {
        log_debug!(
            self.log_level,
            "Forwarding order lookup for phone {} to {}",
            phone_fingerprint(phone.as_str()),
            self.track_order_url()
        );

        let response = self
            .http
            .post(self.track_order_url())
            .headers(self.headers(false)?)
            .json(&json!({ "phone": phone.as_str() }))
            .send()
            .await
            .context("Failed to send order lookup")?;

        log_info!("Order lookup answered with status {}", response.status().as_u16());

        response.json().await.context("Failed to read order lookup body")
    }

    /// Latest driver position for a route, as raw backend JSON.
    pub async fn driver_location_raw(&self, route_id: &str) -> anyhow::Result<Value> {
        log_debug!(self.log_level, "Requesting {}", self.driver_location_url(route_id));

        let response = self
            .http
            .get(self.driver_location_url(route_id))
            .headers(self.headers(true)?)
            .send()
            .await
            .context("Failed to send driver location request")?;

        log_info!(
            "Driver location for route {} answered with status {}",
            route_id,
            response.status().as_u16()
        );

        response.json().await.context("Failed to read driver location body")
    }
}

#[async_trait(?Send)]
impl DriverLocationSource for BackendClient {
    async fn driver_location(&self, route_id: &str) -> anyhow::Result<DriverLocationSnapshot> {
        let raw = self.driver_location_raw(route_id).await?;
        serde_json::from_value(raw).context("Unexpected driver location shape")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> BackendClient {
        let config = Config {
            backend_url: Some("https://backend.example.com".into()),
            api_key: Some("k-123".into()),
            ..Config::default()
        };
        BackendClient::from_config(&config, LogLevel::Info).unwrap()
    }

    #[test]
    fn test_requires_backend_url() {
        let err = BackendClient::from_config(&Config::default(), LogLevel::Info).err();
        assert_eq!(err, Some(ApiError::NotConfigured("BACKEND_URL")));
    }

    #[test]
    fn test_upstream_urls() {
        let client = client();
        assert_eq!(
            client.track_order_url(),
            "https://backend.example.com/api/delivery/public/track-order"
        );
        assert_eq!(
            client.driver_location_url("R-42"),
            "https://backend.example.com/api/delivery/routes/R-42/driver-location"
        );
    }

    #[test]
    fn test_only_location_calls_carry_key() {
        let client = client();
        assert!(client.headers(false).unwrap().get(AUTHORIZATION).is_none());
        assert_eq!(
            client.headers(true).unwrap().get(AUTHORIZATION).unwrap(),
            "ApiKey k-123"
        );
    }
}
