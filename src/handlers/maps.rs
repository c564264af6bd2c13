use anyhow::Context as AnyhowContext;
use reqwest::Client;
use serde_json::{json, Value};

use crate::auth;
use crate::config::Config;
use crate::error::ApiError;
use crate::logger::LogLevel;

pub const ALLOWED_SERVICES: &[&str] = &["geocoding", "staticmap"];
const GOOGLE_MAPS_API: &str = "https://maps.googleapis.com/maps/api";

/// `GET /maps/js-api-url`: script URL with the key baked in.
pub fn process_maps_script_url(config: &Config) -> Result<Value, ApiError> {
    let key = auth::require(&config.google_maps_api_key, "GOOGLE_MAPS_API_KEY")?;
    let url = format!(
        "{}/js?key={}&libraries=geometry&language={}&region={}",
        GOOGLE_MAPS_API, key, config.maps_language, config.maps_region
    );
    Ok(json!({ "url": url, "status": "OK" }))
}

/// Caller's query with any `key` replaced by ours.
pub fn forward_query(params: &[(String, String)], key: &str) -> Vec<(String, String)> {
    let mut query: Vec<(String, String)> = params
        .iter()
        .filter(|(name, _)| name != "key")
        .cloned()
        .collect();
    query.push(("key".to_string(), key.to_string()));
    query
}

/// `GET /maps/{service}`: forwards to Google Maps with the server key.
pub async fn process_maps_service(
    config: &Config,
    service: &str,
    params: &[(String, String)],
    log_level: LogLevel,
) -> Result<Value, ApiError> {
    if !ALLOWED_SERVICES.contains(&service) {
        return Err(ApiError::ServiceNotAllowed(service.to_string()));
    }
    let key = auth::require(&config.google_maps_api_key, "GOOGLE_MAPS_API_KEY")?;

    let url = format!("{}/{}/json", GOOGLE_MAPS_API, service);
    let query = forward_query(params, key);
    log_debug!(log_level, "Forwarding to {} with {} params", url, query.len());

    match fetch_json(&url, &query).await {
        Ok(UpstreamResponse::Success(data)) => Ok(data),
        Ok(UpstreamResponse::Error { status, message }) => {
            log_error!("Google Maps {} answered {} ({})", service, status, message);
            Err(ApiError::UpstreamStatus {
                service: "Google Maps API",
                status,
                details: message,
            })
        }
        Err(e) => {
            log_error!("Maps service error: {}", auth::redact(&format!("{:#}", e), Some(key)));
            Err(ApiError::Upstream {
                message: "Maps service error",
                details: auth::redact(&e.to_string(), Some(key)),
            })
        }
    }
}

enum UpstreamResponse {
    Success(Value),
    Error { status: u16, message: String },
}

async fn fetch_json(url: &str, query: &[(String, String)]) -> anyhow::Result<UpstreamResponse> {
    let response = Client::new()
        .get(url)
        .query(query)
        .send()
        .await
        .context("Failed to send Maps request")?;

    let status = response.status();
    if !status.is_success() {
        return Ok(UpstreamResponse::Error {
            status: status.as_u16(),
            message: status.canonical_reason().unwrap_or("Unknown Status").to_string(),
        });
    }

    let data = response.json().await.context("Failed to read Maps response")?;
    Ok(UpstreamResponse::Success(data))
}
