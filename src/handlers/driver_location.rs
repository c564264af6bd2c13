use serde_json::Value;

use super::backend::BackendClient;
use crate::config::Config;
use crate::error::ApiError;
use crate::logger::LogLevel;

pub fn validate_route_id(route_id: &str) -> Result<&str, ApiError> {
    let route_id = route_id.trim();
    if route_id.is_empty() {
        return Err(ApiError::BadRequest("route id is required".to_string()));
    }
    if !route_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ApiError::BadRequest("route id is malformed".to_string()));
    }
    Ok(route_id)
}

/// `GET /driver-location/{routeId}`: relays the backend position with the API key attached.
pub async fn process_driver_location(
    config: &Config,
    route_id: &str,
    log_level: LogLevel,
) -> Result<Value, ApiError> {
    let route_id = validate_route_id(route_id)?;
    let backend = BackendClient::from_config(config, log_level)?;

    backend.driver_location_raw(route_id).await.map_err(|e| {
        log_error!("Driver location for route {} failed: {:#}", route_id, e);
        ApiError::Upstream {
            message: "Failed to get driver location, please try again later",
            details: e.to_string(),
        }
    })
}
