use serde::Deserialize;
use serde_json::Value;

use super::backend::BackendClient;
use crate::config::Config;
use crate::error::ApiError;
use crate::logger::LogLevel;
use crate::tracking::models::PhoneNumber;

#[derive(Debug, Deserialize)]
pub struct TrackOrderRequest {
    #[serde(default)]
    pub phone: Option<String>,
}

impl TrackOrderRequest {
    pub fn phone(&self) -> Result<PhoneNumber, ApiError> {
        PhoneNumber::parse(self.phone.as_deref().unwrap_or_default())
            .map_err(|reason| ApiError::BadRequest(reason.to_string()))
    }
}

/// `POST /track-order`: validates the phone number and relays the backend answer.
pub async fn process_track_order(
    config: &Config,
    body: &str,
    log_level: LogLevel,
) -> Result<Value, ApiError> {
    let request: TrackOrderRequest = serde_json::from_str(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON: {}", e)))?;
    let phone = request.phone()?;

    let backend = BackendClient::from_config(config, log_level)?;

    backend.track_order(&phone).await.map_err(|e| {
        log_error!("Order lookup failed: {:#}", e);
        ApiError::Upstream {
            message: "Order lookup failed, please try again later",
            details: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<PhoneNumber, ApiError> {
        serde_json::from_str::<TrackOrderRequest>(body)
            .map_err(|e| ApiError::BadRequest(e.to_string()))
            .and_then(|r| r.phone())
    }

    #[test]
    fn test_phone_is_required() {
        assert_eq!(
            parse(r#"{}"#),
            Err(ApiError::BadRequest("phone number is required".into()))
        );
        assert_eq!(
            parse(r#"{"phone": ""}"#),
            Err(ApiError::BadRequest("phone number is required".into()))
        );
        assert_eq!(parse(r#"{"phone": "0412 345 678"}"#).unwrap().as_str(), "0412 345 678");
    }

    #[tokio::test]
    async fn test_rejects_before_contacting_backend() {
        let config = Config::default();

        let err = process_track_order(&config, "not json", LogLevel::Info).await.unwrap_err();
        assert_eq!(err.status(), 400);

        let err = process_track_order(&config, r#"{"phone":"x"}"#, LogLevel::Info)
            .await
            .unwrap_err();
        assert_eq!(err.status(), 400);

        let err = process_track_order(&config, r#"{"phone":"0412345678"}"#, LogLevel::Info)
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::NotConfigured("BACKEND_URL"));
    }
}
