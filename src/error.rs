use serde_json::{json, Value};
use thiserror::Error;

/// Request-level failures. Each variant knows its status code and JSON body.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Not Found")]
    NotFound(String),

    #[error("{0} not configured")]
    NotConfigured(&'static str),

    #[error("Service not allowed")]
    ServiceNotAllowed(String),

    /// The upstream answered, but with a non-success status.
    #[error("{service} error: {status}")]
    UpstreamStatus {
        service: &'static str,
        status: u16,
        details: String,
    },

    /// The upstream call itself failed; `message` is what the caller sees.
    #[error("{message}")]
    Upstream { message: &'static str, details: String },

    #[error("Driver location unavailable")]
    LocationUnavailable(String),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) | ApiError::ServiceNotAllowed(_) => 400,
            ApiError::NotFound(_) | ApiError::LocationUnavailable(_) => 404,
            ApiError::NotConfigured(_) | ApiError::Upstream { .. } => 500,
            ApiError::UpstreamStatus { status, .. } => *status,
        }
    }

    pub fn body(&self) -> Value {
        match self {
            ApiError::NotFound(path) => json!({
                "error": "Not Found",
                "path": path,
                "message": "See / for the available endpoints",
                "available_endpoints": crate::routes::PUBLIC_ENDPOINTS,
            }),
            ApiError::UpstreamStatus { details, .. } => json!({
                "error": self.to_string(),
                "details": details,
            }),
            ApiError::ServiceNotAllowed(service) => json!({
                "error": self.to_string(),
                "service": service,
            }),
            ApiError::LocationUnavailable(route_id) => json!({
                "success": false,
                "error": self.to_string(),
                "route_id": route_id,
            }),
            _ => json!({
                "success": false,
                "error": self.to_string(),
            }),
        }
    }
}
