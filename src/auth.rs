use crate::error::ApiError;

/// `Authorization` header value expected by the delivery backend.
///
/// Expected header format: `Authorization: ApiKey <key>`
pub fn upstream_authorization(api_key: &str) -> String {
    format!("ApiKey {}", api_key)
}

/// Returns the configured secret, or the error the route should answer with.
pub fn require<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, ApiError> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => {
            log_error!("Missing binding: {}", name);
            Err(ApiError::NotConfigured(name))
        }
    }
}

/// Masks a secret inside text that is about to be logged.
pub fn redact(text: &str, secret: Option<&str>) -> String {
    match secret {
        Some(s) if !s.is_empty() => text.replace(s, "HIDDEN"),
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_authorization_format() {
        assert_eq!(upstream_authorization("test-key-123"), "ApiKey test-key-123");
    }

    #[test]
    fn test_require_rejects_missing_and_empty() {
        assert_eq!(require(&Some("k".into()), "API_KEY"), Ok("k"));
        assert_eq!(require(&None, "API_KEY"), Err(ApiError::NotConfigured("API_KEY")));
        assert_eq!(
            require(&Some(String::new()), "API_KEY"),
            Err(ApiError::NotConfigured("API_KEY"))
        );
    }

    #[test]
    fn test_redact() {
        assert_eq!(
            redact("https://maps.googleapis.com/maps/api/js?key=abc123", Some("abc123")),
            "https://maps.googleapis.com/maps/api/js?key=HIDDEN"
        );
        assert_eq!(redact("no secret here", None), "no secret here");
    }
}
