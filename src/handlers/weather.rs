use crate::config::Config;
use crate::error::ApiError;
use crate::geo::Coordinate;
use crate::logger::LogLevel;
use crate::weather::{WeatherClient, WeatherReport};

pub fn parse_coordinates(segments: Option<&(String, String)>) -> Result<Coordinate, ApiError> {
    let (lat, lng) =
        segments.ok_or_else(|| ApiError::BadRequest("latitude and longitude are required".to_string()))?;
    Coordinate::parse_pair(lat, lng)
        .ok_or_else(|| ApiError::BadRequest("invalid latitude or longitude".to_string()))
}

/// `GET /weather/{lat}/{lng}`. Only bad coordinates are errors; provider
/// trouble becomes a dry fallback report.
pub async fn process_weather(
    config: &Config,
    segments: Option<&(String, String)>,
    log_level: LogLevel,
) -> Result<WeatherReport, ApiError> {
    let at = parse_coordinates(segments)?;

    let client = WeatherClient::new(config.weather_provider, config.weather_api_key.clone());
    let report = client.report(at).await;

    log_debug!(
        log_level,
        "Weather at {} via {}: raining={} ({})",
        at,
        report.provider,
        report.is_raining,
        report.weather
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinates() {
        let ok = ("-27.47".to_string(), "153.02".to_string());
        assert_eq!(parse_coordinates(Some(&ok)), Ok(Coordinate::new(-27.47, 153.02)));

        assert_eq!(parse_coordinates(None).unwrap_err().status(), 400);

        let bad = ("north".to_string(), "153.02".to_string());
        assert_eq!(
            parse_coordinates(Some(&bad)),
            Err(ApiError::BadRequest("invalid latitude or longitude".to_string()))
        );
    }

    #[tokio::test]
    async fn test_missing_key_is_dry_fallback() {
        let pair = ("-27.47".to_string(), "153.02".to_string());
        let report = process_weather(&Config::default(), Some(&pair), LogLevel::Debug)
            .await
            .unwrap();

        assert!(report.success);
        assert!(!report.is_raining);
        assert_eq!(report.error.as_deref(), Some("no_api_key"));
        assert_eq!(report.location, "-27.47,153.02");
    }
}
