use serde::Serialize;
use worker::*;

use crate::config::Config;
use crate::cors;
use crate::error::ApiError;
use crate::handlers::driver_location::validate_route_id;
use crate::handlers::BackendClient;
use crate::logger;
use crate::tracking::{DriverIcon, DriverLocationSource, DriverStatusClassifier};
use crate::weather::WeatherClient;

pub const BINDING: &str = "DRIVER_STATUS";
pub const INSTANCE: &str = "driver-status-1";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerStyle {
    pub class: &'static str,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverStatusReport {
    pub route_id: String,
    pub driver_name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub last_location_update: Option<String>,
    pub icon: DriverIcon,
    pub marker: MarkerStyle,
}

/// Fetches the driver's position and classifies it. A missing position is a 404.
pub async fn resolve_driver_status(
    locations: &dyn DriverLocationSource,
    classifier: &DriverStatusClassifier,
    route_id: &str,
    now_ms: u64,
) -> std::result::Result<DriverStatusReport, ApiError> {
    let snapshot = locations.driver_location(route_id).await.map_err(|e| {
        log_error!("Driver location for route {} failed: {:#}", route_id, e);
        ApiError::Upstream {
            message: "Failed to get driver location, please try again later",
            details: e.to_string(),
        }
    })?;

    let position = snapshot
        .position()
        .ok_or_else(|| ApiError::LocationUnavailable(route_id.to_string()))?;

    let icon = classifier
        .classify(position, snapshot.recent_delivery_performance.as_ref(), now_ms)
        .await;
    let (class, color) = icon.marker_style();

    Ok(DriverStatusReport {
        route_id: route_id.to_string(),
        driver_name: snapshot.driver_name,
        latitude: position.lat,
        longitude: position.lng,
        last_location_update: snapshot.last_location_update,
        icon,
        marker: MarkerStyle { class, color },
    })
}

// Durable Object that keeps one weather cache for every driver status lookup
#[durable_object]
pub struct DriverStatusObject {
    #[allow(dead_code)]
    state: State,
    env: Env,
    classifier: DriverStatusClassifier,
}

impl DurableObject for DriverStatusObject {
    fn new(state: State, env: Env) -> Self {
        let config = Config::from_env(&env);
        let weather = WeatherClient::new(config.weather_provider, config.weather_api_key);
        Self {
            state,
            env,
            classifier: DriverStatusClassifier::new(Box::new(weather)),
        }
    }

    async fn fetch(&self, req: Request) -> Result<Response> {
        let config = Config::from_env(&self.env);
        let log_level = logger::LogLevel::resolve(
            req.headers().get("X-Log-Level")?.as_deref(),
            config.log_level,
        );

        let url = req.url()?;
        let route_id = url
            .path_segments()
            .and_then(|mut segments| segments.nth(1))
            .unwrap_or_default()
            .to_string();

        log_info!("Driver status requested for route {}", route_id);
        log_debug!(log_level, "Weather cells cached: {}", self.classifier.cached_cells());

        let outcome = match validate_route_id(&route_id) {
            Ok(route_id) => match BackendClient::from_config(&config, log_level) {
                Ok(backend) => {
                    resolve_driver_status(&backend, &self.classifier, route_id, Date::now().as_millis())
                        .await
                }
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        match outcome {
            Ok(report) => {
                log_info!("Route {} classified as {}", report.route_id, report.icon.as_str());
                cors::json(&report, 200)
            }
            Err(e) => {
                log_error!("Driver status for route {} failed: {}", route_id, e);
                cors::error(&e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::session::tests::{fix, ScriptedLocations, Weather};

    #[tokio::test]
    async fn test_report_for_wet_driver() {
        let locations = ScriptedLocations::new(vec![Some(fix(-27.47, 153.02, Some(5.0)))]);
        let classifier = DriverStatusClassifier::new(Box::new(Weather(true)));

        let report = resolve_driver_status(&locations, &classifier, "R-7", 0).await.unwrap();
        assert_eq!(report.icon, DriverIcon::Rain);
        assert_eq!(report.marker.class, "bi-cloud-rain");
        assert_eq!(report.driver_name.as_deref(), Some("Sam"));

        let wire = serde_json::to_value(&report).unwrap();
        assert_eq!(wire["icon"], "rain");
        assert_eq!(wire["latitude"], -27.47);
    }

    #[tokio::test]
    async fn test_missing_position_is_not_found() {
        let mut no_fix = fix(0.0, 0.0, None);
        no_fix.current_longitude = None;
        let locations = ScriptedLocations::new(vec![Some(no_fix)]);
        let classifier = DriverStatusClassifier::new(Box::new(Weather(false)));

        let err = resolve_driver_status(&locations, &classifier, "R-7", 0).await.unwrap_err();
        assert_eq!(err, ApiError::LocationUnavailable("R-7".into()));
        assert_eq!(err.status(), 404);
    }

    #[tokio::test]
    async fn test_backend_failure_is_500() {
        let locations = ScriptedLocations::new(vec![None]);
        let classifier = DriverStatusClassifier::new(Box::new(Weather(false)));

        let err = resolve_driver_status(&locations, &classifier, "R-7", 0).await.unwrap_err();
        assert_eq!(err.status(), 500);
    }
}
