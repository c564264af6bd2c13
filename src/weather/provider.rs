use anyhow::Context as AnyhowContext;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::{WeatherSnapshot, WeatherSource};
use crate::config::WeatherProvider;
use crate::cors;
use crate::geo::Coordinate;

const WEATHERAPI_URL: &str = "https://api.weatherapi.com/v1/current.json";
const OPENWEATHERMAP_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Condition-text fragments that count as rain on WeatherAPI.com.
const RAINY_CONDITIONS: &[&str] = &[
    "rain",
    "drizzle",
    "shower",
    "thunderstorm",
    "storm",
    "light rain",
    "moderate rain",
    "heavy rain",
    "torrential rain",
    "light drizzle",
    "heavy drizzle",
    "patchy rain",
    "thundery outbreaks",
    "blizzard",
];

/// WeatherAPI.com precipitation condition codes.
const RAINY_CONDITION_CODES: &[i64] = &[
    1063, 1066, 1069, 1072, 1150, 1153, 1168, 1171, 1180, 1183, 1186, 1189, 1192, 1195, 1198,
    1201, 1204, 1207, 1240, 1243, 1246, 1249, 1252, 1255, 1258, 1261, 1264, 1273, 1276,
];

/// `weather[0].main` values that count as rain on OpenWeatherMap.
const RAINY_MAIN: &[&str] = &["rain", "drizzle", "thunderstorm"];

#[derive(Debug, Clone, Error, PartialEq)]
pub enum WeatherFailure {
    #[error("weather API key not configured")]
    NoApiKey,

    #[error("network error: {0}")]
    Network(String),

    #[error("weather API returned status {0}")]
    Api(u16),

    #[error("system error: {0}")]
    System(String),
}

impl WeatherFailure {
    pub fn tag(&self) -> String {
        match self {
            WeatherFailure::NoApiKey => "no_api_key".to_string(),
            WeatherFailure::Network(_) => "network_error".to_string(),
            WeatherFailure::Api(status) => format!("api_error_{}", status),
            WeatherFailure::System(_) => "system_error".to_string(),
        }
    }

    fn description(&self) -> &'static str {
        match self {
            WeatherFailure::NoApiKey => "Weather API not configured, using defaults",
            WeatherFailure::Network(_) => "Network failure, using defaults",
            WeatherFailure::Api(_) => "Weather API temporarily unavailable, using defaults",
            WeatherFailure::System(_) => "System temporarily unavailable, using defaults",
        }
    }
}

/// Body of `GET /weather/{lat}/{lng}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub success: bool,
    #[serde(default)]
    pub is_raining: bool,
    #[serde(default)]
    pub weather: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WeatherReport {
    pub fn from_snapshot(snapshot: WeatherSnapshot, provider: WeatherProvider) -> Self {
        Self {
            success: true,
            is_raining: snapshot.is_raining,
            description: snapshot.condition.clone(),
            weather: snapshot.condition,
            temperature: snapshot.temperature,
            location: snapshot.location,
            provider: provider.label().to_string(),
            error: None,
        }
    }

    /// Dry default served with a 200 whenever the provider cannot be used.
    pub fn fallback(at: Coordinate, failure: &WeatherFailure) -> Self {
        let location = match failure {
            WeatherFailure::System(_) => "Unknown".to_string(),
            _ => at.to_string(),
        };

        Self {
            success: true,
            is_raining: false,
            weather: "Unknown".to_string(),
            description: failure.description().to_string(),
            temperature: None,
            location,
            provider: "fallback".to_string(),
            error: Some(failure.tag()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.error.is_some() || self.provider == "fallback"
    }

    /// Fallbacks are cached briefly so a recovered provider is picked up soon.
    pub fn cache_control(&self) -> &'static str {
        if self.is_fallback() {
            cors::CACHE_FALLBACK
        } else {
            cors::CACHE_WEATHER
        }
    }

    pub fn into_snapshot(self) -> WeatherSnapshot {
        let fallback = self.is_fallback();
        WeatherSnapshot {
            is_raining: self.is_raining,
            condition: self.weather,
            temperature: self.temperature,
            location: self.location,
            fallback,
        }
    }
}

/// Reads a WeatherAPI.com `current.json` body.
pub fn parse_weatherapi(data: &Value, at: Coordinate) -> WeatherSnapshot {
    let condition = data["current"]["condition"]["text"].as_str().unwrap_or("");
    let code = data["current"]["condition"]["code"].as_i64().unwrap_or(0);
    let lowered = condition.to_lowercase();

    let is_raining = RAINY_CONDITIONS.iter().any(|c| lowered.contains(c))
        || RAINY_CONDITION_CODES.contains(&code);

    WeatherSnapshot {
        is_raining,
        condition: non_empty_or(condition, "Unknown"),
        temperature: data["current"]["temp_c"].as_f64(),
        location: data["location"]["name"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| at.to_string()),
        fallback: false,
    }
}

/// Reads an OpenWeatherMap `data/2.5/weather` body.
pub fn parse_openweathermap(data: &Value, at: Coordinate) -> WeatherSnapshot {
    let main = data["weather"][0]["main"].as_str().unwrap_or("");
    let is_raining = RAINY_MAIN.contains(&main.to_lowercase().as_str());

    WeatherSnapshot {
        is_raining,
        condition: non_empty_or(main, "Unknown"),
        temperature: data["main"]["temp"].as_f64(),
        location: data["name"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| at.to_string()),
        fallback: false,
    }
}

fn non_empty_or(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

/// Server-side client for the configured weather provider.
pub struct WeatherClient {
    http: Client,
    provider: WeatherProvider,
    api_key: Option<String>,
}

impl WeatherClient {
    pub fn new(provider: WeatherProvider, api_key: Option<String>) -> Self {
        Self {
            http: Client::new(),
            provider,
            api_key,
        }
    }

    /// Request URL and query for `at`, or `None` without an API key.
    pub fn request_parts(&self, at: Coordinate) -> Option<(&'static str, Vec<(&'static str, String)>)> {
        let key = self.api_key.clone()?;
        let parts = match self.provider {
            WeatherProvider::WeatherApi => (
                WEATHERAPI_URL,
                vec![("key", key), ("q", at.to_string()), ("aqi", "no".to_string())],
            ),
            WeatherProvider::OpenWeatherMap => (
                OPENWEATHERMAP_URL,
                vec![
                    ("lat", at.lat.to_string()),
                    ("lon", at.lng.to_string()),
                    ("appid", key),
                    ("units", "metric".to_string()),
                ],
            ),
        };
        Some(parts)
    }

    pub async fn fetch_snapshot(&self, at: Coordinate) -> Result<WeatherSnapshot, WeatherFailure> {
        let (url, query) = self.request_parts(at).ok_or(WeatherFailure::NoApiKey)?;

        log_info!("Fetching weather from {} for {}", url, at);

        let response = self
            .http
            .get(url)
            .query(&query)
            .send()
            .await
            .map_err(|e| WeatherFailure::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(WeatherFailure::Api(status));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| WeatherFailure::System(e.to_string()))?;

        Ok(match self.provider {
            WeatherProvider::WeatherApi => parse_weatherapi(&data, at),
            WeatherProvider::OpenWeatherMap => parse_openweathermap(&data, at),
        })
    }

    /// Never fails: provider problems become a dry fallback report.
    pub async fn report(&self, at: Coordinate) -> WeatherReport {
        match self.fetch_snapshot(at).await {
            Ok(snapshot) => WeatherReport::from_snapshot(snapshot, self.provider),
            Err(failure) => {
                log_error!("Weather lookup failed for {}: {}", at, failure);
                WeatherReport::fallback(at, &failure)
            }
        }
    }
}

#[async_trait(?Send)]
impl WeatherSource for WeatherClient {
    async fn current(&self, at: Coordinate) -> anyhow::Result<WeatherSnapshot> {
        self.fetch_snapshot(at)
            .await
            .with_context(|| format!("weather lookup at {}", at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn brisbane() -> Coordinate {
        Coordinate::new(-27.47, 153.02)
    }

    #[test]
    fn test_weatherapi_rain_by_text_or_code() {
        let by_text = json!({
            "location": { "name": "Brisbane" },
            "current": { "temp_c": 19.5, "condition": { "text": "Patchy rain nearby", "code": 1000 } }
        });
        let snapshot = parse_weatherapi(&by_text, brisbane());
        assert!(snapshot.is_raining);
        assert_eq!(snapshot.location, "Brisbane");
        assert_eq!(snapshot.temperature, Some(19.5));

        let by_code = json!({ "current": { "condition": { "text": "Overcast", "code": 1183 } } });
        assert!(parse_weatherapi(&by_code, brisbane()).is_raining);

        let dry = json!({ "current": { "condition": { "text": "Sunny", "code": 1000 } } });
        let snapshot = parse_weatherapi(&dry, brisbane());
        assert!(!snapshot.is_raining);
        assert_eq!(snapshot.location, "-27.47,153.02");
    }

    #[test]
    fn test_openweathermap_rain_by_main() {
        let wet = json!({ "weather": [{ "main": "Drizzle" }], "main": { "temp": 17.0 }, "name": "Sydney" });
        let snapshot = parse_openweathermap(&wet, brisbane());
        assert!(snapshot.is_raining);
        assert_eq!(snapshot.condition, "Drizzle");

        let dry = json!({ "weather": [{ "main": "Clouds" }] });
        assert!(!parse_openweathermap(&dry, brisbane()).is_raining);

        let empty = json!({});
        let snapshot = parse_openweathermap(&empty, brisbane());
        assert!(!snapshot.is_raining);
        assert_eq!(snapshot.condition, "Unknown");
    }

    #[test]
    fn test_fallback_report_is_dry_success() {
        let report = WeatherReport::fallback(brisbane(), &WeatherFailure::Api(401));
        assert!(report.success);
        assert!(!report.is_raining);
        assert_eq!(report.provider, "fallback");
        assert_eq!(report.error.as_deref(), Some("api_error_401"));
        assert_eq!(report.location, "-27.47,153.02");

        let system = WeatherReport::fallback(brisbane(), &WeatherFailure::System("boom".into()));
        assert_eq!(system.location, "Unknown");
        assert_eq!(system.error.as_deref(), Some("system_error"));
    }

    #[test]
    fn test_cache_control_by_outcome() {
        let fallback = WeatherReport::fallback(brisbane(), &WeatherFailure::NoApiKey);
        assert!(fallback.is_fallback());
        assert_eq!(fallback.cache_control(), "public, max-age=300");

        let snapshot = fallback.clone().into_snapshot();
        assert!(snapshot.fallback);
        assert!(!snapshot.is_raining);

        let sunny = json!({ "current": { "condition": { "text": "Sunny", "code": 1000 } } });
        let live = WeatherReport::from_snapshot(
            parse_weatherapi(&sunny, brisbane()),
            WeatherProvider::WeatherApi,
        );
        assert!(!live.is_fallback());
        assert_eq!(live.cache_control(), "public, max-age=1800");
        assert!(!live.into_snapshot().fallback);
    }

    #[test]
    fn test_report_wire_names() {
        let report = WeatherReport::from_snapshot(
            WeatherSnapshot {
                is_raining: true,
                condition: "Light rain".into(),
                temperature: None,
                location: "Brisbane".into(),
                fallback: false,
            },
            WeatherProvider::WeatherApi,
        );
        let wire = serde_json::to_value(&report).unwrap();
        assert_eq!(wire["isRaining"], true);
        assert_eq!(wire["provider"], "weatherapi.com");
        assert!(wire.get("error").is_none());
    }

    #[test]
    fn test_request_parts_need_key() {
        let keyless = WeatherClient::new(WeatherProvider::WeatherApi, None);
        assert!(keyless.request_parts(brisbane()).is_none());

        let owm = WeatherClient::new(WeatherProvider::OpenWeatherMap, Some("k".into()));
        let (url, query) = owm.request_parts(brisbane()).unwrap();
        assert_eq!(url, OPENWEATHERMAP_URL);
        assert!(query.contains(&("appid", "k".to_string())));
        assert!(query.contains(&("units", "metric".to_string())));
    }
}
