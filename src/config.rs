use serde::Serialize;
use std::collections::BTreeMap;
use worker::Env;

use crate::logger::LogLevel;

pub const DEFAULT_MAPS_LANGUAGE: &str = "zh-CN";
pub const DEFAULT_MAPS_REGION: &str = "AU";

/// Which upstream answers `/weather/{lat}/{lng}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherProvider {
    WeatherApi,
    OpenWeatherMap,
}

impl WeatherProvider {
    pub fn from_setting(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()) {
            Some(v) if v == "openweathermap" || v == "owm" => WeatherProvider::OpenWeatherMap,
            _ => WeatherProvider::WeatherApi,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WeatherProvider::WeatherApi => "weatherapi.com",
            WeatherProvider::OpenWeatherMap => "openweathermap.org",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: Option<String>,
    pub api_key: Option<String>,
    pub google_maps_api_key: Option<String>,
    pub weather_api_key: Option<String>,
    pub weather_provider: WeatherProvider,
    pub maps_language: String,
    pub maps_region: String,
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: None,
            api_key: None,
            google_maps_api_key: None,
            weather_api_key: None,
            weather_provider: WeatherProvider::WeatherApi,
            maps_language: DEFAULT_MAPS_LANGUAGE.to_string(),
            maps_region: DEFAULT_MAPS_REGION.to_string(),
            log_level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Reads bindings from the worker environment. Missing values stay `None`;
    /// the routes that need them answer with a configuration error.
    pub fn from_env(env: &Env) -> Self {
        let defaults = Config::default();

        Self {
            backend_url: lookup(env, "BACKEND_URL").map(|url| url.trim_end_matches('/').to_string()),
            api_key: lookup(env, "API_KEY"),
            google_maps_api_key: lookup(env, "GOOGLE_MAPS_API_KEY"),
            weather_api_key: lookup(env, "WEATHER_API_KEY"),
            weather_provider: WeatherProvider::from_setting(lookup(env, "WEATHER_PROVIDER").as_deref()),
            maps_language: lookup(env, "MAPS_LANGUAGE").unwrap_or(defaults.maps_language),
            maps_region: lookup(env, "MAPS_REGION").unwrap_or(defaults.maps_region),
            log_level: lookup(env, "LOG_LEVEL")
                .map(|level| LogLevel::from_header(&level))
                .unwrap_or(defaults.log_level),
        }
    }

    /// CONFIGURED / MISSING per binding, for the debug status page.
    pub fn binding_report(&self) -> BTreeMap<&'static str, &'static str> {
        let state = |v: &Option<String>| if v.is_some() { "CONFIGURED" } else { "MISSING" };

        BTreeMap::from([
            ("BACKEND_URL", state(&self.backend_url)),
            ("API_KEY", state(&self.api_key)),
            ("GOOGLE_MAPS_API_KEY", state(&self.google_maps_api_key)),
            ("WEATHER_API_KEY", state(&self.weather_api_key)),
        ])
    }
}

/// Secrets first, then plain vars. Empty values count as missing.
fn lookup(env: &Env, name: &str) -> Option<String> {
    let value = env
        .secret(name)
        .map(|s| s.to_string())
        .or_else(|_| env.var(name).map(|v| v.to_string()))
        .ok()?;

    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
