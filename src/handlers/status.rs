use serde_json::{json, Map, Value};

use crate::config::Config;
use crate::logger::LogLevel;
use crate::routes::PUBLIC_ENDPOINTS;
use crate::tracking::DriverIcon;

pub const SERVICE_NAME: &str = "Delivery Track API";

/// `GET /`: what this worker serves. Debug requests also see which bindings are set.
pub fn process_status(config: &Config, log_level: LogLevel, timestamp: &str) -> Value {
    let icons: Map<String, Value> = DriverIcon::ALL
        .iter()
        .map(|icon| (icon.as_str().to_string(), Value::from(icon.legend())))
        .collect();

    let mut body = json!({
        "status": "OK",
        "service": format!("{} v{}", SERVICE_NAME, env!("CARGO_PKG_VERSION")),
        "features": "driver status icons",
        "timestamp": timestamp,
        "endpoints": PUBLIC_ENDPOINTS,
        "weather_provider": config.weather_provider.label(),
        "smart_icons": icons,
    });

    if log_level.should_log_debug() {
        body["environment"] = json!(config.binding_report());
    }

    body
}
