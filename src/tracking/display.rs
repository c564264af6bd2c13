//! Text shown next to the map: arrival windows, update times and popups.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta};

/// Half-width of the estimated arrival window.
pub const ARRIVAL_WINDOW_MINUTES: i64 = 30;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// RFC 3339 first; offset-less timestamps are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc().fixed_offset())
}

/// `HH:MM-HH:MM` around the estimate. Unparseable input is returned as-is.
pub fn arrival_window(raw: &str) -> String {
    let Some(estimate) = parse_timestamp(raw) else {
        return raw.to_string();
    };
    let half = TimeDelta::minutes(ARRIVAL_WINDOW_MINUTES);
    format!(
        "{}-{}",
        (estimate - half).format("%H:%M"),
        (estimate + half).format("%H:%M")
    )
}

pub fn format_datetime(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Relative age of a location fix, falling back to the full date after a day.
pub fn time_ago(raw: &str, now_ms: u64) -> String {
    let (Some(updated), Some(now)) = (
        parse_timestamp(raw),
        DateTime::from_timestamp_millis(now_ms as i64),
    ) else {
        return raw.to_string();
    };

    let minutes = now.signed_duration_since(updated).num_minutes();
    if minutes < 1 {
        return "just now".to_string();
    }
    if minutes < 60 {
        return format!("{} min ago", minutes);
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{} h ago", hours);
    }
    format_datetime(raw)
}

pub fn popup_text(driver_name: Option<&str>, last_update: Option<&str>) -> String {
    let name = driver_name.filter(|n| !n.is_empty()).unwrap_or("Delivery driver");
    let updated = last_update.map(format_datetime).unwrap_or_else(|| "unknown".to_string());
    format!("{}\nLast updated: {}", name, updated)
}
