use serde::{Deserialize, Serialize};
use std::cell::RefCell;

use super::models::DeliveryPerformance;
use crate::geo::Coordinate;
use crate::weather::{WeatherCache, WeatherSnapshot, WeatherSource};

/// Delay on the last completed drop beyond which a driver counts as running late.
pub const LATE_THRESHOLD_MINUTES: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverIcon {
    Normal,
    Late,
    Rain,
}

impl DriverIcon {
    pub const ALL: [DriverIcon; 3] = [DriverIcon::Normal, DriverIcon::Late, DriverIcon::Rain];

    pub fn as_str(&self) -> &'static str {
        match self {
            DriverIcon::Normal => "normal",
            DriverIcon::Late => "late",
            DriverIcon::Rain => "rain",
        }
    }

    pub fn legend(&self) -> &'static str {
        match self {
            DriverIcon::Normal => "Normal delivery (delay <= 15 min)",
            DriverIcon::Late => "Possible delay (delay > 15 min)",
            DriverIcon::Rain => "Rain delivery (highest priority)",
        }
    }

    /// Bootstrap icon class and colour for the map marker.
    pub fn marker_style(&self) -> (&'static str, &'static str) {
        match self {
            DriverIcon::Normal => ("bi-truck", "#2196f3"),
            DriverIcon::Late => ("bi-truck", "#ff9800"),
            DriverIcon::Rain => ("bi-cloud-rain", "#607d8b"),
        }
    }
}

/// Fixed precedence: rain, then lateness, then normal.
pub fn classify_conditions(is_raining: bool, delay_minutes: Option<f64>) -> DriverIcon {
    if is_raining {
        return DriverIcon::Rain;
    }
    match delay_minutes {
        Some(delay) if delay > LATE_THRESHOLD_MINUTES => DriverIcon::Late,
        _ => DriverIcon::Normal,
    }
}

/// Picks the driver icon for a position, reusing weather lookups per grid cell.
///
/// Lookups never fail the caller: a weather error counts as dry and is not
/// cached, so the next poll tries again. Cache borrows are released before
/// any await, so interleaved calls only race on which snapshot lands last.
pub struct DriverStatusClassifier {
    weather: Box<dyn WeatherSource>,
    cache: RefCell<WeatherCache>,
}

impl DriverStatusClassifier {
    pub fn new(weather: Box<dyn WeatherSource>) -> Self {
        Self::with_cache(weather, WeatherCache::new())
    }

    pub fn with_cache(weather: Box<dyn WeatherSource>, cache: WeatherCache) -> Self {
        Self {
            weather,
            cache: RefCell::new(cache),
        }
    }

    pub async fn weather_at(&self, at: Coordinate, now_ms: u64) -> WeatherSnapshot {
        let key = at.grid_key();

        let cached = self.cache.borrow().get(&key, now_ms).cloned();
        if let Some(snapshot) = cached {
            return snapshot;
        }

        match self.weather.current(at).await {
            Ok(snapshot) => {
                self.cache
                    .borrow_mut()
                    .insert(key, snapshot.clone(), now_ms);
                snapshot
            }
            Err(e) => {
                log_error!("Weather lookup for {} failed, assuming dry: {:#}", key, e);
                WeatherSnapshot::unknown(at)
            }
        }
    }

    pub async fn classify(
        &self,
        at: Coordinate,
        performance: Option<&DeliveryPerformance>,
        now_ms: u64,
    ) -> DriverIcon {
        let is_raining = self.weather_at(at, now_ms).await.is_raining;
        let delay = performance.and_then(|p| p.last_completed_order_delay_minutes);
        classify_conditions(is_raining, delay)
    }

    pub fn cached_cells(&self) -> usize {
        self.cache.borrow().len()
    }
}
