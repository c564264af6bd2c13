pub mod cache;
pub mod provider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

pub use cache::WeatherCache;
pub use provider::{WeatherClient, WeatherFailure, WeatherReport};

/// Current conditions at one point, reduced to what the icon logic needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub is_raining: bool,
    pub condition: String,
    pub temperature: Option<f64>,
    pub location: String,
    /// Dry default served because the provider could not be used.
    #[serde(default)]
    pub fallback: bool,
}

impl WeatherSnapshot {
    /// The "assume dry" value used whenever a lookup fails.
    pub fn unknown(at: Coordinate) -> Self {
        Self {
            is_raining: false,
            condition: "Unknown".to_string(),
            temperature: None,
            location: at.to_string(),
            fallback: true,
        }
    }
}

/// Anything that can answer "what is the weather here right now".
#[async_trait(?Send)]
pub trait WeatherSource {
    async fn current(&self, at: Coordinate) -> anyhow::Result<WeatherSnapshot>;
}
