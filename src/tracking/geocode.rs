use anyhow::Context as AnyhowContext;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::geo::Coordinate;

pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const NOMINATIM_COUNTRY: &str = "Australia";

#[async_trait(?Send)]
pub trait GeocodeProvider {
    fn name(&self) -> &'static str;

    /// `Ok(None)` when the provider answered but found nothing.
    async fn locate(&self, address: &str) -> anyhow::Result<Option<Coordinate>>;
}

/// Tries each provider in order; the first coordinate wins.
pub struct Geocoder {
    tiers: Vec<Box<dyn GeocodeProvider>>,
}

impl Geocoder {
    pub fn new(tiers: Vec<Box<dyn GeocodeProvider>>) -> Self {
        Self { tiers }
    }

    /// Google through the proxy first, then Nominatim.
    pub fn standard(proxy_base_url: &str) -> Self {
        Self::new(vec![
            Box::new(ProxyGeocoder::new(proxy_base_url)),
            Box::new(NominatimGeocoder::new()),
        ])
    }

    pub async fn locate(&self, address: &str) -> Option<Coordinate> {
        if address.trim().is_empty() {
            return None;
        }

        for tier in &self.tiers {
            match tier.locate(address).await {
                Ok(Some(found)) => return Some(found),
                Ok(None) => log_info!("{} found no match for destination", tier.name()),
                Err(e) => log_error!("{} geocoding failed: {:#}", tier.name(), e),
            }
        }
        None
    }
}

/// First result of a Google geocoding body, when the status is `OK`.
pub fn parse_google(data: &Value) -> Option<Coordinate> {
    if data["status"].as_str() != Some("OK") {
        return None;
    }
    let location = &data["results"][0]["geometry"]["location"];
    Some(Coordinate::new(location["lat"].as_f64()?, location["lng"].as_f64()?))
}

/// First hit of a Nominatim search body. Coordinates arrive as strings.
pub fn parse_nominatim(data: &Value) -> Option<Coordinate> {
    let hit = data.as_array()?.first()?;
    let lat = hit["lat"].as_str()?.parse::<f64>().ok()?;
    let lng = hit["lon"].as_str()?.parse::<f64>().ok()?;
    Some(Coordinate::new(lat, lng))
}

/// Google geocoding via the worker's `/maps/geocoding`, which adds the key.
pub struct ProxyGeocoder {
    http: Client,
    base_url: String,
}

impl ProxyGeocoder {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait(?Send)]
impl GeocodeProvider for ProxyGeocoder {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn locate(&self, address: &str) -> anyhow::Result<Option<Coordinate>> {
        let data: Value = self
            .http
            .get(format!("{}/maps/geocoding", self.base_url))
            .query(&[("address", address)])
            .send()
            .await
            .context("Failed to reach geocoding proxy")?
            .error_for_status()
            .context("Geocoding proxy returned an error")?
            .json()
            .await
            .context("Failed to read geocoding response")?;
        Ok(parse_google(&data))
    }
}

pub struct NominatimGeocoder {
    http: Client,
    url: String,
}

impl Default for NominatimGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

impl NominatimGeocoder {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
            url: NOMINATIM_URL.to_string(),
        }
    }
}

#[async_trait(?Send)]
impl GeocodeProvider for NominatimGeocoder {
    fn name(&self) -> &'static str {
        "nominatim"
    }

    async fn locate(&self, address: &str) -> anyhow::Result<Option<Coordinate>> {
        let query = format!("{}, {}", address, NOMINATIM_COUNTRY);
        let data: Value = self
            .http
            .get(&self.url)
            .header("user-agent", "DeliveryTrack/3.0")
            .query(&[("format", "json"), ("q", query.as_str()), ("limit", "1")])
            .send()
            .await
            .context("Failed to reach Nominatim")?
            .error_for_status()
            .context("Nominatim returned an error")?
            .json()
            .await
            .context("Failed to read Nominatim response")?;
        Ok(parse_nominatim(&data))
    }
}
