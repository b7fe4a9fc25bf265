use crate::constants::GEOCODE_REGION;
use crate::error::{Result, ScraperError};
use crate::geo::Coordinate;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Resolves a free-text place to a single coordinate. One lookup per run,
/// no caching; every failure mode is fatal for the caller.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, city: &str, province: &str) -> Result<Coordinate>;
}

/// Nominatim-backed geocoder querying `"{city}, {province}, Indonesia"` with
/// `format=json&limit=1`.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    endpoint: String,
    user_agent: String,
    timeout: Duration,
}

impl NominatimGeocoder {
    pub fn new(endpoint: String, user_agent: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            user_agent,
            timeout,
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn resolve(&self, city: &str, province: &str) -> Result<Coordinate> {
        let query = format!("{}, {}, {}", city.trim(), province.trim(), GEOCODE_REGION);
        debug!("Geocoding location: {}", query);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("format", "json"), ("q", query.as_str()), ("limit", "1")])
            .header("User-Agent", &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ScraperError::Geocode(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ScraperError::Geocode(format!(
                "endpoint returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ScraperError::Geocode(format!("response was not JSON: {e}")))?;

        parse_geocode_body(&body).ok_or_else(|| {
            ScraperError::Geocode(format!("no coordinates found for '{query}'"))
        })
    }
}

/// First element of the result array; `lat`/`lon` arrive as strings or
/// numbers depending on the endpoint.
fn parse_geocode_body(body: &Value) -> Option<Coordinate> {
    let first = body.as_array()?.first()?;
    let lat = coerce_f64(first.get("lat")?)?;
    let lon = coerce_f64(first.get("lon")?)?;
    Some(Coordinate { lat, lon })
}

fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
