//! Address geocoding.
//!
//! [`Geocoder`] is the port; [`NominatimGeocoder`] talks to an OpenStreetMap
//! Nominatim search endpoint restricted to Great Britain.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, REFERER, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use crate::error::GeocodeError;
use crate::types::Coordinates;

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_USER_AGENT: &str = "planning-context/0.1 (address lookup)";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const BODY_EXCERPT_CHARS: usize = 200;

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NominatimConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Sent as `Referer` when set.
    pub referer: Option<String>,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NOMINATIM_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: None,
        }
    }
}

pub struct NominatimGeocoder {
    client: Client,
    config: NominatimConfig,
}

impl NominatimGeocoder {
    pub fn new(config: NominatimConfig) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        let mut request = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("q", address),
                ("format", "jsonv2"),
                ("limit", "1"),
                ("addressdetails", "1"),
                ("countrycodes", "gb"),
            ])
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, &self.config.user_agent);
        if let Some(referer) = &self.config.referer {
            request = request.header(REFERER, referer);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response
            .text()
            .await
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;

        interpret_response(status, &content_type, &body).inspect_err(|e| {
            warn!(status, error = %e, "geocoder rejected address");
        })
    }
}

/// Turn a raw Nominatim response into coordinates.
pub fn interpret_response(
    status: u16,
    content_type: &str,
    body: &str,
) -> Result<Coordinates, GeocodeError> {
    if !content_type.to_ascii_lowercase().contains("application/json") {
        return Err(GeocodeError::NonJson {
            status,
            body: excerpt(body),
        });
    }
    if !(200..300).contains(&status) {
        return Err(GeocodeError::Upstream {
            status,
            body: excerpt(body),
        });
    }

    let parsed: Value = serde_json::from_str(body).map_err(|_| GeocodeError::NonJson {
        status,
        body: excerpt(body),
    })?;
    let Some(first) = parsed.as_array().and_then(|results| results.first()) else {
        return Err(GeocodeError::NotFound);
    };

    let lat = coordinate(first.get("lat")).ok_or(GeocodeError::InvalidCoordinates)?;
    let lng = coordinate(first.get("lon")).ok_or(GeocodeError::InvalidCoordinates)?;

    Ok(Coordinates {
        lat,
        lng,
        display_name: first
            .get("display_name")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

/// Nominatim sends coordinates as strings; accept numbers too.
fn coordinate(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Number(n) => n.as_f64()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}
