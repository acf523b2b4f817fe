//! Reverse geocoding against a Nominatim-compatible service

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::GeocodeError;

pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    error: Option<String>,
}

/// Extract the formatted address from a `/reverse` JSON body
fn parse_reverse(body: &str, lat: f64, lon: f64) -> Result<String, GeocodeError> {
    let parsed: ReverseResponse =
        serde_json::from_str(body).map_err(|e| GeocodeError::Request(format!("Invalid JSON: {}", e)))?;

    if let Some(error) = parsed.error {
        debug!(%error, lat, lon, "Geocoder reported no match");
    }
    parsed
        .display_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or(GeocodeError::NotFound { lat, lon })
}

pub struct ReverseGeocoder {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
    timeout: Duration,
}

impl ReverseGeocoder {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        user_agent: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
            timeout,
        }
    }

    pub fn reverse_url(&self) -> String {
        format!("{}/reverse", self.base_url)
    }

    /// Formatted address for a coordinate
    pub async fn address(&self, lat: f64, lon: f64) -> Result<String, GeocodeError> {
        let response = self
            .client
            .get(self.reverse_url())
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
            ])
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| GeocodeError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), lat, lon, "Geocoder request rejected");
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GeocodeError::Request(e.to_string()))?;
        parse_reverse(&body, lat, lon)
    }
}
