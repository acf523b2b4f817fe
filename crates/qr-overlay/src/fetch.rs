//! Logo download
//!
//! `fetch` reports every failure as a typed [`FetchError`]; `fetch_optional`
//! turns that into "no overlay" for callers that degrade gracefully.

use std::time::Duration;

use image::RgbaImage;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};

use crate::error::FetchError;

/// Largest logo body that will be downloaded
pub const MAX_LOGO_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct LogoFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl LogoFetcher {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Download and decode the image at `url`
    pub async fn fetch(&self, url: &str) -> Result<RgbaImage, FetchError> {
        debug!(%url, "Fetching logo");

        let mut response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        check_content_type(&content_type)?;

        check_length(response.content_length(), MAX_LOGO_BYTES)?;

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?
        {
            bytes.extend_from_slice(&chunk);
            check_length(Some(bytes.len() as u64), MAX_LOGO_BYTES)?;
        }

        decode_logo(&bytes)
    }

    /// Like [`fetch`](Self::fetch), but logs the failure and yields `None`
    pub async fn fetch_optional(&self, url: &str) -> Option<RgbaImage> {
        match self.fetch(url).await {
            Ok(image) => Some(image),
            Err(e) => {
                warn!(%url, error = %e, "Logo unavailable, skipping overlay");
                None
            }
        }
    }
}

fn check_content_type(content_type: &str) -> Result<(), FetchError> {
    if content_type.to_ascii_lowercase().contains("image") {
        Ok(())
    } else if content_type.is_empty() {
        Err(FetchError::NotAnImage("<missing>".into()))
    } else {
        Err(FetchError::NotAnImage(content_type.to_string()))
    }
}

fn check_length(length: Option<u64>, limit: u64) -> Result<(), FetchError> {
    match length {
        Some(len) if len > limit => Err(FetchError::TooLarge(len)),
        _ => Ok(()),
    }
}

/// Decode logo bytes of any supported format into RGBA
pub fn decode_logo(bytes: &[u8]) -> Result<RgbaImage, FetchError> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| FetchError::Decode(e.to_string()))
}
