//! Map tile sources

use std::time::Duration;

use async_trait::async_trait;
use image::RgbaImage;
use tracing::debug;

use crate::error::MapError;

/// Edge length of a raster map tile
pub const TILE_SIZE: u32 = 256;

pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Supplies 256x256 raster tiles by zoom and tile index
#[async_trait]
pub trait TileSource: Send + Sync {
    async fn tile(&self, z: u32, x: u32, y: u32) -> Result<RgbaImage, MapError>;
}

/// Fetches tiles from an XYZ tile server
///
/// The URL template takes `{z}`, `{x}` and `{y}` placeholders.
pub struct HttpTileSource {
    client: reqwest::Client,
    url_template: String,
    timeout: Duration,
}

impl HttpTileSource {
    pub fn new(client: reqwest::Client, url_template: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            url_template: url_template.into(),
            timeout,
        }
    }

    pub fn tile_url(&self, z: u32, x: u32, y: u32) -> String {
        self.url_template
            .replace("{z}", &z.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }
}

#[async_trait]
impl TileSource for HttpTileSource {
    async fn tile(&self, z: u32, x: u32, y: u32) -> Result<RgbaImage, MapError> {
        let url = self.tile_url(z, x, y);
        let tile_error = |reason: String| MapError::Tile { z, x, y, reason };
        debug!(%url, "Fetching tile");

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| tile_error(e.to_string()))?;
        if !response.status().is_success() {
            return Err(tile_error(format!("status {}", response.status().as_u16())));
        }
        let bytes = response.bytes().await.map_err(|e| tile_error(e.to_string()))?;

        image::load_from_memory(&bytes)
            .map(|img| img.to_rgba8())
            .map_err(|e| tile_error(e.to_string()))
    }
}

/// Every tile is a flat fill; for offline rendering and tests
pub struct BlankTileSource {
    pub fill: image::Rgba<u8>,
}

impl Default for BlankTileSource {
    fn default() -> Self {
        Self {
            fill: image::Rgba([242, 239, 233, 255]),
        }
    }
}

#[async_trait]
impl TileSource for BlankTileSource {
    async fn tile(&self, _z: u32, _x: u32, _y: u32) -> Result<RgbaImage, MapError> {
        Ok(RgbaImage::from_pixel(TILE_SIZE, TILE_SIZE, self.fill))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tile_url_substitution() {
        let source = HttpTileSource::new(
            reqwest::Client::new(),
            "https://tiles.test/{z}/{x}/{y}.png",
            Duration::from_secs(1),
        );
        assert_eq!(source.tile_url(12, 2048, 1361), "https://tiles.test/12/2048/1361.png");
    }

    #[tokio::test]
    async fn test_unreachable_tile_server_is_tile_error() {
        let source = HttpTileSource::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9/{z}/{x}/{y}.png",
            Duration::from_millis(500),
        );
        let result = source.tile(1, 0, 0).await;
        assert!(matches!(result, Err(MapError::Tile { z: 1, x: 0, y: 0, .. })));
    }
}
