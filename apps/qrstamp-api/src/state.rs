//! Application state for the qrstamp API

use std::sync::Arc;

use anyhow::{Context, Result};
use image::Rgba;
use map_render::{HttpTileSource, PolygonLimits, ReverseGeocoder, TileSource};
use qr_overlay::{parse_hex_color, LabelFont, LogoFetcher};
use signature_pages::LayoutConfig;

use crate::config::Config;

pub struct AppState {
    pub config: Config,
    pub logos: LogoFetcher,
    /// `None` when no label font is configured; labels are then skipped
    pub label_font: Option<LabelFont>,
    pub tiles: Arc<dyn TileSource>,
    pub geocoder: ReverseGeocoder,
    pub layout: LayoutConfig,
    pub polygon_limits: PolygonLimits,
    pub default_color: Rgba<u8>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;
        let timeout = config.fetch_timeout();

        let default_color = parse_hex_color(&config.qr_color)
            .with_context(|| format!("Invalid default QR colour '{}'", config.qr_color))?;

        let label_font = match &config.label_font {
            Some(path) => {
                let font = LabelFont::from_file(path)
                    .with_context(|| format!("Failed to load label font {}", path.display()))?;
                tracing::info!("Loaded label font {}", path.display());
                Some(font)
            }
            None => {
                tracing::warn!("No label font configured; text labels will be skipped");
                None
            }
        };

        let tiles: Arc<dyn TileSource> =
            Arc::new(HttpTileSource::new(client.clone(), config.tile_url.clone(), timeout));
        let geocoder = ReverseGeocoder::new(
            client.clone(),
            config.geocoder_url.clone(),
            config.user_agent.clone(),
            timeout,
        );

        Ok(Self {
            logos: LogoFetcher::new(client, timeout),
            label_font,
            tiles,
            geocoder,
            layout: LayoutConfig::default(),
            polygon_limits: config.polygon_limits(),
            default_color,
            config,
        })
    }

    /// Replace the tile source, e.g. for offline rendering
    pub fn with_tile_source(mut self, tiles: Arc<dyn TileSource>) -> Self {
        self.tiles = tiles;
        self
    }
}
