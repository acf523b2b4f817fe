//! Command-line and environment configuration

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use map_render::{PolygonLimits, DEFAULT_GEOCODER_URL, DEFAULT_TILE_URL};

/// Command-line arguments for the qrstamp server
///
/// Every option can also be set through the environment (or a `.env` file).
#[derive(Parser, Debug, Clone)]
#[command(name = "qrstamp-api")]
#[command(about = "Branded QR codes, static maps and signature page stamping")]
pub struct Config {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8000")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, env = "QRSTAMP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Timeout for logo, tile and geocoder requests in seconds
    #[arg(long, env = "QRSTAMP_FETCH_TIMEOUT_SECS", default_value = "10")]
    pub fetch_timeout_secs: u64,

    /// TrueType/OpenType font used for QR text labels
    #[arg(long, env = "QRSTAMP_LABEL_FONT")]
    pub label_font: Option<PathBuf>,

    /// Logo overlaid when a request does not name one
    #[arg(long, env = "QRSTAMP_DEFAULT_LOGO_URL")]
    pub default_logo_url: Option<String>,

    /// Default QR foreground colour
    #[arg(long, env = "QRSTAMP_QR_COLOR", default_value = "#7A663C")]
    pub qr_color: String,

    /// Default logo size as a fraction of the QR data area
    #[arg(long, env = "QRSTAMP_OVERLAY_PERCENTAGE", default_value = "0.3")]
    pub overlay_percentage: f64,

    /// Default label font size in points
    #[arg(long, env = "QRSTAMP_LABEL_FONT_SIZE", default_value = "24")]
    pub label_font_size: f32,

    /// XYZ tile server template with {z}, {x} and {y} placeholders
    #[arg(long, env = "QRSTAMP_TILE_URL", default_value = DEFAULT_TILE_URL)]
    pub tile_url: String,

    /// Base URL of a Nominatim-compatible geocoder
    #[arg(long, env = "QRSTAMP_GEOCODER_URL", default_value = DEFAULT_GEOCODER_URL)]
    pub geocoder_url: String,

    /// User-Agent sent to the geocoder and tile server
    #[arg(long, env = "QRSTAMP_USER_AGENT", default_value = concat!("qrstamp-api/", env!("CARGO_PKG_VERSION")))]
    pub user_agent: String,

    /// Maximum size of polygon markup in bytes
    #[arg(long, env = "QRSTAMP_POLYGON_MAX_BYTES", default_value = "65536")]
    pub polygon_max_bytes: usize,

    /// Maximum number of polygon vertices
    #[arg(long, env = "QRSTAMP_POLYGON_MAX_VERTICES", default_value = "2000")]
    pub polygon_max_vertices: usize,

    /// Return the generated owner password in /process-pdf/ responses
    #[arg(long, env = "QRSTAMP_DISCLOSE_OWNER_PASSWORD", default_value_t = true, action = ArgAction::Set)]
    pub disclose_owner_password: bool,

    /// Maximum request body size in bytes
    #[arg(long, env = "QRSTAMP_BODY_LIMIT", default_value = "33554432")]
    pub body_limit: usize,
}

impl Config {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn polygon_limits(&self) -> PolygonLimits {
        PolygonLimits {
            max_bytes: self.polygon_max_bytes,
            max_vertices: self.polygon_max_vertices,
        }
    }
}
