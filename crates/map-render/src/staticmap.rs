//! Static map rendering
//!
//! Picks the deepest zoom at which every marker fits inside the padded
//! canvas, stitches the visible tiles around the marker centroid and draws
//! filled circles on top.

use futures::future::join_all;
use image::{imageops, Rgba, RgbaImage};
use tracing::{debug, warn};

use crate::error::MapError;
use crate::mercator::{lat_to_y, lon_to_x, MAX_ZOOM};
use crate::tiles::{TileSource, TILE_SIZE};

pub const MARKER_RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Filled circle centred on a coordinate
#[derive(Debug, Clone, PartialEq)]
pub struct CircleMarker {
    pub lon: f64,
    pub lat: f64,
    pub color: Rgba<u8>,
    /// Diameter in pixels
    pub diameter: u32,
}

impl CircleMarker {
    pub fn new(lon: f64, lat: f64, color: Rgba<u8>, diameter: u32) -> Self {
        Self {
            lon,
            lat,
            color,
            diameter,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Extent {
    min_lon: f64,
    min_lat: f64,
    max_lon: f64,
    max_lat: f64,
}

#[derive(Debug, Clone)]
pub struct StaticMap {
    pub width: u32,
    pub height: u32,
    /// Pixels kept free on each side when fitting the zoom
    pub padding: u32,
    /// Shown where a tile could not be fetched
    pub background: Rgba<u8>,
    markers: Vec<CircleMarker>,
}

impl StaticMap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            padding: 0,
            background: Rgba([255, 255, 255, 255]),
            markers: Vec::new(),
        }
    }

    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    pub fn add_marker(&mut self, marker: CircleMarker) {
        self.markers.push(marker);
    }

    pub fn markers(&self) -> &[CircleMarker] {
        &self.markers
    }

    fn extent(&self) -> Result<Extent, MapError> {
        let first = self.markers.first().ok_or(MapError::NoMarkers)?;
        let mut extent = Extent {
            min_lon: first.lon,
            min_lat: first.lat,
            max_lon: first.lon,
            max_lat: first.lat,
        };

        for m in &self.markers {
            if !m.lon.is_finite() || !(-180.0..=180.0).contains(&m.lon) {
                return Err(MapError::InvalidCoordinate(format!("longitude {}", m.lon)));
            }
            if !m.lat.is_finite() || !(-90.0..=90.0).contains(&m.lat) {
                return Err(MapError::InvalidCoordinate(format!("latitude {}", m.lat)));
            }
            extent.min_lon = extent.min_lon.min(m.lon);
            extent.max_lon = extent.max_lon.max(m.lon);
            extent.min_lat = extent.min_lat.min(m.lat);
            extent.max_lat = extent.max_lat.max(m.lat);
        }
        Ok(extent)
    }

    /// Deepest zoom in `0..=17` at which the marker extent fits
    ///
    /// The largest marker diameter is reserved on top of the padding so that
    /// circles at the edge stay fully visible. Falls back to 0 when nothing
    /// fits.
    pub fn determine_zoom(&self) -> Result<u32, MapError> {
        let extent = self.extent()?;
        let reserve = 2 * self.padding + self.markers.iter().map(|m| m.diameter).max().unwrap_or(0);
        let avail_w = self.width.saturating_sub(reserve) as f64;
        let avail_h = self.height.saturating_sub(reserve) as f64;
        let tile = TILE_SIZE as f64;

        for zoom in (0..=MAX_ZOOM).rev() {
            let w = (lon_to_x(extent.max_lon, zoom) - lon_to_x(extent.min_lon, zoom)) * tile;
            let h = (lat_to_y(extent.min_lat, zoom) - lat_to_y(extent.max_lat, zoom)) * tile;
            if w <= avail_w && h <= avail_h {
                return Ok(zoom);
            }
        }
        Ok(0)
    }

    /// Render the map
    ///
    /// Tiles that fail to load are logged and left as background.
    pub async fn render(&self, tiles: &dyn TileSource) -> Result<RgbaImage, MapError> {
        let extent = self.extent()?;
        let zoom = self.determine_zoom()?;
        let world = 1i64 << zoom;
        let tile = TILE_SIZE as f64;

        let center_x = (lon_to_x(extent.min_lon, zoom) + lon_to_x(extent.max_lon, zoom)) / 2.0;
        let center_y = (lat_to_y(extent.min_lat, zoom) + lat_to_y(extent.max_lat, zoom)) / 2.0;
        let half_w = self.width as f64 / 2.0;
        let half_h = self.height as f64 / 2.0;

        let to_px = |x: f64, y: f64| -> (f64, f64) {
            ((x - center_x) * tile + half_w, (y - center_y) * tile + half_h)
        };

        let x_min = (center_x - half_w / tile).floor() as i64;
        let x_max = (center_x + half_w / tile).ceil() as i64;
        let y_min = ((center_y - half_h / tile).floor() as i64).max(0);
        let y_max = ((center_y + half_h / tile).ceil() as i64).min(world);

        let positions: Vec<(i64, i64)> = (x_min..x_max)
            .flat_map(|x| (y_min..y_max).map(move |y| (x, y)))
            .collect();
        debug!(zoom, tiles = positions.len(), markers = self.markers.len(), "Rendering static map");

        let fetches = positions.iter().map(|&(x, y)| {
            tiles.tile(zoom, x.rem_euclid(world) as u32, y as u32)
        });
        let results = join_all(fetches).await;

        let mut canvas = RgbaImage::from_pixel(self.width, self.height, self.background);
        for (&(x, y), result) in positions.iter().zip(results) {
            match result {
                Ok(img) => {
                    let (px, py) = to_px(x as f64, y as f64);
                    imageops::overlay(&mut canvas, &img, px.round() as i64, py.round() as i64);
                }
                Err(e) => warn!(error = %e, "Leaving tile blank"),
            }
        }

        for m in &self.markers {
            let (px, py) = to_px(lon_to_x(m.lon, zoom), lat_to_y(m.lat, zoom));
            fill_circle(&mut canvas, px, py, m.diameter as f64 / 2.0, m.color);
        }

        Ok(canvas)
    }
}

fn fill_circle(canvas: &mut RgbaImage, cx: f64, cy: f64, radius: f64, color: Rgba<u8>) {
    let (w, h) = canvas.dimensions();
    let x0 = (cx - radius).floor().max(0.0) as u32;
    let y0 = (cy - radius).floor().max(0.0) as u32;
    let x1 = ((cx + radius).ceil().max(0.0) as u32).min(w);
    let y1 = ((cy + radius).ceil().max(0.0) as u32).min(h);
    let r2 = radius * radius;

    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f64 + 0.5 - cx;
            let dy = y as f64 + 0.5 - cy;
            if dx * dx + dy * dy <= r2 {
                canvas.put_pixel(x, y, color);
            }
        }
    }
}
