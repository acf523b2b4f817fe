//! Static maps, reverse geocoding and polygon markup
//!
//! - `staticmap`: Web Mercator tile stitching with circle markers
//! - `tiles`: tile sources (HTTP XYZ server, blank fill)
//! - `geocode`: Nominatim-compatible reverse lookup
//! - `polygon`: bounded `<coordinates>` parsing

pub mod error;
pub mod geocode;
pub mod mercator;
pub mod polygon;
pub mod staticmap;
pub mod tiles;

pub use error::{GeocodeError, MapError, PolygonError};
pub use geocode::{ReverseGeocoder, DEFAULT_GEOCODER_URL};
pub use polygon::{parse_polygon, Polygon, PolygonLimits, Vertex};
pub use staticmap::{CircleMarker, StaticMap, MARKER_RED};
pub use tiles::{BlankTileSource, HttpTileSource, TileSource, DEFAULT_TILE_URL, TILE_SIZE};

/// Canvas edge of the single-device map
pub const DEVICE_MAP_SIZE: u32 = 200;
/// Canvas edge of the polygon map
pub const POLYGON_MAP_SIZE: u32 = 400;
/// Marker diameter used by both maps
pub const MARKER_DIAMETER: u32 = 12;

/// 200x200 map with one red marker at the device position
pub fn device_map(lat: f64, lon: f64) -> StaticMap {
    let mut map = StaticMap::new(DEVICE_MAP_SIZE, DEVICE_MAP_SIZE);
    map.add_marker(CircleMarker::new(lon, lat, MARKER_RED, MARKER_DIAMETER));
    map
}

/// 400x400 map with one red marker per polygon vertex
pub fn polygon_map(polygon: &Polygon) -> StaticMap {
    let mut map = StaticMap::new(POLYGON_MAP_SIZE, POLYGON_MAP_SIZE);
    for v in &polygon.vertices {
        map.add_marker(CircleMarker::new(v.lon, v.lat, MARKER_RED, MARKER_DIAMETER));
    }
    map
}
