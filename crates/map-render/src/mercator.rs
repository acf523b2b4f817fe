//! Web Mercator conversions in tile units
//!
//! At zoom `z` the world is `2^z` tiles wide; `x` grows east and `y` grows
//! south, both starting at 0 on the antimeridian / north edge.

use std::f64::consts::PI;

/// Highest zoom level used when fitting markers
pub const MAX_ZOOM: u32 = 17;

/// Latitude limit of the square Mercator projection
pub const MAX_LATITUDE: f64 = 85.051_128_78;

fn world_tiles(zoom: u32) -> f64 {
    (1u64 << zoom) as f64
}

pub fn lon_to_x(lon: f64, zoom: u32) -> f64 {
    (lon + 180.0) / 360.0 * world_tiles(zoom)
}

pub fn lat_to_y(lat: f64, zoom: u32) -> f64 {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * world_tiles(zoom)
}

pub fn x_to_lon(x: f64, zoom: u32) -> f64 {
    x / world_tiles(zoom) * 360.0 - 180.0
}

pub fn y_to_lat(y: f64, zoom: u32) -> f64 {
    (PI * (1.0 - 2.0 * y / world_tiles(zoom))).sinh().atan().to_degrees()
}
