use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("Map has no markers to render")]
    NoMarkers,

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Tile {z}/{x}/{y} unavailable: {reason}")]
    Tile {
        z: u32,
        x: u32,
        y: u32,
        reason: String,
    },
}

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("Geocoder request failed: {0}")]
    Request(String),

    #[error("Geocoder returned status {0}")]
    Status(u16),

    #[error("No address found for {lat}, {lon}")]
    NotFound { lat: f64, lon: f64 },
}

#[derive(Error, Debug, PartialEq)]
pub enum PolygonError {
    #[error("Polygon markup is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("Polygon has more than {limit} vertices")]
    TooManyVertices { limit: usize },

    #[error("No <coordinates> element found")]
    NoCoordinates,

    #[error("Invalid coordinate tuple '{0}'")]
    InvalidTuple(String),

    #[error("Coordinate out of range: lon {lon}, lat {lat}")]
    OutOfRange { lon: f64, lat: f64 },
}
