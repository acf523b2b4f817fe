//! Inline polygon markup
//!
//! Accepts KML-style markup: every `<coordinates>` element (optionally
//! namespaced) holds whitespace-separated `lon,lat[,alt]` tuples.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::PolygonError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolygonLimits {
    pub max_bytes: usize,
    pub max_vertices: usize,
}

impl Default for PolygonLimits {
    fn default() -> Self {
        Self {
            max_bytes: 64 * 1024,
            max_vertices: 2_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<Vertex>,
}

lazy_static! {
    static ref COORDINATES_RE: Regex =
        Regex::new(r"(?s)<(?:[\w-]+:)?coordinates(?:\s[^>]*)?>(.*?)</(?:[\w-]+:)?coordinates\s*>").unwrap();
}

fn parse_tuple(tuple: &str) -> Result<Vertex, PolygonError> {
    let invalid = || PolygonError::InvalidTuple(tuple.to_string());
    let mut parts = tuple.split(',');
    let lon: f64 = parts.next().and_then(|v| v.trim().parse().ok()).ok_or_else(invalid)?;
    let lat: f64 = parts.next().and_then(|v| v.trim().parse().ok()).ok_or_else(invalid)?;
    match parts.next() {
        Some(alt) if alt.trim().parse::<f64>().is_err() => return Err(invalid()),
        _ => {}
    }
    if parts.next().is_some() {
        return Err(invalid());
    }

    if !lon.is_finite() || !lat.is_finite() || !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        return Err(PolygonError::OutOfRange { lon, lat });
    }
    Ok(Vertex { lon, lat })
}

/// Parse every coordinate tuple in `markup`
///
/// A ring's closing vertex (equal to its first) is dropped so each corner is
/// reported once.
pub fn parse_polygon(markup: &str, limits: &PolygonLimits) -> Result<Polygon, PolygonError> {
    if markup.len() > limits.max_bytes {
        return Err(PolygonError::TooLarge {
            size: markup.len(),
            limit: limits.max_bytes,
        });
    }

    let mut vertices = Vec::new();
    let mut found = false;
    for caps in COORDINATES_RE.captures_iter(markup) {
        found = true;
        let mut ring = Vec::new();
        for tuple in caps[1].split_whitespace() {
            ring.push(parse_tuple(tuple)?);
            if vertices.len() + ring.len() > limits.max_vertices + 1 {
                return Err(PolygonError::TooManyVertices {
                    limit: limits.max_vertices,
                });
            }
        }
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        vertices.extend(ring);
    }

    if !found || vertices.is_empty() {
        return Err(PolygonError::NoCoordinates);
    }
    if vertices.len() > limits.max_vertices {
        return Err(PolygonError::TooManyVertices {
            limit: limits.max_vertices,
        });
    }
    Ok(Polygon { vertices })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const SQUARE: &str = r#"<Polygon><outerBoundaryIs><LinearRing>
        <coordinates>
            13.0,52.0,0 13.1,52.0,0 13.1,52.1,0 13.0,52.1,0 13.0,52.0,0
        </coordinates>
    </LinearRing></outerBoundaryIs></Polygon>"#;

    #[test]
    fn test_parse_ring_drops_closing_vertex() {
        let polygon = parse_polygon(SQUARE, &PolygonLimits::default()).unwrap();
        assert_eq!(polygon.vertices.len(), 4);
        assert_eq!(polygon.vertices[0], Vertex { lon: 13.0, lat: 52.0 });
        assert_eq!(polygon.vertices[2], Vertex { lon: 13.1, lat: 52.1 });
    }

    #[test]
    fn test_namespaced_and_multiple_blocks() {
        let markup = "<kml:coordinates>1,2 3,4</kml:coordinates><coordinates>5,6</coordinates>";
        let polygon = parse_polygon(markup, &PolygonLimits::default()).unwrap();
        assert_eq!(polygon.vertices.len(), 3);
        assert_eq!(polygon.vertices[2], Vertex { lon: 5.0, lat: 6.0 });
    }

    #[test]
    fn test_missing_coordinates() {
        assert_eq!(
            parse_polygon("<Polygon></Polygon>", &PolygonLimits::default()),
            Err(PolygonError::NoCoordinates)
        );
        assert_eq!(
            parse_polygon("<coordinates>  </coordinates>", &PolygonLimits::default()),
            Err(PolygonError::NoCoordinates)
        );
    }

    #[test]
    fn test_bad_tuples() {
        let limits = PolygonLimits::default();
        for markup in [
            "<coordinates>1</coordinates>",
            "<coordinates>a,b</coordinates>",
            "<coordinates>1,2,x</coordinates>",
            "<coordinates>1,2,3,4</coordinates>",
        ] {
            assert!(
                matches!(parse_polygon(markup, &limits), Err(PolygonError::InvalidTuple(_))),
                "{}",
                markup
            );
        }
        assert_eq!(
            parse_polygon("<coordinates>200,10</coordinates>", &limits),
            Err(PolygonError::OutOfRange { lon: 200.0, lat: 10.0 })
        );
    }

    #[test]
    fn test_size_limit() {
        let limits = PolygonLimits {
            max_bytes: 16,
            max_vertices: 10,
        };
        assert!(matches!(
            parse_polygon(SQUARE, &limits),
            Err(PolygonError::TooLarge { limit: 16, .. })
        ));
    }

    #[test]
    fn test_vertex_limit() {
        let limits = PolygonLimits {
            max_bytes: 1024,
            max_vertices: 3,
        };
        assert!(parse_polygon("<coordinates>1,1 2,2 3,3</coordinates>", &limits).is_ok());
        assert_eq!(
            parse_polygon("<coordinates>1,1 2,2 3,3 4,4 5,5</coordinates>", &limits),
            Err(PolygonError::TooManyVertices { limit: 3 })
        );
    }

    proptest! {
        #[test]
        fn parsing_never_panics(markup in ".{0,200}") {
            let _ = parse_polygon(&markup, &PolygonLimits::default());
        }

        #[test]
        fn generated_rings_parse(points in prop::collection::vec((-180.0f64..180.0, -90.0f64..90.0), 1..50)) {
            let body: Vec<String> = points.iter().map(|(lon, lat)| format!("{},{}", lon, lat)).collect();
            let markup = format!("<coordinates>{}</coordinates>", body.join(" "));
            let polygon = parse_polygon(&markup, &PolygonLimits::default()).unwrap();
            prop_assert!(polygon.vertices.len() <= points.len());
            prop_assert!(polygon.vertices.len() >= points.len().saturating_sub(1).max(1));
        }
    }
}
