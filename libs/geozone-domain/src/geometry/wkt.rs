//! Minimal WKT ring parser for trade-zone boundaries
//!
//! Trade zones publish `POLYGON((lon lat, ...))` strings (occasionally
//! `MULTIPOLYGON`). Every innermost parenthesized group becomes a ring; each
//! comma-separated token inside it is read as `lon lat`. Malformed points are
//! dropped rather than failing the whole boundary.

use geo::{Coord, LineString};
use tracing::debug;

use super::reproject::CoordinateReprojector;
use crate::model::{Polygon, Ring};

/// Parse a WKT polygon into internal `[lat, lon]` rings
///
/// Rings left with fewer than three valid points are discarded, so a string
/// with no usable ring yields an empty polygon.
pub fn parse_wkt(wkt: &str) -> Polygon {
    let reprojector = CoordinateReprojector::default();
    let rings = raw_rings(wkt)
        .into_iter()
        .map(|raw| reprojector.normalize(&raw))
        .collect::<Vec<Ring>>();
    Polygon::new(rings)
}

/// Split a WKT string into raw rings, still in the provider's CRS
pub fn raw_rings(wkt: &str) -> Vec<LineString<f64>> {
    let body = strip_keyword(wkt.trim());
    let mut rings = Vec::new();
    let mut group_start = None;

    for (idx, ch) in body.char_indices() {
        match ch {
            '(' => group_start = Some(idx + 1),
            ')' => {
                if let Some(start) = group_start.take() {
                    rings.push(parse_ring(&body[start..idx]));
                }
            }
            _ => {}
        }
    }

    rings
}

fn strip_keyword(wkt: &str) -> &str {
    let upper = wkt.to_ascii_uppercase();
    for keyword in ["MULTIPOLYGON", "POLYGON"] {
        if upper.starts_with(keyword) {
            return &wkt[keyword.len()..];
        }
    }
    wkt
}

fn parse_ring(text: &str) -> LineString<f64> {
    text.split(',').filter_map(parse_point).collect()
}

fn parse_point(token: &str) -> Option<Coord<f64>> {
    let mut parts = token.split_whitespace();
    let x = parts.next()?.parse::<f64>().ok();
    let y = parts.next().and_then(|value| value.parse::<f64>().ok());
    match (x, y) {
        (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some(Coord { x, y }),
        _ => {
            debug!(token = token.trim(), "Dropping malformed WKT point");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Point;

    #[test]
    fn test_single_ring_is_axis_swapped() {
        let polygon =
            parse_wkt("POLYGON((126.97 37.56, 126.98 37.56, 126.98 37.57, 126.97 37.56))");

        assert_eq!(polygon.rings().len(), 1);
        let points = polygon.rings()[0].points();
        assert_eq!(points.len(), 4);
        assert_eq!(points[0], Point::new(37.56, 126.97));
        assert_eq!(points[3], points[0]);
    }

    #[test]
    fn test_ring_and_point_counts_survive() {
        let wkt = "POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0), (2 2, 4 2, 4 4, 2 2))";
        let polygon = parse_wkt(wkt);

        assert_eq!(polygon.rings().len(), 2);
        assert_eq!(polygon.rings()[0].len(), 5);
        assert_eq!(polygon.rings()[1].len(), 4);
    }

    #[test]
    fn test_multipolygon_yields_every_ring() {
        let wkt = "MULTIPOLYGON(((0 0, 1 0, 1 1, 0 0)),((5 5, 6 5, 6 6, 5 5)))";
        assert_eq!(parse_wkt(wkt).rings().len(), 2);
    }

    #[test]
    fn test_malformed_points_are_dropped() {
        let wkt = "POLYGON((126.97 37.56, abc def, 126.98 37.56, 126.98, 126.98 37.57, 126.97 37.56))";
        let polygon = parse_wkt(wkt);

        assert_eq!(polygon.rings().len(), 1);
        assert_eq!(polygon.rings()[0].len(), 4);
    }

    #[test]
    fn test_fully_malformed_ring_is_removed() {
        let wkt = "POLYGON((0 0, 1 0, 1 1, 0 0), (x y, foo, bar baz))";
        let polygon = parse_wkt(wkt);
        assert_eq!(polygon.rings().len(), 1);
    }

    #[test]
    fn test_garbage_yields_empty_polygon() {
        assert!(parse_wkt("").is_empty());
        assert!(parse_wkt("POINT(1 2)").is_empty());
        assert!(parse_wkt("POLYGON EMPTY").is_empty());
    }

    #[test]
    fn test_raw_rings_keep_provider_coordinates() {
        let rings = raw_rings("POLYGON((958000 1944000, 959000 1944000, 959000 1945000))");
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].0[1], Coord { x: 959_000.0, y: 1_944_000.0 });
    }

    #[test]
    fn test_lowercase_keyword() {
        let polygon = parse_wkt("polygon((0 0, 1 0, 1 1))");
        assert_eq!(polygon.point_count(), 3);
    }
}
