//! GeoJSON feature collections as returned by the boundary providers
//!
//! Only the parts the resolver needs are modeled: feature properties and
//! Polygon / MultiPolygon geometries, both read into a `geo::MultiPolygon`.
//! Other geometry types read as no geometry.

use geo::{Coord, LineString, MultiPolygon};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use super::reproject::CoordinateReprojector;
use crate::error::{ResolveError, Result};
use crate::model::Polygon;

/// A GeoJSON `FeatureCollection`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

/// A GeoJSON `Feature`
#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
    /// Raw provider coordinates, still in whatever CRS the provider used
    #[serde(default, deserialize_with = "multi_polygon")]
    pub geometry: Option<MultiPolygon<f64>>,
}

/// Wire shape of the supported geometry types
#[derive(Deserialize)]
#[serde(tag = "type")]
enum WireGeometry {
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
    #[serde(other)]
    Unsupported,
}

impl WireGeometry {
    fn into_multi_polygon(self) -> Option<MultiPolygon<f64>> {
        let polygons: Vec<geo::Polygon<f64>> = match self {
            WireGeometry::Polygon { coordinates } => polygon(coordinates).into_iter().collect(),
            WireGeometry::MultiPolygon { coordinates } => {
                coordinates.into_iter().filter_map(polygon).collect()
            }
            WireGeometry::Unsupported => Vec::new(),
        };
        (!polygons.is_empty()).then_some(MultiPolygon(polygons))
    }
}

fn multi_polygon<'de, D>(deserializer: D) -> std::result::Result<Option<MultiPolygon<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<WireGeometry>::deserialize(deserializer)?
        .and_then(WireGeometry::into_multi_polygon))
}

/// First ring is the exterior, the rest are holes
fn polygon(rings: Vec<Vec<Vec<f64>>>) -> Option<geo::Polygon<f64>> {
    let mut rings = rings.into_iter().map(line_string);
    let exterior = rings.next()?;
    Some(geo::Polygon::new(exterior, rings.collect()))
}

/// Extra dimensions are ignored and short positions dropped
fn line_string(positions: Vec<Vec<f64>>) -> LineString<f64> {
    positions
        .iter()
        .filter_map(|position| match position.as_slice() {
            [x, y, ..] => Some(Coord { x: *x, y: *y }),
            _ => None,
        })
        .collect()
}

/// The exterior ring with the most vertices
///
/// For multi-polygons this stands in for "largest landmass" so small
/// islands and exclaves do not take over the boundary. Holes are ignored.
pub fn largest_outer_ring(geometry: &MultiPolygon<f64>) -> Option<&LineString<f64>> {
    geometry
        .0
        .iter()
        .map(geo::Polygon::exterior)
        .filter(|ring| !ring.0.is_empty())
        .max_by_key(|ring| ring.0.len())
}

impl FeatureCollection {
    /// Deserialize a feature collection out of an already-parsed JSON value
    pub fn from_value(value: Value, endpoint: &str) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|err| ResolveError::parse(endpoint, format!("invalid GeoJSON: {}", err)))
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl Feature {
    /// First property among `keys` rendered as a string (numbers included)
    pub fn property_str(&self, keys: &[&str]) -> Option<String> {
        let properties = self.properties.as_ref()?;
        keys.iter()
            .filter_map(|key| properties.get(*key))
            .find_map(value_as_string)
    }

    /// Largest outer ring of this feature, normalized to WGS84
    pub fn polygon(&self, reprojector: &CoordinateReprojector) -> Polygon {
        self.geometry
            .as_ref()
            .and_then(largest_outer_ring)
            .map(|raw| Polygon::single(reprojector.normalize(raw)))
            .unwrap_or_default()
    }
}

/// Normalize the largest outer ring of the first feature that has one
pub fn first_feature_polygon(
    collection: &FeatureCollection,
    reprojector: &CoordinateReprojector,
) -> Polygon {
    collection
        .features
        .iter()
        .map(|feature| feature.polygon(reprojector))
        .find(|polygon| !polygon.is_empty())
        .unwrap_or_default()
}

/// Render a JSON scalar as a string; providers mix numeric and string codes
pub fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_multipolygon_keeps_ring_with_most_vertices() {
        let value = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"adm_cd": 11230680, "adm_nm": "역삼1동"},
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[127.0, 37.0], [127.1, 37.0], [127.1, 37.1]]],
                        [[[126.0, 36.0], [126.2, 36.0], [126.2, 36.2], [126.0, 36.2], [126.0, 36.0]]]
                    ]
                }
            }]
        });

        let collection = FeatureCollection::from_value(value, "test").unwrap();
        let polygon = first_feature_polygon(&collection, &CoordinateReprojector::default());

        // The triangle is closed to four vertices, still fewer than the square
        assert_eq!(polygon.rings().len(), 1);
        assert_eq!(polygon.rings()[0].len(), 5);
        assert_eq!(polygon.rings()[0].points()[0].lat, 36.0);
    }

    #[test]
    fn test_polygon_ignores_holes_and_extra_dimensions() {
        let feature: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [
                    [[127.0, 37.0, 12.5], [127.1, 37.0, 0.0], [127.1, 37.1, 0.0]],
                    [[127.02, 37.02], [127.03, 37.02], [127.03, 37.03]]
                ]
            }
        }))
        .unwrap();

        let geometry = feature.geometry.as_ref().unwrap();
        assert_eq!(geometry.0.len(), 1);
        let exterior = largest_outer_ring(geometry).unwrap();
        assert_eq!(exterior.0[0], Coord { x: 127.0, y: 37.0 });
        assert!(exterior.is_closed());

        let polygon = feature.polygon(&CoordinateReprojector::default());
        assert_eq!(polygon.rings().len(), 1);
        assert_eq!(polygon.rings()[0].points()[1].lon, 127.1);
    }

    #[test]
    fn test_unsupported_geometry_gives_empty_polygon() {
        let feature: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "properties": null,
            "geometry": {"type": "Point", "coordinates": [127.0, 37.0]}
        }))
        .unwrap();

        assert!(feature.geometry.is_none());
        assert!(feature.polygon(&CoordinateReprojector::default()).is_empty());
        assert!(feature.property_str(&["adm_nm"]).is_none());
    }

    #[test]
    fn test_property_str_accepts_numbers_and_aliases() {
        let feature: Feature = serde_json::from_value(json!({
            "properties": {"adm_cd": 1168064000_i64, "districtName": " 역삼1동 "}
        }))
        .unwrap();

        assert_eq!(
            feature.property_str(&["districtCode", "adm_cd"]).as_deref(),
            Some("1168064000")
        );
        assert_eq!(
            feature.property_str(&["districtName", "adm_nm"]).as_deref(),
            Some("역삼1동")
        );
    }

    #[test]
    fn test_invalid_shape_is_parse_error() {
        let err = FeatureCollection::from_value(json!({"features": 3}), "wfs").unwrap_err();
        assert!(matches!(err, ResolveError::Parse { .. }));
    }
}
