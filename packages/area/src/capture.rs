//! Boundary capture from the embedded map surface.
//!
//! The map posts a single message when the user confirms a drawing:
//!
//! ```json
//! { "polygon": "{\"type\":\"Polygon\",\"coordinates\":[[[lon,lat],...]]}", "area": 12345.6 }
//! ```
//!
//! `polygon` may be a `GeoJSON` geometry or feature, a bare coordinates
//! array, or a string holding either. A bare `null` message, or a
//! `polygon` of `"null"` or `null`, means nothing is drawn yet and is not an
//! error. A message without a `polygon` key is malformed.

use geo::GeodesicArea;
use geojson::GeoJson;
use serde::Deserialize;
use skyfarm_area_models::{GeometryError, PolygonGeometry};

/// Errors from parsing a map message.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CaptureError {
    /// The message could not be parsed.
    #[error("malformed map message: {message}")]
    Malformed {
        /// Description of the parsing failure.
        message: String,
    },

    /// The polygon parsed but cannot be used as a field boundary.
    #[error("unusable polygon: {0}")]
    Degenerate(#[from] GeometryError),
}

impl CaptureError {
    fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MapMessage {
    polygon: serde_json::Value,
    #[serde(default)]
    area: Option<f64>,
}

/// Parses a raw map message.
///
/// Returns `Ok(None)` when the map reports that no polygon is drawn. When
/// the reported area is missing or not positive, the geodesic area of the
/// ring is used instead.
///
/// # Errors
///
/// Returns [`CaptureError::Malformed`] if the payload cannot be parsed and
/// [`CaptureError::Degenerate`] if the ring cannot bound a field.
pub fn capture(raw: &str) -> Result<Option<PolygonGeometry>, CaptureError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| CaptureError::malformed(format!("invalid JSON: {e}")))?;
    if value.is_null() {
        log::debug!("Map posted the no-polygon sentinel");
        return Ok(None);
    }
    let message: MapMessage = serde_json::from_value(value)
        .map_err(|e| CaptureError::malformed(format!("invalid map message: {e}")))?;
    capture_value(&message.polygon, message.area)
}

/// Same as [`capture`] for an already-decoded polygon value and area.
///
/// # Errors
///
/// See [`capture`].
pub fn capture_value(
    polygon: &serde_json::Value,
    area: Option<f64>,
) -> Result<Option<PolygonGeometry>, CaptureError> {
    let Some(ring) = parse_polygon(polygon, true)? else {
        log::debug!("Map reported no polygon");
        return Ok(None);
    };

    let area_m2 = match area {
        Some(a) if a.is_finite() && a > 0.0 => a,
        other => {
            let computed = geodesic_area_m2(&ring);
            log::debug!("Map area {other:?} unusable, computed {computed:.1} m² from ring");
            computed
        }
    };

    let geometry = PolygonGeometry::new(ring, area_m2)?;
    log::info!(
        "Captured polygon with {} positions ({:.1} m²)",
        geometry.ring().len(),
        geometry.planar_area_m2()
    );
    Ok(Some(geometry))
}

/// Extracts the exterior ring from a polygon value. `None` means the
/// "no polygon" sentinel.
fn parse_polygon(
    value: &serde_json::Value,
    allow_string: bool,
) -> Result<Option<Vec<[f64; 2]>>, CaptureError> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || s == "null" {
                return Ok(None);
            }
            if !allow_string {
                return Err(CaptureError::malformed("polygon string is double-encoded"));
            }
            let inner: serde_json::Value = serde_json::from_str(s)
                .map_err(|e| CaptureError::malformed(format!("invalid polygon JSON: {e}")))?;
            parse_polygon(&inner, false)
        }
        serde_json::Value::Object(_) => ring_from_geojson(value).map(Some),
        serde_json::Value::Array(_) => ring_from_coordinates(value).map(Some),
        other => Err(CaptureError::malformed(format!(
            "expected polygon, got {other}"
        ))),
    }
}

fn ring_from_geojson(value: &serde_json::Value) -> Result<Vec<[f64; 2]>, CaptureError> {
    let geojson = GeoJson::from_json_value(value.clone())
        .map_err(|e| CaptureError::malformed(format!("invalid GeoJSON: {e}")))?;

    let geometry = match geojson {
        GeoJson::Geometry(geometry) => geometry,
        GeoJson::Feature(feature) => feature
            .geometry
            .ok_or_else(|| CaptureError::malformed("feature has no geometry"))?,
        GeoJson::FeatureCollection(_) => {
            return Err(CaptureError::malformed(
                "expected a single polygon, got a feature collection",
            ));
        }
    };

    match geometry.value {
        geojson::Value::Polygon(rings) => exterior_ring(&rings),
        other => Err(CaptureError::malformed(format!(
            "expected Polygon geometry, got {}",
            geometry_type(&other)
        ))),
    }
}

const fn geometry_type(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

/// Accepts either polygon coordinates (`[[[lon, lat], ...]]`) or a bare
/// ring (`[[lon, lat], ...]`).
fn ring_from_coordinates(value: &serde_json::Value) -> Result<Vec<[f64; 2]>, CaptureError> {
    if let Ok(rings) = serde_json::from_value::<Vec<Vec<Vec<f64>>>>(value.clone()) {
        return exterior_ring(&rings);
    }
    let ring = serde_json::from_value::<Vec<Vec<f64>>>(value.clone())
        .map_err(|e| CaptureError::malformed(format!("invalid coordinates: {e}")))?;
    exterior_ring(&[ring])
}

fn exterior_ring(rings: &[Vec<Vec<f64>>]) -> Result<Vec<[f64; 2]>, CaptureError> {
    let exterior = rings
        .first()
        .ok_or_else(|| CaptureError::malformed("polygon has no rings"))?;

    exterior
        .iter()
        .map(|position| match position.as_slice() {
            [lon, lat, ..] => Ok([*lon, *lat]),
            _ => Err(CaptureError::malformed(
                "position needs longitude and latitude",
            )),
        })
        .collect()
}

/// Geodesic area of a lon/lat ring on the WGS84 ellipsoid, in m².
#[must_use]
pub fn geodesic_area_m2(ring: &[[f64; 2]]) -> f64 {
    let exterior: geo::LineString<f64> = ring.iter().map(|&[lon, lat]| (lon, lat)).collect();
    geo::Polygon::new(exterior, Vec::new()).geodesic_area_unsigned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = "[[[-47.0,-15.0],[-46.99,-15.0],[-46.99,-14.99],[-47.0,-14.99],[-47.0,-15.0]]]";

    #[test]
    fn null_sentinel_is_not_an_error() {
        assert_eq!(capture("null"), Ok(None));
        assert_eq!(capture(" null\n"), Ok(None));
        assert_eq!(capture(r#"{"polygon":"null","area":0}"#), Ok(None));
        assert_eq!(capture(r#"{"polygon":null}"#), Ok(None));
    }

    #[test]
    fn missing_polygon_key_is_malformed() {
        assert!(matches!(capture(r"{}"), Err(CaptureError::Malformed { .. })));
        assert!(matches!(
            capture(r#"{"area":12.0}"#),
            Err(CaptureError::Malformed { .. })
        ));
    }

    #[test]
    fn captures_stringified_geometry() {
        let geometry = format!(r#"{{"type":"Polygon","coordinates":{SQUARE}}}"#);
        let raw = serde_json::json!({ "polygon": geometry, "area": 1_150_000.0 }).to_string();
        let polygon = capture(&raw).unwrap().unwrap();
        assert_eq!(polygon.ring().len(), 4);
        assert!((polygon.planar_area_m2() - 1_150_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn captures_stringified_coordinates() {
        let raw = serde_json::json!({ "polygon": SQUARE, "area": 10.0 }).to_string();
        assert!(capture(&raw).unwrap().is_some());
    }

    #[test]
    fn captures_inline_feature() {
        let raw = serde_json::json!({
            "polygon": {
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": serde_json::from_str::<serde_json::Value>(SQUARE).unwrap()
                }
            },
            "area": 10.0
        })
        .to_string();
        assert!(capture(&raw).unwrap().is_some());
    }

    #[test]
    fn computes_area_when_missing() {
        let raw = serde_json::json!({ "polygon": SQUARE }).to_string();
        let polygon = capture(&raw).unwrap().unwrap();
        // ~1.07 km x ~1.11 km near 15°S
        assert!(polygon.planar_area_m2() > 1_000_000.0);
        assert!(polygon.planar_area_m2() < 1_300_000.0);
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(matches!(capture("not json"), Err(CaptureError::Malformed { .. })));
        let raw = serde_json::json!({ "polygon": "{oops", "area": 1.0 }).to_string();
        assert!(matches!(capture(&raw), Err(CaptureError::Malformed { .. })));
        let raw = serde_json::json!({ "polygon": 5, "area": 1.0 }).to_string();
        assert!(matches!(capture(&raw), Err(CaptureError::Malformed { .. })));
    }

    #[test]
    fn non_polygon_geometry_is_malformed() {
        let raw = serde_json::json!({
            "polygon": { "type": "Point", "coordinates": [-47.0, -15.0] },
            "area": 1.0
        })
        .to_string();
        assert!(matches!(capture(&raw), Err(CaptureError::Malformed { .. })));
    }

    #[test]
    fn short_positions_are_malformed() {
        let raw = serde_json::json!({ "polygon": [[[1.0], [2.0, 3.0], [4.0, 5.0]]], "area": 1.0 })
            .to_string();
        assert!(matches!(capture(&raw), Err(CaptureError::Malformed { .. })));
    }

    #[test]
    fn degenerate_ring_is_rejected() {
        let raw = serde_json::json!({ "polygon": [[[1.0, 1.0], [2.0, 2.0], [1.0, 1.0]]], "area": 1.0 })
            .to_string();
        assert!(matches!(capture(&raw), Err(CaptureError::Degenerate(_))));
    }
}
