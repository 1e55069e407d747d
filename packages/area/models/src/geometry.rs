//! Captured field boundary geometry.

use serde::Serialize;

/// Minimum number of distinct positions for a non-degenerate ring.
pub const MIN_RING_POSITIONS: usize = 3;

/// Reasons a ring cannot be used as a field boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// Fewer than [`MIN_RING_POSITIONS`] distinct positions.
    #[error("polygon needs at least 3 distinct positions, got {count}")]
    TooFewPositions {
        /// Number of distinct positions found.
        count: usize,
    },

    /// A coordinate is NaN or infinite.
    #[error("polygon contains a non-finite coordinate")]
    NonFinite,

    /// A position lies outside the WGS84 longitude/latitude range.
    #[error("position ({lon}, {lat}) is outside WGS84 bounds")]
    OutOfBounds {
        /// Longitude.
        lon: f64,
        /// Latitude.
        lat: f64,
    },

    /// The area value is not a positive finite number.
    #[error("polygon area must be positive, got {0}")]
    InvalidArea(f64),
}

/// A field boundary: the exterior ring of a polygon in WGS84
/// longitude/latitude order, plus its planar area in square meters.
///
/// The ring is stored open (the closing position is implied) and is
/// immutable once captured.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolygonGeometry {
    ring: Vec<[f64; 2]>,
    planar_area_m2: f64,
}

impl PolygonGeometry {
    /// Validates a ring and wraps it with its area.
    ///
    /// A trailing position equal to the first one is treated as the
    /// explicit ring closure and dropped.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if the ring is degenerate, contains
    /// non-finite or out-of-range coordinates, or the area is not positive.
    pub fn new(mut ring: Vec<[f64; 2]>, planar_area_m2: f64) -> Result<Self, GeometryError> {
        for &[lon, lat] in &ring {
            if !lon.is_finite() || !lat.is_finite() {
                return Err(GeometryError::NonFinite);
            }
            if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
                return Err(GeometryError::OutOfBounds { lon, lat });
            }
        }

        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }

        let count = distinct_positions(&ring);
        if count < MIN_RING_POSITIONS {
            return Err(GeometryError::TooFewPositions { count });
        }

        if !planar_area_m2.is_finite() || planar_area_m2 <= 0.0 {
            return Err(GeometryError::InvalidArea(planar_area_m2));
        }

        Ok(Self {
            ring,
            planar_area_m2,
        })
    }

    /// Open ring positions as `[longitude, latitude]`.
    #[must_use]
    pub fn ring(&self) -> &[[f64; 2]] {
        &self.ring
    }

    /// Ring positions with the closing position appended.
    #[must_use]
    pub fn closed_ring(&self) -> Vec<[f64; 2]> {
        let mut closed = self.ring.clone();
        if let Some(first) = self.ring.first() {
            closed.push(*first);
        }
        closed
    }

    /// Planar area in square meters.
    #[must_use]
    pub const fn planar_area_m2(&self) -> f64 {
        self.planar_area_m2
    }

    /// `GeoJSON` `Polygon` geometry object for this boundary.
    #[must_use]
    pub fn to_geojson_value(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "Polygon",
            "coordinates": [self.closed_ring()],
        })
    }

    /// Stringified `GeoJSON` geometry, as sent in the `coords` field of
    /// area creation requests.
    #[must_use]
    pub fn to_geojson_string(&self) -> String {
        self.to_geojson_value().to_string()
    }
}

fn distinct_positions(ring: &[[f64; 2]]) -> usize {
    let mut seen: Vec<[f64; 2]> = Vec::with_capacity(ring.len());
    for position in ring {
        if !seen.contains(position) {
            seen.push(*position);
        }
    }
    seen.len()
}
