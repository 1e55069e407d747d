//! Rows read from the hosted store's `projects`, `areas` and `saved`
//! tables.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::series::deserialize_id;
use crate::{MetricKind, MetricSelection};

/// A project owned by the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRow {
    /// Project identifier.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Project name.
    pub name: String,
    /// Owner.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Compact area entry used when listing a project's areas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaSummary {
    /// Area identifier.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Area name.
    pub name: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// A full `areas` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaRow {
    /// Area identifier.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Owning project.
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub project_id: Option<String>,
    /// Area name.
    pub name: String,
    /// Boundary as a `GeoJSON` geometry object.
    pub coords: serde_json::Value,
    /// Observation start.
    #[serde(with = "crate::dates::flexible")]
    pub datefrom: NaiveDate,
    /// Observation end.
    #[serde(with = "crate::dates::flexible")]
    pub dateto: NaiveDate,
    /// Planar area in square meters. Older rows call this column `size`.
    #[serde(default, alias = "size")]
    pub area_m2: Option<f64>,
    /// Aggregation step in days.
    pub aggregation: u32,
}

/// A saved parameter preset that can seed a new area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedQuery {
    /// Preset name.
    pub name: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Stored metric names.
    #[serde(default)]
    pub metrics: Vec<String>,
    /// Aggregation step in days.
    pub aggregation: u32,
    /// Project the preset belongs to.
    #[serde(deserialize_with = "deserialize_id")]
    pub project_id: String,
}

impl SavedQuery {
    /// Recognized metrics of this preset. Unknown names are skipped.
    #[must_use]
    pub fn metric_selection(&self) -> MetricSelection {
        self.metrics
            .iter()
            .filter_map(|name| MetricKind::from_str(name.trim()).ok())
            .collect()
    }
}

fn deserialize_opt_id<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_legacy_size_column_as_square_meters() {
        let row: AreaRow = serde_json::from_value(serde_json::json!({
            "id": 7,
            "project_id": "p-1",
            "name": "North field",
            "coords": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]] },
            "datefrom": "2024-01-01T00:00:00+00:00",
            "dateto": "2024-02-25",
            "size": 2_500_000.0,
            "aggregation": 5
        }))
        .unwrap();
        assert_eq!(row.id, "7");
        assert_eq!(row.area_m2, Some(2_500_000.0));
        assert_eq!(row.datefrom, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn reads_current_area_column() {
        let row: AreaRow = serde_json::from_value(serde_json::json!({
            "id": "a1",
            "name": "South field",
            "coords": null,
            "datefrom": "2024-01-01",
            "dateto": "2024-01-20",
            "area_m2": 1000.0,
            "aggregation": 1
        }))
        .unwrap();
        assert_eq!(row.project_id, None);
        assert_eq!(row.area_m2, Some(1000.0));
    }

    #[test]
    fn saved_query_skips_unknown_metrics() {
        let saved: SavedQuery = serde_json::from_value(serde_json::json!({
            "name": "Weekly NDVI",
            "created_at": "2024-03-01T12:00:00.123456+00:00",
            "metrics": ["ndvi", "evi", "TEMP"],
            "aggregation": 5,
            "project_id": 3
        }))
        .unwrap();
        let selection = saved.metric_selection();
        assert_eq!(selection.len(), 2);
        assert!(selection.contains(MetricKind::Ndvi));
        assert!(selection.contains(MetricKind::Temp));
        assert_eq!(saved.project_id, "3");
    }
}
