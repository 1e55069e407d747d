//! Aggregated metric time series, as stored per area.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::MetricKind;

/// Summary statistics for one aggregation bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    /// Minimum value in the bucket.
    pub min: f64,
    /// Mean value in the bucket.
    pub mean: f64,
    /// Maximum value in the bucket.
    pub max: f64,
    /// Standard deviation.
    #[serde(rename = "stDev", alias = "stdDev")]
    pub std_dev: f64,
    /// Number of valid samples.
    #[serde(default)]
    pub sample_count: f64,
    /// Number of samples without data (clouds, gaps).
    #[serde(default)]
    pub no_data_count: f64,
}

/// Statistics for a single aggregation period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    /// First day of the period.
    #[serde(rename = "from", with = "crate::dates::flexible")]
    pub period_from: NaiveDate,
    /// Last day of the period.
    #[serde(rename = "to", with = "crate::dates::flexible")]
    pub period_to: NaiveDate,
    /// Bucket statistics.
    pub stats: StatsSummary,
}

/// A `metrics` table row: one metric's series for one area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    /// Row identifier.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Stored metric name. Usually a [`MetricKind`] wire name, but older
    /// rows may carry names the client does not know.
    pub name: String,
    /// Periods in storage order. `null` is read as empty.
    #[serde(default, deserialize_with = "deserialize_periods")]
    pub value: Vec<PeriodStats>,
}

impl MetricRow {
    /// The metric kind this row holds, if the name is recognized.
    #[must_use]
    pub fn kind(&self) -> Option<MetricKind> {
        MetricKind::from_str(self.name.trim()).ok()
    }

    /// Periods sorted chronologically by start date.
    #[must_use]
    pub fn chronological(&self) -> Vec<PeriodStats> {
        let mut periods = self.value.clone();
        periods.sort_by_key(|p| (p.period_from, p.period_to));
        periods
    }
}

/// All metric series retrieved for one area.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    /// Area the series belong to.
    pub area_id: String,
    /// One row per stored metric, in retrieval order.
    pub metrics: Vec<MetricRow>,
}

impl MetricSeries {
    /// Wraps rows retrieved for `area_id`.
    #[must_use]
    pub fn new(area_id: impl Into<String>, metrics: Vec<MetricRow>) -> Self {
        Self {
            area_id: area_id.into(),
            metrics,
        }
    }

    /// Looks up the row for a metric kind.
    #[must_use]
    pub fn get(&self, kind: MetricKind) -> Option<&MetricRow> {
        self.metrics.iter().find(|row| row.kind() == Some(kind))
    }

    /// Whether no metric rows exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

/// Reads an identifier that may be stored as a string or a number.
///
/// # Errors
///
/// Returns an error for any other JSON type.
pub fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn deserialize_periods<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<PeriodStats>, D::Error> {
    Ok(Option::<Vec<PeriodStats>>::deserialize(deserializer)?.unwrap_or_default())
}
