//! Maps retrieved metric series to report views.
//!
//! Series with enough points become a three-track line chart (mean, min,
//! max); short series are listed period by period instead, since a chart
//! of one or two points says nothing.

use chrono::NaiveDate;
use serde::Serialize;
use skyfarm_area_models::{AreaRow, MetricKind, MetricRow, MetricSeries, PeriodStats};

/// Series longer than this are charted; others are listed.
pub const LISTING_MAX_POINTS: usize = 2;

/// Lower bound for the chart's y-axis ceiling.
const MIN_CHART_CEILING: f64 = 1.0;

/// One chart sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    /// Short period label (e.g. "Jan 5").
    pub label: String,
    /// Sample value.
    pub value: f64,
}

/// Chart-ready tracks, chronologically ordered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    /// Period means.
    pub mean: Vec<ChartPoint>,
    /// Period minimums.
    pub min: Vec<ChartPoint>,
    /// Period maximums.
    pub max: Vec<ChartPoint>,
    /// Y-axis ceiling: the largest maximum, at least 1.
    pub ceiling: f64,
}

/// One row of a direct listing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ListingRecord {
    /// First day of the period.
    pub period_from: NaiveDate,
    /// Last day of the period.
    pub period_to: NaiveDate,
    /// Minimum.
    pub min: f64,
    /// Mean.
    pub mean: f64,
    /// Maximum.
    pub max: f64,
    /// Standard deviation.
    pub std_dev: f64,
}

impl From<&PeriodStats> for ListingRecord {
    fn from(period: &PeriodStats) -> Self {
        Self {
            period_from: period.period_from,
            period_to: period.period_to,
            min: period.stats.min,
            mean: period.stats.mean,
            max: period.stats.max,
            std_dev: period.stats.std_dev,
        }
    }
}

/// How a metric's periods are shown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricBody {
    /// More than [`LISTING_MAX_POINTS`] periods.
    Chart(ChartSeries),
    /// At most [`LISTING_MAX_POINTS`] periods.
    Listing {
        /// Periods in chronological order.
        records: Vec<ListingRecord>,
    },
}

/// One metric card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricView {
    /// Stored metric name.
    pub name: String,
    /// Recognized kind, `None` for names the client doesn't know.
    pub kind: Option<MetricKind>,
    /// Display label.
    pub label: String,
    /// Display unit, possibly empty.
    pub unit: String,
    /// Chart or listing.
    pub body: MetricBody,
}

/// Everything a report screen renders for an area's metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PresentationModel {
    /// Area the metrics belong to.
    pub area_id: String,
    /// One card per stored metric, in retrieval order.
    pub metrics: Vec<MetricView>,
}

impl PresentationModel {
    /// Looks up a card by stored metric name (case-insensitive).
    #[must_use]
    pub fn metric(&self, name: &str) -> Option<&MetricView> {
        self.metrics
            .iter()
            .find(|view| view.name.eq_ignore_ascii_case(name))
    }
}

/// Builds the presentation model for an area's series.
#[must_use]
pub fn present(series: &MetricSeries) -> PresentationModel {
    PresentationModel {
        area_id: series.area_id.clone(),
        metrics: series.metrics.iter().map(present_metric).collect(),
    }
}

/// Builds one metric card.
#[must_use]
pub fn present_metric(row: &MetricRow) -> MetricView {
    let kind = row.kind();
    let (label, unit) = kind.map_or_else(
        || {
            log::debug!("Unknown metric '{}', using raw name", row.name);
            (row.name.clone(), String::new())
        },
        |k| (k.label().to_string(), k.unit().to_string()),
    );

    let periods = row.chronological();
    let body = if periods.len() > LISTING_MAX_POINTS {
        MetricBody::Chart(chart(&periods))
    } else {
        MetricBody::Listing {
            records: periods.iter().map(ListingRecord::from).collect(),
        }
    };

    MetricView {
        name: row.name.clone(),
        kind,
        label,
        unit,
        body,
    }
}

fn chart(periods: &[PeriodStats]) -> ChartSeries {
    let track = |value: fn(&PeriodStats) -> f64| -> Vec<ChartPoint> {
        periods
            .iter()
            .map(|p| ChartPoint {
                label: short_date_label(p.period_from),
                value: value(p),
            })
            .collect()
    };

    let ceiling = periods
        .iter()
        .map(|p| p.stats.max)
        .filter(|v| v.is_finite())
        .fold(MIN_CHART_CEILING, f64::max);

    ChartSeries {
        mean: track(|p| p.stats.mean),
        min: track(|p| p.stats.min),
        max: track(|p| p.stats.max),
        ceiling,
    }
}

/// Short axis label for a period start, e.g. "Jan 5".
#[must_use]
pub fn short_date_label(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

/// Converts a stored area in m² to km² for display.
#[must_use]
pub fn area_km2(area_m2: f64) -> f64 {
    area_m2 / 1_000_000.0
}

/// Header block of a report: the area and its observation parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaDetails {
    /// Area name.
    pub name: String,
    /// Area in km², when the store has a size.
    pub area_km2: Option<f64>,
    /// Raw polygon coordinates (longitude/latitude).
    pub coordinates: serde_json::Value,
    /// Observation start.
    pub datefrom: NaiveDate,
    /// Observation end.
    pub dateto: NaiveDate,
    /// Aggregation step in days.
    pub aggregation: u32,
}

impl From<&AreaRow> for AreaDetails {
    fn from(area: &AreaRow) -> Self {
        Self {
            name: area.name.clone(),
            area_km2: area.area_m2.map(area_km2),
            coordinates: area
                .coords
                .get("coordinates")
                .cloned()
                .unwrap_or(serde_json::Value::Null),
            datefrom: area.datefrom,
            dateto: area.dateto,
            aggregation: area.aggregation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyfarm_area_models::StatsSummary;

    fn period(day: u32, mean: f64) -> PeriodStats {
        PeriodStats {
            period_from: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            period_to: NaiveDate::from_ymd_opt(2024, 1, day + 4).unwrap(),
            stats: StatsSummary {
                min: mean - 0.1,
                mean,
                max: mean + 0.1,
                std_dev: 0.05,
                sample_count: 100.0,
                no_data_count: 0.0,
            },
        }
    }

    fn row(name: &str, periods: Vec<PeriodStats>) -> MetricRow {
        MetricRow {
            id: "m1".to_string(),
            name: name.to_string(),
            value: periods,
        }
    }

    #[test]
    fn five_points_become_a_chart() {
        let periods = vec![
            period(21, 0.5),
            period(1, 0.1),
            period(16, 0.4),
            period(6, 0.2),
            period(11, 0.3),
        ];
        let view = present_metric(&row("ndvi", periods));
        let MetricBody::Chart(chart) = view.body else {
            panic!("expected chart");
        };
        assert_eq!(chart.mean.len(), 5);
        assert_eq!(chart.mean[0].label, "Jan 1");
        assert_eq!(chart.mean[4].label, "Jan 21");
        assert!((chart.mean[0].value - 0.1).abs() < 1e-9);
        assert!((chart.max[4].value - 0.6).abs() < 1e-9);
        assert!((chart.ceiling - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn two_points_become_a_listing() {
        let view = present_metric(&row("temp", vec![period(6, 20.0), period(1, 18.0)]));
        assert_eq!(view.label, "Soil Temperature");
        assert_eq!(view.unit, "°C");
        let MetricBody::Listing { records } = view.body else {
            panic!("expected listing");
        };
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].period_from, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!((records[0].std_dev - 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn chart_ceiling_tracks_largest_max() {
        let view = present_metric(&row(
            "temp",
            vec![period(1, 18.0), period(6, 25.0), period(11, 21.0)],
        ));
        let MetricBody::Chart(chart) = view.body else {
            panic!("expected chart");
        };
        assert!((chart.ceiling - 25.1).abs() < 1e-9);
    }

    #[test]
    fn empty_series_is_an_empty_listing() {
        let view = present_metric(&row("lai", Vec::new()));
        assert_eq!(view.body, MetricBody::Listing { records: Vec::new() });
    }

    #[test]
    fn unknown_metric_falls_back_to_raw_name() {
        let view = present_metric(&row("evi", vec![period(1, 0.3)]));
        assert_eq!(view.kind, None);
        assert_eq!(view.label, "evi");
        assert_eq!(view.unit, "");
    }

    #[test]
    fn present_keeps_retrieval_order() {
        let series = MetricSeries::new(
            "a1",
            vec![row("prod", Vec::new()), row("NDVI", Vec::new())],
        );
        let model = present(&series);
        assert_eq!(model.area_id, "a1");
        assert_eq!(model.metrics[0].kind, Some(MetricKind::Prod));
        assert_eq!(model.metric("ndvi").unwrap().kind, Some(MetricKind::Ndvi));
    }

    #[test]
    fn converts_square_meters_to_km2() {
        assert!((area_km2(3_250_000.0) - 3.25).abs() < f64::EPSILON);
    }
}
