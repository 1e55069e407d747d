//! Report requests and their wire form.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{DateBounds, MetricSelection, ObservationWindow, PolygonGeometry, ValidationError};

/// Minimum length of an area or project name, in characters.
pub const MIN_NAME_LEN: usize = 2;

/// A complete, validated request to create an area and aggregate metrics
/// over it.
///
/// Immutable; the only way to obtain one is [`ReportRequest::build`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRequest {
    name: String,
    project_id: String,
    geometry: PolygonGeometry,
    window: ObservationWindow,
    metrics: MetricSelection,
}

impl ReportRequest {
    /// Validates every part of a request and assembles it.
    ///
    /// Rules are checked in a fixed order so the same inputs always report
    /// the same error: name, geometry, window, metrics.
    ///
    /// # Errors
    ///
    /// * [`ValidationError::NameTooShort`] if the trimmed name has fewer
    ///   than [`MIN_NAME_LEN`] characters
    /// * [`ValidationError::MissingGeometry`] if no polygon was captured
    /// * [`ValidationError::InvalidWindow`] if the window is absent,
    ///   inconsistent, or reaches outside the availability bounds on
    ///   `today`
    /// * [`ValidationError::EmptyMetrics`] if no metric is selected
    pub fn build(
        name: &str,
        project_id: &str,
        geometry: Option<&PolygonGeometry>,
        window: Option<&ObservationWindow>,
        metrics: &MetricSelection,
        today: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let name = validate_name(name)?;
        let geometry = geometry.ok_or(ValidationError::MissingGeometry)?;
        let window = window
            .filter(|w| w.is_consistent())
            .filter(|w| w.check_bounds(&DateBounds::for_today(today)).is_ok())
            .ok_or(ValidationError::InvalidWindow)?;
        if metrics.is_empty() {
            return Err(ValidationError::EmptyMetrics);
        }

        Ok(Self {
            name,
            project_id: project_id.to_string(),
            geometry: geometry.clone(),
            window: *window,
            metrics: metrics.clone(),
        })
    }

    /// Area name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning project.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Field boundary.
    #[must_use]
    pub const fn geometry(&self) -> &PolygonGeometry {
        &self.geometry
    }

    /// Observation period and step.
    #[must_use]
    pub const fn window(&self) -> &ObservationWindow {
        &self.window
    }

    /// Requested metrics.
    #[must_use]
    pub const fn metrics(&self) -> &MetricSelection {
        &self.metrics
    }

    /// JSON body for the area creation endpoint.
    #[must_use]
    pub fn to_payload(&self) -> CreateAreaPayload {
        CreateAreaPayload {
            name: self.name.clone(),
            coords: self.geometry.to_geojson_string(),
            project_id: self.project_id.clone(),
            datefrom: start_of_day(self.window.from()),
            dateto: start_of_day(self.window.to()),
            metrics: self.metrics.wire_names(),
            aggregation: self.window.aggregation_step_days(),
        }
    }
}

/// Trims `name` and checks its length in characters.
///
/// # Errors
///
/// Returns [`ValidationError::NameTooShort`] if the trimmed name has fewer
/// than [`MIN_NAME_LEN`] characters.
pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if len < MIN_NAME_LEN {
        return Err(ValidationError::NameTooShort {
            len,
            min: MIN_NAME_LEN,
        });
    }
    Ok(trimmed.to_string())
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Body of `POST /area/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAreaPayload {
    /// Area name.
    pub name: String,
    /// Stringified `GeoJSON` polygon.
    pub coords: String,
    /// Owning project.
    pub project_id: String,
    /// Window start (ISO 8601).
    pub datefrom: DateTime<Utc>,
    /// Window end (ISO 8601).
    pub dateto: DateTime<Utc>,
    /// Lowercase metric wire names.
    pub metrics: Vec<String>,
    /// Aggregation step in days.
    pub aggregation: u32,
}
