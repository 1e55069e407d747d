//! In-progress area definition.
//!
//! A [`ReportDraft`] follows the user through the area flow: name and
//! project come from the project screen, the boundary from the map, and
//! the parameters from the window/metric form. [`ReportDraft::build`]
//! produces the immutable request once everything is valid.

use chrono::NaiveDate;
use skyfarm_area_models::{PolygonGeometry, ReportRequest, ValidationError};

use crate::capture::{CaptureError, capture};
use crate::params::{ParamsAction, ParamsState};

/// Mutable form state for one area.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportDraft {
    name: String,
    project_id: String,
    geometry: Option<PolygonGeometry>,
    params: ParamsState,
}

impl ReportDraft {
    /// Starts a draft for `project_id`.
    #[must_use]
    pub fn new(project_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project_id: project_id.into(),
            geometry: None,
            params: ParamsState::new(),
        }
    }

    /// Replaces the area name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Feeds a message from the map surface.
    ///
    /// A "no polygon" message clears any previous boundary.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError`] if the message is malformed or the polygon
    /// is degenerate; the previous boundary is kept in that case.
    pub fn accept_map_message(&mut self, raw: &str) -> Result<bool, CaptureError> {
        self.geometry = capture(raw)?;
        Ok(self.geometry.is_some())
    }

    /// Discards the captured boundary (the user cancelled the map).
    pub fn clear_geometry(&mut self) {
        self.geometry = None;
    }

    /// Applies a parameter edit.
    ///
    /// # Errors
    ///
    /// See [`ParamsState::apply`]; the parameters are unchanged on error.
    pub fn apply(&mut self, action: ParamsAction, today: NaiveDate) -> Result<(), ValidationError> {
        self.params = self.params.apply(action, today)?;
        Ok(())
    }

    /// Area name as typed.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning project.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Captured boundary, if any.
    #[must_use]
    pub const fn geometry(&self) -> Option<&PolygonGeometry> {
        self.geometry.as_ref()
    }

    /// Current parameters.
    #[must_use]
    pub const fn params(&self) -> &ParamsState {
        &self.params
    }

    /// Builds the request as of `today`.
    ///
    /// # Errors
    ///
    /// See [`ReportRequest::build`].
    pub fn build(&self, today: NaiveDate) -> Result<ReportRequest, ValidationError> {
        ReportRequest::build(
            &self.name,
            &self.project_id,
            self.geometry.as_ref(),
            self.params.window(),
            self.params.metrics(),
            today,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyfarm_area_models::{MetricKind, ValidationErrorKind};

    const MESSAGE: &str = r#"{"polygon":"[[[-47.0,-15.0],[-46.99,-15.0],[-46.99,-14.99],[-47.0,-14.99],[-47.0,-15.0]]]","area":1190000.0}"#;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2024, 6, 1)
    }

    #[test]
    fn walks_the_area_flow() {
        let mut draft = ReportDraft::new("p-1", "North field");
        assert_eq!(draft.build(today()).unwrap_err().kind(), ValidationErrorKind::MissingGeometry);

        assert!(draft.accept_map_message(MESSAGE).unwrap());
        assert_eq!(draft.build(today()).unwrap_err().kind(), ValidationErrorKind::InvalidWindow);

        draft
            .apply(ParamsAction::SelectFrom(date(2024, 1, 1)), today())
            .unwrap();
        draft
            .apply(ParamsAction::SelectTo(date(2024, 1, 20)), today())
            .unwrap();
        assert_eq!(draft.build(today()).unwrap_err(), ValidationError::EmptyMetrics);

        draft
            .apply(ParamsAction::ToggleMetric(MetricKind::Ndvi), today())
            .unwrap();
        let request = draft.build(today()).unwrap();
        assert_eq!(request.window().aggregation_step_days(), 1);
        assert_eq!(request.metrics().wire_names(), vec!["ndvi"]);
    }

    #[test]
    fn null_message_clears_geometry() {
        let mut draft = ReportDraft::new("p-1", "North field");
        draft.accept_map_message(MESSAGE).unwrap();
        assert!(!draft.accept_map_message(r#"{"polygon":"null","area":0}"#).unwrap());
        assert!(draft.geometry().is_none());
    }

    #[test]
    fn malformed_message_keeps_previous_geometry() {
        let mut draft = ReportDraft::new("p-1", "North field");
        draft.accept_map_message(MESSAGE).unwrap();
        assert!(draft.accept_map_message("{").is_err());
        assert!(draft.geometry().is_some());
    }

    #[test]
    fn window_gone_stale_fails_build() {
        let mut draft = ReportDraft::new("p-1", "North field");
        draft.accept_map_message(MESSAGE).unwrap();
        draft
            .apply(ParamsAction::SelectFrom(date(2024, 1, 1)), today())
            .unwrap();
        draft
            .apply(ParamsAction::SelectTo(date(2024, 1, 20)), today())
            .unwrap();
        draft
            .apply(ParamsAction::ToggleMetric(MetricKind::Ndvi), today())
            .unwrap();
        assert!(draft.build(today()).is_ok());

        let much_later = date(2026, 3, 1);
        assert_eq!(draft.build(much_later).unwrap_err(), ValidationError::InvalidWindow);
    }

    #[test]
    fn short_name_checked_first() {
        let mut draft = ReportDraft::new("p-1", "N");
        draft.accept_map_message(MESSAGE).unwrap();
        assert_eq!(draft.build(today()).unwrap_err().kind(), ValidationErrorKind::NameTooShort);
        draft.set_name("North");
        assert_eq!(draft.build(today()).unwrap_err().kind(), ValidationErrorKind::InvalidWindow);
    }
}
