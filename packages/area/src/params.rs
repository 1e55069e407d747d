//! Report parameter state: observation window plus metric selection.
//!
//! All changes go through [`ParamsState::apply`], which returns the next
//! state or the validation error that blocked the change. The state can't
//! hold a selected metric without a complete window: choosing a new start
//! date drops the end date, the step and every selected metric in one
//! transition.

use chrono::NaiveDate;
use skyfarm_area_models::{
    AggregationBounds, DateBounds, MetricKind, MetricSelection, ObservationWindow, ValidationError,
};

use crate::window::{PartialWindow, select_from, select_to};

/// A single user edit to the report parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamsAction {
    /// Pick the start date.
    SelectFrom(NaiveDate),
    /// Pick the end date.
    SelectTo(NaiveDate),
    /// Pick a non-default aggregation step, in days.
    SelectStep(u32),
    /// Add or remove one metric.
    ToggleMetric(MetricKind),
    /// Deselect every metric.
    ClearMetrics,
    /// Return to the empty state.
    Reset,
}

/// Current report parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamsState {
    start: Option<PartialWindow>,
    window: Option<ObservationWindow>,
    metrics: MetricSelection,
}

impl ParamsState {
    /// The empty state: nothing picked.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `action` as of `today`.
    ///
    /// On error the current state is unaffected; callers keep it and show
    /// the error inline.
    ///
    /// # Errors
    ///
    /// * [`ValidationError::OutOfRange`] for dates outside the availability
    ///   bounds
    /// * [`ValidationError::InvalidRange`] for an end date not after the
    ///   start date
    /// * [`ValidationError::InvalidWindow`] when picking an end date, step
    ///   or metric before the prerequisite is set
    /// * [`ValidationError::InvalidStep`] for a step outside the bounds
    pub fn apply(&self, action: ParamsAction, today: NaiveDate) -> Result<Self, ValidationError> {
        match action {
            ParamsAction::SelectFrom(date) => Ok(Self {
                start: Some(select_from(date, today)?),
                window: None,
                metrics: MetricSelection::new(),
            }),
            ParamsAction::SelectTo(date) => {
                let start = self.start.as_ref().ok_or(ValidationError::InvalidWindow)?;
                Ok(Self {
                    start: self.start,
                    window: Some(select_to(date, start, today)?),
                    metrics: self.metrics.clone(),
                })
            }
            ParamsAction::SelectStep(step) => {
                let window = self.window.ok_or(ValidationError::InvalidWindow)?;
                Ok(Self {
                    window: Some(window.with_step(step)?),
                    ..self.clone()
                })
            }
            ParamsAction::ToggleMetric(kind) => {
                if self.window.is_none() {
                    return Err(ValidationError::InvalidWindow);
                }
                Ok(Self {
                    metrics: self.metrics.toggle(kind),
                    ..self.clone()
                })
            }
            ParamsAction::ClearMetrics => Ok(Self {
                metrics: MetricSelection::new(),
                ..self.clone()
            }),
            ParamsAction::Reset => Ok(Self::new()),
        }
    }

    /// Chosen start date, if any.
    #[must_use]
    pub fn from_date(&self) -> Option<NaiveDate> {
        self.start.map(|s| s.from())
    }

    /// Complete window, if an end date has been chosen.
    #[must_use]
    pub const fn window(&self) -> Option<&ObservationWindow> {
        self.window.as_ref()
    }

    /// Selected metrics.
    #[must_use]
    pub const fn metrics(&self) -> &MetricSelection {
        &self.metrics
    }

    /// Whether the end date picker should accept input.
    #[must_use]
    pub const fn to_enabled(&self) -> bool {
        self.start.is_some()
    }

    /// Whether metric toggles and the step picker should accept input.
    #[must_use]
    pub const fn metrics_enabled(&self) -> bool {
        self.window.is_some()
    }

    /// Steps the user may pick, once a window exists.
    #[must_use]
    pub fn step_bounds(&self) -> Option<AggregationBounds> {
        self.window.map(|w| w.step_bounds())
    }

    /// Dates a date picker should enable on `today`.
    #[must_use]
    pub fn date_bounds(today: NaiveDate) -> DateBounds {
        DateBounds::for_today(today)
    }
}
