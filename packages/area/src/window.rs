//! Observation window policy.
//!
//! A window is picked in two steps: a start date, then an end date. Picking
//! the start date always discards any previous end date (the caller's state
//! holds a [`PartialWindow`] until the end date arrives).

use chrono::NaiveDate;
use skyfarm_area_models::{DateBounds, ObservationWindow, ValidationError};

/// A window with only its start date chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialWindow {
    from: NaiveDate,
}

impl PartialWindow {
    /// The chosen start date.
    #[must_use]
    pub const fn from(&self) -> NaiveDate {
        self.from
    }
}

/// Picks a start date.
///
/// # Errors
///
/// Returns [`ValidationError::OutOfRange`] if `date` is outside the
/// availability bounds on `today`.
pub fn select_from(date: NaiveDate, today: NaiveDate) -> Result<PartialWindow, ValidationError> {
    DateBounds::for_today(today).check(date)?;
    Ok(PartialWindow { from: date })
}

/// Picks an end date, completing the window with its default step.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidRange`] if `date` is not after the
/// start date, or [`ValidationError::OutOfRange`] if it is outside the
/// availability bounds on `today`.
pub fn select_to(
    date: NaiveDate,
    partial: &PartialWindow,
    today: NaiveDate,
) -> Result<ObservationWindow, ValidationError> {
    if date <= partial.from {
        return Err(ValidationError::InvalidRange {
            from: partial.from,
            to: date,
        });
    }
    let window = ObservationWindow::new(partial.from, date)?;
    window.check_bounds(&DateBounds::for_today(today))?;
    log::debug!(
        "Window {} to {}: {} days, step {}",
        window.from(),
        window.to(),
        window.span_days(),
        window.aggregation_step_days()
    );
    Ok(window)
}
