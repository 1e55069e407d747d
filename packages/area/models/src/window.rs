//! Observation windows and the aggregation step table.
//!
//! Imagery is only available for the last two years and lags a few days
//! behind the present, so every window must fit inside [`DateBounds`]. The
//! backend buckets observations into fixed-size steps whose minimum size
//! grows with the span of the window.

use chrono::{Days, Months, NaiveDate};
use serde::Serialize;

use crate::ValidationError;

/// Days between the newest selectable date and today.
pub const AVAILABILITY_LAG_DAYS: u64 = 5;

/// How far back imagery is available, in months.
pub const LOOKBACK_MONTHS: u32 = 24;

/// Every step size the table can produce, in days.
pub const AGGREGATION_STEPS: [u32; 4] = [1, 5, 10, 15];

/// Default (and minimum) aggregation step for a window spanning
/// `span_days` days.
#[must_use]
pub const fn aggregation_step_for_span(span_days: u32) -> u32 {
    match span_days {
        0..=30 => 1,
        31..=60 => 5,
        61..=90 => 10,
        _ => 15,
    }
}

/// Inclusive range of aggregation steps allowed for a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AggregationBounds {
    /// Smallest step; also the default.
    pub min: u32,
    /// Largest step; the whole span in one bucket.
    pub max: u32,
}

impl AggregationBounds {
    /// Bounds for a window spanning `span_days` days.
    #[must_use]
    pub const fn for_span(span_days: u32) -> Self {
        let min = aggregation_step_for_span(span_days);
        let max = if span_days == 0 { 1 } else { span_days };
        Self {
            min,
            max: if max < min { min } else { max },
        }
    }

    /// Whether `step` lies within the bounds.
    #[must_use]
    pub const fn contains(self, step: u32) -> bool {
        step >= self.min && step <= self.max
    }
}

/// Range of dates a user may pick, relative to a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateBounds {
    /// Earliest selectable date (two years back).
    pub earliest: NaiveDate,
    /// Latest selectable date (five days back).
    pub latest: NaiveDate,
}

impl DateBounds {
    /// Bounds in effect on `today`.
    #[must_use]
    pub fn for_today(today: NaiveDate) -> Self {
        Self {
            earliest: today
                .checked_sub_months(Months::new(LOOKBACK_MONTHS))
                .unwrap_or(NaiveDate::MIN),
            latest: today
                .checked_sub_days(Days::new(AVAILABILITY_LAG_DAYS))
                .unwrap_or(NaiveDate::MIN),
        }
    }

    /// Whether `date` can be selected.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.earliest && date <= self.latest
    }

    /// Checks that `date` can be selected.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfRange`] if it cannot.
    pub fn check(&self, date: NaiveDate) -> Result<NaiveDate, ValidationError> {
        if self.contains(date) {
            Ok(date)
        } else {
            Err(ValidationError::OutOfRange {
                date,
                earliest: self.earliest,
                latest: self.latest,
            })
        }
    }
}

/// A validated observation period with its aggregation step.
///
/// Only constructible through [`ObservationWindow::new`], which guarantees
/// `from < to`, a span consistent with the dates, and a step inside
/// [`AggregationBounds::for_span`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObservationWindow {
    from: NaiveDate,
    to: NaiveDate,
    span_days: u32,
    aggregation_step_days: u32,
}

impl ObservationWindow {
    /// Builds a window with the default step for its span.
    ///
    /// Availability bounds are not checked here since they depend on the
    /// current day; see [`DateBounds`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidRange`] if `to` is not after
    /// `from`, or [`ValidationError::InvalidWindow`] if the span does not
    /// fit in a `u32`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, ValidationError> {
        if to <= from {
            return Err(ValidationError::InvalidRange { from, to });
        }
        let span_days = days_between(from, to).ok_or(ValidationError::InvalidWindow)?;

        Ok(Self {
            from,
            to,
            span_days,
            aggregation_step_days: aggregation_step_for_span(span_days),
        })
    }

    /// Returns a copy of this window with a different aggregation step.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidStep`] if `step` is outside the
    /// bounds for this window's span.
    pub const fn with_step(self, step: u32) -> Result<Self, ValidationError> {
        let bounds = self.step_bounds();
        if !bounds.contains(step) {
            return Err(ValidationError::InvalidStep {
                step,
                min: bounds.min,
                max: bounds.max,
            });
        }
        Ok(Self {
            aggregation_step_days: step,
            ..self
        })
    }

    /// First day of the window.
    #[must_use]
    pub const fn from(&self) -> NaiveDate {
        self.from
    }

    /// Last day of the window.
    #[must_use]
    pub const fn to(&self) -> NaiveDate {
        self.to
    }

    /// Whole calendar days between `from` and `to`.
    #[must_use]
    pub const fn span_days(&self) -> u32 {
        self.span_days
    }

    /// Bucket size in days.
    #[must_use]
    pub const fn aggregation_step_days(&self) -> u32 {
        self.aggregation_step_days
    }

    /// Steps a user may choose for this window.
    #[must_use]
    pub const fn step_bounds(&self) -> AggregationBounds {
        AggregationBounds::for_span(self.span_days)
    }

    /// Re-checks every structural invariant.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.from < self.to
            && days_between(self.from, self.to) == Some(self.span_days)
            && self.step_bounds().contains(self.aggregation_step_days)
    }

    /// Checks both ends against the availability bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfRange`] for the first end that falls
    /// outside `bounds`.
    pub fn check_bounds(&self, bounds: &DateBounds) -> Result<(), ValidationError> {
        bounds.check(self.from)?;
        bounds.check(self.to)?;
        Ok(())
    }
}

/// Whole calendar days from `from` to `to`, `None` if negative or too large.
#[must_use]
pub fn days_between(from: NaiveDate, to: NaiveDate) -> Option<u32> {
    u32::try_from(to.signed_duration_since(from).num_days()).ok()
}
