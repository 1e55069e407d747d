#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Field area and metric report types.
//!
//! This crate defines the data model shared by the whole skyfarm client
//! core: captured field boundaries, observation windows, the closed set of
//! remote-sensing metric kinds, report requests, and the metric series rows
//! read back from the hosted store. Types here enforce their own invariants
//! at construction time so that downstream crates never see a half-valid
//! request.

pub mod dates;
pub mod geometry;
pub mod request;
pub mod rows;
pub mod series;
pub mod window;

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use geometry::{GeometryError, PolygonGeometry};
pub use request::{CreateAreaPayload, MIN_NAME_LEN, ReportRequest};
pub use rows::{AreaRow, AreaSummary, ProjectRow, SavedQuery};
pub use series::{MetricRow, MetricSeries, PeriodStats, StatsSummary};
pub use window::{AggregationBounds, DateBounds, ObservationWindow};

/// A remote-sensing metric that can be requested for an area.
///
/// The set is closed: the backend only knows how to aggregate these five
/// indices. Wire names are lowercase (`"ndvi"`, `"moisture"`, ...) and are
/// parsed case-insensitively.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MetricKind {
    /// Normalized difference vegetation index.
    Ndvi,
    /// Soil moisture.
    Moisture,
    /// Soil temperature.
    Temp,
    /// Leaf area index.
    Lai,
    /// Productivity proxy (absorbed photosynthetic radiation).
    Prod,
}

impl MetricKind {
    /// Human-readable label shown on report cards.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ndvi => "Corrected Vegetation Density",
            Self::Moisture => "Soil Moisture",
            Self::Temp => "Soil Temperature",
            Self::Lai => "Leaf Area Index",
            Self::Prod => "Radiation Absorption",
        }
    }

    /// Display unit for values of this metric. May be empty.
    #[must_use]
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Temp => "°C",
            Self::Lai => "m²/m²",
            Self::Ndvi | Self::Moisture | Self::Prod => "",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Ndvi, Self::Moisture, Self::Temp, Self::Lai, Self::Prod]
    }
}

/// The set of metric kinds a user picked for a report.
///
/// Order is irrelevant. An empty selection is a valid intermediate state;
/// only request building requires at least one member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricSelection(BTreeSet<MetricKind>);

impl MetricSelection {
    /// Creates an empty selection.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Returns a new selection with `kind` added if absent or removed if
    /// present. Toggling the same kind twice yields the original set.
    #[must_use]
    pub fn toggle(&self, kind: MetricKind) -> Self {
        let mut next = self.0.clone();
        if !next.remove(&kind) {
            next.insert(kind);
        }
        Self(next)
    }

    /// Whether `kind` is selected.
    #[must_use]
    pub fn contains(&self, kind: MetricKind) -> bool {
        self.0.contains(&kind)
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of selected kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates selected kinds in their canonical order.
    pub fn iter(&self) -> impl Iterator<Item = MetricKind> + '_ {
        self.0.iter().copied()
    }

    /// Lowercase wire names of the selected kinds.
    #[must_use]
    pub fn wire_names(&self) -> Vec<String> {
        self.iter().map(|kind| kind.to_string()).collect()
    }
}

impl FromIterator<MetricKind> for MetricSelection {
    fn from_iter<I: IntoIterator<Item = MetricKind>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Discriminant of a [`ValidationError`], for callers that only need to
/// know which rule failed (e.g. to pick which form field to highlight).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationErrorKind {
    /// End date is not after the start date.
    InvalidRange,
    /// Date falls outside the imagery availability bounds.
    OutOfRange,
    /// No field boundary was captured.
    MissingGeometry,
    /// No metric kind was selected.
    EmptyMetrics,
    /// Observation window is absent or inconsistent.
    InvalidWindow,
    /// Area or project name is too short.
    NameTooShort,
    /// Aggregation step is outside the bounds allowed for the span.
    InvalidStep,
}

/// A local, recoverable validation failure that blocks submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The end date is earlier than or equal to the start date.
    #[error("start date cannot be after end date")]
    InvalidRange {
        /// Selected start date.
        from: NaiveDate,
        /// Rejected end date.
        to: NaiveDate,
    },

    /// The date is outside the range imagery is available for.
    #[error("date {date} is outside the available range {earliest} to {latest}")]
    OutOfRange {
        /// Rejected date.
        date: NaiveDate,
        /// Earliest selectable date.
        earliest: NaiveDate,
        /// Latest selectable date.
        latest: NaiveDate,
    },

    /// No polygon has been captured for the area.
    #[error("draw a field boundary before continuing")]
    MissingGeometry,

    /// No metric kind is selected.
    #[error("select at least one metric")]
    EmptyMetrics,

    /// The observation window is absent or violates its invariants.
    #[error("observation window is missing or invalid")]
    InvalidWindow,

    /// The name is shorter than the minimum length.
    #[error("name must have at least {min} characters, got {len}")]
    NameTooShort {
        /// Length of the trimmed name, in characters.
        len: usize,
        /// Required minimum.
        min: usize,
    },

    /// The aggregation step is outside the allowed bounds for the span.
    #[error("aggregation step of {step} days must be between {min} and {max}")]
    InvalidStep {
        /// Rejected step.
        step: u32,
        /// Smallest permitted step.
        min: u32,
        /// Largest permitted step.
        max: u32,
    },
}

impl ValidationError {
    /// Returns which rule this error violates.
    #[must_use]
    pub const fn kind(&self) -> ValidationErrorKind {
        match self {
            Self::InvalidRange { .. } => ValidationErrorKind::InvalidRange,
            Self::OutOfRange { .. } => ValidationErrorKind::OutOfRange,
            Self::MissingGeometry => ValidationErrorKind::MissingGeometry,
            Self::EmptyMetrics => ValidationErrorKind::EmptyMetrics,
            Self::InvalidWindow => ValidationErrorKind::InvalidWindow,
            Self::NameTooShort { .. } => ValidationErrorKind::NameTooShort,
            Self::InvalidStep { .. } => ValidationErrorKind::InvalidStep,
        }
    }
}
