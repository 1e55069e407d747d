#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Area definition pipeline.
//!
//! Everything between "the user drew a boundary" and "a request is ready to
//! send", plus the mapping from retrieved metric series to something a
//! report screen can render:
//!
//! 1. [`capture`] turns the embedded map's message into a
//!    [`PolygonGeometry`](skyfarm_area_models::PolygonGeometry).
//! 2. [`window`] applies the observation window policy, and [`params`]
//!    wraps it with metric selection in a single reducer so that changing
//!    the start date structurally clears everything that depended on it.
//! 3. [`draft`] collects name, project, boundary and parameters and builds
//!    the immutable [`ReportRequest`](skyfarm_area_models::ReportRequest).
//! 4. [`presentation`] maps stored series to chart or listing views.
//!
//! All functions here are pure and take "today" as an argument instead of
//! reading the clock.

pub mod capture;
pub mod draft;
pub mod params;
pub mod presentation;
pub mod window;

pub use capture::{CaptureError, capture};
pub use draft::ReportDraft;
pub use params::{ParamsAction, ParamsState};
pub use presentation::{PresentationModel, present};
pub use window::{PartialWindow, select_from, select_to};
