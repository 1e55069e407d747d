#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Read access to the hosted data store.
//!
//! Projects, areas, metric series and saved presets are read from the
//! store's REST interface; rendered metric images live in object storage
//! and are handed out as short-lived signed URLs. [`load_report`] fetches
//! everything a report screen needs in one concurrent round.

pub mod client;
pub mod report;

pub use client::StoreClient;
pub use report::{DATA_FETCH_MESSAGE, DataFetchError, Report, image_path, load_report};

use serde::{Deserialize, Serialize};
use skyfarm_api::Session;
use skyfarm_area_models::{AreaRow, AreaSummary, MetricSeries, ProjectRow, SavedQuery};
use thiserror::Error;

/// Errors from reading the hosted store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network or protocol failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The client could not be set up from configuration.
    #[error("Client setup error: {0}")]
    Setup(#[from] skyfarm_api::ApiError),

    /// Response body did not match the expected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The store answered with a non-success status.
    #[error("Store returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message from the response body, or the raw body.
        message: String,
    },

    /// A single-row read matched nothing.
    #[error("{table} row not found: {id}")]
    NotFound {
        /// Table that was read.
        table: String,
        /// Identifier that was looked up.
        id: String,
    },
}

/// One entry of a signed URL batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedUrl {
    /// Object path inside the bucket.
    #[serde(default)]
    pub path: Option<String>,
    /// Absolute, time-limited URL; `None` when the object doesn't exist.
    #[serde(default, rename = "signedURL", alias = "signedUrl")]
    pub signed_url: Option<String>,
    /// Per-object error reported by the storage service.
    #[serde(default)]
    pub error: Option<String>,
}

/// Reads the data a signed-in user can see.
///
/// Row-level access is enforced by the store from the session's token.
#[async_trait::async_trait]
pub trait ReportStore: Send + Sync {
    /// Projects owned by the session's user.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the request fails or the rows don't parse.
    async fn projects(&self, session: &Session) -> Result<Vec<ProjectRow>, StoreError>;

    /// Areas of a project.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the request fails or the rows don't parse.
    async fn areas_for_project(
        &self,
        project_id: &str,
        session: &Session,
    ) -> Result<Vec<AreaSummary>, StoreError>;

    /// One area by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no area has that id.
    async fn area(&self, area_id: &str, session: &Session) -> Result<AreaRow, StoreError>;

    /// All metric series of an area.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the request fails or the rows don't parse.
    async fn metrics(&self, area_id: &str, session: &Session) -> Result<MetricSeries, StoreError>;

    /// Saved parameter presets.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the request fails or the rows don't parse.
    async fn saved_queries(&self, session: &Session) -> Result<Vec<SavedQuery>, StoreError>;

    /// Signs a batch of object paths in the image bucket.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the batch request itself fails. Missing
    /// objects are reported per entry instead.
    async fn signed_urls(
        &self,
        paths: &[String],
        session: &Session,
    ) -> Result<Vec<SignedUrl>, StoreError>;
}
