#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Client for the skyfarm backend API.
//!
//! Sends area and project creation requests and folds every outcome into a
//! [`SubmissionResult`]: submission never fails with a Rust error, since
//! connectivity problems and server rejections are both things the user
//! acts on by retrying.
//!
//! The [`Session`] and [`ClientConfig`] are plain values passed into each
//! call; nothing here reads global state.
//!
//! # Environment Variables
//!
//! | Variable | Required | Description |
//! |---|---|---|
//! | `SKYFARM_API_URL` | Yes | Base URL of the area/project API |
//! | `SKYFARM_STORE_URL` | Yes | Base URL of the hosted data store |
//! | `SKYFARM_STORE_KEY` | Yes | Public (anon) key for the hosted data store |
//! | `SKYFARM_IMAGE_BUCKET` | No | Storage bucket for metric images (default `projects`) |
//! | `SKYFARM_SIGNED_URL_TTL_SECS` | No | Lifetime of signed image URLs (default 60) |
//! | `SKYFARM_REQUEST_TIMEOUT_SECS` | No | Per-request timeout (default 30) |

pub mod client;
pub mod config;
pub mod session;
pub mod submit;

pub use client::{ApiClient, AreaApi, Endpoint, NewProject};
pub use config::ClientConfig;
pub use session::Session;
pub use submit::{BusyGuard, FailureCause, SubmissionResult, SubmitOutcome, Submitter};

use thiserror::Error;

/// Errors from setting up the API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Configuration is missing or invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },

    /// Configuration TOML could not be parsed.
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The HTTP client could not be built.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
