//! HTTP client for the area and project creation endpoints.
//!
//! - `POST {api}/area/create`: body is a [`CreateAreaPayload`]; any 2xx
//!   with a JSON body is success.
//! - `POST {api}/project/create`: body is `{ "name": ... }`; only
//!   `201 Created` is success.
//!
//! Both send `Authorization: Bearer <token>` and a JSON body. Each call
//! performs exactly one request; there is no automatic retry.

use serde::Serialize;
use skyfarm_area_models::{CreateAreaPayload, ReportRequest, ValidationError};

use crate::submit::GENERIC_ERROR_MESSAGE;
use crate::{ApiError, ClientConfig, FailureCause, Session, SubmissionResult};

/// Creation endpoints and their success contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `POST /area/create`.
    CreateArea,
    /// `POST /project/create`.
    CreateProject,
}

impl Endpoint {
    /// Path relative to the API base URL.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::CreateArea => "area/create",
            Self::CreateProject => "project/create",
        }
    }

    /// Whether `status` means the resource was created.
    #[must_use]
    pub const fn accepts(self, status: u16) -> bool {
        match self {
            Self::CreateArea => status >= 200 && status < 300,
            Self::CreateProject => status == 201,
        }
    }

    /// Whether a success response must carry a JSON body.
    #[must_use]
    pub const fn requires_body(self) -> bool {
        matches!(self, Self::CreateArea)
    }
}

/// Maps a settled HTTP exchange to a [`SubmissionResult`].
///
/// Non-success responses use the body's `message` field when present.
#[must_use]
pub fn map_response(endpoint: Endpoint, status: u16, body: &str) -> SubmissionResult {
    if endpoint.accepts(status) {
        let trimmed = body.trim();
        if trimmed.is_empty() && !endpoint.requires_body() {
            return SubmissionResult::Success {
                payload: serde_json::Value::Null,
            };
        }
        return match serde_json::from_str(trimmed) {
            Ok(payload) => SubmissionResult::Success { payload },
            Err(e) if endpoint.requires_body() => {
                log::warn!("{} returned {status} with unreadable body: {e}", endpoint.path());
                SubmissionResult::transport()
            }
            Err(_) => SubmissionResult::Success {
                payload: serde_json::Value::String(trimmed.to_string()),
            },
        };
    }

    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());

    log::warn!("{} rejected with {status}: {message}", endpoint.path());
    SubmissionResult::Failure {
        message,
        cause: FailureCause::Server { status },
    }
}

/// A validated project creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProject {
    name: String,
}

impl NewProject {
    /// Validates a project name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NameTooShort`] for names under two
    /// characters.
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            name: skyfarm_area_models::request::validate_name(name)?,
        })
    }

    /// Project name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Backend operations that create resources.
#[async_trait::async_trait]
pub trait AreaApi: Send + Sync {
    /// Creates an area and queues its metric aggregation.
    async fn create_area(&self, request: &ReportRequest, session: &Session) -> SubmissionResult;

    /// Creates a project.
    async fn create_project(&self, project: &NewProject, session: &Session) -> SubmissionResult;
}

/// [`AreaApi`] over HTTP.
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        Ok(Self::with_client(config.api_base(), config.http_client()?))
    }

    /// Creates a client around an existing `reqwest` client.
    #[must_use]
    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    async fn post<B: Serialize + Sync>(
        &self,
        endpoint: Endpoint,
        body: &B,
        session: &Session,
    ) -> SubmissionResult {
        let url = format!("{}/{}", self.base_url, endpoint.path());
        log::debug!("POST {url}");

        let response = match self
            .client
            .post(&url)
            .bearer_auth(session.access_token())
            .json(body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                log::warn!("POST {url} failed: {e}");
                return SubmissionResult::transport();
            }
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(text) => map_response(endpoint, status, &text),
            Err(e) => {
                log::warn!("Failed to read response from {url}: {e}");
                SubmissionResult::transport()
            }
        }
    }
}

#[async_trait::async_trait]
impl AreaApi for ApiClient {
    async fn create_area(&self, request: &ReportRequest, session: &Session) -> SubmissionResult {
        let payload: CreateAreaPayload = request.to_payload();
        log::info!(
            "Submitting area '{}' for project {} ({} metrics, step {} days)",
            payload.name,
            payload.project_id,
            payload.metrics.len(),
            payload.aggregation
        );
        self.post(Endpoint::CreateArea, &payload, session).await
    }

    async fn create_project(&self, project: &NewProject, session: &Session) -> SubmissionResult {
        log::info!("Creating project '{}'", project.name());
        self.post(Endpoint::CreateProject, project, session).await
    }
}
