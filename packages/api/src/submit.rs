//! Submission outcomes and duplicate-submission guarding.

use std::sync::atomic::{AtomicBool, Ordering};

use skyfarm_area_models::ReportRequest;

use crate::{AreaApi, Session};

/// Message shown for connectivity problems and unreadable responses.
pub const CONNECTION_ERROR_MESSAGE: &str = "connection error, try again";

/// Message shown when the server rejects a request without explaining why.
pub const GENERIC_ERROR_MESSAGE: &str = "an unexpected error occurred, try again";

/// Why a submission failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    /// No connectivity, timeout, or a response that couldn't be read.
    Transport,
    /// The server answered with a non-success status.
    Server {
        /// HTTP status code.
        status: u16,
    },
}

/// Outcome of one submission. Exactly one of payload or message.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionResult {
    /// The server accepted the request.
    Success {
        /// Response body (the created resource), `Null` if empty.
        payload: serde_json::Value,
    },
    /// The request failed; `message` is ready to show the user.
    Failure {
        /// User-facing message.
        message: String,
        /// Failure category, for choosing retry affordances.
        cause: FailureCause,
    },
}

impl SubmissionResult {
    /// A transport-level failure with the standard message.
    #[must_use]
    pub fn transport() -> Self {
        Self::Failure {
            message: CONNECTION_ERROR_MESSAGE.to_string(),
            cause: FailureCause::Transport,
        }
    }

    /// Whether the server accepted the request.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Success payload, if any.
    #[must_use]
    pub const fn payload(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Success { payload } => Some(payload),
            Self::Failure { .. } => None,
        }
    }

    /// Failure message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { message, .. } => Some(message),
        }
    }
}

/// Holds the busy flag for the duration of one submission.
///
/// Dropping the guard clears the flag, also when the submitting future is
/// dropped before it settles.
pub struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    /// Sets `flag` and returns a guard, or `None` if it was already set.
    #[must_use]
    pub fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Result of asking a [`Submitter`] to send a request.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// A previous submission is still pending; nothing was sent.
    Busy,
    /// The request was sent and settled.
    Settled(SubmissionResult),
}

/// Sends area requests through an [`AreaApi`], at most one at a time.
///
/// The guard prevents client-side double firing only; the server does not
/// deduplicate.
pub struct Submitter<A> {
    api: A,
    busy: AtomicBool,
}

impl<A: AreaApi> Submitter<A> {
    /// Wraps an API implementation.
    #[must_use]
    pub const fn new(api: A) -> Self {
        Self {
            api,
            busy: AtomicBool::new(false),
        }
    }

    /// The wrapped API.
    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Whether a submission is in flight. Submit controls should be
    /// disabled while this is `true`.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Submits `request` unless another submission is pending.
    pub async fn submit(&self, request: &ReportRequest, session: &Session) -> SubmitOutcome {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            log::debug!("Ignoring submission of '{}': one is already pending", request.name());
            return SubmitOutcome::Busy;
        };
        SubmitOutcome::Settled(self.api.create_area(request, session).await)
    }
}
