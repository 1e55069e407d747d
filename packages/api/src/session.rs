//! Authenticated session handle.
//!
//! Sign-in and token refresh belong to the identity provider; the client
//! core only needs the current access token, handed in explicitly.

use std::fmt;

/// The signed-in user's credentials for one request.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    access_token: String,
    user_id: Option<String>,
}

impl Session {
    /// Wraps an access token issued by the identity provider.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            user_id: None,
        }
    }

    /// Attaches the user id the token belongs to.
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Bearer token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// User id, if known.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("user_id", &self.user_id)
            .finish()
    }
}
