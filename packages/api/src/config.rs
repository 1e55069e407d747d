//! Client configuration, from the environment or a TOML document.

use std::time::Duration;

use serde::Deserialize;

use crate::ApiError;

/// Endpoints and limits for the backend services.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the area/project API (e.g. `https://api.skyfarm.app`).
    pub api_url: String,
    /// Base URL of the hosted data store (e.g. `https://xyz.supabase.co`).
    pub store_url: String,
    /// Public key sent as the store's `apikey` header.
    pub store_key: String,
    /// Storage bucket holding rendered metric images.
    #[serde(default = "default_image_bucket")]
    pub image_bucket: String,
    /// Lifetime of signed image URLs, in seconds.
    #[serde(default = "default_signed_url_ttl")]
    pub signed_url_ttl_secs: u64,
    /// Per-request timeout, in seconds.
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

fn default_image_bucket() -> String {
    "projects".to_string()
}

const fn default_signed_url_ttl() -> u64 {
    60
}

const fn default_timeout() -> u64 {
    30
}

impl ClientConfig {
    /// Loads configuration from `SKYFARM_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if a required variable is unset or a
    /// numeric variable does not parse.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ApiError::Config {
                    message: format!("{key} environment variable not set"),
                })
        };
        let number = |key: &str, default: u64| -> Result<u64, ApiError> {
            lookup(key).map_or(Ok(default), |raw| {
                raw.trim().parse().map_err(|_| ApiError::Config {
                    message: format!("{key} must be a whole number of seconds, got '{raw}'"),
                })
            })
        };

        let config = Self {
            api_url: required("SKYFARM_API_URL")?,
            store_url: required("SKYFARM_STORE_URL")?,
            store_key: required("SKYFARM_STORE_KEY")?,
            image_bucket: lookup("SKYFARM_IMAGE_BUCKET").unwrap_or_else(default_image_bucket),
            signed_url_ttl_secs: number("SKYFARM_SIGNED_URL_TTL_SECS", default_signed_url_ttl())?,
            request_timeout_secs: number("SKYFARM_REQUEST_TIMEOUT_SECS", default_timeout())?,
        };
        log::debug!(
            "Loaded client config from environment (api: {}, store: {})",
            config.api_url,
            config.store_url
        );
        Ok(config)
    }

    /// Parses configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Toml`] if the document is invalid or a required
    /// key is missing.
    pub fn from_toml_str(s: &str) -> Result<Self, ApiError> {
        Ok(toml::from_str(s)?)
    }

    /// API base URL without a trailing slash.
    #[must_use]
    pub fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    /// Store base URL without a trailing slash.
    #[must_use]
    pub fn store_base(&self) -> &str {
        self.store_url.trim_end_matches('/')
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Builds an HTTP client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the TLS backend cannot be initialized.
    pub fn http_client(&self) -> Result<reqwest::Client, ApiError> {
        Ok(reqwest::Client::builder()
            .timeout(self.request_timeout())
            .build()?)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn loads_from_variables_with_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("SKYFARM_API_URL", "https://api.example.com/"),
            ("SKYFARM_STORE_URL", "https://store.example.com"),
            ("SKYFARM_STORE_KEY", "anon"),
        ]))
        .unwrap();
        assert_eq!(config.api_base(), "https://api.example.com");
        assert_eq!(config.image_bucket, "projects");
        assert_eq!(config.signed_url_ttl_secs, 60);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn missing_required_variable_is_reported() {
        let err = ClientConfig::from_lookup(lookup(&[("SKYFARM_API_URL", "https://a")]))
            .unwrap_err();
        assert!(err.to_string().contains("SKYFARM_STORE_URL"));
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        let err = ClientConfig::from_lookup(lookup(&[
            ("SKYFARM_API_URL", "https://a"),
            ("SKYFARM_STORE_URL", "https://b"),
            ("SKYFARM_STORE_KEY", "k"),
            ("SKYFARM_REQUEST_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ApiError::Config { .. }));
    }

    #[test]
    fn parses_toml() {
        let config = ClientConfig::from_toml_str(
            r#"
            api_url = "https://api.example.com"
            store_url = "https://store.example.com/"
            store_key = "anon"
            signed_url_ttl_secs = 120
            "#,
        )
        .unwrap();
        assert_eq!(config.store_base(), "https://store.example.com");
        assert_eq!(config.signed_url_ttl_secs, 120);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn toml_missing_key_is_an_error() {
        assert!(matches!(
            ClientConfig::from_toml_str("api_url = \"https://a\""),
            Err(ApiError::Toml(_))
        ));
    }
}
