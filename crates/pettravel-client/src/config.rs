//! Client configuration.

use std::time::Duration;

use url::Url;

/// Environment variable selecting the backend origin.
pub const API_BASE_URL_ENV: &str = "API_BASE_URL";

/// Environment variable overriding the per-request timeout, in seconds.
pub const TIMEOUT_ENV: &str = "PETTRAVEL_TIMEOUT";

/// Backend used when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/";

/// Errors raised while building a [`ClientConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid API base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported URL scheme '{0}': expected http or https")]
    UnsupportedScheme(String),

    #[error("Invalid timeout '{0}': expected a positive number of seconds")]
    InvalidTimeout(String),
}

/// Configuration for [`crate::PetTravelClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend root. Always ends with `/` so endpoint paths join under it.
    pub base_url: Url,

    /// Bounded wait for every HTTP call (default: 30 seconds).
    pub request_timeout: Duration,

    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_API_BASE_URL).expect("default base URL is valid"),
            request_timeout: Duration::from_secs(30),
            user_agent: concat!("pettravel-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Creates a configuration pointing at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            ..Self::default()
        })
    }

    /// Reads `API_BASE_URL` and `PETTRAVEL_TIMEOUT`, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(API_BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url.trim())?,
            _ => Self::default(),
        };
        if let Ok(raw) = std::env::var(TIMEOUT_ENV) {
            config.request_timeout = parse_timeout(&raw)?;
        }
        Ok(config)
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Parses a base URL, normalising it to end with `/`.
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    let url = Url::parse(&normalized).map_err(|source| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}

/// Parses a timeout given in whole seconds.
pub fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout(raw.to_string())),
    }
}
