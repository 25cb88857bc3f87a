//! Normalised error taxonomy for the API client.
//!
//! Every failure that leaves this crate is an [`ApiError`]. HTTP failures are
//! classified by status code in [`ApiError::from_failure`], transport failures
//! by [`NetworkErrorKind`]. Callers never see raw `reqwest` errors.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::session::StorageError;

/// Keys of a DRF error body that carry a summary rather than a field error.
const SUMMARY_KEYS: &[&str] = &["detail", "message", "error", "code", "status"];

/// Why a request never produced an HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    /// DNS resolution or TCP/TLS connection failed.
    Connect,
    /// The bounded wait configured on the client elapsed.
    Timeout,
    /// Any other transport failure (body stream broken, redirect loop, ...).
    Other,
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "connect"),
            Self::Timeout => write!(f, "timeout"),
            Self::Other => write!(f, "transport"),
        }
    }
}

/// Discriminant of [`ApiError`], for callers that only need to branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Auth,
    NotFound,
    Server,
    Network,
    Decode,
    Storage,
}

/// Errors produced by the API client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request was rejected as invalid (400, 409, 422 and other 4xx).
    #[error("Validation failed (HTTP {status}): {message}")]
    Validation {
        /// HTTP status code.
        status: u16,
        /// Summary message.
        message: String,
        /// Field name to messages, as returned by the backend.
        fields: BTreeMap<String, Vec<String>>,
    },

    /// The credentials were rejected (401/403).
    #[error("Authentication failed (HTTP {status}): {message}")]
    Auth {
        /// HTTP status code.
        status: u16,
        /// Summary message.
        message: String,
        /// The session was cleared; the user has to log in again.
        login_required: bool,
    },

    /// The resource does not exist (404).
    #[error("Not found: {message}")]
    NotFound {
        /// Summary message.
        message: String,
    },

    /// The backend failed (5xx) or throttled the client (429).
    #[error("Server error (HTTP {status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Summary message.
        message: String,
    },

    /// No HTTP response was received.
    #[error("Network error ({kind}): {message}")]
    Network {
        /// Transport failure class.
        kind: NetworkErrorKind,
        /// Underlying error text.
        message: String,
    },

    /// A success response did not match the expected shape.
    #[error("Failed to decode response: {message}")]
    Decode {
        /// Decoder error text.
        message: String,
    },

    /// Persisting the session failed.
    #[error("Session storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// Normalises a non-success HTTP response.
    pub fn from_failure(status: u16, body: &Value) -> Self {
        let message = summary_message(body);
        match status {
            401 | 403 => Self::Auth {
                status,
                message: message.unwrap_or_else(|| "Authentication required".to_string()),
                login_required: false,
            },
            404 => Self::NotFound {
                message: message.unwrap_or_else(|| "Resource not found".to_string()),
            },
            429 => Self::Server {
                status,
                message: message.unwrap_or_else(|| "Too many requests".to_string()),
            },
            400..=499 => {
                let fields = field_errors(body);
                let message = message
                    .or_else(|| {
                        fields
                            .iter()
                            .next()
                            .and_then(|(field, msgs)| msgs.first().map(|m| format!("{field}: {m}")))
                    })
                    .unwrap_or_else(|| "Invalid request".to_string());
                Self::Validation {
                    status,
                    message,
                    fields,
                }
            }
            _ => Self::Server {
                status,
                message: message.unwrap_or_else(|| "Unexpected server response".to_string()),
            },
        }
    }

    /// Builds the error reported after a forced logout.
    pub(crate) fn session_expired(status: u16) -> Self {
        Self::Auth {
            status,
            message: "Session expired, please log in again".to_string(),
            login_required: true,
        }
    }

    pub(crate) fn decode(err: impl fmt::Display) -> Self {
        Self::Decode {
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Auth { .. } => ErrorKind::Auth,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Server { .. } => ErrorKind::Server,
            Self::Network { .. } => ErrorKind::Network,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// HTTP status, when the error came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Validation { status, .. } | Self::Auth { status, .. } | Self::Server { status, .. } => {
                Some(*status)
            }
            Self::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// True for errors a user may retry by hand (server and network failures).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Server { .. } | Self::Network { .. })
    }

    /// True when the session is gone and the caller must go to the login entry point.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::Auth {
                login_required: true,
                ..
            }
        )
    }

    /// Human-readable message for display next to a form or in a terminal.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            Self::Auth {
                login_required: true,
                ..
            } => "Your session has expired. Please log in again.".to_string(),
            Self::Auth { status: 403, .. } => {
                "You do not have permission to perform this action.".to_string()
            }
            Self::Auth { .. } => {
                "Authentication failed. Please check your credentials and try again.".to_string()
            }
            Self::NotFound { .. } => "The requested resource was not found.".to_string(),
            Self::Server { status: 429, .. } => "Too many requests. Please try again later.".to_string(),
            Self::Server { .. } => "Server error. Please try again later.".to_string(),
            Self::Network {
                kind: NetworkErrorKind::Timeout,
                ..
            } => "Request timed out. Please try again.".to_string(),
            Self::Network { .. } => {
                "Unable to connect to the server. Please check your connection and try again."
                    .to_string()
            }
            Self::Decode { .. } => {
                "There was a problem processing the response. Please try again.".to_string()
            }
            Self::Storage(_) => "Could not save your session on this device.".to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            NetworkErrorKind::Timeout
        } else if err.is_connect() {
            NetworkErrorKind::Connect
        } else {
            NetworkErrorKind::Other
        };
        Self::Network {
            kind,
            message: err.to_string(),
        }
    }
}

fn summary_message(body: &Value) -> Option<String> {
    match body {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(map) => SUMMARY_KEYS
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(|v| v.as_str().map(str::to_string)),
        _ => None,
    }
}

fn field_errors(body: &Value) -> BTreeMap<String, Vec<String>> {
    let mut fields = BTreeMap::new();
    let Some(map) = body.as_object() else {
        return fields;
    };
    // Some views nest field errors under "errors".
    let map = map
        .get("errors")
        .and_then(Value::as_object)
        .unwrap_or(map);

    for (field, value) in map {
        if SUMMARY_KEYS.contains(&field.as_str()) {
            continue;
        }
        let messages: Vec<String> = match value {
            Value::String(s) => vec![s.clone()],
            Value::Array(items) => items
                .iter()
                .filter_map(|i| i.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };
        if !messages.is_empty() {
            fields.insert(field.clone(), messages);
        }
    }
    fields
}
