//! Error taxonomy for work item API operations.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::http::HttpError;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the work item client and provider.
///
/// Every transport- or protocol-level failure is mapped into one of these
/// kinds before it reaches a caller; raw transport errors never escape.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed caller input (non-positive id, empty query or comment
    /// text, empty connection fields). Detected before any network call.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// HTTP 401 or 403: the access token was rejected or lacks privileges.
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    /// HTTP 404 on a single-record fetch.
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// HTTP 400 from the query endpoint: the server rejected the WIQL text.
    /// Distinct from [`Error::Validation`], which never left the process.
    #[error("invalid query: {message}")]
    InvalidQuery { message: String },

    /// HTTP 429. Carries the server's reset hint when one was present.
    #[error("rate limit exceeded{}", reset_hint(.reset_at))]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    /// HTTP 5xx, or any status the taxonomy has no dedicated kind for.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Connection-level failure. The message distinguishes timeouts from
    /// other transport problems.
    #[error("network error: {message}")]
    Network { message: String },

    /// A 2xx response body that did not match the expected wire schema.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

fn reset_hint(reset_at: &Option<DateTime<Utc>>) -> String {
    match reset_at {
        Some(at) => format!(", resets at {at}"),
        None => String::new(),
    }
}

impl Error {
    /// Construct a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    /// Whether a later retry of the same operation could plausibly succeed.
    ///
    /// Rate-limit, 5xx, and network failures are transient; validation,
    /// authentication, not-found, and query-syntax failures are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Error::RateLimited { .. } | Error::Network { .. } => true,
            Error::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// The server's rate-limit reset hint, if this is a rate-limit error
    /// that carried one.
    #[must_use]
    pub fn retry_after(&self) -> Option<DateTime<Utc>> {
        match self {
            Error::RateLimited { reset_at } => *reset_at,
            _ => None,
        }
    }
}

impl From<HttpError> for Error {
    fn from(err: HttpError) -> Self {
        Error::Network {
            message: err.to_string(),
        }
    }
}

/// Get a short error message suitable for log lines.
pub fn short_error_message(err: &Error) -> String {
    match err {
        Error::Validation { message } => format!("Validation: {message}"),
        Error::Authentication { .. } => "Authentication failed".to_string(),
        Error::NotFound { resource } => format!("Not found: {resource}"),
        Error::InvalidQuery { .. } => "Invalid query".to_string(),
        Error::RateLimited { .. } => "Rate limited".to_string(),
        Error::Server { status, message } => {
            if message.len() > 50 {
                let truncated: String = message.chars().take(47).collect();
                format!("HTTP {status}: {truncated}...")
            } else {
                format!("HTTP {status}: {message}")
            }
        }
        Error::Network { .. } => "Network error".to_string(),
        Error::Decode(_) => "Malformed response body".to_string(),
    }
}
