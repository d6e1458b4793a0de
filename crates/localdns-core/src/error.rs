//! Error types for the Local DNS console
//!
//! Two families live here:
//!
//! - [`ApiError`]: the structured, serialisable outcome of a failed API call.
//!   Domain operations return it instead of panicking or bubbling transport
//!   errors, so every caller can branch on a single shape.
//! - [`Error`]: library-level failures (configuration, transport
//!   construction) that are not API outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for library-level operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for API-facing operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Core error type for library-level failures
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport construction or usage errors
    #[error("Transport error ({transport}): {message}")]
    Transport {
        /// Transport name
        transport: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a transport error
    pub fn transport(transport: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            transport: transport.into(),
            message: message.into(),
        }
    }
}

/// Kind tag carried by every [`ApiError`]
///
/// The serialised names are the ones the presentation layer branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A Local DNS call was attempted without a selected organization
    NoOrganizationSelected,
    /// The vendor answered with a non-2xx status
    #[serde(rename = "HTTPError")]
    HttpError,
    /// The connection could not be established
    ConnectionError,
    /// The request timed out
    TimeoutError,
    /// Any other request-level failure (including undecodable success bodies)
    RequestException,
    /// A failure inside the operation's own logic
    UnexpectedError,
    /// The dashboard client could not be built (no credential)
    #[serde(rename = "DashboardAPIError")]
    DashboardApiError,
}

impl ErrorKind {
    /// Wire name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NoOrganizationSelected => "NoOrganizationSelected",
            ErrorKind::HttpError => "HTTPError",
            ErrorKind::ConnectionError => "ConnectionError",
            ErrorKind::TimeoutError => "TimeoutError",
            ErrorKind::RequestException => "RequestException",
            ErrorKind::UnexpectedError => "UnexpectedError",
            ErrorKind::DashboardApiError => "DashboardAPIError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure of an API call
///
/// Serialises as `{"error": "<kind>", "details": "...", "status_code": 404}`;
/// `status_code` is omitted when the failure never produced a response.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {details}")]
pub struct ApiError {
    /// What went wrong
    #[serde(rename = "error")]
    pub kind: ErrorKind,

    /// Raw response body or stringified failure
    pub details: String,

    /// HTTP status, present for [`ErrorKind::HttpError`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl ApiError {
    /// Create an error of the given kind without a status code
    pub fn new(kind: ErrorKind, details: impl Into<String>) -> Self {
        Self {
            kind,
            details: details.into(),
            status_code: None,
        }
    }

    /// No organization is selected in the session scope
    pub fn no_organization() -> Self {
        Self::new(
            ErrorKind::NoOrganizationSelected,
            "Please select an organization first.",
        )
    }

    /// Non-2xx response; `details` carries the raw body
    pub fn http(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::HttpError,
            details: body.into(),
            status_code: Some(status_code),
        }
    }

    /// Connection failure
    pub fn connection(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConnectionError, details)
    }

    /// Timeout
    pub fn timeout(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::TimeoutError, details)
    }

    /// Generic request failure
    pub fn request(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestException, details)
    }

    /// Unexpected failure in the operation's own logic
    pub fn unexpected(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnexpectedError, details)
    }

    /// The dashboard client is not available
    pub fn dashboard_unavailable() -> Self {
        Self::new(
            ErrorKind::DashboardApiError,
            "Meraki Dashboard API not initialized.",
        )
    }
}
