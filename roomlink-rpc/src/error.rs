//! Call failures
//!
//! `RequestCaller::try_call` returns these; `RequestCaller::call` reports
//! them to the notifier and resolves to an empty object instead.

use serde_json::Value;
use thiserror::Error;

/// Result type for RPC calls
pub type CallResult<T> = std::result::Result<T, CallError>;

/// Why a call did not produce a result
#[derive(Debug, Clone, Error)]
pub enum CallError {
    /// The request never got a response (refused, DNS, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status
    #[error("{title}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// `"API Error - <status>"`
        title: String,
        /// Response body, parsed as JSON when possible
        message: Value,
    },

    /// The auth check reported no session
    #[error("Not authenticated")]
    Unauthenticated,

    /// The server redirected the caller
    #[error("Redirected to {location}")]
    Redirect {
        /// Target the navigator was sent to
        location: String,
    },

    /// The payload or a success response body is not valid JSON
    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl CallError {
    /// Short label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            CallError::Network(_) => "network",
            CallError::Status { .. } => "status",
            CallError::Unauthenticated => "unauthenticated",
            CallError::Redirect { .. } => "redirect",
            CallError::Decode(_) => "decode",
        }
    }

    /// HTTP status, when a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            CallError::Status { status, .. } => Some(*status),
            CallError::Unauthenticated => Some(401),
            _ => None,
        }
    }
}
