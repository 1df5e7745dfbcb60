//! Error types for roomlink
//!
//! Most realtime failures are not surfaced as errors at all: sends while
//! disconnected are dropped, socket failures are reported to status
//! listeners. The `Error` enum covers what remains, such as a malformed
//! endpoint or a frame that cannot be serialized.

use thiserror::Error;

/// Result type for roomlink operations
pub type Result<T> = std::result::Result<T, Error>;

/// Application-level error type for roomlink operations
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Serialization or deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// WebSocket transport layer error
    ///
    /// Covers handshake failures, protocol violations and frame errors
    /// below the room/event layer.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// The realtime endpoint could not be built from the configured host
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
