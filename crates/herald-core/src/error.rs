//! Error types shared by every Herald layer.
//!
//! Command-level errors (checks, handlers, construction) live in
//! `herald-framework`; this module only covers the transport-facing side.

use thiserror::Error;

/// Error type for reply calls made through a [`Message`](crate::Message).
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The underlying client is not connected.
    #[error("client is not connected")]
    NotConnected,
    /// The transport refused or failed to deliver the reply.
    #[error("failed to send message: {0}")]
    SendFailed(String),
    /// Other error.
    #[error("{0}")]
    Other(String),
}

/// Result type for reply calls.
pub type ApiResult<T> = Result<T, ApiError>;
