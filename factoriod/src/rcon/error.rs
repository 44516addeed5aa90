//! Error types for the remote console.

use std::io;

use thiserror::Error;

/// Result type for console operations.
pub type RconResult<T> = Result<T, RconError>;

/// Errors from talking to the remote console.
#[derive(Debug, Error)]
pub enum RconError {
    /// No password has been configured yet.
    #[error("remote console password is not configured")]
    ConfigurationRequired,

    /// Could not reach the console endpoint.
    #[error("failed to connect to {addr}: {source}")]
    Connect { addr: String, source: io::Error },

    /// The connection failed mid-exchange.
    #[error("console connection failed: {0}")]
    Io(#[from] io::Error),

    /// The server rejected the configured password.
    #[error("the server rejected the console password")]
    AuthFailed,

    /// A reply did not match the expected format.
    #[error("unexpected console reply: {0}")]
    Protocol(String),
}
