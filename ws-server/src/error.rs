//! Error types for the pulse-remote server.

use std::net::SocketAddr;
use std::time::Duration;

use crate::logging::LoggingError;

/// Errors that can stop the server from starting.
///
/// Once the listener is bound nothing is fatal: command, parse and transport
/// failures are handled per request or per connection.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Invalid configuration provided
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The listener could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: warp::Error,
    },

    /// Logging could not be initialised
    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),
}

/// Errors writing to a single subscriber connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The subscriber was already closed
    #[error("Connection closed")]
    Closed,

    /// The send did not complete within the deadline
    #[error("Send timed out after {0:?}")]
    Timeout(Duration),

    /// The underlying socket reported an error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// A message could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<warp::Error> for TransportError {
    fn from(err: warp::Error) -> Self {
        TransportError::WebSocket(err.to_string())
    }
}
