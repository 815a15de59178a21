//! Error types for running `pactl`

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while invoking the external `pactl` binary
#[derive(Debug, Error)]
pub enum PactlError {
    /// The process could not be started at all
    #[error("failed to spawn `{binary}`: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran but exited unsuccessfully
    #[error("`{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        /// Exit status as reported by the OS, e.g. `exit status: 1`
        status: String,
        stderr: String,
    },

    /// The process did not finish within the configured deadline
    #[error("`{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    /// Standard output was not valid UTF-8
    #[error("`{command}` produced non UTF-8 output")]
    Utf8 { command: String },
}

/// Result type alias for pactl operations
pub type PactlResult<T> = Result<T, PactlError>;
