//! Process boundary for `pactl` invocations

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::error::{PactlError, PactlResult};

/// Default binary looked up on `PATH`
pub const DEFAULT_BINARY: &str = "pactl";

/// Default per-invocation deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs one `pactl` subcommand and returns its standard output.
///
/// This is the only place the system touches the audio server. Everything
/// above it receives a runner by injection so tests can substitute canned
/// output for the real binary.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `pactl <args...>` and return stdout on success
    async fn run(&self, args: &[String]) -> PactlResult<String>;
}

/// [`CommandRunner`] backed by the real `pactl` binary
#[derive(Debug, Clone)]
pub struct Pactl {
    binary: String,
    timeout: Duration,
}

impl Pactl {
    /// Create a runner for `pactl` on `PATH` with the default timeout
    pub fn new() -> Self {
        Self {
            binary: DEFAULT_BINARY.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Use a different binary (absolute path or name on `PATH`)
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Set the per-invocation deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn describe(&self, args: &[String]) -> String {
        let mut command = self.binary.clone();
        for arg in args {
            command.push(' ');
            command.push_str(arg);
        }
        command
    }
}

impl Default for Pactl {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for Pactl {
    async fn run(&self, args: &[String]) -> PactlResult<String> {
        let command = self.describe(args);
        debug!(%command, "running pactl");

        let mut child = Command::new(&self.binary);
        child
            .args(args)
            // Field names are matched literally, so force untranslated output.
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, child.output()).await {
            Ok(result) => result.map_err(|source| PactlError::Spawn {
                binary: self.binary.clone(),
                source,
            })?,
            Err(_) => {
                return Err(PactlError::Timeout {
                    command,
                    timeout: self.timeout,
                })
            }
        };

        if !output.status.success() {
            return Err(PactlError::CommandFailed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| PactlError::Utf8 {
            command: command.clone(),
        })?;
        trace!(%command, bytes = stdout.len(), "pactl finished");
        Ok(stdout)
    }
}
