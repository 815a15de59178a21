//! Configuration types for the pulse-remote server
//!
//! [`ServerConfig`] controls where the server listens, how often mixer state
//! is reconciled and how long individual operations may take.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::error::ServerError;

/// Configuration for [`PulseServer`](crate::PulseServer)
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address the HTTP/WebSocket listener binds to
    pub bind_addr: SocketAddr,

    /// Period of the broadcast tick
    pub broadcast_interval: Duration,

    /// Deadline for a single WebSocket send before the subscriber is dropped
    pub send_timeout: Duration,

    /// `pactl` binary, either a name on `PATH` or an absolute path
    pub pactl_binary: String,

    /// Deadline for a single `pactl` invocation
    pub command_timeout: Duration,
}

/// Default listen port
pub const DEFAULT_PORT: u16 = 8448;

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            broadcast_interval: Duration::from_millis(500),
            send_timeout: Duration::from_secs(10),
            pactl_binary: pactl_client::DEFAULT_BINARY.to_string(),
            command_timeout: pactl_client::DEFAULT_TIMEOUT,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loopback-only preset on an ephemeral port, used by tests and local tools
    pub fn local() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
            ..Default::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.broadcast_interval.is_zero() {
            return Err(ServerError::Configuration(
                "Broadcast interval must be greater than 0".to_string(),
            ));
        }

        if self.send_timeout.is_zero() {
            return Err(ServerError::Configuration(
                "Send timeout must be greater than 0".to_string(),
            ));
        }

        if self.command_timeout.is_zero() {
            return Err(ServerError::Configuration(
                "Command timeout must be greater than 0".to_string(),
            ));
        }

        if self.pactl_binary.trim().is_empty() {
            return Err(ServerError::Configuration(
                "pactl binary must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn with_broadcast_interval(mut self, interval: Duration) -> Self {
        self.broadcast_interval = interval;
        self
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    pub fn with_pactl_binary(mut self, binary: impl Into<String>) -> Self {
        self.pactl_binary = binary.into();
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }
}
