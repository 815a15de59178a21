//! WebSocket server for remote control of a PulseAudio mixer
//!
//! The server keeps every connected client in sync with the local mixer and
//! accepts commands that change it:
//!
//! - [`SyncEngine`] polls a [`SnapshotSource`](pulse_state::SnapshotSource) on a
//!   fixed interval and broadcasts the snapshot whenever it changes.
//! - [`handler`] answers the JSON request/response [`protocol`] on each
//!   connection and re-reads state after every mutation.
//! - [`SubscriberRegistry`] is the one shared set of connected clients.
//!
//! ```no_run
//! use std::time::Duration;
//! use pulse_server::{PulseServer, ServerConfig};
//!
//! # async fn run() -> Result<(), pulse_server::ServerError> {
//! let config = ServerConfig::local().with_broadcast_interval(Duration::from_millis(250));
//! let server = PulseServer::with_pactl(config).await?;
//! println!("ws://{}/api/v1/ws", server.local_addr());
//! server.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod handler;
pub mod logging;
pub mod origin;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod subscriber;

pub use config::{ServerConfig, DEFAULT_PORT};
pub use engine::{EngineHandle, SyncEngine, TickOutcome};
pub use error::{ServerError, TransportError};
pub use handler::AppContext;
pub use logging::{init_logging, LoggingError, LoggingMode};
pub use protocol::{Action, Command, ProtocolError, Response, ResponsePayload, StatusCode};
pub use registry::SubscriberRegistry;
pub use server::{routes, PulseServer};
pub use subscriber::{MessageSink, Subscriber};
