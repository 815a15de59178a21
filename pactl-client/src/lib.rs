//! Thin async client for the `pactl` command-line tool
//!
//! [`CommandRunner`] is the process boundary: it runs one `pactl` subcommand
//! and hands back stdout. [`Pactl`] is the production implementation; tests
//! and embedders can supply their own. [`DeviceController`] builds the
//! argument lists for volume, mute, move and list operations on top of any
//! runner.

mod controller;
mod error;
mod runner;

pub use controller::{
    move_args, mute_args, volume_args, DeviceController, DeviceKind, Listing, StreamKind,
};
pub use error::{PactlError, PactlResult};
pub use runner::{CommandRunner, Pactl, DEFAULT_BINARY, DEFAULT_TIMEOUT};
