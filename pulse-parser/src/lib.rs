//! Parsers for `pactl list` text output
//!
//! This crate turns the human-readable listings printed by `pactl` into typed
//! mixer records:
//!
//! - [`parse_outputs`] for `pactl list sinks`
//! - [`parse_sources`] for `pactl list sources`
//! - [`parse_playback_streams`] for `pactl list sink-inputs`
//! - [`parse_recording_streams`] for `pactl list source-outputs`
//!
//! Every parser splits the listing into one block per record and extracts a
//! fixed set of fields from each. A block with a missing field or a malformed
//! number is skipped, and the reason is returned in [`Parsed::rejected`] next
//! to the records that did parse.
//!
//! ```
//! use pulse_parser::parse_outputs;
//!
//! let raw = "Sink #0\n\tName: speakers\n\tDescription: Speakers\n\tMute: no\n\tVolume: mono: 40%\n";
//! let parsed = parse_outputs(raw);
//! assert_eq!(parsed.records[0].volume, 40);
//! ```

pub mod error;
pub mod records;

mod blocks;
mod devices;
mod streams;

pub use devices::{parse_outputs, parse_sources};
pub use error::{ParseError, ParseResult};
pub use records::{ApplicationStream, CaptureSource, OutputDevice, Parsed, StreamTarget};
pub use streams::{parse_playback_streams, parse_recording_streams};
