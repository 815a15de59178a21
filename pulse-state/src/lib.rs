//! Mixer snapshot model and acquisition
//!
//! A [`Snapshot`] is the complete view of outputs, sources and application
//! streams plus [`BuildInfo`]. [`StatusAggregator`] produces one by running
//! the four `pactl list` queries concurrently and parsing their output; any
//! query that fails leaves its section empty instead of failing the whole
//! snapshot.

mod aggregator;
mod snapshot;

pub use aggregator::{SnapshotSource, StatusAggregator};
pub use snapshot::{BuildInfo, Snapshot};

// Re-export the record types so downstream crates need only this one
pub use pulse_parser::{ApplicationStream, CaptureSource, OutputDevice, StreamTarget};
