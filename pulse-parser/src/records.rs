//! Typed mixer records produced by the parser
//!
//! Every record serializes with camelCase field names, which is the shape
//! pushed to WebSocket clients inside a status snapshot.

use serde::{Deserialize, Serialize};

/// An audio playback endpoint (a PulseAudio sink).
///
/// `name` is the stable identity. `id` is the server's index, which can be
/// renumbered whenever the device is re-created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputDevice {
    /// Numeric sink index
    pub id: u32,
    /// Stable sink name, e.g. `alsa_output.pci-0000_00_1f.3.analog-stereo`
    pub name: String,
    /// Human-readable description
    pub label: String,
    /// Volume of the first channel, in percent
    pub volume: u32,
    /// Whether the sink is muted
    pub muted: bool,
}

/// An audio capture endpoint (a PulseAudio source).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSource {
    /// Numeric source index
    pub id: u32,
    /// Stable source name
    pub name: String,
    /// Human-readable description
    pub label: String,
    /// Volume of the first channel, in percent
    pub volume: u32,
    /// Whether the source is muted
    pub muted: bool,
    /// Name of the sink this source monitors, if any
    #[serde(default)]
    pub monitor: Option<String>,
    /// True when `monitor` is set
    pub monitored: bool,
}

/// Device an application stream is attached to.
///
/// Serialized flat into the owning [`ApplicationStream`] as either
/// `outputId` or `sourceId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamTarget {
    /// Playback stream (sink input) attached to an output device
    Output {
        #[serde(rename = "outputId")]
        output_id: u32,
    },
    /// Recording stream (source output) attached to a capture source
    Source {
        #[serde(rename = "sourceId")]
        source_id: u32,
    },
}

impl StreamTarget {
    /// Index of the owning device, whichever kind it is
    pub fn device_id(&self) -> u32 {
        match *self {
            StreamTarget::Output { output_id } => output_id,
            StreamTarget::Source { source_id } => source_id,
        }
    }
}

/// One application's playback or recording stream.
///
/// `id` is the transient sink-input / source-output index and is not stable
/// across reconnects or device moves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStream {
    pub id: u32,
    #[serde(flatten)]
    pub target: StreamTarget,
    /// Value of the `application.name` property
    pub label: String,
    pub volume: u32,
    pub muted: bool,
}

impl ApplicationStream {
    /// True for sink inputs
    pub fn is_playback(&self) -> bool {
        matches!(self.target, StreamTarget::Output { .. })
    }

    /// Owning sink index, for playback streams
    pub fn output_id(&self) -> Option<u32> {
        match self.target {
            StreamTarget::Output { output_id } => Some(output_id),
            StreamTarget::Source { .. } => None,
        }
    }

    /// Owning source index, for recording streams
    pub fn source_id(&self) -> Option<u32> {
        match self.target {
            StreamTarget::Source { source_id } => Some(source_id),
            StreamTarget::Output { .. } => None,
        }
    }
}

/// Outcome of parsing one `pactl list` output.
///
/// `records` keeps input order. Blocks that failed to parse are reported in
/// `rejected` and contribute nothing to `records`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed<T> {
    pub records: Vec<T>,
    pub rejected: Vec<crate::ParseError>,
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

impl<T> Parsed<T> {
    /// True when no block was rejected
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    /// Drop the rejection list and keep the records
    pub fn into_records(self) -> Vec<T> {
        self.records
    }
}
