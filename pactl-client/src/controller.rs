//! High-level controller for mixer mutations and listings

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error};

use crate::error::PactlResult;
use crate::runner::CommandRunner;

/// Kind of object a volume or mute command addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// Output device
    Sink,
    /// Playback stream
    SinkInput,
    /// Capture source
    Source,
    /// Recording stream
    SourceOutput,
}

impl DeviceKind {
    /// Name used in `pactl set-<kind>-volume` style subcommands
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::Sink => "sink",
            DeviceKind::SinkInput => "sink-input",
            DeviceKind::Source => "source",
            DeviceKind::SourceOutput => "source-output",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of an application stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Sink input, attached to an output device
    Playback,
    /// Source output, attached to a capture source
    Recording,
}

impl StreamKind {
    /// The addressable kind backing this stream
    pub fn device_kind(&self) -> DeviceKind {
        match self {
            StreamKind::Playback => DeviceKind::SinkInput,
            StreamKind::Recording => DeviceKind::SourceOutput,
        }
    }
}

/// The four `pactl list` queries a snapshot is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listing {
    Sinks,
    Sources,
    SinkInputs,
    SourceOutputs,
}

impl Listing {
    pub const ALL: [Listing; 4] = [
        Listing::Sinks,
        Listing::Sources,
        Listing::SinkInputs,
        Listing::SourceOutputs,
    ];

    /// Argument passed after `list`
    pub fn as_str(&self) -> &'static str {
        match self {
            Listing::Sinks => "sinks",
            Listing::Sources => "sources",
            Listing::SinkInputs => "sink-inputs",
            Listing::SourceOutputs => "source-outputs",
        }
    }

    pub fn args(&self) -> Vec<String> {
        vec!["list".to_string(), self.as_str().to_string()]
    }
}

/// Ends `pactl`'s option parsing, so a device name starting with `-` stays a name
const END_OF_OPTIONS: &str = "--";

/// Argument list for `set-<kind>-volume`, volume rendered with two decimals
pub fn volume_args(kind: DeviceKind, target: &str, percent: f64) -> Vec<String> {
    vec![
        format!("set-{kind}-volume"),
        END_OF_OPTIONS.to_string(),
        target.to_string(),
        format!("{percent:.2}%"),
    ]
}

/// Argument list for `set-<kind>-mute`
pub fn mute_args(kind: DeviceKind, target: &str, muted: bool) -> Vec<String> {
    vec![
        format!("set-{kind}-mute"),
        END_OF_OPTIONS.to_string(),
        target.to_string(),
        muted.to_string(),
    ]
}

/// Argument list for `move-sink-input` / `move-source-output`
pub fn move_args(kind: StreamKind, stream_id: u32, device: &str) -> Vec<String> {
    vec![
        format!("move-{}", kind.device_kind()),
        END_OF_OPTIONS.to_string(),
        stream_id.to_string(),
        device.to_string(),
    ]
}

/// Issues mixer commands through a [`CommandRunner`].
///
/// Mutations come in two flavours. The `try_*` methods return the runner's
/// result. The plain methods are fire-and-forget: a failure is logged and
/// swallowed, and the caller is expected to re-read state to learn whether
/// the change landed.
#[derive(Clone)]
pub struct DeviceController {
    runner: Arc<dyn CommandRunner>,
}

impl DeviceController {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// The underlying runner, shared with listing consumers
    pub fn runner(&self) -> &Arc<dyn CommandRunner> {
        &self.runner
    }

    /// Raw text of one `pactl list` query
    pub async fn list(&self, listing: Listing) -> PactlResult<String> {
        self.runner.run(&listing.args()).await
    }

    pub async fn try_set_volume(
        &self,
        kind: DeviceKind,
        target: &str,
        percent: f64,
    ) -> PactlResult<()> {
        self.execute(volume_args(kind, target, percent)).await
    }

    pub async fn try_set_muted(&self, kind: DeviceKind, target: &str, muted: bool) -> PactlResult<()> {
        self.execute(mute_args(kind, target, muted)).await
    }

    pub async fn try_move_stream(
        &self,
        kind: StreamKind,
        stream_id: u32,
        device: &str,
    ) -> PactlResult<()> {
        self.execute(move_args(kind, stream_id, device)).await
    }

    /// Set the volume of a device or stream, logging any failure
    pub async fn set_volume(&self, kind: DeviceKind, target: &str, percent: f64) {
        if let Err(e) = self.try_set_volume(kind, target, percent).await {
            error!(%kind, device = target, percent, error = %e, "failed to set volume");
        }
    }

    /// Mute or unmute a device or stream, logging any failure
    pub async fn set_muted(&self, kind: DeviceKind, target: &str, muted: bool) {
        if let Err(e) = self.try_set_muted(kind, target, muted).await {
            error!(%kind, device = target, muted, error = %e, "failed to set mute");
        }
    }

    /// Move a stream to another device, logging any failure
    pub async fn move_stream(&self, kind: StreamKind, stream_id: u32, device: &str) {
        if let Err(e) = self.try_move_stream(kind, stream_id, device).await {
            error!(?kind, stream_id, device, error = %e, "failed to move stream");
        }
    }

    async fn execute(&self, args: Vec<String>) -> PactlResult<()> {
        debug!(?args, "mixer mutation");
        // Output of mutations carries no information.
        self.runner.run(&args).await.map(|_| ())
    }
}

impl fmt::Debug for DeviceController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceController").finish_non_exhaustive()
    }
}
