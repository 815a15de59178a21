//! Shared fakes for the server integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pactl_client::{CommandRunner, DeviceController, PactlError, PactlResult};
use parking_lot::Mutex;
use pulse_server::{AppContext, SubscriberRegistry, TransportError};
use pulse_state::StatusAggregator;
use tokio::sync::mpsc;

/// One-sink mixer that answers like `pactl` and applies volume/mute changes
pub struct FakeMixer {
    volume: Mutex<u32>,
    muted: Mutex<bool>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeMixer {
    pub fn new(volume: u32) -> Arc<Self> {
        Arc::new(Self {
            volume: Mutex::new(volume),
            muted: Mutex::new(false),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn set_volume(&self, volume: u32) {
        *self.volume.lock() = volume;
    }

    /// Every non-list invocation, in order
    pub fn mutations(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .iter()
            .filter(|args| args.first().map(String::as_str) != Some("list"))
            .cloned()
            .collect()
    }

    fn sinks(&self) -> String {
        format!(
            "Sink #0\n\tName: speakers\n\tDescription: Speakers\n\tMute: {}\n\tVolume: front-left: 1 / {:>3}% / 0.00 dB\n",
            if *self.muted.lock() { "yes" } else { "no" },
            self.volume.lock()
        )
    }
}

const SINK_INPUTS: &str = "Sink Input #41
\tDriver: protocol-native.c
\tSink: 0
\tMute: no
\tVolume: front-left: 52429 /  80% / -5.81 dB
\tProperties:
\t\tapplication.name = \"Firefox\"
";

#[async_trait]
impl CommandRunner for FakeMixer {
    async fn run(&self, args: &[String]) -> PactlResult<String> {
        self.calls.lock().push(args.to_vec());
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        match args.as_slice() {
            ["list", "sinks"] => Ok(self.sinks()),
            ["list", "sink-inputs"] => Ok(SINK_INPUTS.to_string()),
            ["list", _] => Ok(String::new()),
            ["set-sink-volume", "--", "speakers", percent] => {
                let value: f64 = percent.trim_end_matches('%').parse().unwrap_or(0.0);
                *self.volume.lock() = value.round() as u32;
                Ok(String::new())
            }
            ["set-sink-mute", "--", "speakers", muted] => {
                *self.muted.lock() = *muted == "true";
                Ok(String::new())
            }
            _ => Err(PactlError::CommandFailed {
                command: args.join(" "),
                status: "exit status: 1".to_string(),
                stderr: "Failure: No such entity".to_string(),
            }),
        }
    }
}

pub fn context(mixer: &Arc<FakeMixer>) -> AppContext {
    let controller = DeviceController::new(mixer.clone());
    AppContext::new(
        Arc::new(StatusAggregator::new(controller.clone())),
        controller,
        SubscriberRegistry::new(),
        Duration::from_secs(1),
    )
}

/// Sink that forwards frames to a channel, or fails every send
pub struct ChannelSink {
    frames: mpsc::UnboundedSender<String>,
    broken: bool,
}

impl ChannelSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { frames: tx, broken: false }, rx)
    }

    pub fn broken() -> Self {
        let (tx, _) = mpsc::unbounded_channel();
        Self { frames: tx, broken: true }
    }
}

#[async_trait]
impl pulse_server::MessageSink for ChannelSink {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        if self.broken {
            return Err(TransportError::WebSocket("connection reset".to_string()));
        }
        self.frames.send(text).map_err(|_| TransportError::Closed)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}
