//! The aggregate mixer snapshot pushed to clients

use pulse_parser::{ApplicationStream, CaptureSource, OutputDevice};
use serde::{Deserialize, Serialize};

/// Build and version metadata reported alongside every snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub git_version: String,
    pub git_commit: String,
    pub build_date: String,
    pub compiler: String,
    pub platform: String,
}

impl BuildInfo {
    /// Metadata of the running binary.
    ///
    /// Commit and build date come from `PULSE_REMOTE_GIT_COMMIT` and
    /// `PULSE_REMOTE_BUILD_DATE` at compile time and read `unknown` when unset.
    pub fn current() -> Self {
        Self {
            git_version: env!("CARGO_PKG_VERSION").to_string(),
            git_commit: option_env!("PULSE_REMOTE_GIT_COMMIT")
                .unwrap_or("unknown")
                .to_string(),
            build_date: option_env!("PULSE_REMOTE_BUILD_DATE")
                .unwrap_or("unknown")
                .to_string(),
            compiler: option_env!("PULSE_REMOTE_RUSTC_VERSION")
                .unwrap_or("rustc")
                .to_string(),
            platform: format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH),
        }
    }
}

/// Complete point-in-time view of the mixer.
///
/// Equality is structural and order sensitive: two snapshots are equal only
/// if every record in every list matches at the same position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub outputs: Vec<OutputDevice>,
    pub sources: Vec<CaptureSource>,
    /// Playback streams first, then recording streams
    pub apps: Vec<ApplicationStream>,
    pub build_info: BuildInfo,
}

impl Snapshot {
    pub fn playback_streams(&self) -> impl Iterator<Item = &ApplicationStream> {
        self.apps.iter().filter(|app| app.is_playback())
    }

    pub fn recording_streams(&self) -> impl Iterator<Item = &ApplicationStream> {
        self.apps.iter().filter(|app| !app.is_playback())
    }

    /// Find an output device by its stable name
    pub fn output(&self, name: &str) -> Option<&OutputDevice> {
        self.outputs.iter().find(|o| o.name == name)
    }

    /// Find a capture source by its stable name
    pub fn source(&self, name: &str) -> Option<&CaptureSource> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// True when no device, source or stream was acquired
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty() && self.sources.is_empty() && self.apps.is_empty()
    }
}
