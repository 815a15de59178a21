//! Snapshot acquisition from the four `pactl list` queries

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use pactl_client::{DeviceController, Listing};
use parking_lot::Mutex;
use pulse_parser::{
    parse_outputs, parse_playback_streams, parse_recording_streams, parse_sources, ParseError,
    Parsed,
};
use tracing::{debug, error, warn};

use crate::snapshot::{BuildInfo, Snapshot};

/// Anything that can produce a fresh [`Snapshot`] on demand
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Acquire a complete snapshot.
    ///
    /// Never fails: sections that could not be acquired are left empty.
    async fn snapshot(&self) -> Snapshot;

    /// Metadata attached to every snapshot
    fn build_info(&self) -> BuildInfo;
}

/// Builds snapshots by listing and parsing mixer state through `pactl`
#[derive(Debug, Clone)]
pub struct StatusAggregator {
    controller: DeviceController,
    build_info: BuildInfo,
    rejections: Arc<RejectionLog>,
}

impl StatusAggregator {
    pub fn new(controller: DeviceController) -> Self {
        Self {
            controller,
            build_info: BuildInfo::current(),
            rejections: Arc::default(),
        }
    }

    /// Override the reported build metadata
    pub fn with_build_info(mut self, build_info: BuildInfo) -> Self {
        self.build_info = build_info;
        self
    }

    pub fn controller(&self) -> &DeviceController {
        &self.controller
    }

    /// Run one listing and parse it.
    ///
    /// A failed listing is logged and yields an empty section. Rejected
    /// blocks are logged individually, at `warn` only on the first pass they
    /// show up in; the records that did parse are kept.
    async fn section<T>(&self, listing: Listing, parse: fn(&str) -> Parsed<T>) -> Vec<T> {
        let raw = match self.controller.list(listing).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(listing = listing.as_str(), error = %e, "failed to acquire mixer state");
                return Vec::new();
            }
        };

        let parsed = parse(&raw);
        let fresh = self.rejections.fresh(listing, &parsed.rejected);
        for rejected in &parsed.rejected {
            if fresh.contains(&rejected.to_string()) {
                warn!(listing = listing.as_str(), %rejected, "skipping malformed record");
            } else {
                debug!(listing = listing.as_str(), %rejected, "skipping malformed record");
            }
        }
        parsed.records
    }
}

/// Rejections seen on the previous pass of each listing
///
/// The mixer is polled continuously, so a block that never parses would
/// otherwise be reported on every tick.
#[derive(Debug, Default)]
struct RejectionLog {
    seen: Mutex<HashMap<Listing, HashSet<String>>>,
}

impl RejectionLog {
    /// Record this pass and return the rejections absent from the last one
    fn fresh(&self, listing: Listing, rejected: &[ParseError]) -> HashSet<String> {
        let current: HashSet<String> = rejected.iter().map(ToString::to_string).collect();
        let mut seen = self.seen.lock();
        let previous = seen.insert(listing, current.clone()).unwrap_or_default();
        current.difference(&previous).cloned().collect()
    }
}

#[async_trait]
impl SnapshotSource for StatusAggregator {
    async fn snapshot(&self) -> Snapshot {
        let (outputs, sources, playback, recording) = tokio::join!(
            self.section(Listing::Sinks, parse_outputs),
            self.section(Listing::Sources, parse_sources),
            self.section(Listing::SinkInputs, parse_playback_streams),
            self.section(Listing::SourceOutputs, parse_recording_streams),
        );

        let mut apps = playback;
        apps.extend(recording);

        debug!(
            outputs = outputs.len(),
            sources = sources.len(),
            apps = apps.len(),
            "acquired snapshot"
        );

        Snapshot {
            outputs,
            sources,
            apps,
            build_info: self.build_info.clone(),
        }
    }

    fn build_info(&self) -> BuildInfo {
        self.build_info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn out_of_order(id: &str) -> ParseError {
        ParseError::OutOfOrder {
            record: "Sink Input",
            id: id.to_string(),
        }
    }

    #[test]
    fn test_repeated_rejection_is_not_fresh() {
        let log = RejectionLog::default();
        let rejected = vec![out_of_order("41")];

        assert_eq!(log.fresh(Listing::SinkInputs, &rejected).len(), 1);
        assert!(log.fresh(Listing::SinkInputs, &rejected).is_empty());
        assert!(log.fresh(Listing::SinkInputs, &rejected).is_empty());
    }

    #[test]
    fn test_new_rejection_is_fresh() {
        let log = RejectionLog::default();
        log.fresh(Listing::SinkInputs, &[out_of_order("41")]);

        let fresh = log.fresh(Listing::SinkInputs, &[out_of_order("41"), out_of_order("42")]);
        assert_eq!(fresh.len(), 1);
        assert!(fresh.contains(&out_of_order("42").to_string()));
    }

    #[test]
    fn test_cleared_rejection_is_fresh_again() {
        let log = RejectionLog::default();
        let rejected = [out_of_order("41")];

        log.fresh(Listing::SinkInputs, &rejected);
        assert!(log.fresh(Listing::SinkInputs, &[]).is_empty());
        assert_eq!(log.fresh(Listing::SinkInputs, &rejected).len(), 1);
    }

    #[test]
    fn test_listings_are_tracked_separately() {
        let log = RejectionLog::default();
        let rejected = [out_of_order("41")];

        log.fresh(Listing::SinkInputs, &rejected);
        assert_eq!(log.fresh(Listing::SourceOutputs, &rejected).len(), 1);
    }
}
