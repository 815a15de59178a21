//! StatusAggregator against canned `pactl list` output

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use pactl_client::{CommandRunner, DeviceController, PactlError, PactlResult};
use parking_lot::Mutex;
use proptest::prelude::*;
use pulse_state::{BuildInfo, Snapshot, SnapshotSource, StatusAggregator, StreamTarget};

const SINKS: &str = "Sink #0
\tName: speakers
\tDescription: Speakers
\tMute: no
\tVolume: front-left: 26214 /  40% / -23.88 dB
Sink #1
\tName: headphones
\tDescription: Headphones
\tMute: yes
\tVolume: front-left: 65536 / 100% / 0.00 dB
Sink #2
\tName: broken
\tDescription: No mute line
\tVolume: front-left: 65536 / 100% / 0.00 dB
";

const SOURCES: &str = "Source #0
\tName: speakers.monitor
\tDescription: Monitor of Speakers
\tMute: no
\tVolume: mono: 100%
\tMonitor of Sink: speakers
";

const SINK_INPUTS: &str = "Sink Input #41
\tSink: 0
\tMute: no
\tVolume: front-left: 52429 /  80% / -5.81 dB
\tProperties:
\t\tapplication.name = \"Firefox\"
";

const SOURCE_OUTPUTS: &str = "Source Output #7
\tSource: 0
\tMute: no
\tVolume: mono: 65536 / 100% / 0.00 dB
\tProperties:
\t\tapplication.name = \"OBS\"
";

/// Serves canned listings keyed by the `list` argument
struct CannedRunner {
    listings: Mutex<HashMap<&'static str, Result<String, String>>>,
    calls: Mutex<usize>,
}

impl CannedRunner {
    fn healthy() -> Self {
        let mut listings = HashMap::new();
        listings.insert("sinks", Ok(SINKS.to_string()));
        listings.insert("sources", Ok(SOURCES.to_string()));
        listings.insert("sink-inputs", Ok(SINK_INPUTS.to_string()));
        listings.insert("source-outputs", Ok(SOURCE_OUTPUTS.to_string()));
        Self {
            listings: Mutex::new(listings),
            calls: Mutex::new(0),
        }
    }

    fn fail(&self, listing: &'static str) {
        self.listings
            .lock()
            .insert(listing, Err("Connection failure: Connection refused".to_string()));
    }

    fn set(&self, listing: &'static str, raw: &str) {
        self.listings.lock().insert(listing, Ok(raw.to_string()));
    }
}

#[async_trait]
impl CommandRunner for CannedRunner {
    async fn run(&self, args: &[String]) -> PactlResult<String> {
        *self.calls.lock() += 1;
        let key = args.get(1).map(String::as_str).unwrap_or_default();
        match self.listings.lock().get(key) {
            Some(Ok(raw)) => Ok(raw.clone()),
            Some(Err(stderr)) => Err(PactlError::CommandFailed {
                command: args.join(" "),
                status: "exit status: 1".to_string(),
                stderr: stderr.clone(),
            }),
            None => Ok(String::new()),
        }
    }
}

fn aggregator(runner: &Arc<CannedRunner>) -> StatusAggregator {
    StatusAggregator::new(DeviceController::new(runner.clone()))
        .with_build_info(BuildInfo::default())
}

#[tokio::test]
async fn test_full_snapshot() {
    let runner = Arc::new(CannedRunner::healthy());
    let snapshot = aggregator(&runner).snapshot().await;

    assert_eq!(*runner.calls.lock(), 4);

    // The block without a mute line is skipped, the rest keep their order.
    let names: Vec<&str> = snapshot.outputs.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["speakers", "headphones"]);

    assert_eq!(snapshot.sources.len(), 1);
    assert!(snapshot.sources[0].monitored);

    assert_eq!(snapshot.apps.len(), 2);
    assert_eq!(snapshot.apps[0].target, StreamTarget::Output { output_id: 0 });
    assert_eq!(snapshot.apps[1].target, StreamTarget::Source { source_id: 0 });
}

#[tokio::test]
async fn test_failed_section_is_left_empty() {
    let runner = Arc::new(CannedRunner::healthy());
    runner.fail("sinks");
    runner.fail("source-outputs");

    let snapshot = aggregator(&runner).snapshot().await;

    assert!(snapshot.outputs.is_empty());
    assert_eq!(snapshot.sources.len(), 1);
    assert_eq!(snapshot.apps.len(), 1);
    assert!(snapshot.apps[0].is_playback());
}

#[tokio::test]
async fn test_every_section_failing_still_yields_snapshot() {
    let runner = Arc::new(CannedRunner::healthy());
    for listing in ["sinks", "sources", "sink-inputs", "source-outputs"] {
        runner.fail(listing);
    }

    let snapshot = aggregator(&runner).snapshot().await;
    assert!(snapshot.is_empty());
    assert_eq!(snapshot.build_info, BuildInfo::default());
}

#[tokio::test]
async fn test_snapshots_are_fresh_and_comparable() {
    let runner = Arc::new(CannedRunner::healthy());
    let aggregator = aggregator(&runner);

    let first = aggregator.snapshot().await;
    let second = aggregator.snapshot().await;
    assert_eq!(first, second);
    assert_eq!(*runner.calls.lock(), 8);

    runner.set("sinks", &SINKS.replace(" 40%", " 41%"));
    let third = aggregator.snapshot().await;
    assert_ne!(first, third);
    assert_eq!(third.outputs[0].volume, 41);
}

#[tokio::test]
async fn test_build_info_is_attached() {
    let runner = Arc::new(CannedRunner::healthy());
    let info = BuildInfo {
        git_version: "1.2.3".to_string(),
        git_commit: "abc123".to_string(),
        build_date: "2024-01-01".to_string(),
        compiler: "rustc".to_string(),
        platform: "linux/x86_64".to_string(),
    };
    let aggregator = StatusAggregator::new(DeviceController::new(runner.clone()))
        .with_build_info(info.clone());

    assert_eq!(aggregator.build_info(), info);
    assert_eq!(aggregator.snapshot().await.build_info, info);
}

fn snapshot_strategy() -> impl Strategy<Value = Snapshot> {
    let output = (0u32..8, "[a-z]{1,8}", 0u32..=150, any::<bool>()).prop_map(
        |(id, name, volume, muted)| pulse_state::OutputDevice {
            id,
            label: name.to_uppercase(),
            name,
            volume,
            muted,
        },
    );
    prop::collection::vec(output, 0..4).prop_map(|outputs| Snapshot {
        outputs,
        ..Snapshot::default()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Equality is reflexive and symmetric.
    #[test]
    fn prop_snapshot_equality_laws(a in snapshot_strategy(), b in snapshot_strategy()) {
        prop_assert_eq!(&a, &a.clone());
        prop_assert_eq!(a == b, b == a);
    }

    /// Any single volume change makes two snapshots unequal.
    #[test]
    fn prop_single_field_change_detected(
        a in snapshot_strategy().prop_filter("needs an output", |s| !s.outputs.is_empty()),
        index in any::<prop::sample::Index>(),
    ) {
        let mut b = a.clone();
        let i = index.index(b.outputs.len());
        b.outputs[i].volume += 1;
        prop_assert_ne!(&a, &b);
    }
}
