//! Application stream parsing (`pactl list sink-inputs|source-outputs`)
//!
//! Each stream block is matched against one compound pattern that requires
//! the owning device, mute state, volume and application name in that order.
//! The pattern is applied per block so fields can never be borrowed from a
//! neighbouring record.

use std::sync::LazyLock;

use regex::Regex;

use crate::blocks::{decimal, split_blocks, yes_no, Block};
use crate::error::{ParseError, ParseResult};
use crate::records::{ApplicationStream, Parsed, StreamTarget};

const SINK_INPUT: &str = "Sink Input";
const SOURCE_OUTPUT: &str = "Source Output";

static SINK_INPUT_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*Sink Input #(\S*)").expect("static regex"));
static SOURCE_OUTPUT_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*Source Output #(\S*)").expect("static regex"));

static PLAYBACK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)Sink: (\d+).*?Mute: (yes|no).*?Volume:[^\n]*?(\d+)%.*?application\.name = "([^"]*)""#,
    )
    .expect("static regex")
});
static RECORDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)Source: (\d+).*?Mute: (yes|no).*?Volume:[^\n]*?(\d+)%.*?application\.name = "([^"]*)""#,
    )
    .expect("static regex")
});

// Individual field probes, only used to explain why the compound pattern failed.
static SINK_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Sink: (\d+)").expect("static regex"));
static SOURCE_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Source: (\d+)").expect("static regex"));
static MUTE_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Mute: (yes|no)").expect("static regex"));
static VOLUME_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Volume:[^\n]*?(\d+)%").expect("static regex"));
static APPLICATION_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"application\.name = "([^"]*)""#).expect("static regex"));

/// Which listing a stream block came from.
struct StreamShape {
    record: &'static str,
    compound: &'static LazyLock<Regex>,
    target_field: &'static str,
    target_probe: &'static LazyLock<Regex>,
    target: fn(u32) -> StreamTarget,
}

static PLAYBACK_SHAPE: StreamShape = StreamShape {
    record: SINK_INPUT,
    compound: &PLAYBACK,
    target_field: "Sink",
    target_probe: &SINK_FIELD,
    target: output_target,
};

static RECORDING_SHAPE: StreamShape = StreamShape {
    record: SOURCE_OUTPUT,
    compound: &RECORDING,
    target_field: "Source",
    target_probe: &SOURCE_FIELD,
    target: source_target,
};

fn output_target(output_id: u32) -> StreamTarget {
    StreamTarget::Output { output_id }
}

fn source_target(source_id: u32) -> StreamTarget {
    StreamTarget::Source { source_id }
}

impl StreamShape {
    fn parse(&self, block: &Block<'_>) -> ParseResult<ApplicationStream> {
        let id = decimal(self.record, block.id, "id", block.id)?;

        let Some(caps) = self.compound.captures(block.body) else {
            return Err(self.diagnose(block));
        };
        // All four groups are mandatory in the pattern.
        let group = |i: usize| caps.get(i).map_or("", |m| m.as_str());

        let device = decimal(self.record, block.id, self.target_field, group(1))?;
        let muted = yes_no(group(2));
        let volume = decimal(self.record, block.id, "Volume", group(3))?;

        Ok(ApplicationStream {
            id,
            target: (self.target)(device),
            label: group(4).to_string(),
            volume,
            muted,
        })
    }

    /// Name the first required field that is absent, or report that the
    /// fields exist but not in the expected order.
    fn diagnose(&self, block: &Block<'_>) -> ParseError {
        let probes: [(&'static str, &Regex); 4] = [
            (self.target_field, &**self.target_probe),
            ("Mute", &*MUTE_FIELD),
            ("Volume", &*VOLUME_FIELD),
            ("application.name", &*APPLICATION_FIELD),
        ];

        probes
            .into_iter()
            .find(|(_, probe)| !probe.is_match(block.body))
            .map(|(field, _)| ParseError::MissingField {
                record: self.record,
                id: block.id.to_string(),
                field,
            })
            .unwrap_or_else(|| ParseError::OutOfOrder {
                record: self.record,
                id: block.id.to_string(),
            })
    }

    fn parse_all(&self, raw: &str, header: &Regex) -> Parsed<ApplicationStream> {
        let mut parsed = Parsed::default();
        for block in split_blocks(raw, header) {
            match self.parse(&block) {
                Ok(stream) => parsed.records.push(stream),
                Err(err) => parsed.rejected.push(err),
            }
        }
        parsed
    }
}

/// Parse the output of `pactl list sink-inputs` into playback streams.
pub fn parse_playback_streams(raw: &str) -> Parsed<ApplicationStream> {
    PLAYBACK_SHAPE.parse_all(raw, &SINK_INPUT_HEADER)
}

/// Parse the output of `pactl list source-outputs` into recording streams.
pub fn parse_recording_streams(raw: &str) -> Parsed<ApplicationStream> {
    RECORDING_SHAPE.parse_all(raw, &SOURCE_OUTPUT_HEADER)
}
