//! Output device and capture source parsing (`pactl list sinks|sources`)

use std::sync::LazyLock;

use regex::Regex;

use crate::blocks::{capture, decimal, require, split_blocks, yes_no, Block};
use crate::error::ParseResult;
use crate::records::{CaptureSource, OutputDevice, Parsed};

const SINK: &str = "Sink";
const SOURCE: &str = "Source";

static SINK_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*Sink #(\S*)").expect("static regex"));
static SOURCE_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*Source #(\S*)").expect("static regex"));

static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*Name: (.+)$").expect("static regex"));
static DESCRIPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*Description: (.+)$").expect("static regex"));
static MUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*Mute: (yes|no)\b").expect("static regex"));
// `Base Volume:` lines never match because of the anchor.
static VOLUME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*Volume: .*?(\d+)%").expect("static regex"));
static MONITOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*Monitor of Sink: (.+)$").expect("static regex"));

/// Fields shared by sinks and sources.
struct DeviceFields {
    id: u32,
    name: String,
    label: String,
    volume: u32,
    muted: bool,
}

fn device_fields(block: &Block<'_>, record: &'static str) -> ParseResult<DeviceFields> {
    let id = decimal(record, block.id, "id", block.id)?;
    let name = require(block, record, "Name", &NAME)?;
    let label = require(block, record, "Description", &DESCRIPTION)?;
    let muted = yes_no(require(block, record, "Mute", &MUTE)?);
    let volume = decimal(
        record,
        block.id,
        "Volume",
        require(block, record, "Volume", &VOLUME)?,
    )?;

    Ok(DeviceFields {
        id,
        name: name.to_string(),
        label: label.to_string(),
        volume,
        muted,
    })
}

impl OutputDevice {
    /// Parse a single `Sink #<id>` block.
    ///
    /// The text must start with the header line; anything after the first
    /// block is ignored.
    pub fn from_block(text: &str) -> ParseResult<Self> {
        let block = first_block(text, &SINK_HEADER, SINK)?;
        Self::from_parsed_block(&block)
    }

    fn from_parsed_block(block: &Block<'_>) -> ParseResult<Self> {
        let fields = device_fields(block, SINK)?;
        Ok(Self {
            id: fields.id,
            name: fields.name,
            label: fields.label,
            volume: fields.volume,
            muted: fields.muted,
        })
    }
}

impl CaptureSource {
    /// Parse a single `Source #<id>` block.
    pub fn from_block(text: &str) -> ParseResult<Self> {
        let block = first_block(text, &SOURCE_HEADER, SOURCE)?;
        Self::from_parsed_block(&block)
    }

    fn from_parsed_block(block: &Block<'_>) -> ParseResult<Self> {
        let fields = device_fields(block, SOURCE)?;
        let monitor = capture(block.body, &MONITOR)
            .filter(|target| *target != "n/a" && !target.is_empty())
            .map(str::to_string);

        Ok(Self {
            id: fields.id,
            name: fields.name,
            label: fields.label,
            volume: fields.volume,
            muted: fields.muted,
            monitored: monitor.is_some(),
            monitor,
        })
    }
}

fn first_block<'a>(text: &'a str, header: &Regex, record: &'static str) -> ParseResult<Block<'a>> {
    split_blocks(text, header)
        .into_iter()
        .next()
        .ok_or_else(|| crate::ParseError::MissingField {
            record,
            id: String::new(),
            field: "header",
        })
}

fn collect<'a, T>(
    blocks: Vec<Block<'a>>,
    parse: impl Fn(&Block<'a>) -> ParseResult<T>,
) -> Parsed<T> {
    let mut parsed = Parsed::default();
    for block in &blocks {
        match parse(block) {
            Ok(record) => parsed.records.push(record),
            Err(err) => parsed.rejected.push(err),
        }
    }
    parsed
}

/// Parse the output of `pactl list sinks`.
///
/// Records keep the order of the listing. Malformed blocks are skipped and
/// reported in [`Parsed::rejected`].
pub fn parse_outputs(raw: &str) -> Parsed<OutputDevice> {
    collect(split_blocks(raw, &SINK_HEADER), OutputDevice::from_parsed_block)
}

/// Parse the output of `pactl list sources`.
pub fn parse_sources(raw: &str) -> Parsed<CaptureSource> {
    collect(split_blocks(raw, &SOURCE_HEADER), CaptureSource::from_parsed_block)
}
