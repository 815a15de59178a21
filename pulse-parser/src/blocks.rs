//! Block splitting and field extraction shared by the record parsers.

use regex::Regex;

use crate::error::{ParseError, ParseResult};

/// One record's slice of a `pactl list` listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Block<'a> {
    /// Raw text after the `#` of the header line
    pub id: &'a str,
    /// Full block text, header line included
    pub body: &'a str,
}

/// Split `raw` at every match of `header`.
///
/// `header` must capture the id text in group 1. A block runs from its header
/// to the next header or the end of input; text before the first header is
/// discarded.
pub(crate) fn split_blocks<'a>(raw: &'a str, header: &Regex) -> Vec<Block<'a>> {
    let starts: Vec<(usize, &'a str)> = header
        .captures_iter(raw)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let id = caps.get(1)?;
            Some((whole.start(), id.as_str()))
        })
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, &(start, id))| {
            let end = starts.get(i + 1).map_or(raw.len(), |&(next, _)| next);
            Block {
                id,
                body: &raw[start..end],
            }
        })
        .collect()
}

/// First capture group of `pattern` in `body`, trimmed.
pub(crate) fn capture<'a>(body: &'a str, pattern: &Regex) -> Option<&'a str> {
    pattern
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// Like [`capture`] but a miss becomes [`ParseError::MissingField`].
pub(crate) fn require<'a>(
    block: &Block<'a>,
    record: &'static str,
    field: &'static str,
    pattern: &Regex,
) -> ParseResult<&'a str> {
    capture(block.body, pattern).ok_or_else(|| ParseError::MissingField {
        record,
        id: block.id.to_string(),
        field,
    })
}

/// Parse strictly decimal text into a `u32`.
///
/// Signs, whitespace, empty input and overflow are all rejected.
pub(crate) fn decimal(
    record: &'static str,
    id: &str,
    field: &'static str,
    value: &str,
) -> ParseResult<u32> {
    let invalid = || ParseError::InvalidNumber {
        record,
        id: id.to_string(),
        field,
        value: value.to_string(),
    };

    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    value.parse::<u32>().map_err(|_| invalid())
}

/// `yes` / `no` as printed by pactl for mute state.
pub(crate) fn yes_no(value: &str) -> bool {
    value == "yes"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Regex {
        Regex::new(r"(?m)^[ \t]*Item #(\S*)").unwrap()
    }

    #[test]
    fn test_split_blocks_keeps_order() {
        let raw = "preamble\nItem #4\n\ta: 1\nItem #2\n\ta: 2\n";
        let blocks = split_blocks(raw, &header());

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].id, "4");
        assert!(blocks[0].body.starts_with("Item #4"));
        assert!(blocks[0].body.contains("a: 1"));
        assert!(!blocks[0].body.contains("a: 2"));
        assert_eq!(blocks[1].id, "2");
        assert!(blocks[1].body.ends_with("a: 2\n"));
    }

    #[test]
    fn test_split_blocks_without_headers() {
        assert!(split_blocks("nothing to see", &header()).is_empty());
        assert!(split_blocks("", &header()).is_empty());
    }

    #[test]
    fn test_decimal_rejects_non_digits() {
        assert_eq!(decimal("Item", "1", "id", "42"), Ok(42));
        assert_eq!(decimal("Item", "1", "id", "0"), Ok(0));
        assert!(decimal("Item", "1", "id", "").is_err());
        assert!(decimal("Item", "1", "id", "+5").is_err());
        assert!(decimal("Item", "1", "id", "-5").is_err());
        assert!(decimal("Item", "1", "id", "4x").is_err());
        assert!(decimal("Item", "1", "id", "99999999999").is_err());
    }

    #[test]
    fn test_require_reports_field() {
        let raw = "Item #9\n\tName: thing\n";
        let blocks = split_blocks(raw, &header());
        let missing = Regex::new(r"(?m)^[ \t]*Mute: (yes|no)").unwrap();

        let err = require(&blocks[0], "Item", "Mute", &missing).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingField {
                record: "Item",
                id: "9".to_string(),
                field: "Mute",
            }
        );
    }
}
