//! HTTP Range header parsing
//!
//! Parses `Range: bytes=...` headers into resolved byte ranges, RFC 7233
//! semantics: open-ended (`a-`) and suffix (`-n`) forms, multiple ranges,
//! end positions clamped to the file size. Anything malformed or not
//! satisfiable against the file is answered with 416 by the caller.

/// One resolved byte range (inclusive bounds, already clamped)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered (bounds are inclusive)
    #[must_use]
    pub fn content_length(self) -> u64 {
        self.end - self.start + 1
    }
}

/// Range header parse result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeParseResult {
    /// One or more satisfiable ranges, in header order
    Valid(Vec<ByteRange>),
    /// Malformed or out of bounds - respond 416
    NotSatisfiable,
    /// No Range header, or a unit other than bytes (ignored)
    None,
}

/// Parse an HTTP Range header against a file of `file_size` bytes
///
/// Supported forms, also comma-combined: `bytes=a-b`, `bytes=a-`,
/// `bytes=-n`.
///
/// # Examples
/// ```
/// use polyhost::http::range::{parse_range_header, ByteRange, RangeParseResult};
///
/// let result = parse_range_header(Some("bytes=-200"), 1000);
/// assert_eq!(
///     result,
///     RangeParseResult::Valid(vec![ByteRange { start: 800, end: 999 }])
/// );
/// ```
pub fn parse_range_header(header: Option<&str>, file_size: u64) -> RangeParseResult {
    let Some(header) = header else {
        return RangeParseResult::None;
    };

    let Some(range_set) = header.strip_prefix("bytes=") else {
        return RangeParseResult::None; // not a bytes unit, ignore
    };

    if file_size == 0 {
        return RangeParseResult::NotSatisfiable;
    }

    let mut ranges = Vec::new();
    for part in range_set.split(',') {
        match parse_single_range(part.trim(), file_size) {
            Some(range) => ranges.push(range),
            None => return RangeParseResult::NotSatisfiable,
        }
    }

    if ranges.is_empty() {
        return RangeParseResult::NotSatisfiable;
    }
    RangeParseResult::Valid(ranges)
}

fn parse_single_range(part: &str, file_size: u64) -> Option<ByteRange> {
    let (start_str, end_str) = part.split_once('-')?;
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    // Suffix range: "-n" means the last n bytes
    if start_str.is_empty() {
        let suffix: u64 = end_str.parse().ok()?;
        if suffix == 0 {
            return None;
        }
        return Some(ByteRange {
            start: file_size.saturating_sub(suffix),
            end: file_size - 1,
        });
    }

    let start: u64 = start_str.parse().ok()?;
    if start >= file_size {
        return None;
    }

    let end = if end_str.is_empty() {
        file_size - 1
    } else {
        let end: u64 = end_str.parse().ok()?;
        if end < start {
            return None;
        }
        end.min(file_size - 1)
    };

    Some(ByteRange { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_header() {
        assert_eq!(parse_range_header(None, 1000), RangeParseResult::None);
    }

    #[test]
    fn other_units_are_ignored() {
        assert_eq!(
            parse_range_header(Some("items=0-9"), 1000),
            RangeParseResult::None
        );
    }

    #[test]
    fn fixed_range() {
        assert_eq!(
            parse_range_header(Some("bytes=0-99"), 1000),
            RangeParseResult::Valid(vec![ByteRange { start: 0, end: 99 }])
        );
    }

    #[test]
    fn open_ended_range() {
        assert_eq!(
            parse_range_header(Some("bytes=500-"), 1000),
            RangeParseResult::Valid(vec![ByteRange {
                start: 500,
                end: 999
            }])
        );
    }

    #[test]
    fn suffix_range() {
        assert_eq!(
            parse_range_header(Some("bytes=-200"), 1000),
            RangeParseResult::Valid(vec![ByteRange {
                start: 800,
                end: 999
            }])
        );
    }

    #[test]
    fn oversized_suffix_covers_the_whole_file() {
        assert_eq!(
            parse_range_header(Some("bytes=-5000"), 1000),
            RangeParseResult::Valid(vec![ByteRange { start: 0, end: 999 }])
        );
    }

    #[test]
    fn end_is_clamped_to_file_size() {
        assert_eq!(
            parse_range_header(Some("bytes=500-1200"), 1000),
            RangeParseResult::Valid(vec![ByteRange {
                start: 500,
                end: 999
            }])
        );
    }

    #[test]
    fn inverted_range_is_not_satisfiable() {
        assert_eq!(
            parse_range_header(Some("bytes=600-500"), 1000),
            RangeParseResult::NotSatisfiable
        );
    }

    #[test]
    fn start_beyond_file_is_not_satisfiable() {
        assert_eq!(
            parse_range_header(Some("bytes=1000-"), 1000),
            RangeParseResult::NotSatisfiable
        );
    }

    #[test]
    fn zero_suffix_is_not_satisfiable() {
        assert_eq!(
            parse_range_header(Some("bytes=-0"), 1000),
            RangeParseResult::NotSatisfiable
        );
    }

    #[test]
    fn malformed_values_are_not_satisfiable() {
        assert_eq!(
            parse_range_header(Some("bytes=a-b"), 1000),
            RangeParseResult::NotSatisfiable
        );
        assert_eq!(
            parse_range_header(Some("bytes="), 1000),
            RangeParseResult::NotSatisfiable
        );
    }

    #[test]
    fn multiple_ranges() {
        assert_eq!(
            parse_range_header(Some("bytes=0-99, 200-299, -100"), 1000),
            RangeParseResult::Valid(vec![
                ByteRange { start: 0, end: 99 },
                ByteRange {
                    start: 200,
                    end: 299
                },
                ByteRange {
                    start: 900,
                    end: 999
                },
            ])
        );
    }

    #[test]
    fn one_bad_range_spoils_the_set() {
        assert_eq!(
            parse_range_header(Some("bytes=0-99, 600-500"), 1000),
            RangeParseResult::NotSatisfiable
        );
    }

    #[test]
    fn range_length() {
        assert_eq!(ByteRange { start: 800, end: 999 }.content_length(), 200);
        assert_eq!(ByteRange { start: 0, end: 0 }.content_length(), 1);
    }
}
