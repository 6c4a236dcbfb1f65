//! `Range` header parsing.

use serde::Serialize;

/// Inclusive byte span within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes in the span.
    pub fn content_length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` value for this span.
    pub fn content_range(&self, file_size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, file_size)
    }
}

/// Resolve a `bytes=<start>-<end>` header against a file.
///
/// Either bound may be omitted. Without a start the header asks for the
/// last bytes of the file; without an end it reads to the end of the file.
/// The span is measured as `end - start` and capped by `max_chunk_size`.
/// Returns `None` for a missing or malformed header, a start past the end
/// of the file, or a span of zero bytes.
///
/// Because the span is `end - start`, a single-byte request such as
/// `bytes=0-0` is a zero-byte span and yields `None` (416), and
/// `bytes=0-99` serves bytes 0 through 98.
pub fn parse_range(header: Option<&str>, file_size: u64, max_chunk_size: Option<u64>) -> Option<ByteRange> {
    let ranges = header?.trim().strip_prefix("bytes=")?;
    let first = ranges.split(',').next()?.trim();
    let (start_str, end_str) = first.split_once('-')?;
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    if start_str.is_empty() && end_str.is_empty() {
        return None;
    }

    let start = parse_bound(start_str)?;
    let end = parse_bound(end_str)?;

    if !start_str.is_empty() && start.unwrap_or(0) >= file_size {
        return None;
    }

    let start_value = start.unwrap_or(0);
    let end_value = end.unwrap_or(file_size);
    let cap = max_chunk_size.map_or(file_size, |c| c.min(file_size));
    let size = end_value.saturating_sub(start_value).min(cap);

    if size == 0 {
        return None;
    }

    match start {
        None => Some(ByteRange {
            start: file_size - size,
            end: file_size - 1,
        }),
        Some(start) => Some(ByteRange {
            start,
            end: (start + size - 1).min(file_size - 1),
        }),
    }
}

/// `Ok(None)` for an empty bound, `None` when it is not a number.
fn parse_bound(value: &str) -> Option<Option<u64>> {
    if value.is_empty() {
        return Some(None);
    }
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok().map(Some)
}
