//! Streaming proxy: stream listings, byte ranges and file bodies.

mod body;
mod range;
mod service;

pub use body::reader_stream;
pub use range::{parse_range, ByteRange};
pub use service::{PlayableFile, StreamEntry, StreamError, StreamService};
