//! Torrent descriptor fetching and parsing.
//!
//! Turns a `.torrent` URL into an info hash plus a flat file list, and can
//! persist the raw descriptor under the configured torrents directory.

mod parser;
mod resolver;
mod types;

pub use parser::parse_descriptor;
pub use resolver::DescriptorResolver;
pub use types::*;
