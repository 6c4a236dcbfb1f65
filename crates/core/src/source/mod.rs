//! Torrent source gateway.
//!
//! A [`TorrentSource`] is one external index. The [`SourceManager`] fans
//! queries out to every configured source, applies the speculative title
//! fallback and the episode filter, and caches the results per query.

mod batch;
mod manager;
pub mod ncore;
mod types;

pub use batch::{process_in_batches, settle_all};
pub use manager::SourceManager;
pub use ncore::NcoreSource;
pub use types::*;
