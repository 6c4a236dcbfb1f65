//! Torrent store: the download engine, the registry of managed torrents,
//! and scheduled cleanup.

mod cleanup;
mod librqbit;
mod registry;
mod types;

pub use cleanup::{parse_schedule, CleanupScheduler, InvalidSchedule};
pub use self::librqbit::LibrqbitEngine;
pub use registry::TorrentStore;
pub use types::*;
