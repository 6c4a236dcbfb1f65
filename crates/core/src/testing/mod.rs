//! Testing utilities and mock implementations.
//!
//! Mocks stand in for the download engine, the torrent sources and the
//! metadata service so the store, gateway and HTTP layer can be exercised
//! without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use torrentcast_core::testing::{fixtures, MockDownloadEngine, MockTorrentSource};
//!
//! let engine = Arc::new(MockDownloadEngine::new());
//! let source = MockTorrentSource::new("mock");
//! source.set_direct_results(vec![fixtures::candidate("abc", Language::Hu, "Movie.mkv")]).await;
//! ```

pub mod fixtures;
mod mock_engine;
mod mock_metadata;
mod mock_source;

pub use mock_engine::MockDownloadEngine;
pub use mock_metadata::MockMetadataLookup;
pub use mock_source::MockTorrentSource;
