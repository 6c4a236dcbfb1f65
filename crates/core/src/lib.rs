pub mod cache;
pub mod config;
pub mod descriptor;
pub mod metadata;
pub mod selection;
pub mod source;
pub mod store;
pub mod streaming;
pub mod testing;
pub mod units;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, LogFormat,
    SanitizedConfig,
};
pub use descriptor::{DescriptorResolver, ParsedDescriptor, ResolveError, TorrentFile};
pub use metadata::{CinemetaClient, MetadataError, MetadataLookup};
pub use selection::{
    FileClassifier, Language, PreferenceProvider, ReleaseNameClassifier, Resolution,
    StaticPreferences, UserPreference,
};
pub use source::{
    ConfigIssue, MediaQuery, MediaType, NcoreSource, SourceError, SourceManager,
    TorrentCandidate, TorrentSource,
};
pub use store::{
    CleanupScheduler, DownloadEngine, LibrqbitEngine, ManagedTorrent, StoreError, TorrentStats,
    TorrentStore,
};
pub use streaming::{StreamEntry, StreamError, StreamService};
