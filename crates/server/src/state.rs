use std::sync::Arc;
use torrentcast_core::{
    Config, PreferenceProvider, SanitizedConfig, SourceManager, StreamService, TorrentStore,
};

/// Shared application state
pub struct AppState {
    config: Config,
    streams: Arc<StreamService>,
    preferences: Arc<dyn PreferenceProvider>,
}

impl AppState {
    pub fn new(
        config: Config,
        streams: Arc<StreamService>,
        preferences: Arc<dyn PreferenceProvider>,
    ) -> Self {
        Self {
            config,
            streams,
            preferences,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn streams(&self) -> &StreamService {
        self.streams.as_ref()
    }

    pub fn sources(&self) -> &SourceManager {
        self.streams.sources()
    }

    pub fn store(&self) -> &TorrentStore {
        self.streams.store()
    }

    pub fn preferences(&self) -> &dyn PreferenceProvider {
        self.preferences.as_ref()
    }
}
