use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::selection::UserPreference;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub streaming: StreamingConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    /// Ranking preferences keyed by requester name.
    #[serde(default)]
    pub preferences: HashMap<String, UserPreference>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Base URL clients use to reach this server; prefixes play links.
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: default_public_url(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    3000
}

fn default_public_url() -> String {
    "http://localhost:3000".to_string()
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// On-disk locations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Saved `.torrent` descriptors.
    #[serde(default = "default_torrents_dir")]
    pub torrents_dir: PathBuf,
    /// Downloaded content, one entry per torrent.
    #[serde(default = "default_downloads_dir")]
    pub downloads_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            torrents_dir: default_torrents_dir(),
            downloads_dir: default_downloads_dir(),
        }
    }
}

fn default_torrents_dir() -> PathBuf {
    PathBuf::from("data/torrents")
}

fn default_downloads_dir() -> PathBuf {
    PathBuf::from("data/downloads")
}

/// Embedded download engine
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Peer discovery through the DHT (default: off).
    #[serde(default)]
    pub enable_dht: bool,
    /// TCP port for incoming peers; random when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_port: Option<u16>,
}

/// Streaming proxy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamingConfig {
    /// Upper bound for one range response in bytes; unbounded when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chunk_size: Option<u64>,
    /// How long a finished playback preparation is shared (default: 5).
    #[serde(default = "default_grace_secs")]
    pub playback_grace_secs: u64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: None,
            playback_grace_secs: default_grace_secs(),
        }
    }
}

/// Descriptor resolution
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_resolver_cache_entries")]
    pub cache_max_entries: usize,
    /// How long a finished fetch is shared with late callers.
    #[serde(default = "default_grace_secs")]
    pub inflight_grace_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            cache_ttl_secs: default_cache_ttl(),
            cache_max_entries: default_resolver_cache_entries(),
            inflight_grace_secs: default_grace_secs(),
        }
    }
}

fn default_timeout() -> u64 {
    5
}

fn default_cache_ttl() -> u64 {
    900
}

fn default_resolver_cache_entries() -> usize {
    1000
}

fn default_grace_secs() -> u64 {
    5
}

/// Title lookup used by the speculative search fallback
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetadataConfig {
    #[serde(default = "default_cinemeta_url")]
    pub cinemeta_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            cinemeta_url: default_cinemeta_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_cinemeta_url() -> String {
    "https://v3-cinemeta.strem.io".to_string()
}

/// Source fan-out
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    #[serde(default = "default_cache_ttl")]
    pub query_cache_ttl_secs: u64,
    #[serde(default = "default_query_cache_entries")]
    pub query_cache_max_entries: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            query_cache_ttl_secs: default_cache_ttl(),
            query_cache_max_entries: default_query_cache_entries(),
        }
    }
}

fn default_query_cache_entries() -> usize {
    500
}

/// Scheduled removal of torrents whose seeding obligation is met
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CleanupConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Cron expression, five or six fields (default: "0 2 * * *").
    #[serde(default = "default_schedule")]
    pub schedule: String,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            schedule: default_schedule(),
        }
    }
}

fn default_schedule() -> String {
    "0 2 * * *".to_string()
}

/// Configured torrent sources
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SourcesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ncore: Option<NcoreConfig>,
}

/// nCore tracker credentials and tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NcoreConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_ncore_url")]
    pub url: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Descriptors resolved concurrently per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Pause between batches.
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
}

impl NcoreConfig {
    pub fn new(url: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            enabled: true,
            url: url.into(),
            username: username.into(),
            password: password.into(),
            timeout_secs: default_timeout(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_ncore_url() -> String {
    "https://ncore.pro".to_string()
}

fn default_batch_size() -> usize {
    15
}

fn default_batch_delay_ms() -> u64 {
    200
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub engine: EngineConfig,
    pub streaming: StreamingConfig,
    pub resolver: ResolverConfig,
    pub metadata: MetadataConfig,
    pub gateway: GatewayConfig,
    pub cleanup: CleanupConfig,
    pub sources: SanitizedSourcesConfig,
    /// Requester names only.
    pub requesters: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSourcesConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ncore: Option<SanitizedNcoreConfig>,
}

/// Sanitized nCore config (credentials hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedNcoreConfig {
    pub enabled: bool,
    pub url: String,
    pub username_configured: bool,
    pub password_configured: bool,
    pub timeout_secs: u64,
    pub batch_size: usize,
    pub batch_delay_ms: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let mut requesters: Vec<String> = config.preferences.keys().cloned().collect();
        requesters.sort();

        Self {
            server: config.server.clone(),
            logging: config.logging.clone(),
            storage: config.storage.clone(),
            engine: config.engine.clone(),
            streaming: config.streaming.clone(),
            resolver: config.resolver.clone(),
            metadata: config.metadata.clone(),
            gateway: config.gateway.clone(),
            cleanup: config.cleanup.clone(),
            sources: SanitizedSourcesConfig {
                ncore: config.sources.ncore.as_ref().map(|n| SanitizedNcoreConfig {
                    enabled: n.enabled,
                    url: n.url.clone(),
                    username_configured: !n.username.is_empty(),
                    password_configured: !n.password.is_empty(),
                    timeout_secs: n.timeout_secs,
                    batch_size: n.batch_size,
                    batch_delay_ms: n.batch_delay_ms,
                }),
            },
            requesters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{Language, Resolution};

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.resolver.timeout_secs, 5);
        assert_eq!(config.resolver.cache_ttl_secs, 900);
        assert_eq!(config.gateway.query_cache_max_entries, 500);
        assert_eq!(config.cleanup.schedule, "0 2 * * *");
        assert!(!config.cleanup.enabled);
        assert!(!config.engine.enable_dht);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.sources.ncore.is_none());
    }

    #[test]
    fn test_deserialize_ncore_with_defaults() {
        let toml = r#"
[sources.ncore]
username = "user"
password = "secret"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let ncore = config.sources.ncore.unwrap();
        assert!(ncore.enabled);
        assert_eq!(ncore.url, "https://ncore.pro");
        assert_eq!(ncore.batch_size, 15);
        assert_eq!(ncore.batch_delay_ms, 200);
        assert_eq!(ncore.timeout_secs, 5);
    }

    #[test]
    fn test_deserialize_ncore_requires_credentials() {
        let toml = r#"
[sources.ncore]
username = "user"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_deserialize_preferences() {
        let toml = r#"
[preferences.alice]
language = "hu"
resolutions = ["1080P", "720P"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let alice = &config.preferences["alice"];
        assert_eq!(alice.language, Language::Hu);
        assert_eq!(alice.resolutions, vec![Resolution::R1080P, Resolution::R720P]);
    }

    #[test]
    fn test_sanitized_config_hides_credentials() {
        let mut config = Config::default();
        config.sources.ncore = Some(NcoreConfig::new("https://ncore.pro", "user", "hunter2"));
        config.preferences.insert(
            "bob".to_string(),
            UserPreference {
                language: Language::En,
                resolutions: vec![],
            },
        );

        let sanitized = SanitizedConfig::from(&config);
        let json = serde_json::to_string(&sanitized).unwrap();

        assert!(!json.contains("hunter2"));
        assert!(json.contains("\"password_configured\":true"));
        assert_eq!(sanitized.requesters, vec!["bob"]);
    }
}
