use super::{types::Config, ConfigError};
use crate::store::parse_schedule;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Public URL is an http(s) URL
/// - Cache sizes and nCore batch size are positive
/// - Torrents and downloads live in different directories
/// - Enabled nCore has a URL and credentials
/// - Cleanup schedule parses when cleanup is enabled
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let public_url = &config.server.public_url;
    if !public_url.starts_with("http://") && !public_url.starts_with("https://") {
        return Err(ConfigError::ValidationError(format!(
            "server.public_url must start with http:// or https://, got '{}'",
            public_url
        )));
    }

    if config.resolver.cache_max_entries == 0 {
        return Err(ConfigError::ValidationError(
            "resolver.cache_max_entries must be at least 1".to_string(),
        ));
    }

    if config.gateway.query_cache_max_entries == 0 {
        return Err(ConfigError::ValidationError(
            "gateway.query_cache_max_entries must be at least 1".to_string(),
        ));
    }

    if config.streaming.max_chunk_size == Some(0) {
        return Err(ConfigError::ValidationError(
            "streaming.max_chunk_size cannot be 0".to_string(),
        ));
    }

    if config.storage.torrents_dir == config.storage.downloads_dir {
        return Err(ConfigError::ValidationError(
            "storage.torrents_dir and storage.downloads_dir must differ".to_string(),
        ));
    }

    if let Some(ncore) = config.sources.ncore.as_ref().filter(|n| n.enabled) {
        if ncore.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "sources.ncore.url cannot be empty".to_string(),
            ));
        }
        if ncore.username.is_empty() || ncore.password.is_empty() {
            return Err(ConfigError::ValidationError(
                "sources.ncore requires username and password".to_string(),
            ));
        }
        if ncore.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "sources.ncore.batch_size must be at least 1".to_string(),
            ));
        }
    }

    if config.cleanup.enabled {
        parse_schedule(&config.cleanup.schedule)
            .map_err(|e| ConfigError::ValidationError(format!("cleanup.schedule: {}", e)))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NcoreConfig, ServerConfig};

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                port: 0,
                ..ServerConfig::default()
            },
            ..Config::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_public_url_scheme() {
        let mut config = Config::default();
        config.server.public_url = "localhost:3000".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_ncore_credentials() {
        let mut config = Config::default();
        config.sources.ncore = Some(NcoreConfig::new("https://ncore.pro", "user", ""));
        assert!(validate_config(&config).is_err());

        config.sources.ncore = Some(NcoreConfig::new("https://ncore.pro", "user", "pass"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_ncore_url_required() {
        let mut config = Config::default();
        config.sources.ncore = Some(NcoreConfig::new("  ", "user", "pass"));
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_storage_dirs_differ() {
        let mut config = Config::default();
        config.storage.downloads_dir = config.storage.torrents_dir.clone();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("storage"));
    }

    #[test]
    fn test_validate_disabled_ncore_skips_credentials() {
        let mut config = Config::default();
        let mut ncore = NcoreConfig::new("https://ncore.pro", "", "");
        ncore.enabled = false;
        config.sources.ncore = Some(ncore);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_cleanup_schedule() {
        let mut config = Config::default();
        config.cleanup.schedule = "whenever".to_string();
        assert!(validate_config(&config).is_ok());

        config.cleanup.enabled = true;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("cleanup.schedule"));
    }
}
