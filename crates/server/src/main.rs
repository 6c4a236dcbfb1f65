use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use torrentcast_core::config::LoggingConfig;
use torrentcast_core::store::parse_schedule;
use torrentcast_core::{
    load_config, validate_config, CinemetaClient, CleanupScheduler, DescriptorResolver,
    FileClassifier, LibrqbitEngine, LogFormat, NcoreSource, ReleaseNameClassifier,
    SourceManager, StaticPreferences, StreamService, TorrentSource, TorrentStore,
};
use torrentcast_server::{api::create_router, state::AppState};

/// Environment variable naming the config file
const CONFIG_PATH_ENV: &str = "TORRENTCAST_CONFIG";

/// Filter used when neither `RUST_LOG` nor `logging.filter` is set
const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        tracing::error!("Fatal error: {:#}", e);
        eprintln!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        logging
            .filter
            .as_deref()
            .unwrap_or(DEFAULT_LOG_FILTER)
            .into()
    });
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn run() -> Result<()> {
    // Determine config path
    let config_path = std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    init_tracing(&config.logging);
    info!(path = ?config_path, "Configuration loaded");
    info!(
        torrents_dir = ?config.storage.torrents_dir,
        downloads_dir = ?config.storage.downloads_dir,
        "Storage locations"
    );

    let resolver = Arc::new(
        DescriptorResolver::new(&config.resolver, config.storage.torrents_dir.clone())
            .context("Failed to create torrent resolver")?,
    );

    // Torrent sources
    let mut sources: Vec<Arc<dyn TorrentSource>> = Vec::new();
    match config.sources.ncore.as_ref().filter(|n| n.enabled) {
        Some(ncore) => {
            info!(url = %ncore.url, "Initializing nCore source");
            let source = NcoreSource::new(ncore.clone(), Arc::clone(&resolver))
                .context("Failed to create nCore source")?;
            sources.push(Arc::new(source));
        }
        None => warn!("No torrent sources configured, stream listings will be empty"),
    }

    let metadata = Arc::new(
        CinemetaClient::new(&config.metadata).context("Failed to create metadata client")?,
    );
    let classifier: Arc<dyn FileClassifier> = Arc::new(ReleaseNameClassifier::new());
    let source_manager = Arc::new(SourceManager::new(
        sources,
        metadata,
        Arc::clone(&classifier),
        &config.gateway,
    ));

    // Download engine and store
    let engine = LibrqbitEngine::new(&config.engine, &config.storage.downloads_dir)
        .await
        .context("Failed to start download engine")?;
    let store = TorrentStore::new(
        Arc::new(engine),
        config.storage.torrents_dir.clone(),
        config.storage.downloads_dir.clone(),
    );
    let loaded = store
        .load_existing_torrents()
        .await
        .context("Failed to load existing torrents")?;
    info!(engine = %store.engine_name(), loaded, "Torrent store ready");

    // Cleanup scheduler
    let scheduler = if config.cleanup.enabled {
        let schedule =
            parse_schedule(&config.cleanup.schedule).context("Invalid cleanup schedule")?;
        let scheduler =
            CleanupScheduler::new(store.clone(), Arc::clone(&source_manager), schedule);
        scheduler.start();
        info!(schedule = %config.cleanup.schedule, "Cleanup scheduler started");
        Some(scheduler)
    } else {
        info!("Cleanup scheduler disabled in config");
        None
    };

    let streams = Arc::new(StreamService::new(
        source_manager,
        store,
        resolver,
        classifier,
        &config.streaming,
        &config.server.public_url,
    ));

    let preferences = StaticPreferences::new(config.preferences.clone());
    if preferences.is_empty() {
        warn!("No requester preferences configured, every stream request will be rejected");
    }

    let state = Arc::new(AppState::new(
        config.clone(),
        streams,
        Arc::new(preferences),
    ));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!(%addr, public_url = %config.server.public_url, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    if let Some(scheduler) = scheduler {
        scheduler.stop();
        info!("Cleanup scheduler stopped");
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
