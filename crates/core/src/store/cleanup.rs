//! Cron-driven removal of torrents whose seeding obligation is met.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use cron::Schedule;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::registry::TorrentStore;
use crate::source::SourceManager;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid cleanup schedule '{expression}': {message}")]
pub struct InvalidSchedule {
    pub expression: String,
    pub message: String,
}

/// Parse a cron expression. Five-field expressions run at second zero.
pub fn parse_schedule(expression: &str) -> Result<Schedule, InvalidSchedule> {
    let trimmed = expression.trim();
    let normalized = if trimmed.split_whitespace().count() == 5 {
        format!("0 {}", trimmed)
    } else {
        trimmed.to_string()
    };

    Schedule::from_str(&normalized).map_err(|e| InvalidSchedule {
        expression: expression.to_string(),
        message: e.to_string(),
    })
}

/// Runs [`TorrentStore::delete_unnecessary_torrents`] on every schedule tick.
pub struct CleanupScheduler {
    store: TorrentStore,
    sources: Arc<SourceManager>,
    schedule: Schedule,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl CleanupScheduler {
    pub fn new(store: TorrentStore, sources: Arc<SourceManager>, schedule: Schedule) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            store,
            sources,
            schedule,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Cleanup scheduler already running");
            return;
        }

        let store = self.store.clone();
        let sources = Arc::clone(&self.sources);
        let schedule = self.schedule.clone();
        let running = Arc::clone(&self.running);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            loop {
                let Some(next) = schedule.upcoming(Utc).next() else {
                    warn!("Cleanup schedule has no upcoming runs, stopping");
                    running.store(false, Ordering::SeqCst);
                    break;
                };
                let delay = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
                debug!(next_run = %next, "Cleanup scheduled");

                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("Cleanup scheduler received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(delay) => {
                        if !running.load(Ordering::SeqCst) {
                            break;
                        }
                        let report = store.delete_unnecessary_torrents(&sources).await;
                        if report.failed > 0 {
                            warn!(failed = report.failed, "Some torrents could not be cleaned up");
                        }
                    }
                }
            }
        });

        info!("Cleanup scheduler started");
    }

    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Cleanup scheduler not running");
            return;
        }

        let _ = self.shutdown_tx.send(());
        info!("Cleanup scheduler stopped");
    }
}
