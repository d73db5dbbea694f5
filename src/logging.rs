//! Tracing setup.
//!
//! The terminal belongs to the UI, so logs never go to stdout. On Linux the
//! journal is used when reachable; otherwise a daily log file under the local
//! data directory. The filter comes from `GALLERYPIX_LOG` (default `info`).

use anyhow::Result;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_ENV: &str = "GALLERYPIX_LOG";

static GUARD: OnceLock<WorkerGuard> = OnceLock::new();

pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gallerypix")
        .join("logs")
}

pub fn init(log_dir: Option<PathBuf>) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    #[cfg(target_os = "linux")]
    {
        if let Ok(journald) = tracing_journald::layer() {
            tracing_subscriber::registry().with(filter).with(journald).init();
            tracing::info!(backend = "journald", "Logging initialized");
            return Ok(());
        }
    }

    let log_dir = log_dir.unwrap_or_else(default_log_dir);
    std::fs::create_dir_all(&log_dir)?;

    let appender = tracing_appender::rolling::daily(&log_dir, "gallerypix.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    // Flushes on drop; must outlive the subscriber.
    let _ = GUARD.set(guard);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();

    tracing::info!(backend = "file", dir = ?log_dir, "Logging initialized");
    Ok(())
}
