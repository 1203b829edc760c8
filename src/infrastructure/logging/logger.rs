use anyhow::Result;
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::domain::models::LoggingConfig;

/// Prefix shared by the active log file and its dated rotations.
const LOG_FILE_PREFIX: &str = "vigil.log";

/// Installed logging pipeline.
///
/// Keep the returned instance alive for the life of the process: dropping it
/// flushes and closes the background file writer.
pub struct Logger {
    _guard: Option<WorkerGuard>,
}

impl Logger {
    /// Initialize the global subscriber from configuration.
    ///
    /// Logs go to stderr in the configured format; when a log directory is
    /// set, a daily-rolling JSON file is written as well and files older
    /// than the retention window are removed.
    pub fn init(config: &LoggingConfig) -> Result<Self> {
        let default_level = parse_log_level(&config.level)?;

        // EnvFilter is not Clone; build one per layer from the same source.
        let filter = || {
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy()
        };

        let guard = if let Some(ref dir) = config.dir {
            let file_appender = rolling::daily(dir, LOG_FILE_PREFIX);
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

            // File output is always JSON for downstream tooling.
            let file_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking_file)
                .with_ansi(false)
                .with_current_span(true)
                .with_target(true)
                .with_filter(filter());

            match config.format.as_str() {
                "pretty" => {
                    let stderr_layer = tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(io::stderr)
                        .with_target(true)
                        .with_filter(filter());
                    tracing_subscriber::registry().with(file_layer).with(stderr_layer).init();
                }
                _ => {
                    let stderr_layer = tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(io::stderr)
                        .with_current_span(true)
                        .with_target(true)
                        .with_filter(filter());
                    tracing_subscriber::registry().with(file_layer).with(stderr_layer).init();
                }
            }

            prune_old_logs(dir, config.retention_days);
            Some(guard)
        } else {
            match config.format.as_str() {
                "pretty" => {
                    let stderr_layer = tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(io::stderr)
                        .with_target(true)
                        .with_filter(filter());
                    tracing_subscriber::registry().with(stderr_layer).init();
                }
                _ => {
                    let stderr_layer = tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(io::stderr)
                        .with_current_span(true)
                        .with_target(true)
                        .with_filter(filter());
                    tracing_subscriber::registry().with(stderr_layer).init();
                }
            }
            None
        };

        Ok(Self { _guard: guard })
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => anyhow::bail!("Unknown log level: {other}"),
    }
}

/// Remove rotated log files older than the retention window.
/// `retention_days` of 0 keeps files indefinitely. Best effort.
fn prune_old_logs(dir: &Path, retention_days: u32) {
    if retention_days == 0 {
        return;
    }
    let Some(cutoff) =
        SystemTime::now().checked_sub(Duration::from_secs(u64::from(retention_days) * 86_400))
    else {
        return;
    };
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX));
        if !is_log {
            continue;
        }

        let modified = entry.metadata().and_then(|m| m.modified());
        if let Ok(modified) = modified {
            if modified < cutoff {
                if let Err(err) = std::fs::remove_file(&path) {
                    warn!(path = %path.display(), error = %err, "failed to prune old log file");
                }
            }
        }
    }
}
