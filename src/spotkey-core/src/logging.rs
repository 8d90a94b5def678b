//! Log setup: a daily-rotating file in the platform log directory, with an
//! optional stdout tee for interactive debugging.

use crate::config::LoggingConfig;
use crate::paths::AppDirs;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_STEM: &str = "spotkey.log";

/// Keeps the non-blocking log writer alive; dropping it flushes and stops
/// the background writer thread.
#[must_use]
pub struct LoggingGuard {
    _worker: WorkerGuard,
}

/// Install the global tracing subscriber.
///
/// Log lines always go to a daily-rotated file under the app's log
/// directory; `stdout = true` additionally mirrors them to the terminal.
/// Rotated files beyond `max_log_files` are pruned at startup, oldest
/// first.
pub fn init_logging(config: &LoggingConfig, dirs: &AppDirs) -> Result<LoggingGuard, LoggingError> {
    let log_dir = dirs.log_dir();
    fs::create_dir_all(log_dir).map_err(|source| LoggingError::Prepare {
        path: log_dir.to_path_buf(),
        source,
    })?;

    let stem = config.file_name.as_deref().unwrap_or(DEFAULT_LOG_STEM);
    prune_rotated_logs(log_dir, stem, config.max_log_files.max(1))?;

    let (file_writer, worker) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(log_dir, stem));
    let writer = if config.stdout {
        BoxMakeWriter::new(file_writer.and(std::io::stdout))
    } else {
        BoxMakeWriter::new(file_writer)
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.level.as_directive()))
        .with_target(false)
        .with_ansi(config.stdout)
        .with_writer(writer)
        .try_init()
        .map_err(LoggingError::Install)?;

    Ok(LoggingGuard { _worker: worker })
}

/// Delete the oldest rotated log files so at most `keep` remain.
///
/// The daily appender suffixes files with an ISO date, so lexicographic
/// file-name order is chronological order.
fn prune_rotated_logs(dir: &Path, stem: &str, keep: usize) -> Result<(), LoggingError> {
    let entries = fs::read_dir(dir).map_err(|source| LoggingError::Prepare {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut logs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().starts_with(stem))
                .unwrap_or(false)
        })
        .collect();
    if logs.len() <= keep {
        return Ok(());
    }

    logs.sort();
    let excess = logs.len() - keep;
    for path in logs.into_iter().take(excess) {
        fs::remove_file(&path).map_err(|source| LoggingError::Prune { path, source })?;
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to prepare log directory {path}: {source}")]
    Prepare {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to prune old log file {path}: {source}")]
    Prune {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to install tracing subscriber: {0}")]
    Install(Box<dyn std::error::Error + Send + Sync>),
}
