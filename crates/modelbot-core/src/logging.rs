//! File logging. The terminal belongs to the UI, so diagnostics go to a
//! daily-rolling file instead of stderr.

use std::fs::create_dir_all;
use std::path::Path;

use anyhow::Result;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "MODELBOT_LOG";
pub const LOG_FILE_PREFIX: &str = "modelbot.log";

/// Build a subscriber writing to `log_dir`. Keep the guard alive for as long
/// as events should reach the file.
pub fn file_subscriber(
    log_dir: &Path,
) -> Result<(impl Subscriber + Send + Sync + 'static, WorkerGuard)> {
    create_dir_all(log_dir)?;

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .finish();

    Ok((subscriber, guard))
}

/// Install the file subscriber globally.
pub fn init(log_dir: &Path) -> Result<WorkerGuard> {
    let (subscriber, guard) = file_subscriber(log_dir)?;
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(guard)
}

/// Concatenated contents of every log file in `log_dir`.
#[cfg(test)]
pub(crate) fn read_logs(log_dir: &Path) -> String {
    std::fs::read_dir(log_dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .starts_with(LOG_FILE_PREFIX)
        })
        .map(|entry| std::fs::read_to_string(entry.path()).unwrap())
        .collect()
}
