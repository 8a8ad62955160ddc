//! File-backed tracing setup. The terminal belongs to the UI, so logs never go to stdout/stderr.

use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

pub const LOG_FILTER_ENV_VAR: &str = "MAIL_CHAT_LOG";
pub const LOG_FILE_ENV_VAR: &str = "MAIL_CHAT_LOG_FILE";
pub const DEFAULT_LOG_FILTER: &str = "warn";
pub const DEFAULT_LOG_FILE_NAME: &str = "mail_chat.log";

/// Log file path from `MAIL_CHAT_LOG_FILE`, defaulting to the system temp directory.
pub fn log_file_path(from_env: Option<String>) -> PathBuf {
    from_env
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_LOG_FILE_NAME))
}

/// Installs the global subscriber and returns the file it appends to.
pub fn init() -> anyhow::Result<PathBuf> {
    let path = log_file_path(std::env::var(LOG_FILE_ENV_VAR).ok());
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(file)
        .with_ansi(false)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to install tracing subscriber: {error}"))?;

    Ok(path)
}
