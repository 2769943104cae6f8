use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured log level
pub const LOG_ENV_VAR: &str = "GOALPOST_LOG";

const LOG_FILE_NAME: &str = "goalpost.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to open log file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid log filter '{0}'")]
    Filter(String),
    #[error("Failed to install subscriber: {0}")]
    Init(String),
}

/// Build the filter from `GOALPOST_LOG`, falling back to the configured level
pub fn build_filter(configured: &str) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_env(LOG_ENV_VAR) {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(configured).map_err(|_| LoggingError::Filter(configured.to_string())),
    }
}

/// Send tracing output to a file in `dir`. Writing to the terminal would
/// corrupt the TUI's alternate screen.
pub fn init(dir: &Path, configured_level: &str) -> Result<PathBuf, LoggingError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(build_filter(configured_level)?)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(path)
}
