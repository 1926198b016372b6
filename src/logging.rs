//! Structured logging setup.
//!
//! Logs go to a file so they never scribble over the TUI.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("failed to open log file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to install log subscriber: {0}")]
    Subscriber(String),
}

/// Directory that holds `precis.log`
pub fn log_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("precis")
}

/// Initialize logging to `<state dir>/precis/precis.log`.
///
/// `RUST_LOG` takes precedence over `verbose`. Returns the log file path.
pub fn init(verbose: bool) -> Result<PathBuf, LoggingError> {
    let dir = log_dir();
    fs::create_dir_all(&dir)?;
    let log_file_path = dir.join("precis.log");

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    let default_filter = if verbose { "info,precis=debug" } else { "warn,precis=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| LoggingError::Subscriber(e.to_string()))?;

    tracing::debug!("logging initialized at {}", log_file_path.display());
    Ok(log_file_path)
}
