//! Logging system initialization
//!
//! Sets up tracing-based logging with file output to
//! %APPDATA%\instutils\instutils.log. Each session starts a fresh file; the
//! previous sessions are kept as instutils.log.1 (newest) through
//! instutils.log.5 (oldest).

use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::ConfigManager;
use crate::error::{Result, StringError, UtilsError};

/// Number of previous sessions kept next to the current log
const KEPT_SESSIONS: u8 = 5;

/// Initialize the logging system
///
/// Log level defaults to INFO and can be changed through `RUST_LOG`.
pub fn init_logging() -> Result<()> {
    let log_dir = ConfigManager::app_dir();
    std::fs::create_dir_all(&log_dir)?;

    rotate_logs(&log_dir.join("instutils.log"), KEPT_SESSIONS)?;

    // Rotation is done above, once per session
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix("instutils")
        .filename_suffix("log")
        .build(&log_dir)
        .map_err(|e| UtilsError::ConfigError(Box::new(e)))?;

    let subscriber = fmt()
        .with_writer(file_appender)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| UtilsError::ConfigError(Box::new(e)))?;

    tracing::info!("instutils v{} logging started", env!("CARGO_PKG_VERSION"));
    Ok(())
}

/// Shift `log_path` into the numbered history, dropping sessions beyond `keep`
///
/// `name.log.{keep}` is deleted, every `name.log.{n}` becomes `name.log.{n+1}`
/// and `name.log` becomes `name.log.1`. Gaps in the history are preserved.
fn rotate_logs(log_path: &Path, keep: u8) -> Result<()> {
    if !log_path.exists() {
        return Ok(());
    }

    let (Some(dir), Some(name)) = (log_path.parent(), log_path.file_name()) else {
        return Err(UtilsError::ConfigError(StringError::new(format!(
            "Invalid log path: {}",
            log_path.display()
        ))));
    };
    let name = name.to_string_lossy();
    let numbered = |n: u8| dir.join(format!("{name}.{n}"));

    let oldest = numbered(keep);
    if oldest.exists() {
        std::fs::remove_file(&oldest)?;
    }
    for n in (1..keep).rev() {
        let current = numbered(n);
        if current.exists() {
            std::fs::rename(&current, numbered(n + 1))?;
        }
    }
    std::fs::rename(log_path, numbered(1))?;

    Ok(())
}
