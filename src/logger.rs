//! Debug logging support for EdX
//!
//! When debug mode is enabled via config or --debug, interpreter events
//! are logged to ~/.edx/edx.log through a non-blocking file writer.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

/// Initialize the debug logging system
///
/// If debug_enabled is true, sets up file logging and returns the log
/// path plus the writer guard the caller must keep alive. Returns None
/// when logging is not enabled.
pub fn init_debug_logging(debug_enabled: bool) -> Result<Option<(PathBuf, WorkerGuard)>> {
    if !debug_enabled {
        return Ok(None);
    }

    let log_path = get_log_path()?;

    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path);

    // If we can't open the log file, gracefully fall back to no logging
    // rather than breaking the editing session.
    match file {
        Ok(log_file) => {
            let (writer, guard) = tracing_appender::non_blocking(log_file);
            let subscriber = registry()
                .with(
                    fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(false)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false),
                )
                .with(EnvFilter::new("edx=debug"));

            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

            Ok(Some((log_path, guard)))
        }
        Err(e) => {
            eprintln!("Warning: Could not create log file: {}", e);
            Ok(None)
        }
    }
}

/// Get the log file path (~/.edx/edx.log)
fn get_log_path() -> Result<PathBuf> {
    let home_dir =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home_dir.join(".edx").join("edx.log"))
}
