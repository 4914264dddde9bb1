//! Logging init: append to a file under the XDG state dir, or fall back to stderr.
//!
//! Attempt outcomes, retry scheduling and gate refusals are logged at debug
//! level by the `execute` and `retry` modules; everything else stays at info.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str =
    "info,ctxreq_core::execute=debug,ctxreq_core::retry=debug,ctxreq_core::request=debug,ctxreq=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// `$XDG_STATE_HOME/ctxreq/ctxreq.log`, creating the directory if needed.
pub fn log_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ctxreq")?;
    xdg_dirs
        .place_state_file("ctxreq.log")
        .context("create log directory")
}

/// Install a subscriber that appends to [`log_path`]. Returns the log file
/// path. On failure the caller can fall back to [`init_logging_stderr`].
pub fn init_logging() -> Result<PathBuf> {
    let path = log_path()?;
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install subscriber: {}", e))?;

    tracing::info!("ctxreq logging to {}", path.display());
    Ok(path)
}

/// Log to stderr only. Never fails; a second init is ignored.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
