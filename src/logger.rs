//! Logging setup for repren
//!
//! Diagnostics (overlap warnings, per-file modify/rename lines) go to stderr
//! through `tracing`. The level comes from the config file or `-q`/`-v`, and
//! `REPREN_LOG` overrides both with a full filter directive. A log file can
//! be added on top; it receives the same events without colors.

use anyhow::{Context, Result};
use std::fs;
use std::io::IsTerminal;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*, registry};

/// Environment variable holding a filter directive, e.g. `repren=debug`
pub const LOG_ENV: &str = "REPREN_LOG";

/// Pick the effective level from the configured one and the `-q`/`-v` switches
pub fn resolve_level(configured: &str, quiet: bool, verbose: bool) -> &str {
    if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        configured
    }
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(format!("repren={}", level)))
}

/// Initialize the global subscriber
///
/// Returns the guard of the background file writer; it must be held until
/// exit or buffered lines are lost. A log file that cannot be opened is
/// reported and skipped.
pub fn init_logging(level: &str, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none())
        .with_target(false)
        .without_time();

    let mut guard = None;
    let file_layer = match log_file.map(open_log_file).transpose() {
        Ok(Some(file)) => {
            let (writer, worker_guard) = tracing_appender::non_blocking(file);
            guard = Some(worker_guard);
            Some(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
        }
        Ok(None) => None,
        Err(e) => {
            // Logging must never break a run
            eprintln!("Warning: Could not create log file: {:#}", e);
            None
        }
    };

    registry()
        .with(build_filter(level))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    Ok(guard)
}

fn open_log_file(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))
}
