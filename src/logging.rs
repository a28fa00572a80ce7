//! Logging setup
//!
//! Events go to two places: a human-readable stream on stderr whose level
//! follows the `-v`/`-q` flags, and an append-only run log file without ANSI
//! colors. [`init`] is called once at process start; the returned
//! [`LogGuard`] must live until exit so the file is flushed.

use crate::HarvestError;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Keeps the run log open and syncs it to disk when dropped
#[must_use = "dropping the guard closes the run log"]
#[derive(Debug)]
pub struct LogGuard {
    file: File,
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        let _ = self.file.sync_all();
    }
}

/// Filter directives for the console, by verbosity
pub fn console_directives(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "doc_harvest=info,warn",
        1 => "doc_harvest=debug,info",
        2 => "doc_harvest=trace,debug",
        _ => "trace",
    }
}

/// Filter directives for the run log file
///
/// The file always keeps informational events, even when the console is quiet.
pub fn file_directives(verbose: u8) -> &'static str {
    if verbose > 0 {
        "doc_harvest=debug,info"
    } else {
        "doc_harvest=info,warn"
    }
}

/// Installs the global subscriber
///
/// `RUST_LOG`, when set, replaces the console directives.
///
/// # Errors
///
/// Fails if the log file cannot be opened or a subscriber is already set.
pub fn init(log_path: &Path, verbose: u8, quiet: bool) -> Result<LogGuard, HarvestError> {
    let file = OpenOptions::new().create(true).append(true).open(log_path)?;
    let writer = Mutex::new(file.try_clone()?);

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console_directives(verbose, quiet)));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_filter(console_filter);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .with_filter(EnvFilter::new(file_directives(verbose)));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| HarvestError::Logging(e.to_string()))?;

    Ok(LogGuard { file })
}
