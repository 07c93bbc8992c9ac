//! Tracing setup.
//!
//! Normal runs log to stderr at `info`. In debug mode everything at `debug`
//! and above is appended to `cover-scout.log` in the log directory, which
//! is where the per-rule search diagnostics end up.
//!
//! `RUST_LOG` overrides the default filter in both modes.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::{self, LoggingConfig};

pub const LOG_FILE_NAME: &str = "cover-scout.log";

/// Keeps the log file open; flushes it when dropped.
#[derive(Debug, Default)]
pub struct LogGuard {
    file: Option<Arc<File>>,
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            let _ = file.as_ref().flush();
        }
    }
}

fn default_directive(debug_mode: bool) -> &'static str {
    if debug_mode {
        "cover_scout=debug"
    } else {
        "cover_scout=info"
    }
}

/// Where the debug log goes, if a directory can be determined.
pub fn log_file_path(config: &LoggingConfig) -> Option<PathBuf> {
    config
        .log_dir
        .clone()
        .or_else(config::config_dir)
        .map(|dir| dir.join(LOG_FILE_NAME))
}

/// Open the log for appending. A new file starts with a line describing
/// the environment.
fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let is_new = !path.exists();
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if is_new {
        writeln!(
            file,
            "cover-scout {} on {}/{}",
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            std::env::consts::ARCH
        )?;
    }
    Ok(file)
}

/// Install the global subscriber.
///
/// Falls back to stderr when the debug log cannot be opened. Calling this
/// twice keeps the first subscriber.
pub fn init(config: &LoggingConfig) -> LogGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config.debug_mode)));

    let file = if config.debug_mode {
        match log_file_path(config).map(|path| open_log_file(&path).map(|f| (path, f))) {
            Some(Ok((path, file))) => Some((path, Arc::new(file))),
            Some(Err(e)) => {
                eprintln!("Could not open debug log, logging to stderr: {}", e);
                None
            }
            None => None,
        }
    } else {
        None
    };

    let result = match &file {
        Some((_, file)) => tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_ansi(false).with_writer(file.clone()))
            .with(filter)
            .try_init(),
        None => tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(io::stderr))
            .with(filter)
            .try_init(),
    };

    if let Err(e) = result {
        tracing::debug!("Logging already initialized: {}", e);
    }

    match file {
        Some((path, file)) => {
            tracing::info!("Debug log at {:?}", path);
            LogGuard { file: Some(file) }
        }
        None => LogGuard::default(),
    }
}
