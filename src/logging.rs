//! Tracing subscriber setup.
//!
//! Composer events (submits, delivery outcomes, auto-resets, rejected
//! attachments) go to stdout and, when a log file is configured, are
//! appended to it as plain text. `RUST_LOG` directives are honoured on
//! top of the configured level.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::{ComposerError, Result};

/// Map a configured level name to a [`Level`]; unknown names mean `info`.
fn level_named(name: &str) -> Level {
    match name.trim().to_ascii_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::from_default_env().add_directive(level_named(level).into())
}

/// Open `path` for appending, creating missing parent directories.
fn open_log_file(path: &Path) -> Result<fs::File> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Log to stdout and append to `config.file`.
///
/// Fails if the file cannot be opened or a global subscriber is already
/// installed; callers fall back to [`init_console_only`].
pub fn init(config: &LoggingConfig) -> Result<()> {
    let file = open_log_file(Path::new(&config.file))?;
    let writer = std::io::stdout.and(Arc::new(file));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .with(env_filter(&config.level))
        .try_init()
        .map_err(|e| ComposerError::Config(format!("failed to install log subscriber: {e}")))
}

/// Log to stdout only. A no-op if a subscriber is already installed.
pub fn init_console_only(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(env_filter(level))
        .try_init();
}
