//! Tracing setup: stderr at the `-v` level, plus an append-only log file
//! for commands that touch devices.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::CliError;

pub const LOG_FILE_NAME: &str = "ncsync.log";

const CRATES: &[&str] = &["ncsync", "ncsync_core", "ncsync_transport", "ncsync_config"];

/// Path of the log file inside `dir`.
pub fn log_file(dir: &Path) -> PathBuf {
    dir.join(LOG_FILE_NAME)
}

/// Install the global subscriber. Keep the returned guard alive until exit
/// so buffered file output is flushed.
pub fn init(verbosity: u8, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>, CliError> {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let stderr = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)));

    let (file, guard) = match log_dir {
        Some(dir) => {
            let (layer, guard) = file_layer(dir, verbosity)?;
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // A subscriber may already be installed (tests); that is not an error.
    let _ = tracing_subscriber::registry()
        .with(file)
        .with(stderr)
        .try_init();

    Ok(guard)
}

type FileLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

fn file_layer(dir: &Path, verbosity: u8) -> Result<(FileLayer, WorkerGuard), CliError> {
    let log_error = |reason: String| CliError::LogFile {
        dir: dir.display().to_string(),
        reason,
    };

    std::fs::create_dir_all(dir).map_err(|e| log_error(e.to_string()))?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE_NAME)
        .build(dir)
        .map_err(|e| log_error(e.to_string()))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    // The file always records at least info for our own crates.
    let level = if verbosity >= 2 { "debug" } else { "info" };
    let directives = CRATES
        .iter()
        .map(|c| format!("{c}={level}"))
        .fold(String::from("warn"), |acc, d| format!("{acc},{d}"));

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_filter(EnvFilter::new(directives))
        .boxed();

    Ok((layer, guard))
}
