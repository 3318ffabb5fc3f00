//! Debug logging support for excise
//!
//! Logging is off unless `[logging] debug = true` is set in the config or
//! `EXCISE_LOG` is present in the environment. Events are appended to
//! ~/.excise/excise.log so the console output stays exactly what the user
//! asked for.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

pub const LOG_ENV: &str = "EXCISE_LOG";
const LOG_FILE_NAME: &str = "excise.log";

/// Keeps the background writer alive; logs are flushed when this is dropped.
pub struct LogHandle {
    pub path: PathBuf,
    _guard: WorkerGuard,
}

pub fn logging_requested(debug_enabled: bool) -> bool {
    debug_enabled || std::env::var_os(LOG_ENV).is_some()
}

/// Filter used when `EXCISE_LOG` holds no valid directive
fn default_filter(debug_enabled: bool) -> &'static str {
    if debug_enabled { "excise=debug" } else { "excise=info" }
}

/// Install the global file subscriber writing into `log_dir`.
///
/// Returns None when logging was not requested, or when the subscriber could
/// not be installed; failing to log never stops an excision.
pub fn init_debug_logging(debug_enabled: bool, log_dir: &Path) -> Result<Option<LogHandle>> {
    if !logging_requested(debug_enabled) {
        return Ok(None);
    }

    let appender = match RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE_NAME)
        .build(log_dir)
    {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("Warning: Could not create log file: {}", e);
            return Ok(None);
        }
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter(debug_enabled)));

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
        .with(filter);

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: Could not start debug log: {}", e);
        return Ok(None);
    }

    Ok(Some(LogHandle {
        path: log_path(log_dir),
        _guard: guard,
    }))
}

pub fn log_path(log_dir: &Path) -> PathBuf {
    log_dir.join(LOG_FILE_NAME)
}
