//! Logging infrastructure for subburn.
//!
//! This module provides:
//! - Per-export loggers with file + callback dual output
//! - Compact mode with progress filtering
//! - Tail buffer for encoder diagnostics
//! - Integration with the `tracing` ecosystem
//!
//! # Example
//!
//! ```no_run
//! use subburn_core::logging::{JobLogger, LogConfig};
//!
//! let logger = JobLogger::new("clip", "/path/to/logs", LogConfig::default(), None).unwrap();
//!
//! logger.phase("Rendering video frames");
//! logger.progress(50);
//! logger.success("Export complete");
//! ```

mod job_logger;
mod types;

use std::path::Path;

pub use job_logger::{JobLogger, JobLoggerBuilder};
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingSettings;

/// Name of the application-wide log file inside the logs folder.
pub const APP_LOG_FILE: &str = "subburn.log";

/// Initialize global tracing subscriber for application-wide logging.
///
/// `RUST_LOG` overrides `default_level`. Output goes to stderr. Calling this
/// more than once is a no-op.
pub fn init_tracing(default_level: LogLevel) {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(env_filter(default_level))
        .try_init();
}

/// Like [`init_tracing`], additionally appending to `<log_dir>/subburn.log`.
///
/// Keep the returned guard alive for the life of the program; dropping it
/// flushes the file writer.
pub fn init_tracing_with_file(
    default_level: LogLevel,
    log_dir: impl AsRef<Path>,
) -> std::io::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir.as_ref())?;
    let appender = tracing_appender::rolling::never(log_dir.as_ref(), APP_LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .with(env_filter(default_level))
        .try_init();

    Ok(guard)
}

fn env_filter(default_level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level.as_filter()))
}

impl From<&LoggingSettings> for LogConfig {
    fn from(settings: &LoggingSettings) -> Self {
        Self {
            level: settings.level,
            compact: settings.compact,
            progress_step: settings.progress_step.max(1),
            error_tail: settings.error_tail,
            show_timestamps: settings.show_timestamps,
        }
    }
}
