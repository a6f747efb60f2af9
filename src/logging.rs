use crate::error::{AppError, Result};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_FILE: &str = "ytmux.log";

fn env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose {
        "ytmux=debug,yt_dlp=debug"
    } else {
        "ytmux=info"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into())
}

/// Logs to stderr and, without ANSI colors, to `<log_dir>/ytmux.log`.
///
/// The returned guard flushes the file writer when dropped and must be
/// kept alive for the whole run.
pub fn init_tracing(log_dir: &Path, verbose: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(env_filter(verbose)),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(env_filter(verbose)),
        )
        .try_init()
        .map_err(|e| AppError::Custom(format!("failed to initialize logging: {}", e)))?;

    Ok(guard)
}

/// Shared owner of the file writer's guard.
///
/// `std::process::exit` skips destructors, so whichever path ends the
/// process calls [`LogFlush::flush`] first. Later calls do nothing, and
/// events logged after the flush only reach stderr.
#[derive(Clone)]
pub struct LogFlush(Arc<Mutex<Option<WorkerGuard>>>);

impl LogFlush {
    pub fn new(guard: WorkerGuard) -> Self {
        Self(Arc::new(Mutex::new(Some(guard))))
    }

    /// Drains buffered file output and closes the writer.
    pub fn flush(&self) {
        let guard = match self.0.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        drop(guard);
    }
}
