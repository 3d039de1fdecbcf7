//! Logging utilities wrapping `tracing` initialisation
//!
//! Logs go to stderr so that scan results on stdout stay machine readable.

use crate::config::{LogRotation, LoggingOptions};
use crate::error::{Error, Result};
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::OnceLock;
use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlockingBuilder, WorkerGuard};
use tracing_appender::rolling;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

type LayeredEnvFilter = Layered<EnvFilter, Registry>;
type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Initialise the global tracing subscriber according to the provided logging options.
///
/// Subsequent calls are ignored.
pub fn init(options: &LoggingOptions) -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_new(options.level.as_str())
        .map_err(|e| Error::Config(format!("Invalid log level '{}': {e}", options.level)))?;

    Registry::default()
        .with(env_filter)
        .with(file_layer::<LayeredEnvFilter>(options)?)
        .with(stderr_layer(options.color))
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to install tracing subscriber: {e}")))
}

fn file_layer<S>(options: &LoggingOptions) -> Result<Option<BoxedLayer<S>>>
where
    S: Subscriber + for<'span> LookupSpan<'span> + Send + Sync + 'static,
{
    let Some(path) = options.file.as_deref() else {
        return Ok(None);
    };

    let dir = ensure_log_dir(path)?;
    let (writer, guard) = match options.rotation {
        Some(rotation) => {
            let file_name = path.file_name().ok_or_else(|| {
                Error::Config(format!(
                    "Log file path '{}' must include a filename when rotation is enabled",
                    path.display()
                ))
            })?;
            let appender = match rotation {
                LogRotation::Hourly => rolling::hourly(dir, file_name),
                LogRotation::Daily => rolling::daily(dir, file_name),
            };
            NonBlockingBuilder::default().lossy(false).finish(appender)
        }
        None => {
            let file = OpenOptions::new()
                .append(true)
                .create(true)
                .open(path)
                .map_err(|e| {
                    Error::Config(format!("Failed to open log file {}: {e}", path.display()))
                })?;
            NonBlockingBuilder::default().lossy(false).finish(file)
        }
    };

    // Dropping the guard would stop the background writer.
    let _ = FILE_GUARD.set(guard);

    Ok(Some(
        fmt::layer()
            .with_timer(UtcTime::rfc_3339())
            .with_ansi(false)
            .with_writer(writer)
            .with_target(true)
            .boxed(),
    ))
}

fn ensure_log_dir(path: &Path) -> Result<&Path> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| {
        Error::Config(format!(
            "Failed to create log directory {}: {e}",
            dir.display()
        ))
    })?;
    Ok(dir)
}

fn stderr_layer<S>(color: bool) -> BoxedLayer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span> + Send + Sync + 'static,
{
    fmt::layer()
        .with_timer(UtcTime::rfc_3339())
        .with_writer(io::stderr)
        .with_ansi(color)
        .with_target(true)
        .boxed()
}
