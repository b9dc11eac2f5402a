//! Logging setup (tracing-subscriber + optional rolling file)

use anyhow::Result;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;

const DEFAULT_FILTER: &str = "jqlite=info,tower_http=info";
const LOG_FILE_PREFIX: &str = "jqlite-gateway.log";

/// Initialize the global subscriber
///
/// Returns the file writer guard when `log_dir` is set; keep it alive for the
/// lifetime of the process or buffered lines are lost.
pub fn init(format: LogFormat, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))?;

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    match format {
        LogFormat::Json => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer)
                .with(fmt::layer().json())
                .try_init()?;
        }
        LogFormat::Pretty => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer)
                .with(fmt::layer().pretty())
                .try_init()?;
        }
    }

    Ok(guard)
}
