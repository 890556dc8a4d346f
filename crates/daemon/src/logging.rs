//! Tracing setup
//!
//! Console (pretty or JSON), a daily rolling file under `LOG_DIR`, and the
//! in-memory buffer behind `/logs`. `RUST_LOG` overrides the default filter.

use crate::config::LogFormat;
use anyhow::{Context, Result};
use paygate_api_http::{LogBuffer, LogBufferLayer};
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Targets match by prefix, so `paygate` covers every workspace crate
const DEFAULT_FILTER: &str = "paygate=info,tower_http=info";
const LOG_FILE_PREFIX: &str = "paygate.log";

/// Install the global subscriber
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// life of the process.
pub fn init(format: &LogFormat, log_dir: &str, buffer: Arc<LogBuffer>) -> Result<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .context("Failed to create env filter")?;

    let log_dir = shellexpand::tilde(log_dir).into_owned();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir))?;
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX));

    let console: Box<dyn Layer<Registry> + Send + Sync> = match format {
        // Production: JSON structured logging
        LogFormat::Json => fmt::layer().json().boxed(),
        // Development: Pretty formatting with colors
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .with(LogBufferLayer::new(buffer))
        .with(env_filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
