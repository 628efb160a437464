//! Logging setup for the CLI using `tracing`.
//!
//! Log output always goes to stderr so `--json` output on stdout stays
//! machine-readable.
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: filter directives (e.g., `RUST_LOG=debuginfo_core=debug`); used when
//!   no `--log-level` flag is given
//! - `DEBUGINFO_LOG_FORMAT`: output format (`json` or `pretty`, default: `pretty`)

use std::env;
use std::io;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Default filter when neither a flag nor `RUST_LOG` is set.
const DEFAULT_FILTER: &str = "warn";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable output (default)
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {s}. Use 'pretty' or 'json'")),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!(
                "Unknown log level: {s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            )),
        }
    }
}

/// Resolve the format from an explicit flag, falling back to `DEBUGINFO_LOG_FORMAT`.
pub fn resolve_format(flag: Option<&str>) -> Result<LogFormat> {
    match flag {
        Some(value) => value.parse().map_err(|e: String| anyhow!(e)),
        None => match env::var("DEBUGINFO_LOG_FORMAT") {
            Ok(value) => value.parse().map_err(|e: String| anyhow!(e)),
            Err(_) => Ok(LogFormat::default()),
        },
    }
}

/// Build the filter: an explicit level wins over `RUST_LOG`.
pub fn build_filter(level: Option<LogLevel>) -> EnvFilter {
    match level {
        Some(level) => EnvFilter::new(Level::from(level).to_string().to_lowercase()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    }
}

/// Install the global subscriber.
///
/// Calling this twice (e.g., from tests) is not an error; the first
/// subscriber stays installed.
pub fn init_logging(level: Option<LogLevel>, format: LogFormat) -> Result<()> {
    let filter = build_filter(level);
    let layer: Box<dyn Layer<Registry> + Send + Sync> = match format {
        LogFormat::Pretty => fmt::layer().with_writer(io::stderr).with_target(true).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(io::stderr).with_current_span(false).boxed(),
    };

    if Registry::default().with(layer.with_filter(filter)).try_init().is_err() {
        tracing::debug!("logging already initialized");
    }
    Ok(())
}
