//! Logging infrastructure for the pulse-remote server
//!
//! Logging is configured once at startup from a [`LoggingMode`] and the
//! environment. The filter is taken from the first of these that is set:
//!
//! - `PULSE_LOG_LEVEL`: any `EnvFilter` directive (`info`, `pulse_server=debug`, ...)
//! - `RUST_LOG`: same syntax
//! - `DEBUG`: legacy level name (`TRACE`, `DEBUG`, `INFO`, `WARN`, `ERR`) or
//!   number (`-1` trace through `3` error)
//! - the default level of the chosen mode

use std::str::FromStr;

use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Logging mode for different use cases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// No output
    Silent,
    /// Compact stderr output at `info`
    Development,
    /// Verbose output with source locations at `debug`
    Debug,
    /// One JSON object per line at `info`, for log collectors
    Json,
}

impl FromStr for LoggingMode {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "silent" => Ok(LoggingMode::Silent),
            "development" | "dev" => Ok(LoggingMode::Development),
            "debug" => Ok(LoggingMode::Debug),
            "json" => Ok(LoggingMode::Json),
            other => Err(LoggingError::InvalidMode(other.to_string())),
        }
    }
}

/// Logging configuration error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Invalid environment variable: {0}")]
    InvalidEnv(String),

    #[error("Unknown logging mode: {0}")]
    InvalidMode(String),
}

/// Initialize logging with the specified mode
///
/// Call once, early in `main`. A second call fails with
/// [`LoggingError::TracingInit`].
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Development => {
            let filter = create_env_filter("info")?;

            Registry::default()
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false)
                        .compact(),
                )
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
        LoggingMode::Debug => {
            let filter = create_env_filter("debug")?;

            Registry::default()
                .with(
                    fmt::layer()
                        .pretty()
                        .with_thread_ids(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
        LoggingMode::Json => {
            let filter = create_env_filter("info")?;

            Registry::default()
                .with(fmt::layer().json().with_current_span(false))
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
    }
}

fn create_env_filter(default_level: &str) -> Result<EnvFilter, LoggingError> {
    let directive = filter_directive(
        std::env::var("PULSE_LOG_LEVEL").ok(),
        std::env::var("RUST_LOG").ok(),
        std::env::var("DEBUG").ok(),
        default_level,
    )?;
    EnvFilter::try_new(&directive).map_err(|e| LoggingError::InvalidEnv(format!("{directive}: {e}")))
}

/// Pick the filter directive by precedence.
fn filter_directive(
    pulse_log_level: Option<String>,
    rust_log: Option<String>,
    legacy_debug: Option<String>,
    default_level: &str,
) -> Result<String, LoggingError> {
    if let Some(level) = pulse_log_level.filter(|v| !v.trim().is_empty()) {
        return Ok(level);
    }
    if let Some(rust_log) = rust_log.filter(|v| !v.trim().is_empty()) {
        return Ok(rust_log);
    }
    if let Some(debug) = legacy_debug.filter(|v| !v.trim().is_empty()) {
        return legacy_level(&debug)
            .map(str::to_string)
            .ok_or_else(|| LoggingError::InvalidEnv(format!("DEBUG={debug}")));
    }
    Ok(default_level.to_string())
}

/// Map the legacy `DEBUG` variable onto a level directive
fn legacy_level(value: &str) -> Option<&'static str> {
    match value.trim().to_ascii_uppercase().as_str() {
        "TRACE" | "-1" => Some("trace"),
        "DEBUG" | "0" => Some("debug"),
        "INFO" | "1" => Some("info"),
        "WARN" | "2" => Some("warn"),
        "ERR" | "ERROR" | "3" => Some("error"),
        _ => None,
    }
}
