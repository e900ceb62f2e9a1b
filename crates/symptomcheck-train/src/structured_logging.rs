//! Subscriber setup for the `tracing` events emitted by this crate.
//!
//! Library code only emits events (`tracing::info!` at phase boundaries,
//! `debug!` per fold and per fitted model, `warn!` on non-convergence and
//! failed candidates). Binaries install a subscriber once at startup:
//!
//! ```toml
//! [dependencies]
//! symptomcheck-train = { version = "0.1", features = ["structured-logging"] }
//! ```
//!
//! ```no_run
//! use symptomcheck_train::structured_logging::{LogFormat, LogLevel, TracingLogger};
//!
//! let _logger = TracingLogger::builder()
//!     .with_format(LogFormat::Compact)
//!     .with_level(LogLevel::Info)
//!     .build()
//!     .expect("logger already installed");
//!
//! tracing::info!(rows = 4920, "Dataset loaded");
//! ```

use crate::{TrainError, TrainResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, colored output for development.
    Pretty,
    /// One line per event, no colors.
    #[default]
    Compact,
    /// Newline-delimited JSON.
    Json,
}

/// Log level filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show all logs.
    Trace,
    /// Per-fold and per-model detail.
    Debug,
    /// Phase boundaries.
    Info,
    /// Only non-convergence, failed candidates and errors.
    #[default]
    Warn,
    /// Show only errors.
    Error,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = TrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(TrainError::InvalidParameter(format!(
                "unknown log level '{}'",
                other
            ))),
        }
    }
}

/// Configuration builder for structured logging.
#[derive(Debug, Clone)]
pub struct TracingLoggerBuilder {
    format: LogFormat,
    level: LogLevel,
    env_filter: Option<String>,
    with_targets: bool,
    with_file_location: bool,
    with_span_events: bool,
}

impl Default for TracingLoggerBuilder {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::default(),
            env_filter: None,
            with_targets: true,
            with_file_location: false,
            with_span_events: false,
        }
    }
}

impl TracingLoggerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the log level filter.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set a directive filter such as `"symptomcheck_train=debug"`; overrides the level.
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Include target names (module paths).
    pub fn with_targets(mut self, enabled: bool) -> Self {
        self.with_targets = enabled;
        self
    }

    /// Include file:line.
    pub fn with_file_location(mut self, enabled: bool) -> Self {
        self.with_file_location = enabled;
        self
    }

    /// Emit span open/close events.
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.with_span_events = enabled;
        self
    }

    fn filter(&self) -> TrainResult<EnvFilter> {
        match &self.env_filter {
            Some(directives) => EnvFilter::try_new(directives).map_err(|e| {
                TrainError::InvalidParameter(format!("Invalid log filter: {}", e))
            }),
            None => Ok(EnvFilter::new(self.level.as_str())),
        }
    }

    /// Install the global subscriber.
    ///
    /// Fails if a global subscriber is already set.
    pub fn build(self) -> TrainResult<TracingLogger> {
        let env_filter = self.filter()?;
        let span_events = if self.with_span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let base = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(self.with_targets)
            .with_file(self.with_file_location)
            .with_line_number(self.with_file_location)
            .with_span_events(span_events);
        let registry = tracing_subscriber::registry().with(env_filter);

        let installed = match self.format {
            LogFormat::Pretty => registry.with(base.pretty()).try_init(),
            LogFormat::Compact => registry.with(base.with_ansi(false).compact()).try_init(),
            LogFormat::Json => registry.with(base.json()).try_init(),
        };
        installed.map_err(|e| {
            TrainError::InvalidParameter(format!("Failed to initialize tracing: {}", e))
        })?;

        Ok(TracingLogger {
            format: self.format,
        })
    }
}

/// Handle returned once the global subscriber is installed.
#[derive(Debug)]
pub struct TracingLogger {
    format: LogFormat,
}

impl TracingLogger {
    /// Create a new logger builder.
    pub fn builder() -> TracingLoggerBuilder {
        TracingLoggerBuilder::new()
    }

    /// Install with the given level and format.
    pub fn init(level: LogLevel, format: LogFormat) -> TrainResult<Self> {
        Self::builder().with_level(level).with_format(format).build()
    }

    /// Format the subscriber writes.
    pub fn format(&self) -> LogFormat {
        self.format
    }
}
