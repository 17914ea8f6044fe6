//! JSON log lines: one JSON object per line (ndjson), or plain text for interactive runs.

use crate::config::LogConfig;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Initialize tracing with JSON or plain formatting
pub struct StructuredLogger;

impl StructuredLogger {
    /// Install global subscriber: lines to stderr, level from RUST_LOG or default.
    /// Fails if a global subscriber is already set.
    pub fn try_init(json: bool, default_level: &str) -> Result<(), TryInitError> {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        if json {
            let fmt = tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(FmtSpan::NONE)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt)
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()
        }
    }

    /// Like [`StructuredLogger::try_init`], ignoring an already-installed subscriber.
    pub fn init(json: bool, default_level: &str) {
        let _ = Self::try_init(json, default_level);
    }

    pub fn from_config(config: &LogConfig) -> Result<(), TryInitError> {
        Self::try_init(config.json, &config.level)
    }
}
