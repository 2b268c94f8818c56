//! Logging setup shared by the semvec binaries.
//!
//! Installs a global [`tracing`] subscriber writing to stderr, filtered by
//! `RUST_LOG` (default `info`). Stdout stays free for command output.
//!
//! ```rust,ignore
//! semvec_telemetry::init_telemetry("semvec-server")?;
//! tracing::info!("ready");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Filter applied when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => f.write_str("pretty"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}', expected 'pretty' or 'json'")),
        }
    }
}

/// Error returned when a global subscriber is already installed.
#[derive(Debug, thiserror::Error)]
#[error("failed to install log subscriber: {0}")]
pub struct InitError(String);

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the human-readable subscriber.
pub fn init_telemetry(service_name: &str) -> Result<(), InitError> {
    init(service_name, LogFormat::Pretty)
}

/// Install the JSON subscriber.
pub fn init_json(service_name: &str) -> Result<(), InitError> {
    init(service_name, LogFormat::Json)
}

/// Install the subscriber for `format`.
///
/// Fails instead of panicking when called twice in one process.
pub fn init(service_name: &str, format: LogFormat) -> Result<(), InitError> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(true);

    let result = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
    };
    result.map_err(|e| InitError(e.to_string()))?;

    tracing::debug!(service = service_name, %format, "logging initialised");
    Ok(())
}
