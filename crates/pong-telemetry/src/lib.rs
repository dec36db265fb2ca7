//! # Pong Telemetry
//!
//! Structured logging for the pong responder.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pong_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `awala-pong` | Service name in logs |
//! | `PONG_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `PONG_JSON_LOGS` | `false` (`true` in containers) | JSON output |
//! | `PONG_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// A global subscriber could not be installed.
    #[error("Failed to initialize log subscriber: {0}")]
    SubscriberInit(String),

    /// The configuration is unusable.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging.
///
/// Returns a guard to hold for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    init_logging(&config)?;
    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Guard that keeps telemetry active and logs shutdown when dropped.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}
