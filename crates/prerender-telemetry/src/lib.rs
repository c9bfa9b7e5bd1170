//! # Prerender Telemetry
//!
//! Structured logging for the prerender host.
//!
//! `prerender-host` only emits `tracing` events. The embedding server binary
//! calls [`init_telemetry`] once at startup to install the subscriber.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use prerender_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).expect("Failed to init telemetry");
//!     // host code here
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PRERENDER_SERVICE_NAME` | `prerender` | Service name in the startup record |
//! | `PRERENDER_LOG_LEVEL` | `info` | Log filter, `RUST_LOG` also honored |
//! | `PRERENDER_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `PRERENDER_JSON_LOGS` | `false` | JSON formatted logs |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::build_filter;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Install the global tracing subscriber.
///
/// Fails with [`TelemetryError::SubscriberInit`] when a global subscriber is
/// already set.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    logging::init_logging(&config)?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        filter = %config.log_level,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Guard held for the lifetime of the application.
pub struct TelemetryGuard {
    service_name: String,
}

impl TelemetryGuard {
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry...");
    }
}
