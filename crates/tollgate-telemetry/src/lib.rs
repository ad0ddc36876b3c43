//! Observability bootstrap for tollgate hosts.
//!
//! The validation middleware only depends on the `tracing` and
//! `opentelemetry` APIs. This crate is what a host calls once at startup to
//! give those calls somewhere to go:
//!
//! - **Logging**: a `tracing-subscriber` registry with JSON or pretty output
//! - **Tracing**: an OpenTelemetry SDK provider exporting spans over OTLP
//! - **Propagation**: the W3C `traceparent` propagator and header carriers
//!
//! # Example
//!
//! ```rust,ignore
//! use tollgate_telemetry::{init_telemetry, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TelemetryConfig::builder()
//!         .service_name("users-api")
//!         .environment("production")
//!         .otlp_endpoint("http://localhost:4317")
//!         .build();
//!
//!     let guard = init_telemetry(config).expect("telemetry");
//!
//!     // Hand the provider to the validation middleware, or rely on the
//!     // global provider installed above.
//!     let provider = guard.tracer_provider().cloned();
//! }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod tracing;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use tracing::{
    extract_context, init_tracing, inject_context, HeaderExtractor, HeaderInjector, TracingConfig,
};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Flushes and shuts down the tracer provider on drop.
///
/// Keep it alive for the lifetime of the process.
pub struct TelemetryGuard {
    tracer_provider: Option<opentelemetry_sdk::trace::TracerProvider>,
}

impl TelemetryGuard {
    /// Creates a new telemetry guard.
    #[must_use]
    pub fn new(tracer_provider: Option<opentelemetry_sdk::trace::TracerProvider>) -> Self {
        Self { tracer_provider }
    }

    /// The installed provider, if trace export is enabled.
    pub fn tracer_provider(&self) -> Option<&opentelemetry_sdk::trace::TracerProvider> {
        self.tracer_provider.as_ref()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            for result in provider.force_flush() {
                if let Err(e) = result {
                    ::tracing::warn!(error = %e, "failed to flush tracer provider");
                }
            }
            if let Err(e) = provider.shutdown() {
                ::tracing::warn!(error = %e, "failed to shut down tracer provider");
            }
        }
    }
}

/// Installs logging, then tracing.
///
/// Logging goes first so tracing initialization can log through it.
pub fn init_telemetry(config: TelemetryConfig) -> TelemetryResult<TelemetryGuard> {
    let config = config.normalized();
    init_logging(&config.logging)?;
    let tracer_provider = init_tracing(&config.tracing)?;
    Ok(TelemetryGuard::new(tracer_provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_guard_without_provider() {
        let guard = TelemetryGuard::new(None);
        assert!(guard.tracer_provider().is_none());
        drop(guard);
    }

    #[test]
    fn test_init_telemetry_disabled() {
        let config = TelemetryConfig {
            tracing: TracingConfig {
                enabled: false,
                ..TracingConfig::default()
            },
            logging: LogConfig {
                enabled: false,
                ..LogConfig::default()
            },
            ..TelemetryConfig::default()
        };
        let guard = init_telemetry(config).unwrap();
        assert!(guard.tracer_provider().is_none());
    }
}
