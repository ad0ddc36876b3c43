//! Telemetry configuration.

use serde::Deserialize;

use crate::logging::LogConfig;
use crate::tracing::TracingConfig;

/// Configuration for logging and trace export.
///
/// Deserializes from any serde format with every field optional, so a host
/// can embed it in its own configuration file:
///
/// ```json
/// { "service_name": "users-api", "tracing": { "sample_ratio": 0.25 } }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Service name, stamped on logs and trace resources.
    pub service_name: String,

    /// Service version.
    pub service_version: String,

    /// Deployment environment (production, staging, development).
    pub environment: String,

    /// Trace export configuration.
    pub tracing: TracingConfig,

    /// Log subscriber configuration.
    pub logging: LogConfig,
}

impl TelemetryConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> TelemetryConfigBuilder {
        TelemetryConfigBuilder::new()
    }

    /// Copies the service identity into the sub-configurations.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.tracing.service_name.clone_from(&self.service_name);
        self.tracing.service_version.clone_from(&self.service_version);
        self.tracing.environment.clone_from(&self.environment);
        self.logging.service_name.clone_from(&self.service_name);
        self
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "tollgate".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
            tracing: TracingConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

/// Builder for [`TelemetryConfig`].
#[derive(Debug, Default)]
pub struct TelemetryConfigBuilder {
    service_name: Option<String>,
    service_version: Option<String>,
    environment: Option<String>,
    tracing: Option<TracingConfig>,
    logging: Option<LogConfig>,
}

impl TelemetryConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the service name.
    #[must_use]
    pub fn service_name(mut self, name: &str) -> Self {
        self.service_name = Some(name.to_string());
        self
    }

    /// Sets the service version.
    #[must_use]
    pub fn service_version(mut self, version: &str) -> Self {
        self.service_version = Some(version.to_string());
        self
    }

    /// Sets the environment.
    #[must_use]
    pub fn environment(mut self, env: &str) -> Self {
        self.environment = Some(env.to_string());
        self
    }

    /// Sets the tracing configuration.
    #[must_use]
    pub fn tracing(mut self, config: TracingConfig) -> Self {
        self.tracing = Some(config);
        self
    }

    /// Sets the logging configuration.
    #[must_use]
    pub fn logging(mut self, config: LogConfig) -> Self {
        self.logging = Some(config);
        self
    }

    /// Enables trace export to the given OTLP endpoint.
    #[must_use]
    pub fn otlp_endpoint(mut self, endpoint: &str) -> Self {
        let config = self.tracing.take().unwrap_or_default();
        self.tracing = Some(TracingConfig {
            enabled: true,
            otlp_endpoint: endpoint.to_string(),
            ..config
        });
        self
    }

    /// Sets the log filter directives.
    #[must_use]
    pub fn log_level(mut self, level: &str) -> Self {
        let config = self.logging.take().unwrap_or_default();
        self.logging = Some(LogConfig {
            level: level.to_string(),
            ..config
        });
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> TelemetryConfig {
        let defaults = TelemetryConfig::default();

        TelemetryConfig {
            service_name: self.service_name.unwrap_or(defaults.service_name),
            service_version: self.service_version.unwrap_or(defaults.service_version),
            environment: self.environment.unwrap_or(defaults.environment),
            tracing: self.tracing.unwrap_or(defaults.tracing),
            logging: self.logging.unwrap_or(defaults.logging),
        }
        .normalized()
    }
}
