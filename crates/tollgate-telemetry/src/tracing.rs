//! OpenTelemetry tracing export and W3C trace context propagation.
//!
//! [`init_tracing`] builds an SDK tracer provider that batches spans to an
//! OTLP collector over gRPC, installs it and the W3C propagator globally,
//! and hands the provider back so it can also be passed explicitly to the
//! validation middleware.
//!
//! # Example
//!
//! ```rust,ignore
//! use tollgate_telemetry::tracing::{init_tracing, TracingConfig};
//!
//! let provider = init_tracing(&TracingConfig::default())?;
//! ```

use opentelemetry::propagation::{Extractor, Injector};
use opentelemetry::{global, Context, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler, TracerProvider};
use opentelemetry_sdk::Resource;
use serde::Deserialize;

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Tracing configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Whether a provider is built at all.
    pub enabled: bool,

    /// OTLP gRPC endpoint, e.g. `http://localhost:4317`.
    pub otlp_endpoint: String,

    /// `service.name` resource attribute.
    pub service_name: String,

    /// `service.version` resource attribute.
    pub service_version: String,

    /// `deployment.environment` resource attribute.
    pub environment: String,

    /// Fraction of traces sampled, within `0.0..=1.0`.
    pub sample_ratio: f64,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            otlp_endpoint: "http://localhost:4317".to_string(),
            service_name: "tollgate".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
            sample_ratio: 1.0,
        }
    }
}

impl TracingConfig {
    /// Production defaults: ten percent sampling.
    #[must_use]
    pub fn production(service_name: &str, version: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
            service_version: version.to_string(),
            environment: "production".to_string(),
            sample_ratio: 0.1,
            ..Self::default()
        }
    }

    fn sampler(&self) -> TelemetryResult<Sampler> {
        if !(0.0..=1.0).contains(&self.sample_ratio) {
            return Err(TelemetryError::InvalidConfig(format!(
                "sample_ratio must be within 0..=1, got {}",
                self.sample_ratio
            )));
        }
        Ok(if self.sample_ratio >= 1.0 {
            Sampler::AlwaysOn
        } else if self.sample_ratio <= 0.0 {
            Sampler::AlwaysOff
        } else {
            Sampler::TraceIdRatioBased(self.sample_ratio)
        })
    }
}

/// Builds and installs the global tracer provider and W3C propagator.
///
/// Returns `None` when tracing is disabled. The propagator is installed
/// either way so inbound `traceparent` headers keep parenting spans.
pub fn init_tracing(config: &TracingConfig) -> TelemetryResult<Option<TracerProvider>> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    if !config.enabled {
        return Ok(None);
    }

    let sampler = config.sampler()?;
    let resource = Resource::new([
        KeyValue::new(
            opentelemetry_semantic_conventions::resource::SERVICE_NAME,
            config.service_name.clone(),
        ),
        KeyValue::new(
            opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
            config.service_version.clone(),
        ),
        KeyValue::new("deployment.environment", config.environment.clone()),
    ]);

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&config.otlp_endpoint)
        .build()
        .map_err(|e| TelemetryError::TracingInit(e.to_string()))?;

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_sampler(sampler)
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource)
        .build();

    global::set_tracer_provider(provider.clone());
    ::tracing::info!(
        endpoint = %config.otlp_endpoint,
        ratio = config.sample_ratio,
        "trace export enabled"
    );

    Ok(Some(provider))
}

/// Extracts the remote parent context from inbound headers.
pub fn extract_context(headers: &http::HeaderMap) -> Context {
    global::get_text_map_propagator(|propagator| propagator.extract(&HeaderExtractor(headers)))
}

/// Writes `context` into outbound headers.
pub fn inject_context(context: &Context, headers: &mut http::HeaderMap) {
    global::get_text_map_propagator(|propagator| {
        propagator.inject_context(context, &mut HeaderInjector(headers));
    });
}

/// Read-only propagation carrier over `http::HeaderMap`.
pub struct HeaderExtractor<'a>(pub &'a http::HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(http::HeaderName::as_str).collect()
    }
}

/// Writable propagation carrier over `http::HeaderMap`.
pub struct HeaderInjector<'a>(pub &'a mut http::HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if let (Ok(name), Ok(value)) = (
            http::header::HeaderName::try_from(key),
            http::header::HeaderValue::try_from(value),
        ) {
            self.0.insert(name, value);
        }
    }
}
