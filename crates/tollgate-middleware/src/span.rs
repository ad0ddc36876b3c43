//! Stage spans.
//!
//! Each validation stage runs inside one OpenTelemetry span. The provider
//! that creates it is chosen per request:
//!
//! 1. the provider configured through
//!    [`MiddlewareOptionsBuilder::tracer_provider`];
//! 2. an [`AmbientTracerProvider`] request extension, honoured only when the
//!    parent context carries a valid span;
//! 3. the process-wide provider from [`opentelemetry::global`].
//!
//! The parent is an [`opentelemetry::Context`] request extension when one is
//! present, otherwise whatever the global propagator extracts from the
//! request headers.
//!
//! [`MiddlewareOptionsBuilder::tracer_provider`]: crate::MiddlewareOptionsBuilder::tracer_provider

use std::sync::Arc;

use opentelemetry::trace::{Status, TraceContextExt, Tracer, TracerProvider};
use opentelemetry::{global, Context};

use crate::failure::ValidationFailure;
use crate::options::MiddlewareOptions;
use crate::types::Request;

/// Instrumentation scope of every span this crate opens.
pub const TRACER_NAME: &str = "tollgate";

/// Span name of the request stage.
pub const REQUEST_VALIDATION_SPAN: &str = "RequestValidation";

/// Span name of the response stage.
pub const RESPONSE_VALIDATION_SPAN: &str = "ResponseValidation";

/// Something that can open a span under a parent context.
///
/// Implemented for every [`TracerProvider`] whose spans can move between
/// threads, which covers the SDK provider and the global one.
pub trait SpanSource: Send + Sync {
    /// Opens `name` under `parent` and returns the context holding it.
    fn start(&self, name: &'static str, parent: &Context) -> Context;
}

impl<P> SpanSource for P
where
    P: TracerProvider + Send + Sync,
    <P::Tracer as Tracer>::Span: Send + Sync + 'static,
{
    fn start(&self, name: &'static str, parent: &Context) -> Context {
        let span = self.tracer(TRACER_NAME).start_with_context(name, parent);
        parent.with_span(span)
    }
}

/// Request extension naming the provider behind the caller's active span.
///
/// Hosts that keep a non-global provider insert this next to the parent
/// [`Context`] so stage spans land in the same pipeline.
#[derive(Clone)]
pub struct AmbientTracerProvider(pub Arc<dyn SpanSource>);

impl AmbientTracerProvider {
    /// Wraps a provider.
    pub fn new(provider: impl SpanSource + 'static) -> Self {
        Self(Arc::new(provider))
    }
}

impl std::fmt::Debug for AmbientTracerProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AmbientTracerProvider")
    }
}

/// A stage span, ended when dropped.
pub(crate) struct StageSpan {
    context: Context,
}

impl StageSpan {
    pub(crate) fn start(
        options: &MiddlewareOptions,
        name: &'static str,
        request: &Request,
    ) -> Self {
        let parent = request
            .extensions()
            .get::<Context>()
            .cloned()
            .unwrap_or_else(|| tollgate_telemetry::extract_context(request.headers()));

        let context = if let Some(provider) = options.tracer_provider() {
            (**provider).start(name, &parent)
        } else if let Some(ambient) = ambient_provider(request, &parent) {
            (*ambient.0).start(name, &parent)
        } else {
            global::tracer_provider().start(name, &parent)
        };

        Self { context }
    }

    pub(crate) fn context(&self) -> &Context {
        &self.context
    }

    pub(crate) fn record_failure(&self, failure: &ValidationFailure) {
        let span = self.context.span();
        span.record_error(failure);
        span.set_status(Status::error(failure.to_string()));
    }
}

impl Drop for StageSpan {
    fn drop(&mut self) {
        self.context.span().end();
    }
}

fn ambient_provider<'r>(
    request: &'r Request,
    parent: &Context,
) -> Option<&'r AmbientTracerProvider> {
    if !parent.span().span_context().is_valid() {
        return None;
    }
    request.extensions().get::<AmbientTracerProvider>()
}
