//! Integrator-facing configuration.
//!
//! Only the router is required. Everything else falls back to a default
//! when [`MiddlewareOptionsBuilder::build`] runs: the JSON Schema engine,
//! empty validation options, the default reporters and the ambient or
//! global tracer provider.
//!
//! # Example
//!
//! ```
//! use http::StatusCode;
//! use tollgate_contract::{ContractRouter, ValidationOptions};
//! use tollgate_middleware::report::generic_error;
//! use tollgate_middleware::MiddlewareOptions;
//!
//! let router = ContractRouter::from_json(r#"{"openapi": "3.0.3", "paths": {}}"#).unwrap();
//! let options = MiddlewareOptions::builder(router)
//!     .validation_options(ValidationOptions::strict())
//!     .report_route_error(|_request, err| {
//!         let status = if err.is_not_found() {
//!             StatusCode::NOT_FOUND
//!         } else {
//!             StatusCode::METHOD_NOT_ALLOWED
//!         };
//!         generic_error(status, &err.to_string(), err.kind())
//!     })
//!     .build();
//!
//! assert!(options.validation_options().include_response_status);
//! ```

use std::sync::Arc;

use tollgate_contract::{
    JsonSchemaEngine, RequestError, RequestSnapshot, ResponseError, RouteError, RouteMatcher,
    ValidationEngine, ValidationOptions,
};

use crate::report::{
    default_request_reporter, default_response_reporter, default_route_reporter, Reporters,
    RequestErrorReporter, ResponseErrorReporter, RouteErrorReporter,
};
use crate::span::SpanSource;
use crate::types::Response;

/// Everything the validation stages need, resolved and cheap to clone.
#[derive(Clone)]
pub struct MiddlewareOptions {
    router: Arc<dyn RouteMatcher>,
    engine: Arc<dyn ValidationEngine>,
    validation_options: Arc<ValidationOptions>,
    reporters: Reporters,
    tracer_provider: Option<Arc<dyn SpanSource>>,
}

impl MiddlewareOptions {
    /// Starts a builder around the required router.
    pub fn builder(router: impl RouteMatcher + 'static) -> MiddlewareOptionsBuilder {
        MiddlewareOptionsBuilder::new(Arc::new(router))
    }

    /// Options with every default.
    pub fn new(router: impl RouteMatcher + 'static) -> Self {
        Self::builder(router).build()
    }

    /// The route matcher.
    pub fn router(&self) -> &dyn RouteMatcher {
        &*self.router
    }

    /// The validation engine.
    pub fn engine(&self) -> &dyn ValidationEngine {
        &*self.engine
    }

    /// Options forwarded to the engine.
    pub fn validation_options(&self) -> &Arc<ValidationOptions> {
        &self.validation_options
    }

    /// The resolved reporters.
    pub fn reporters(&self) -> &Reporters {
        &self.reporters
    }

    /// The explicitly configured tracer provider, if any.
    pub fn tracer_provider(&self) -> Option<&Arc<dyn SpanSource>> {
        self.tracer_provider.as_ref()
    }
}

impl std::fmt::Debug for MiddlewareOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareOptions")
            .field("validation_options", &self.validation_options)
            .field("tracer_provider", &self.tracer_provider.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`MiddlewareOptions`].
pub struct MiddlewareOptionsBuilder {
    router: Arc<dyn RouteMatcher>,
    engine: Option<Arc<dyn ValidationEngine>>,
    validation_options: ValidationOptions,
    route_reporter: Option<RouteErrorReporter>,
    request_reporter: Option<RequestErrorReporter>,
    response_reporter: Option<ResponseErrorReporter>,
    tracer_provider: Option<Arc<dyn SpanSource>>,
}

impl MiddlewareOptionsBuilder {
    /// Creates a builder around a shared router.
    pub fn new(router: Arc<dyn RouteMatcher>) -> Self {
        Self {
            router,
            engine: None,
            validation_options: ValidationOptions::default(),
            route_reporter: None,
            request_reporter: None,
            response_reporter: None,
            tracer_provider: None,
        }
    }

    /// Replaces the validation engine.
    pub fn engine(mut self, engine: impl ValidationEngine + 'static) -> Self {
        self.engine = Some(Arc::new(engine));
        self
    }

    /// Sets the options forwarded to the engine.
    pub fn validation_options(mut self, options: ValidationOptions) -> Self {
        self.validation_options = options;
        self
    }

    /// Reports routing failures.
    pub fn report_route_error<F>(mut self, reporter: F) -> Self
    where
        F: Fn(&RequestSnapshot, &RouteError) -> Response + Send + Sync + 'static,
    {
        self.route_reporter = Some(Arc::new(reporter));
        self
    }

    /// Reports request validation failures.
    pub fn report_request_error<F>(mut self, reporter: F) -> Self
    where
        F: Fn(&RequestSnapshot, &RequestError) -> Response + Send + Sync + 'static,
    {
        self.request_reporter = Some(Arc::new(reporter));
        self
    }

    /// Reports response validation failures.
    pub fn report_response_error<F>(mut self, reporter: F) -> Self
    where
        F: Fn(&RequestSnapshot, &ResponseError) -> Response + Send + Sync + 'static,
    {
        self.response_reporter = Some(Arc::new(reporter));
        self
    }

    /// Opens stage spans with `provider` instead of an ambient or global one.
    pub fn tracer_provider(mut self, provider: impl SpanSource + 'static) -> Self {
        self.tracer_provider = Some(Arc::new(provider));
        self
    }

    /// Resolves defaults.
    pub fn build(self) -> MiddlewareOptions {
        let reporters = Reporters::new(
            self.route_reporter
                .unwrap_or_else(|| Arc::new(default_route_reporter)),
            self.request_reporter
                .unwrap_or_else(|| Arc::new(default_request_reporter)),
            self.response_reporter
                .unwrap_or_else(|| Arc::new(default_response_reporter)),
        );

        MiddlewareOptions {
            router: self.router,
            engine: self.engine.unwrap_or_else(|| Arc::new(JsonSchemaEngine::new())),
            validation_options: Arc::new(self.validation_options),
            reporters,
            tracer_provider: self.tracer_provider,
        }
    }
}
