//! Pipeline composition.
//!
//! A [`Pipeline`] is an ordered list of stages. The validation constructors
//! build the two fixed shapes:
//!
//! - [`Pipeline::with_validation`]: request stage, then response stage
//! - [`Pipeline::with_request_validation`]: request stage only
//! - [`Pipeline::with_response_validation`]: response stage only
//!
//! Whatever the shape, the handler runs at most once per request, and not
//! at all when the request stage rejects.
//!
//! # Example
//!
//! ```
//! use tollgate_contract::ContractRouter;
//! use tollgate_middleware::{full, MiddlewareOptions, Pipeline, Request, Response};
//!
//! let router = ContractRouter::from_json(r#"{"openapi": "3.0.3", "paths": {}}"#).unwrap();
//! let pipeline = Pipeline::with_validation(MiddlewareOptions::new(router));
//! assert_eq!(pipeline.stage_names(), ["request_validation", "response_validation"]);
//!
//! let service = pipeline.wrap(|_request: Request| async { Response::new(full("ok")) });
//! ```

use std::future::Future;
use std::sync::Arc;

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::options::MiddlewareOptions;
use crate::stages::{RequestValidation, ResponseValidation};
use crate::types::{Request, Response};

/// A type-erased stage.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The wrapped business handler.
///
/// Implemented for every `Fn(Request) -> impl Future<Output = Response>`.
pub trait Handler: Send + Sync + 'static {
    /// Handles one request.
    fn call(&self, request: Request) -> BoxFuture<'static, Response>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, request: Request) -> BoxFuture<'static, Response> {
        Box::pin(self(request))
    }
}

/// Ordered, immutable list of stages.
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
    options: Option<MiddlewareOptions>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Request validation in front of response validation.
    pub fn with_validation(options: MiddlewareOptions) -> Self {
        Self::builder()
            .stage(RequestValidation::new(options.clone()))
            .stage(ResponseValidation::new(options.clone()))
            .options(options)
            .build()
    }

    /// Request validation only.
    pub fn with_request_validation(options: MiddlewareOptions) -> Self {
        Self::builder()
            .stage(RequestValidation::new(options.clone()))
            .options(options)
            .build()
    }

    /// Response validation only. Buffers every response in memory.
    pub fn with_response_validation(options: MiddlewareOptions) -> Self {
        Self::builder()
            .stage(ResponseValidation::new(options.clone()))
            .options(options)
            .build()
    }

    /// Options for failures raised outside the stages, such as a request
    /// body that cannot be read.
    #[must_use]
    pub fn options(&self) -> Option<&MiddlewareOptions> {
        self.options.as_ref()
    }

    /// Runs `request` through every stage and then `handler`.
    pub async fn process<H>(
        &self,
        mut ctx: MiddlewareContext,
        request: Request,
        handler: H,
    ) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        let next = self.build_chain(handler);
        next.run(&mut ctx, request).await
    }

    fn build_chain<'a, H>(&'a self, handler: H) -> Next<'a>
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        let mut next = Next::handler(handler);
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Binds `handler` behind this pipeline.
    pub fn wrap<H: Handler>(self, handler: H) -> Validated<H> {
        Validated {
            pipeline: Arc::new(self),
            handler: Arc::new(handler),
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
    options: Option<MiddlewareOptions>,
}

impl PipelineBuilder {
    /// An empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage. Stages run in the order they are added.
    #[must_use]
    pub fn stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Sets the options used to report failures the stages never see.
    #[must_use]
    pub fn options(mut self, options: MiddlewareOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
            options: self.options,
        }
    }
}

/// A handler behind a pipeline. Itself a [`Handler`], so it can be served
/// or wrapped again.
pub struct Validated<H> {
    pipeline: Arc<Pipeline>,
    handler: Arc<H>,
}

impl<H: Handler> Validated<H> {
    /// Handles one request with a fresh context.
    pub async fn handle(&self, request: Request) -> Response {
        self.handle_with(MiddlewareContext::new(), request).await
    }

    /// Handles one request with a caller supplied context.
    ///
    /// When a stage resolved the request, the handler finds the result as a
    /// [`MatchedRoute`](crate::MatchedRoute) request extension.
    pub async fn handle_with(&self, ctx: MiddlewareContext, request: Request) -> Response {
        let handler = Arc::clone(&self.handler);
        self.pipeline
            .process(ctx, request, move |ctx, mut request| {
                if let Some(route) = ctx.matched_route() {
                    request.extensions_mut().insert(route);
                }
                handler.call(request)
            })
            .await
    }

    /// The pipeline in front of the handler.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

impl<H> Clone for Validated<H> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<H: Handler> Handler for Validated<H> {
    fn call(&self, request: Request) -> BoxFuture<'static, Response> {
        let this = self.clone();
        Box::pin(async move { this.handle(request).await })
    }
}
