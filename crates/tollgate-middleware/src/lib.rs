//! # Tollgate Middleware
//!
//! Contract validation middleware for hyper services.
//!
//! Two stages sit between the transport and the business handler. The
//! request stage refuses anything the contract does not allow before the
//! handler sees it; the response stage buffers what the handler produced
//! and only lets a conforming response out.
//!
//! ## Pipeline
//!
//! ```text
//! Request → RequestValidation → ResponseValidation → Handler
//!                                                       ↓
//! Response ←──────────────── capture, validate, emit ←──┘
//! ```
//!
//! | Stage | Middleware          | On failure                          |
//! |-------|---------------------|-------------------------------------|
//! | 1     | Request Validation  | route or request reporter, no handler |
//! | 2     | Response Validation | route or response reporter           |
//!
//! Each stage runs inside its own OpenTelemetry span
//! (`RequestValidation`, `ResponseValidation`); see [`span`] for how the
//! provider and parent are chosen.
//!
//! ## Example
//!
//! ```
//! use tollgate_contract::ContractRouter;
//! use tollgate_middleware::{full, MiddlewareOptions, Pipeline, Request, Response};
//!
//! let router = ContractRouter::from_json(r#"{"openapi": "3.0.3", "paths": {}}"#).unwrap();
//! let service = Pipeline::with_validation(MiddlewareOptions::new(router))
//!     .wrap(|_request: Request| async { Response::new(full("ok")) })
//!     .into_service();
//! # let _ = service;
//! ```

#![doc(html_root_url = "https://docs.rs/tollgate-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod capture;
pub mod context;
pub mod failure;
pub mod input;
pub mod middleware;
pub mod options;
pub mod pipeline;
pub mod report;
pub mod service;
pub mod span;
pub mod stages;
pub mod types;

// Re-export main types at crate root
pub use capture::{CapturedResponse, ResponseCapture};
pub use context::{MatchedRoute, MiddlewareContext};
pub use failure::ValidationFailure;
pub use middleware::{BoxFuture, Middleware, Next};
pub use options::{MiddlewareOptions, MiddlewareOptionsBuilder};
pub use pipeline::{BoxedMiddleware, Handler, Pipeline, PipelineBuilder, Validated};
pub use report::{Reporters, RequestErrorReporter, ResponseErrorReporter, RouteErrorReporter};
pub use service::ValidationService;
pub use span::{
    AmbientTracerProvider, SpanSource, REQUEST_VALIDATION_SPAN, RESPONSE_VALIDATION_SPAN,
    TRACER_NAME,
};
pub use stages::{RequestValidation, ResponseValidation};
pub use types::{empty, full, Body, BoxError, Request, Response, ResponseExt};
