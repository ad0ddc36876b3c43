//! # Tollgate
//!
//! **OpenAPI contract validation for hyper services**
//!
//! Tollgate puts two checks around a request handler:
//!
//! - **Request validation** – path, query, header and body are checked
//!   against the matched operation before the handler runs
//! - **Response validation** – the handler's response is buffered and only
//!   emitted once it matches the contract
//!
//! Every failure is classified (route, request, response) and turned into
//! exactly one response by a reporter you can replace.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tollgate::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let router = ContractRouter::from_file("openapi.json").await?;
//! let options = MiddlewareOptions::builder(router)
//!     .validation_options(ValidationOptions::strict())
//!     .build();
//!
//! let service = Pipeline::with_validation(options)
//!     .wrap(|_request: Request| async { Response::new(full("ok")) })
//!     .into_service();
//! # let _ = service;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → RequestValidation → ResponseValidation → Handler
//!                                                       ↓
//! Response ←──────────────── capture, validate, emit ←──┘
//! ```

#![doc(html_root_url = "https://docs.rs/tollgate/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export router types
pub use tollgate_router as router;

// Re-export contract types
pub use tollgate_contract as contract;

// Re-export middleware types
pub use tollgate_middleware as middleware;

// Re-export telemetry bootstrap
pub use tollgate_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use tollgate::prelude::*;
///
/// let options = ValidationOptions::request_only();
/// assert!(options.exclude_response_body);
/// ```
pub mod prelude {
    pub use tollgate_contract::{
        ContractRouter, JsonSchemaEngine, RequestError, RequestSnapshot, ResponseError, RouteError,
        RouteMatcher, SchemaViolation, ValidationEngine, ValidationOptions,
    };

    pub use tollgate_middleware::{
        full, AmbientTracerProvider, Handler, MatchedRoute, MiddlewareOptions, Pipeline, Request,
        Response, ResponseExt, Validated, ValidationFailure, ValidationService,
    };

    // Default body builders for custom reporters
    pub use tollgate_middleware::report::{field_error, generic_error};

    pub use tollgate_telemetry::{init_telemetry, TelemetryConfig, TelemetryGuard};
}
