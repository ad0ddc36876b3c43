//! Failure reporting.
//!
//! Each failure category has one reporter: a callback that turns the
//! failure into the response the client receives. Callers replace any of
//! them through [`MiddlewareOptions`](crate::MiddlewareOptions); the rest
//! fall back to the defaults in this module.
//!
//! Default bodies are JSON. A failure carrying a [`SchemaViolation`] is
//! reported field by field:
//!
//! ```json
//! {"error": {"request": {
//!     "reason": "...",
//!     "field": "/age",
//!     "value": "abc",
//!     "schema": {"type": "integer"},
//!     "origin": "..."
//! }}}
//! ```
//!
//! Anything else gets the generic shape:
//!
//! ```json
//! {"error": {"Message": "no route matches GET /nowhere", "Kind": "RouteNotFound"}}
//! ```
//!
//! | Failure | Default status |
//! |---------|----------------|
//! | routing (any cause) | 500 |
//! | request | 400 |
//! | response | 500 |
//! | response capture | 500 |

use std::sync::Arc;

use http::StatusCode;
use serde_json::{json, Map, Value};
use tollgate_contract::{
    RequestError, RequestSnapshot, ResponseError, RouteError, SchemaViolation,
};

use crate::failure::ValidationFailure;
use crate::types::{Response, ResponseExt};

/// Reports routing failures.
pub type RouteErrorReporter =
    Arc<dyn Fn(&RequestSnapshot, &RouteError) -> Response + Send + Sync>;

/// Reports request validation failures.
pub type RequestErrorReporter =
    Arc<dyn Fn(&RequestSnapshot, &RequestError) -> Response + Send + Sync>;

/// Reports response validation failures.
pub type ResponseErrorReporter =
    Arc<dyn Fn(&RequestSnapshot, &ResponseError) -> Response + Send + Sync>;

/// One reporter per failure category, resolved when options are built.
#[derive(Clone)]
pub struct Reporters {
    route: RouteErrorReporter,
    request: RequestErrorReporter,
    response: ResponseErrorReporter,
}

impl Reporters {
    /// Creates a set from explicit reporters.
    pub fn new(
        route: RouteErrorReporter,
        request: RequestErrorReporter,
        response: ResponseErrorReporter,
    ) -> Self {
        Self {
            route,
            request,
            response,
        }
    }

    /// Produces the single response for `failure`.
    pub fn report(&self, request: &RequestSnapshot, failure: &ValidationFailure) -> Response {
        match failure {
            ValidationFailure::Routing(err) => (self.route)(request, err),
            ValidationFailure::Request(err) => (self.request)(request, err),
            ValidationFailure::Response(err) => (self.response)(request, err),
            ValidationFailure::Capture(_) => generic_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                &failure.to_string(),
                failure.kind(),
            ),
        }
    }
}

impl Default for Reporters {
    fn default() -> Self {
        Self {
            route: Arc::new(default_route_reporter),
            request: Arc::new(default_request_reporter),
            response: Arc::new(default_response_reporter),
        }
    }
}

impl std::fmt::Debug for Reporters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporters").finish_non_exhaustive()
    }
}

/// Generic 500 for every routing failure.
///
/// Not-found and method-not-allowed are not told apart here; supply a
/// route reporter to answer them with 404 or 405.
pub fn default_route_reporter(_request: &RequestSnapshot, err: &RouteError) -> Response {
    generic_error(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string(), err.kind())
}

/// Field-level 400 when the failure carries a violation, generic 400 otherwise.
pub fn default_request_reporter(_request: &RequestSnapshot, err: &RequestError) -> Response {
    match err.violation() {
        Some(violation) => {
            field_error(StatusCode::BAD_REQUEST, "request", violation, Some(&err.to_string()))
        }
        None => generic_error(StatusCode::BAD_REQUEST, &err.to_string(), err.kind()),
    }
}

/// Field-level 500 when the failure carries a violation, generic 500 otherwise.
pub fn default_response_reporter(_request: &RequestSnapshot, err: &ResponseError) -> Response {
    match err.violation() {
        Some(violation) => field_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "response",
            violation,
            Some(&err.to_string()),
        ),
        None => generic_error(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string(), err.kind()),
    }
}

/// `{"error": {"Message": .., "Kind": ..}}`
pub fn generic_error(status: StatusCode, message: &str, kind: &str) -> Response {
    Response::json(status, &json!({"error": {"Message": message, "Kind": kind}}))
}

/// `{"error": {<side>: {"reason", "field", "value", "schema", "origin"?}}}`
pub fn field_error(
    status: StatusCode,
    side: &str,
    violation: &SchemaViolation,
    origin: Option<&str>,
) -> Response {
    let mut report = Map::new();
    report.insert("reason".to_string(), Value::String(violation.reason.clone()));
    report.insert("field".to_string(), Value::String(violation.field.clone()));
    report.insert("value".to_string(), violation.value.clone());
    report.insert("schema".to_string(), violation.schema.clone());
    if let Some(origin) = origin {
        report.insert("origin".to_string(), Value::String(origin.to_string()));
    }

    let mut error = Map::new();
    error.insert(side.to_string(), Value::Object(report));
    Response::json(status, &json!({ "error": Value::Object(error) }))
}
