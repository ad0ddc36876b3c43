//! Validation stages.
//!
//! ```text
//! Request → [RequestValidation] → [ResponseValidation] → Handler
//!                                          ↓
//! Response ←───────────────────── capture, validate, emit
//! ```
//!
//! The request stage runs first so an invalid request never reaches the
//! handler. The response stage wraps the handler directly so it sees the
//! handler's own output.

pub mod request_validation;
pub mod response_validation;

pub use request_validation::RequestValidation;
pub use response_validation::ResponseValidation;

use tollgate_contract::RequestSnapshot;
use tracing::warn;

use crate::context::MiddlewareContext;
use crate::failure::ValidationFailure;
use crate::options::MiddlewareOptions;
use crate::span::StageSpan;
use crate::types::Response;

/// Records `failure` on the stage span, logs it, and produces the one
/// response the client gets for it.
fn reject(
    options: &MiddlewareOptions,
    span: &StageSpan,
    ctx: &MiddlewareContext,
    request: &RequestSnapshot,
    failure: &ValidationFailure,
) -> Response {
    span.record_failure(failure);
    warn!(
        request_id = %ctx.request_id(),
        operation_id = ctx.operation_id().unwrap_or("unknown"),
        http.method = %request.method,
        http.path = request.path(),
        kind = failure.kind(),
        elapsed_us = ctx.elapsed().as_micros(),
        error = %failure,
        "validation failed"
    );
    options.reporters().report(request, failure)
}
