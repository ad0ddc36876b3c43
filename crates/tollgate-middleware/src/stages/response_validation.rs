//! Response validation stage.
//!
//! Runs the rest of the chain to completion, drains its response into a
//! [`ResponseCapture`], and validates it against the operation the request
//! resolves to. Only a conforming response is emitted; on failure the
//! captured status and body are discarded and the reporter's response is
//! sent instead.

use tracing::debug;

use crate::capture::ResponseCapture;
use crate::context::MiddlewareContext;
use crate::failure::ValidationFailure;
use crate::input::{build_request_input, snapshot};
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::options::MiddlewareOptions;
use crate::span::{StageSpan, RESPONSE_VALIDATION_SPAN};
use crate::types::{Request, Response};

use super::reject;

/// Checks handler responses against the contract.
#[derive(Debug, Clone)]
pub struct ResponseValidation {
    options: MiddlewareOptions,
}

impl ResponseValidation {
    /// Creates the stage.
    pub fn new(options: MiddlewareOptions) -> Self {
        Self { options }
    }
}

impl Middleware for ResponseValidation {
    fn name(&self) -> &'static str {
        "response_validation"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let (mut request, snapshot) = snapshot(request).await;
            let span = StageSpan::start(&self.options, RESPONSE_VALIDATION_SPAN, &request);
            ctx.set_trace_context(span.context().clone());
            request.extensions_mut().insert(span.context().clone());

            // Without a request stage in front, resolve here so the handler
            // still sees the route. Failures are reported after it runs.
            if ctx.operation_id().is_none() {
                let router = self.options.router();
                if let Ok(route) = router.find_route(&snapshot.method, &snapshot.uri) {
                    ctx.set_operation_id(route.operation.id().to_string());
                    ctx.set_path_params(route.path_params);
                }
            }

            let response = next.run(ctx, request).await;
            let captured = match ResponseCapture::drain(response).await {
                Ok(capture) => capture.freeze(),
                Err(err) => {
                    let failure = ValidationFailure::Capture(err);
                    return reject(&self.options, &span, ctx, &snapshot, &failure);
                }
            };

            // Routing is re-derived from the original request.
            let request_input = match build_request_input(
                self.options.router(),
                &snapshot,
                self.options.validation_options(),
            ) {
                Ok(input) => input,
                Err(err) => {
                    let failure = ValidationFailure::Routing(err);
                    return reject(&self.options, &span, ctx, &snapshot, &failure);
                }
            };

            let input = captured.validation_input(request_input);
            if let Err(err) = self.options.engine().validate_response(&input) {
                let failure = ValidationFailure::Response(err);
                return reject(&self.options, &span, ctx, &snapshot, &failure);
            }
            debug!(
                request_id = %ctx.request_id(),
                operation_id = input.request.operation.id(),
                status = captured.status().as_u16(),
                body_bytes = captured.body().len(),
                elapsed_us = ctx.elapsed().as_micros(),
                "response conforms to contract"
            );

            captured.emit()
        })
    }
}
