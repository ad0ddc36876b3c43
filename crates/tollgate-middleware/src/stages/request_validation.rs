//! Request validation stage.
//!
//! Resolves the operation, checks the request against it, and only then
//! hands the request on. A routing or validation failure ends the request
//! here with the matching reporter's response; the handler never runs.

use tracing::debug;

use crate::context::MiddlewareContext;
use crate::failure::ValidationFailure;
use crate::input::{build_request_input, snapshot};
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::options::MiddlewareOptions;
use crate::span::{StageSpan, REQUEST_VALIDATION_SPAN};
use crate::types::{Request, Response};

use super::reject;

/// Checks inbound requests against the contract.
#[derive(Debug, Clone)]
pub struct RequestValidation {
    options: MiddlewareOptions,
}

impl RequestValidation {
    /// Creates the stage.
    pub fn new(options: MiddlewareOptions) -> Self {
        Self { options }
    }
}

impl Middleware for RequestValidation {
    fn name(&self) -> &'static str {
        "request_validation"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let (mut request, snapshot) = snapshot(request).await;
            let span = StageSpan::start(&self.options, REQUEST_VALIDATION_SPAN, &request);
            ctx.set_trace_context(span.context().clone());

            let input = match build_request_input(
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
            ctx.set_operation_id(input.operation.id().to_string());
            ctx.set_path_params(input.path_params.clone());

            if let Err(err) = self.options.engine().validate_request(&input) {
                let failure = ValidationFailure::Request(err);
                return reject(&self.options, &span, ctx, &snapshot, &failure);
            }
            debug!(
                request_id = %ctx.request_id(),
                operation_id = input.operation.id(),
                elapsed_us = ctx.elapsed().as_micros(),
                "request conforms to contract"
            );

            request.extensions_mut().insert(span.context().clone());
            next.run(ctx, request).await
        })
    }
}
