//! Per-request middleware state.
//!
//! A [`MiddlewareContext`] is created for each request and dropped when the
//! response leaves the pipeline. Nothing in it is shared between requests.

use std::time::{Duration, Instant};

use opentelemetry::Context;
use tollgate_contract::PathParams;
use uuid::Uuid;

/// Routing result handed to the handler as a request extension.
///
/// Present whenever a stage resolved the request before the handler ran.
///
/// ```
/// use tollgate_middleware::{MatchedRoute, Request, Response, full};
///
/// async fn get_user(request: Request) -> Response {
///     let id = request
///         .extensions()
///         .get::<MatchedRoute>()
///         .and_then(|route| route.path_params.get("id"))
///         .unwrap_or_default()
///         .to_string();
///     Response::new(full(id))
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute {
    /// Pipeline request id.
    pub request_id: Uuid,
    /// Resolved operation.
    pub operation_id: String,
    /// Captured path parameters.
    pub path_params: PathParams,
}

/// Context that flows through the middleware chain.
///
/// Stages enrich it as they learn about the request: the request stage sets
/// the resolved operation and path parameters, and both stages publish the
/// span context they opened.
///
/// # Example
///
/// ```
/// use tollgate_middleware::MiddlewareContext;
///
/// let mut ctx = MiddlewareContext::new();
/// ctx.set_operation_id("getUser".to_string());
/// assert_eq!(ctx.operation_id(), Some("getUser"));
/// ```
#[derive(Debug, Clone)]
pub struct MiddlewareContext {
    /// Unique identifier for this request (UUID v7).
    request_id: Uuid,

    /// Operation resolved by the router.
    operation_id: Option<String>,

    /// Path parameters captured by the router.
    path_params: Option<PathParams>,

    /// Innermost OpenTelemetry context opened so far.
    trace_context: Context,

    /// When the request entered the pipeline.
    started_at: Instant,
}

impl MiddlewareContext {
    /// Creates a context with a fresh request id.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(Uuid::now_v7())
    }

    /// Creates a context with a caller supplied request id.
    #[must_use]
    pub fn with_request_id(request_id: Uuid) -> Self {
        Self {
            request_id,
            operation_id: None,
            path_params: None,
            trace_context: Context::new(),
            started_at: Instant::now(),
        }
    }

    /// Returns the request id.
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Returns the operation id, if routing has happened.
    #[must_use]
    pub fn operation_id(&self) -> Option<&str> {
        self.operation_id.as_deref()
    }

    /// Sets the operation id.
    pub fn set_operation_id(&mut self, operation_id: String) {
        self.operation_id = Some(operation_id);
    }

    /// Returns the captured path parameters, if routing has happened.
    #[must_use]
    pub fn path_params(&self) -> Option<&PathParams> {
        self.path_params.as_ref()
    }

    /// Sets the captured path parameters.
    pub fn set_path_params(&mut self, params: PathParams) {
        self.path_params = Some(params);
    }

    /// Returns the innermost span context opened by a stage.
    #[must_use]
    pub fn trace_context(&self) -> &Context {
        &self.trace_context
    }

    /// Replaces the current span context.
    pub fn set_trace_context(&mut self, context: Context) {
        self.trace_context = context;
    }

    /// Time spent in the pipeline so far.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// The routing result, once both operation and path parameters are known.
    #[must_use]
    pub fn matched_route(&self) -> Option<MatchedRoute> {
        Some(MatchedRoute {
            request_id: self.request_id,
            operation_id: self.operation_id()?.to_string(),
            path_params: self.path_params()?.clone(),
        })
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique_v7() {
        let a = MiddlewareContext::new();
        let b = MiddlewareContext::new();
        assert_ne!(a.request_id(), b.request_id());
        assert_eq!(a.request_id().get_version_num(), 7);
    }

    #[test]
    fn test_routing_state() {
        let mut ctx = MiddlewareContext::new();
        assert!(ctx.operation_id().is_none());
        assert!(ctx.path_params().is_none());

        let mut params = PathParams::new();
        params.insert("id", "42");
        ctx.set_operation_id("getUser".to_string());
        ctx.set_path_params(params);

        assert_eq!(ctx.operation_id(), Some("getUser"));
        assert_eq!(ctx.path_params().unwrap().get("id"), Some("42"));
    }

    #[test]
    fn test_matched_route_needs_operation_and_params() {
        let mut ctx = MiddlewareContext::new();
        ctx.set_operation_id("getUser".to_string());
        assert!(ctx.matched_route().is_none());

        let mut params = PathParams::new();
        params.insert("id", "42");
        ctx.set_path_params(params.clone());

        let route = ctx.matched_route().unwrap();
        assert_eq!(route.request_id, ctx.request_id());
        assert_eq!(route.operation_id, "getUser");
        assert_eq!(route.path_params, params);
    }

    #[test]
    fn test_clone_keeps_request_identity() {
        let mut ctx = MiddlewareContext::new();
        ctx.set_operation_id("listUsers".to_string());

        let cloned = ctx.clone();
        assert_eq!(cloned.request_id(), ctx.request_id());
        assert_eq!(cloned.operation_id(), Some("listUsers"));
        assert!(cloned.elapsed() >= Duration::ZERO);
    }
}
