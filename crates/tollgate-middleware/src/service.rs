//! hyper integration.
//!
//! [`ValidationService`] adapts a [`Validated`] handler to
//! [`hyper::service::Service`] so it can be passed straight to
//! `serve_connection`. The inbound body is collected before the pipeline
//! runs; a body that fails mid-stream never reaches the stages and is
//! reported as a request body failure through the pipeline's reporters.

use std::convert::Infallible;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body as HttpBody;
use hyper::service::Service;
use tollgate_contract::{RequestError, RequestLocation, RequestSnapshot};
use tracing::warn;

use crate::failure::ValidationFailure;
use crate::middleware::BoxFuture;
use crate::options::MiddlewareOptions;
use crate::pipeline::{Handler, Validated};
use crate::report::default_request_reporter;
use crate::types::{BoxError, Request, Response};

/// A [`Validated`] handler served by hyper.
pub struct ValidationService<H> {
    inner: Validated<H>,
}

impl<H: Handler> ValidationService<H> {
    /// Wraps `inner`.
    pub fn new(inner: Validated<H>) -> Self {
        Self { inner }
    }

    /// The wrapped handler.
    pub fn inner(&self) -> &Validated<H> {
        &self.inner
    }
}

impl<H> Clone for ValidationService<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<H: Handler> Validated<H> {
    /// Turns this handler into a hyper service.
    pub fn into_service(self) -> ValidationService<H> {
        ValidationService::new(self)
    }
}

impl<H, B> Service<http::Request<B>> for ValidationService<H>
where
    H: Handler,
    B: HttpBody + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn call(&self, request: http::Request<B>) -> Self::Future {
        let inner = self.inner.clone();
        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let bytes = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(err) => {
                    let err: BoxError = err.into();
                    warn!(
                        http.method = %parts.method,
                        http.path = parts.uri.path(),
                        error = %err,
                        "failed to read request body"
                    );
                    let snapshot = RequestSnapshot {
                        method: parts.method,
                        uri: parts.uri,
                        version: parts.version,
                        headers: parts.headers,
                        body: Bytes::new(),
                    };
                    let options = inner.pipeline().options();
                    return Ok(report_unreadable_body(options, &snapshot, &err));
                }
            };

            let request: Request = http::Request::from_parts(parts, Full::<Bytes>::new(bytes));
            Ok(inner.handle(request).await)
        })
    }
}

/// Routes the request first, so an unknown path is still a routing
/// failure, then reports the body as a request failure.
fn report_unreadable_body(
    options: Option<&MiddlewareOptions>,
    request: &RequestSnapshot,
    err: &BoxError,
) -> Response {
    let reason = format!("failed to read request body: {err}");
    let Some(options) = options else {
        let operation_id = format!("{} {}", request.method, request.path());
        let err = RequestError::new(operation_id, RequestLocation::Body, reason);
        return default_request_reporter(request, &err);
    };

    let failure = match options.router().find_route(&request.method, &request.uri) {
        Ok(route) => {
            let err = RequestError::new(route.operation.id(), RequestLocation::Body, reason);
            ValidationFailure::Request(err)
        }
        Err(err) => ValidationFailure::Routing(err),
    };
    options.reporters().report(request, &failure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use crate::types::full;
    use http::StatusCode;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tollgate_contract::ContractRouter;

    const CONTRACT: &str = r#"{
        "openapi": "3.0.3",
        "paths": {
            "/echo": {"post": {"operationId": "echo", "responses": {"200": {"description": "ok"}}}}
        }
    }"#;

    struct Broken;

    impl HttpBody for Broken {
        type Data = Bytes;
        type Error = std::io::Error;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<hyper::body::Frame<Bytes>, Self::Error>>> {
            Poll::Ready(Some(Err(std::io::Error::other("connection reset"))))
        }
    }

    fn echo_service() -> ValidationService<impl Handler> {
        Pipeline::builder()
            .build()
            .wrap(|request: Request| async move {
                let body = request.into_body().collect().await.unwrap().to_bytes();
                Response::new(full(body))
            })
            .into_service()
    }

    #[tokio::test]
    async fn test_collects_streaming_body() {
        let service = echo_service();
        let request = http::Request::builder()
            .uri("/echo")
            .body(full("hello"))
            .unwrap();

        let response = service.call(request).await.unwrap();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"hello");
    }

    #[tokio::test]
    async fn test_unreadable_body_is_bad_request() {
        let service = echo_service();
        let request = http::Request::builder().uri("/echo").body(Broken).unwrap();

        let response = service.call(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["Kind"], "RequestError");
        assert!(json["error"]["Message"]
            .as_str()
            .unwrap()
            .contains("connection reset"));
    }

    #[tokio::test]
    async fn test_unreadable_body_uses_request_reporter() {
        let options = MiddlewareOptions::builder(ContractRouter::from_json(CONTRACT).unwrap())
            .report_request_error(|request, err| {
                let body = format!("{} {} {}", request.path(), err.operation_id, err.location);
                let mut response = Response::new(full(body));
                *response.status_mut() = StatusCode::UNPROCESSABLE_ENTITY;
                response
            })
            .build();
        let service = Pipeline::with_validation(options)
            .wrap(|_request: Request| async { Response::new(full("unreachable")) })
            .into_service();

        let request = http::Request::builder()
            .method(http::Method::POST)
            .uri("/echo")
            .body(Broken)
            .unwrap();
        let response = service.call(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"/echo echo request body");
    }

    #[tokio::test]
    async fn test_unreadable_body_on_unknown_path_is_routing_failure() {
        let options = MiddlewareOptions::new(ContractRouter::from_json(CONTRACT).unwrap());
        let service = Pipeline::with_request_validation(options)
            .wrap(|_request: Request| async { Response::new(full("unreachable")) })
            .into_service();

        let request = http::Request::builder().uri("/nowhere").body(Broken).unwrap();
        let response = service.call(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["Kind"], "RouteNotFound");
    }
}
