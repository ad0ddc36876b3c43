//! Validation input building.

use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use tollgate_contract::{
    RequestSnapshot, RequestValidationInput, RouteError, RouteMatcher, ValidationOptions,
};

use crate::types::Request;

/// Takes an immutable snapshot of `request` and hands the request back
/// with an identical, unread body.
pub async fn snapshot(request: Request) -> (Request, Arc<RequestSnapshot>) {
    let (parts, body) = request.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(never) => match never {},
    };

    let snapshot = RequestSnapshot {
        method: parts.method.clone(),
        uri: parts.uri.clone(),
        version: parts.version,
        headers: parts.headers.clone(),
        body: bytes.clone(),
    };
    (Request::from_parts(parts, Full::new(bytes)), Arc::new(snapshot))
}

/// Routes `request` and packages what the engine needs to check it.
///
/// Routing failures are returned as they come from the matcher, so the
/// caller can still tell not-found from method-not-allowed.
pub fn build_request_input(
    router: &dyn RouteMatcher,
    request: &Arc<RequestSnapshot>,
    options: &Arc<ValidationOptions>,
) -> Result<RequestValidationInput, RouteError> {
    let route = router.find_route(&request.method, &request.uri)?;
    Ok(RequestValidationInput {
        request: Arc::clone(request),
        path_params: route.path_params,
        operation: route.operation,
        options: Arc::clone(options),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Method, Version};
    use tollgate_contract::ContractRouter;

    const CONTRACT: &str = r#"{
        "openapi": "3.0.3",
        "paths": {
            "/users/{id}": {
                "get": {"operationId": "getUser", "responses": {"200": {"description": "ok"}}}
            }
        }
    }"#;

    fn request(method: Method, uri: &str, body: &'static str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .version(Version::HTTP_2)
            .header("x-trace", "1")
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap()
    }

    #[tokio::test]
    async fn test_snapshot_leaves_body_readable() {
        let (request, snapshot) = snapshot(request(Method::POST, "/users?x=1", "{\"a\":1}")).await;

        assert_eq!(snapshot.method, Method::POST);
        assert_eq!(snapshot.version, Version::HTTP_2);
        assert_eq!(snapshot.query(), Some("x=1"));
        assert_eq!(snapshot.headers["x-trace"], "1");
        assert_eq!(&snapshot.body[..], b"{\"a\":1}");

        let body = request.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"{\"a\":1}");
    }

    #[tokio::test]
    async fn test_build_request_input() {
        let router = ContractRouter::from_json(CONTRACT).unwrap();
        let options = Arc::new(ValidationOptions::strict());

        let (_, found) = snapshot(request(Method::GET, "/users/9", "")).await;
        let input = build_request_input(&router, &found, &options).unwrap();
        assert_eq!(input.operation.id(), "getUser");
        assert_eq!(input.path_params.get("id"), Some("9"));
        assert!(input.options.include_response_status);
        assert!(Arc::ptr_eq(&input.request, &found));

        let (_, missing) = snapshot(request(Method::GET, "/groups", "")).await;
        assert!(build_request_input(&router, &missing, &options).unwrap_err().is_not_found());

        let (_, wrong_method) = snapshot(request(Method::DELETE, "/users/9", "")).await;
        assert!(build_request_input(&router, &wrong_method, &options)
            .unwrap_err()
            .is_method_not_allowed());
    }
}
