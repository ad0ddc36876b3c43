//! Contract loading, routing and validation against a fixture document.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use serde_json::json;
use tollgate_contract::{
    ContractRouter, JsonSchemaEngine, RequestLocation, RequestSnapshot, RequestValidationInput,
    ResponseValidationInput, RouteMatcher, ValidationEngine, ValidationOptions,
};

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/petstore.openapi.json")
}

async fn router() -> ContractRouter {
    ContractRouter::from_file(fixture()).await.unwrap()
}

fn headers(content_type: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers
}

fn input(
    router: &ContractRouter,
    method: Method,
    uri: &'static str,
    headers: HeaderMap,
    body: &'static str,
) -> RequestValidationInput {
    let uri = Uri::from_static(uri);
    let route = router.find_route(&method, &uri).unwrap();
    let body = Bytes::from_static(body.as_bytes());
    RequestValidationInput {
        request: Arc::new(RequestSnapshot::new(method, uri, headers, body)),
        path_params: route.path_params,
        operation: route.operation,
        options: Arc::new(ValidationOptions::default()),
    }
}

#[tokio::test]
async fn test_load_fixture() {
    let router = router().await;
    assert_eq!(router.len(), 4);
    assert!(router.operation("listPets").is_some());
    assert!(router.operation("DELETE /pets/{petId}").is_some());
}

#[tokio::test]
async fn test_routes_require_server_prefix() {
    let router = router().await;
    let route = router
        .find_route(&Method::GET, &Uri::from_static("/api/pets/3"))
        .unwrap();
    assert_eq!(route.operation.id(), "showPet");
    assert_eq!(route.path_params.get("petId"), Some("3"));

    assert!(router
        .find_route(&Method::GET, &Uri::from_static("/pets/3"))
        .unwrap_err()
        .is_not_found());
    assert!(router
        .find_route(&Method::PUT, &Uri::from_static("/api/pets/3"))
        .unwrap_err()
        .is_method_not_allowed());
}

#[tokio::test]
async fn test_referenced_query_parameter() {
    let router = router().await;
    let engine = JsonSchemaEngine::new();

    let ok = input(&router, Method::GET, "/api/pets?limit=5&species=cat,dog", HeaderMap::new(), "");
    assert!(engine.validate_request(&ok).is_ok());

    let bad = input(&router, Method::GET, "/api/pets?species=cow", HeaderMap::new(), "");
    let err = engine.validate_request(&bad).unwrap_err();
    assert_eq!(err.location, RequestLocation::Query("species".to_string()));
    assert_eq!(err.violation().unwrap().field, "/species/0");
    assert_eq!(err.violation().unwrap().value, json!("cow"));
}

#[tokio::test]
async fn test_path_level_parameter_applies_to_every_method() {
    let router = router().await;
    let engine = JsonSchemaEngine::new();
    let err = engine
        .validate_request(&input(&router, Method::DELETE, "/api/pets/0", HeaderMap::new(), ""))
        .unwrap_err();
    assert_eq!(err.location, RequestLocation::Path("petId".to_string()));
}

#[tokio::test]
async fn test_referenced_request_body() {
    let router = router().await;
    let engine = JsonSchemaEngine::new();

    let json = || headers("application/json");
    let ok = input(&router, Method::POST, "/api/pets", json(), r#"{"name":"Rex","tag":null}"#);
    assert!(engine.validate_request(&ok).is_ok());

    let bad = input(&router, Method::POST, "/api/pets", json(), r#"{"name":""}"#);
    let violation = engine.validate_request(&bad).unwrap_err().violation.unwrap();
    assert_eq!(violation.field, "/name");
    assert_eq!(violation.schema, json!({"type": "string", "minLength": 1}));
}

#[tokio::test]
async fn test_referenced_responses() {
    let router = router().await;
    let engine = JsonSchemaEngine::new();
    let request = input(&router, Method::GET, "/api/pets/3", HeaderMap::new(), "");

    let problem = ResponseValidationInput {
        request: request.clone(),
        status: StatusCode::NOT_FOUND,
        headers: headers("application/problem+json"),
        body: Bytes::from_static(br#"{"status":404}"#),
    };
    let err = engine.validate_response(&problem).unwrap_err();
    assert_eq!(err.violation().unwrap().field, "/title");

    let pet = ResponseValidationInput {
        request,
        status: StatusCode::OK,
        headers: headers("application/json"),
        body: Bytes::from_static(br#"{"id":3,"name":"Rex"}"#),
    };
    assert!(engine.validate_response(&pet).is_ok());
}

#[tokio::test]
async fn test_default_response_covers_other_statuses() {
    let router = router().await;
    let engine = JsonSchemaEngine::new();
    let response = ResponseValidationInput {
        request: input(&router, Method::GET, "/api/pets", HeaderMap::new(), ""),
        status: StatusCode::SERVICE_UNAVAILABLE,
        headers: headers("application/problem+json"),
        body: Bytes::from_static(br#"{"title":"down"}"#),
    };
    assert!(engine.validate_response(&response).is_ok());
}
