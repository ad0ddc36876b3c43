//! Stage spans: names, parentage and provider selection.

use std::path::PathBuf;

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::Full;
use opentelemetry::trace::{SpanId, Status, TraceContextExt, TraceId, Tracer, TracerProvider as _};
use opentelemetry::Context;
use opentelemetry_sdk::export::trace::SpanData;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::testing::trace::InMemorySpanExporter;
use opentelemetry_sdk::trace::TracerProvider;
use tollgate_contract::ContractRouter;
use tollgate_middleware::{
    full, AmbientTracerProvider, MiddlewareOptions, Pipeline, Request, Response,
    REQUEST_VALIDATION_SPAN, RESPONSE_VALIDATION_SPAN,
};

const USER: &str = r#"{"id":42,"name":"Ada","age":36}"#;

async fn router() -> ContractRouter {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/users.openapi.json");
    ContractRouter::from_file(path).await.unwrap()
}

fn recording() -> (InMemorySpanExporter, TracerProvider) {
    let exporter = InMemorySpanExporter::default();
    let provider = TracerProvider::builder()
        .with_simple_exporter(exporter.clone())
        .build();
    (exporter, provider)
}

fn get(uri: &str) -> Request {
    http::Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

async fn user(_request: Request) -> Response {
    http::Response::builder()
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(full(USER))
        .unwrap()
}

fn named<'a>(spans: &'a [SpanData], name: &str) -> &'a SpanData {
    spans
        .iter()
        .find(|span| span.name == name)
        .unwrap_or_else(|| panic!("no span named {name}"))
}

#[tokio::test]
async fn test_explicit_provider_nests_response_span() {
    let (exporter, provider) = recording();
    let options = MiddlewareOptions::builder(router().await)
        .tracer_provider(provider.clone())
        .build();
    let service = Pipeline::with_validation(options).wrap(user);

    let response = service.handle(get("/users/42")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let spans = exporter.get_finished_spans().unwrap();
    assert_eq!(spans.len(), 2);
    let request_span = named(&spans, REQUEST_VALIDATION_SPAN);
    let response_span = named(&spans, RESPONSE_VALIDATION_SPAN);

    assert_eq!(request_span.parent_span_id, SpanId::INVALID);
    assert_eq!(response_span.parent_span_id, request_span.span_context.span_id());
    assert_eq!(
        response_span.span_context.trace_id(),
        request_span.span_context.trace_id()
    );
}

#[tokio::test]
async fn test_ambient_provider_follows_active_span() {
    let (exporter, provider) = recording();
    let service = Pipeline::with_validation(MiddlewareOptions::new(router().await)).wrap(user);

    let outer = provider.tracer("host").start("inbound");
    let parent = Context::current_with_span(outer);
    let mut request = get("/users/42");
    request.extensions_mut().insert(parent.clone());
    request
        .extensions_mut()
        .insert(AmbientTracerProvider::new(provider.clone()));

    let response = service.handle(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    parent.span().end();

    let spans = exporter.get_finished_spans().unwrap();
    assert_eq!(spans.len(), 3);
    let inbound = named(&spans, "inbound");
    let request_span = named(&spans, REQUEST_VALIDATION_SPAN);
    let response_span = named(&spans, RESPONSE_VALIDATION_SPAN);

    assert_eq!(request_span.parent_span_id, inbound.span_context.span_id());
    assert_eq!(response_span.parent_span_id, request_span.span_context.span_id());
}

#[tokio::test]
async fn test_parent_extracted_from_traceparent_header() {
    opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());
    let (exporter, provider) = recording();
    let options = MiddlewareOptions::builder(router().await)
        .tracer_provider(provider.clone())
        .build();
    let service = Pipeline::with_request_validation(options).wrap(user);

    let mut request = get("/users/42");
    request.headers_mut().insert(
        "traceparent",
        http::HeaderValue::from_static("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"),
    );
    service.handle(request).await;

    let spans = exporter.get_finished_spans().unwrap();
    let request_span = named(&spans, REQUEST_VALIDATION_SPAN);
    assert_eq!(
        request_span.span_context.trace_id(),
        TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap()
    );
    assert_eq!(
        request_span.parent_span_id,
        SpanId::from_hex("00f067aa0ba902b7").unwrap()
    );
}

#[tokio::test]
async fn test_rejection_marks_span_as_error() {
    let (exporter, provider) = recording();
    let options = MiddlewareOptions::builder(router().await)
        .tracer_provider(provider.clone())
        .build();
    let service = Pipeline::with_validation(options).wrap(user);

    let response = service.handle(get("/users/abc")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let spans = exporter.get_finished_spans().unwrap();
    assert_eq!(spans.len(), 1);
    let request_span = named(&spans, REQUEST_VALIDATION_SPAN);
    assert!(matches!(request_span.status, Status::Error { .. }));
}
