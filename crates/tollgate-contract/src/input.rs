//! Validation inputs.
//!
//! Inputs are built once per request and never mutated. The request input
//! is shared through `Arc` pieces so the response input can embed it
//! without copying the request body.

use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Method, StatusCode, Uri, Version};

use crate::config::ValidationOptions;
use crate::operation::Operation;
use crate::router::PathParams;

/// Immutable copy of an inbound request with its body fully read.
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    /// Request method.
    pub method: Method,
    /// Request URI.
    pub uri: Uri,
    /// HTTP version.
    pub version: Version,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Bytes,
}

impl RequestSnapshot {
    /// Creates a snapshot of an HTTP/1.1 request.
    #[must_use]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            uri,
            version: Version::HTTP_11,
            headers,
            body,
        }
    }

    /// Request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Raw query string.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// `Content-Type` header value, if present and readable.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        content_type(&self.headers)
    }
}

/// Everything the engine needs to check a request.
#[derive(Debug, Clone)]
pub struct RequestValidationInput {
    /// The request.
    pub request: Arc<RequestSnapshot>,
    /// Captured path parameters.
    pub path_params: PathParams,
    /// The matched operation.
    pub operation: Arc<Operation>,
    /// Options forwarded from the middleware configuration.
    pub options: Arc<ValidationOptions>,
}

/// Everything the engine needs to check a response.
#[derive(Debug, Clone)]
pub struct ResponseValidationInput {
    /// The request side of the exchange.
    pub request: RequestValidationInput,
    /// Status the handler produced; 200 when it set none.
    pub status: StatusCode,
    /// Headers the handler produced.
    pub headers: HeaderMap,
    /// The complete response body.
    pub body: Bytes,
}

impl ResponseValidationInput {
    /// `Content-Type` of the response, if present and readable.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        content_type(&self.headers)
    }
}

fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
}
