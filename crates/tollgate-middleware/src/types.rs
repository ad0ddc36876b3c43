//! Request, response and body types used throughout the middleware.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use serde_json::Value;

pub use tollgate_contract::BoxError;

/// Inbound request. The body is fully buffered so it can be validated and
/// still handed to the handler.
pub type Request = http::Request<Full<Bytes>>;

/// Response body. Handlers may stream; response validation drains it.
pub type Body = BoxBody<Bytes, BoxError>;

/// Outbound response.
pub type Response = http::Response<Body>;

/// A complete body from the given bytes.
pub fn full(bytes: impl Into<Bytes>) -> Body {
    Full::new(bytes.into()).map_err(|never| match never {}).boxed()
}

/// An empty body.
pub fn empty() -> Body {
    Empty::<Bytes>::new().map_err(|never| match never {}).boxed()
}

/// Extension trait for building responses.
pub trait ResponseExt {
    /// A response with `status` and `value` serialized as its JSON body.
    fn json(status: StatusCode, value: &Value) -> Response;
}

impl ResponseExt for Response {
    fn json(status: StatusCode, value: &Value) -> Response {
        let mut response = http::Response::new(full(value.to_string()));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}
