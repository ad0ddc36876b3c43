//! Response capture.
//!
//! The response stage must see the whole body before the client sees any
//! of it, so the handler's response is drained into a [`ResponseCapture`]
//! and only rebuilt by [`CapturedResponse::emit`] once it has been
//! validated. Memory use is proportional to the response size.

use bytes::{Bytes, BytesMut};
use http::{Extensions, HeaderMap, StatusCode, Version};
use http_body_util::BodyExt;
use tollgate_contract::{BoxError, RequestValidationInput, ResponseValidationInput};

use crate::types::{full, Response};

/// Stand-in sink for a handler's response.
///
/// Status writes are recorded, body writes are appended to an in-memory
/// buffer, and headers are kept as the handler left them. Nothing reaches
/// the client until the capture is frozen and emitted.
#[derive(Debug, Default)]
pub struct ResponseCapture {
    status: Option<StatusCode>,
    version: Version,
    headers: HeaderMap,
    extensions: Extensions,
    body: BytesMut,
}

impl ResponseCapture {
    /// An empty capture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains `response` into a capture, reading the body to the end.
    ///
    /// Trailers are dropped.
    pub async fn drain(response: Response) -> Result<Self, BoxError> {
        let (parts, mut body) = response.into_parts();
        let mut capture = Self {
            version: parts.version,
            headers: parts.headers,
            extensions: parts.extensions,
            ..Self::default()
        };
        capture.write_status(parts.status);

        while let Some(frame) = body.frame().await {
            if let Ok(data) = frame?.into_data() {
                capture.write(&data);
            }
        }
        Ok(capture)
    }

    /// Records the intended status. The last write wins.
    pub fn write_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// Appends to the body buffer.
    pub fn write(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }

    /// Status that will be emitted; 200 when none was written.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable response headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Bytes written so far.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Ends writing. The buffer becomes immutable and shareable.
    #[must_use]
    pub fn freeze(self) -> CapturedResponse {
        CapturedResponse {
            status: self.status(),
            version: self.version,
            headers: self.headers,
            extensions: self.extensions,
            body: self.body.freeze(),
        }
    }
}

/// A fully captured response awaiting validation.
#[derive(Debug)]
pub struct CapturedResponse {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    extensions: Extensions,
    body: Bytes,
}

impl CapturedResponse {
    /// Captured status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Captured body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Pairs the captured response with the request side of the exchange.
    #[must_use]
    pub fn validation_input(&self, request: RequestValidationInput) -> ResponseValidationInput {
        ResponseValidationInput {
            request,
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }

    /// Rebuilds the response exactly as the handler produced it.
    #[must_use]
    pub fn emit(self) -> Response {
        let mut response = http::Response::new(full(self.body));
        *response.status_mut() = self.status;
        *response.version_mut() = self.version;
        *response.headers_mut() = self.headers;
        *response.extensions_mut() = self.extensions;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{CONTENT_TYPE, ETAG};
    use http::HeaderValue;
    use hyper::body::Frame;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Yields one data frame, then fails.
    struct Truncated {
        sent: bool,
    }

    impl hyper::body::Body for Truncated {
        type Data = Bytes;
        type Error = BoxError;

        fn poll_frame(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, BoxError>>> {
            if self.sent {
                return Poll::Ready(Some(Err("upstream closed".into())));
            }
            self.sent = true;
            Poll::Ready(Some(Ok(Frame::data(Bytes::from_static(b"{\"id\"")))))
        }
    }

    #[test]
    fn test_status_defaults_to_ok() {
        let mut capture = ResponseCapture::new();
        assert_eq!(capture.status(), StatusCode::OK);

        capture.write_status(StatusCode::CREATED);
        capture.write_status(StatusCode::ACCEPTED);
        assert_eq!(capture.freeze().status(), StatusCode::ACCEPTED);
    }

    #[test]
    fn test_writes_accumulate() {
        let mut capture = ResponseCapture::new();
        capture.write(b"{\"id\":");
        capture.write(b"1}");
        capture
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        assert_eq!(capture.body(), b"{\"id\":1}");
        assert_eq!(capture.headers()[CONTENT_TYPE], "application/json");
    }

    #[tokio::test]
    async fn test_drain_and_emit_round_trip() {
        let mut response = http::Response::new(full(r#"{"id":1}"#));
        *response.status_mut() = StatusCode::CREATED;
        response.headers_mut().insert(ETAG, HeaderValue::from_static("\"v1\""));

        let captured = ResponseCapture::drain(response).await.unwrap().freeze();
        assert_eq!(captured.body().as_ref(), br#"{"id":1}"#);

        let emitted = captured.emit();
        assert_eq!(emitted.status(), StatusCode::CREATED);
        assert_eq!(emitted.headers()[ETAG], "\"v1\"");
        let body = emitted.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"id":1}"#);
    }

    #[tokio::test]
    async fn test_drain_reports_body_errors() {
        let response = http::Response::new(Truncated { sent: false }.boxed());
        let err = ResponseCapture::drain(response).await.unwrap_err();
        assert_eq!(err.to_string(), "upstream closed");
    }
}
