//! The failures a validation stage can end a request with.

use thiserror::Error;
use tollgate_contract::{BoxError, RequestError, ResponseError, RouteError, SchemaViolation};

/// Every way a stage can refuse to pass traffic through.
///
/// Each variant maps to one reporter. Field-level detail is one call away
/// through [`ValidationFailure::violation`].
#[derive(Debug, Error)]
pub enum ValidationFailure {
    /// The request matched no operation.
    #[error(transparent)]
    Routing(#[from] RouteError),

    /// The request does not satisfy its operation.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The handler's response does not satisfy its operation.
    #[error(transparent)]
    Response(#[from] ResponseError),

    /// The handler's response body could not be read to the end.
    #[error("failed to capture response body: {0}")]
    Capture(#[source] BoxError),
}

impl ValidationFailure {
    /// Field-level detail, if the failure came from a schema check.
    #[must_use]
    pub fn violation(&self) -> Option<&SchemaViolation> {
        match self {
            Self::Request(err) => err.violation(),
            Self::Response(err) => err.violation(),
            Self::Routing(_) | Self::Capture(_) => None,
        }
    }

    /// Stable name of the failure class.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Routing(err) => err.kind(),
            Self::Request(err) => err.kind(),
            Self::Response(err) => err.kind(),
            Self::Capture(_) => "ResponseCaptureError",
        }
    }
}
