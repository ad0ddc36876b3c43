//! Error taxonomy for contract loading, routing and validation.
//!
//! Routing and validation failures are separate types so a caller can
//! register one reporter per category. Validation failures that can be
//! pinned to one field carry a [`SchemaViolation`] as their source; all
//! other validation failures carry only a reason.

use std::fmt;
use std::path::PathBuf;

use http::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tollgate_router::InvalidTemplate;

/// Boxed error used for opaque causes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for contract loading.
pub type ContractResult<T> = Result<T, ContractError>;

/// Errors raised while loading or compiling a contract document.
#[derive(Debug, Error)]
pub enum ContractError {
    /// The document could not be read.
    #[error("failed to read contract document {path}: {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON or does not have the expected shape.
    #[error("failed to parse contract document: {0}")]
    Parse(#[from] serde_json::Error),

    /// A `$ref` points outside the document or at nothing.
    #[error("unresolvable reference '{0}'")]
    UnresolvedReference(String),

    /// `$ref` chains nest deeper than the resolver allows.
    #[error("reference '{reference}' nests deeper than {limit} levels")]
    ReferenceDepth {
        /// Reference being expanded when the limit was hit.
        reference: String,
        /// The nesting limit.
        limit: usize,
    },

    /// A schema failed to compile.
    #[error("invalid schema at {location}: {message}")]
    InvalidSchema {
        /// Where the schema sits in the document.
        location: String,
        /// Compiler message.
        message: String,
    },

    /// A path template uses a segment form the router cannot match.
    #[error(transparent)]
    InvalidPathTemplate(#[from] InvalidTemplate),

    /// Two operations share an id.
    #[error("duplicate operation id '{0}'")]
    DuplicateOperationId(String),

    /// The route table references an operation that was never compiled.
    #[error("no operation registered with id '{0}'")]
    UnknownOperation(String),
}

/// A route lookup failure.
#[derive(Debug, Error)]
pub enum RouteError {
    /// No path template matches.
    #[error("no route matches {method} {path}")]
    NotFound {
        /// Request method.
        method: Method,
        /// Request path.
        path: String,
    },

    /// The path matches a template that does not declare the method.
    #[error("method {method} is not allowed on {path}")]
    MethodNotAllowed {
        /// Request method.
        method: Method,
        /// Request path.
        path: String,
        /// Methods the template declares.
        allowed: Vec<Method>,
    },

    /// The matcher itself failed.
    #[error("route lookup failed: {0}")]
    Other(#[source] BoxError),
}

impl RouteError {
    /// Wraps an arbitrary matcher failure.
    pub fn other(cause: impl Into<BoxError>) -> Self {
        Self::Other(cause.into())
    }

    /// Returns true for [`RouteError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true for [`RouteError::MethodNotAllowed`].
    #[must_use]
    pub fn is_method_not_allowed(&self) -> bool {
        matches!(self, Self::MethodNotAllowed { .. })
    }

    /// Stable name of the failure class, used in generic error bodies.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "RouteNotFound",
            Self::MethodNotAllowed { .. } => "MethodNotAllowed",
            Self::Other(_) => "RouteLookupFailed",
        }
    }
}

/// A value that does not conform to its schema.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("{reason}")]
pub struct SchemaViolation {
    /// Validator message.
    pub reason: String,
    /// JSON pointer of the offending value.
    pub field: String,
    /// The offending value.
    pub value: Value,
    /// The schema fragment holding the failed keyword.
    pub schema: Value,
}

/// Part of a request a failure is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestLocation {
    /// A path parameter.
    Path(String),
    /// A query parameter.
    Query(String),
    /// The raw query string.
    QueryString,
    /// A header parameter.
    Header(String),
    /// The request body.
    Body,
}

impl fmt::Display for RequestLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(name) => write!(f, "path parameter '{name}'"),
            Self::Query(name) => write!(f, "query parameter '{name}'"),
            Self::QueryString => f.write_str("query string"),
            Self::Header(name) => write!(f, "header '{name}'"),
            Self::Body => f.write_str("request body"),
        }
    }
}

/// A request that does not satisfy its operation.
#[derive(Debug, Error)]
#[error("invalid {location} for operation '{operation_id}': {reason}")]
pub struct RequestError {
    /// Matched operation.
    pub operation_id: String,
    /// Offending part of the request.
    pub location: RequestLocation,
    /// Human readable reason.
    pub reason: String,
    /// Field-level detail, when the failure came from a schema check.
    #[source]
    pub violation: Option<SchemaViolation>,
}

impl RequestError {
    /// A failure without field-level detail.
    pub fn new(
        operation_id: impl Into<String>,
        location: RequestLocation,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            operation_id: operation_id.into(),
            location,
            reason: reason.into(),
            violation: None,
        }
    }

    /// A failure raised by a schema check.
    pub fn schema(
        operation_id: impl Into<String>,
        location: RequestLocation,
        violation: SchemaViolation,
    ) -> Self {
        Self {
            operation_id: operation_id.into(),
            location,
            reason: violation.reason.clone(),
            violation: Some(violation),
        }
    }

    /// Field-level detail, if any.
    #[must_use]
    pub fn violation(&self) -> Option<&SchemaViolation> {
        self.violation.as_ref()
    }

    /// Stable name of the failure class.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        "RequestError"
    }
}

/// A response that does not satisfy its operation.
#[derive(Debug, Error)]
#[error("invalid response for operation '{operation_id}' with status {status}: {reason}")]
pub struct ResponseError {
    /// Matched operation.
    pub operation_id: String,
    /// Status the handler produced.
    pub status: StatusCode,
    /// Human readable reason.
    pub reason: String,
    /// Field-level detail, when the failure came from a schema check.
    #[source]
    pub violation: Option<SchemaViolation>,
}

impl ResponseError {
    /// A failure without field-level detail.
    pub fn new(
        operation_id: impl Into<String>,
        status: StatusCode,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            operation_id: operation_id.into(),
            status,
            reason: reason.into(),
            violation: None,
        }
    }

    /// A failure raised by a schema check.
    pub fn schema(
        operation_id: impl Into<String>,
        status: StatusCode,
        violation: SchemaViolation,
    ) -> Self {
        Self {
            operation_id: operation_id.into(),
            status,
            reason: violation.reason.clone(),
            violation: Some(violation),
        }
    }

    /// Field-level detail, if any.
    #[must_use]
    pub fn violation(&self) -> Option<&SchemaViolation> {
        self.violation.as_ref()
    }

    /// Stable name of the failure class.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        "ResponseError"
    }
}
