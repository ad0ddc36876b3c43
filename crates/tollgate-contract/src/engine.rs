//! Validation engines.
//!
//! [`ValidationEngine`] is the seam the middleware checks traffic through.
//! [`JsonSchemaEngine`] checks parameters and bodies against the compiled
//! schemas carried by the matched [`Operation`].

use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;
use tracing::trace;

use crate::coerce::coerce;
use crate::document::ParameterLocation;
use crate::error::{RequestError, RequestLocation, ResponseError, SchemaViolation};
use crate::input::{RequestValidationInput, ResponseValidationInput};
use crate::media;
use crate::operation::{Content, Operation, Parameter};

/// Checks requests and responses against their operation.
///
/// Implementations are shared across concurrent requests and must not
/// mutate shared state while validating.
pub trait ValidationEngine: Send + Sync {
    /// Checks an inbound request.
    fn validate_request(&self, input: &RequestValidationInput) -> Result<(), RequestError>;

    /// Checks a fully captured response.
    fn validate_response(&self, input: &ResponseValidationInput) -> Result<(), ResponseError>;
}

impl<T: ValidationEngine + ?Sized> ValidationEngine for Arc<T> {
    fn validate_request(&self, input: &RequestValidationInput) -> Result<(), RequestError> {
        (**self).validate_request(input)
    }

    fn validate_response(&self, input: &ResponseValidationInput) -> Result<(), ResponseError> {
        (**self).validate_response(input)
    }
}

/// JSON Schema backed engine.
///
/// Request checks run in a fixed order (path, query, header, body) and
/// stop at the first failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaEngine;

impl JsonSchemaEngine {
    /// Creates the engine.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ValidationEngine for JsonSchemaEngine {
    fn validate_request(&self, input: &RequestValidationInput) -> Result<(), RequestError> {
        let operation = &input.operation;
        let id = operation.id();

        let query: Vec<(String, String)> = match input.request.query() {
            Some(raw) => serde_urlencoded::from_str(raw)
                .map_err(|e| RequestError::new(id, RequestLocation::QueryString, e.to_string()))?,
            None => Vec::new(),
        };

        for location in [
            ParameterLocation::Path,
            ParameterLocation::Query,
            ParameterLocation::Header,
        ] {
            for parameter in operation.parameters().iter().filter(|p| p.location == location) {
                let values: Vec<&str> = match location {
                    ParameterLocation::Path => {
                        input.path_params.get(&parameter.name).into_iter().collect()
                    }
                    ParameterLocation::Query => query
                        .iter()
                        .filter(|(name, _)| *name == parameter.name)
                        .map(|(_, value)| value.as_str())
                        .collect(),
                    ParameterLocation::Header => input
                        .request
                        .headers
                        .get_all(parameter.name.as_str())
                        .iter()
                        .filter_map(|v| v.to_str().ok())
                        .collect(),
                    ParameterLocation::Cookie => Vec::new(),
                };
                check_parameter(operation, parameter, &values)?;
            }
        }

        if input.options.exclude_request_body {
            return Ok(());
        }
        let Some(body) = operation.request_body() else {
            return Ok(());
        };

        if input.request.body.is_empty() {
            if body.required {
                let reason = "request body is required";
                return Err(RequestError::new(id, RequestLocation::Body, reason));
            }
            return Ok(());
        }

        let request = &input.request;
        check_body(&body.content, request.content_type(), &request.body).map_err(|failure| {
            match failure {
                BodyFailure::Reason(reason) => RequestError::new(id, RequestLocation::Body, reason),
                BodyFailure::Violation(violation) => {
                    RequestError::schema(id, RequestLocation::Body, violation)
                }
            }
        })?;

        trace!(operation_id = id, "request conforms");
        Ok(())
    }

    fn validate_response(&self, input: &ResponseValidationInput) -> Result<(), ResponseError> {
        let operation = &input.request.operation;
        let options = &input.request.options;
        let id = operation.id();
        let status = input.status;

        let Some(content) = operation.response_for(status) else {
            if options.include_response_status {
                return Err(ResponseError::new(
                    id,
                    status,
                    format!("status {} is not declared", status.as_u16()),
                ));
            }
            return Ok(());
        };

        if options.exclude_response_body {
            return Ok(());
        }

        check_body(content, input.content_type(), &input.body).map_err(|failure| match failure {
            BodyFailure::Reason(reason) => ResponseError::new(id, status, reason),
            BodyFailure::Violation(violation) => ResponseError::schema(id, status, violation),
        })?;

        trace!(operation_id = id, status = status.as_u16(), "response conforms");
        Ok(())
    }
}

fn check_parameter(
    operation: &Operation,
    parameter: &Parameter,
    values: &[&str],
) -> Result<(), RequestError> {
    let name = parameter.name.clone();
    let location = match parameter.location {
        ParameterLocation::Path => RequestLocation::Path(name),
        ParameterLocation::Query => RequestLocation::Query(name),
        ParameterLocation::Header | ParameterLocation::Cookie => RequestLocation::Header(name),
    };

    if values.is_empty() {
        if parameter.required {
            let reason = "required parameter is missing";
            return Err(RequestError::new(operation.id(), location, reason));
        }
        return Ok(());
    }

    let Some(schema) = &parameter.schema else {
        return Ok(());
    };

    schema.validate(&coerce(values, schema)).map_err(|mut violation| {
        violation.field = format!("/{}{}", parameter.name, violation.field);
        RequestError::schema(operation.id(), location, violation)
    })
}

enum BodyFailure {
    Reason(String),
    Violation(SchemaViolation),
}

fn check_body(
    content: &Content,
    content_type: Option<&str>,
    body: &Bytes,
) -> Result<(), BodyFailure> {
    if content.is_empty() {
        return Ok(());
    }

    let Some(media_type) = content.select(content_type) else {
        return Err(BodyFailure::Reason(match content_type {
            Some(ct) => format!("content type '{ct}' is not declared"),
            None => "content type is missing".to_string(),
        }));
    };
    let Some(schema) = &media_type.schema else {
        return Ok(());
    };

    let essence = media::essence(content_type.unwrap_or(&media_type.range));
    let instance = if media::is_json(&essence) {
        if body.is_empty() {
            return Err(BodyFailure::Reason("body is empty".to_string()));
        }
        serde_json::from_slice::<Value>(body)
            .map_err(|e| BodyFailure::Reason(format!("body is not valid JSON: {e}")))?
    } else if schema.declared_type() == Some("string") {
        Value::String(String::from_utf8_lossy(body).into_owned())
    } else {
        return Ok(());
    };

    schema.validate(&instance).map_err(BodyFailure::Violation)
}
