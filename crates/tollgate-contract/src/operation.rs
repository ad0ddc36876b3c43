//! Compiled operations.
//!
//! An [`Operation`] is everything the engine needs to check one request and
//! its response: merged parameters, the request body declaration and the
//! response declarations, each with a compiled schema. It is built once when
//! the contract loads and shared read-only afterwards.

use http::{Method, StatusCode};
use tracing::debug;

use crate::document::{
    ApiDocument, MediaTypeSpec, OperationSpec, ParameterLocation, ParameterSpec, PathItem,
};
use crate::error::{ContractError, ContractResult};
use crate::media;
use crate::schema::{CompiledSchema, SchemaDialect};

/// A compiled parameter.
#[derive(Debug)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Where the parameter lives.
    pub location: ParameterLocation,
    /// Whether the parameter must be present.
    pub required: bool,
    /// Value schema, if declared.
    pub schema: Option<CompiledSchema>,
}

/// A media range with its optional schema.
#[derive(Debug)]
pub struct MediaType {
    /// Media range as declared, e.g. `application/json` or `text/*`.
    pub range: String,
    /// Body schema, if declared.
    pub schema: Option<CompiledSchema>,
}

/// The media types a body may take.
#[derive(Debug, Default)]
pub struct Content {
    media_types: Vec<MediaType>,
}

impl Content {
    /// True when no media type is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.media_types.is_empty()
    }

    /// Declared media types in document order.
    #[must_use]
    pub fn media_types(&self) -> &[MediaType] {
        &self.media_types
    }

    /// Picks the media type for a body with the given `Content-Type`.
    ///
    /// Exact matches beat `type/*`, which beats `*/*`. Without a content
    /// type, a single declared media type is used.
    #[must_use]
    pub fn select(&self, content_type: Option<&str>) -> Option<&MediaType> {
        let Some(content_type) = content_type else {
            return match self.media_types.as_slice() {
                [only] => Some(only),
                _ => None,
            };
        };

        let essence = media::essence(content_type);
        self.media_types
            .iter()
            .filter_map(|m| media::specificity(&m.range, &essence).map(|s| (s, m)))
            .fold(None, |best: Option<(u8, &MediaType)>, (score, candidate)| match best {
                Some((best_score, _)) if best_score >= score => best,
                _ => Some((score, candidate)),
            })
            .map(|(_, m)| m)
    }
}

/// A compiled request body declaration.
#[derive(Debug)]
pub struct RequestBody {
    /// Whether an empty body is rejected.
    pub required: bool,
    /// Accepted media types.
    pub content: Content,
}

/// Operation descriptor produced by a route lookup.
#[derive(Debug)]
pub struct Operation {
    id: String,
    method: Method,
    path: String,
    parameters: Vec<Parameter>,
    request_body: Option<RequestBody>,
    responses: Vec<(String, Content)>,
}

impl Operation {
    /// Operation id; `"<METHOD> <path>"` when the document declares none.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path template.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Parameters, path-level first, with operation-level overrides applied.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Request body declaration.
    #[must_use]
    pub fn request_body(&self) -> Option<&RequestBody> {
        self.request_body.as_ref()
    }

    /// Response declaration for `status`: exact code, then `NXX`, then `default`.
    #[must_use]
    pub fn response_for(&self, status: StatusCode) -> Option<&Content> {
        let exact = status.as_str();
        let range = format!("{}XX", &exact[..1]);
        let lookup = |wanted: &str| {
            self.responses
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(wanted))
                .map(|(_, content)| content)
        };

        lookup(exact)
            .or_else(|| lookup(&range))
            .or_else(|| lookup("default"))
    }

    pub(crate) fn compile(
        document: &ApiDocument,
        dialect: SchemaDialect,
        template: &str,
        item: &PathItem,
        method: Method,
        spec: &OperationSpec,
    ) -> ContractResult<Self> {
        let id = spec
            .operation_id
            .clone()
            .unwrap_or_else(|| format!("{method} {template}"));

        let mut declared: Vec<ParameterSpec> = Vec::new();
        for entry in item.parameters.iter().chain(&spec.parameters) {
            let parameter = document.resolve(entry)?;
            match declared
                .iter_mut()
                .find(|p| p.name == parameter.name && p.location == parameter.location)
            {
                Some(existing) => *existing = parameter,
                None => declared.push(parameter),
            }
        }

        let parameters = declared
            .into_iter()
            .map(|p| {
                let schema = p
                    .schema
                    .as_ref()
                    .map(|s| {
                        let location = format!("{id} parameter '{}'", p.name);
                        CompiledSchema::compile(document, s, dialect, &location)
                    })
                    .transpose()?;
                Ok(Parameter {
                    name: p.name,
                    location: p.location,
                    required: p.required || p.location == ParameterLocation::Path,
                    schema,
                })
            })
            .collect::<ContractResult<Vec<_>>>()?;

        let request_body = spec
            .request_body
            .as_ref()
            .map(|entry| {
                let body = document.resolve(entry)?;
                let location = format!("{id} request body");
                Ok::<_, ContractError>(RequestBody {
                    required: body.required,
                    content: compile_content(document, dialect, &body.content, &location)?,
                })
            })
            .transpose()?;

        let responses = spec
            .responses
            .iter()
            .map(|(key, entry)| {
                let response = document.resolve(entry)?;
                let content = compile_content(
                    document,
                    dialect,
                    &response.content,
                    &format!("{id} response {key}"),
                )?;
                Ok((key.clone(), content))
            })
            .collect::<ContractResult<Vec<_>>>()?;

        debug!(
            operation_id = %id,
            method = %method,
            path = template,
            parameters = parameters.len(),
            responses = responses.len(),
            "operation compiled"
        );

        Ok(Self {
            id,
            method,
            path: template.to_string(),
            parameters,
            request_body,
            responses,
        })
    }
}

fn compile_content<'a>(
    document: &ApiDocument,
    dialect: SchemaDialect,
    content: impl IntoIterator<Item = (&'a String, &'a MediaTypeSpec)>,
    location: &str,
) -> ContractResult<Content> {
    let media_types = content
        .into_iter()
        .map(|(range, spec)| {
            let schema = spec
                .schema
                .as_ref()
                .map(|s| {
                    let location = format!("{location} {range}");
                    CompiledSchema::compile(document, s, dialect, &location)
                })
                .transpose()?;
            Ok(MediaType {
                range: range.clone(),
                schema,
            })
        })
        .collect::<ContractResult<Vec<_>>>()?;
    Ok(Content { media_types })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ContractLoader;
    use serde_json::json;

    fn compile(method: Method, template: &str) -> Operation {
        let doc = ContractLoader::from_value(json!({
            "openapi": "3.0.3",
            "paths": {
                "/users/{id}": {
                    "parameters": [
                        {"name": "id", "in": "path", "schema": {"type": "string"}},
                        {"name": "verbose", "in": "query", "schema": {"type": "boolean"}}
                    ],
                    "get": {
                        "operationId": "getUser",
                        "parameters": [
                            {"name": "id", "in": "path", "required": true,
                                "schema": {"type": "integer"}}
                        ],
                        "responses": {
                            "200": {"description": "ok", "content": {
                                "application/json": {"schema": {"type": "object"}}
                            }},
                            "4XX": {"description": "client error"},
                            "default": {"description": "other", "content": {"text/*": {}}}
                        }
                    },
                    "delete": {"responses": {}}
                }
            }
        }))
        .unwrap();
        let item = &doc.paths[template];
        let (_, spec) = item.operations().find(|(m, _)| *m == method).unwrap();
        Operation::compile(&doc, SchemaDialect::Draft4, template, item, method, spec).unwrap()
    }

    #[test]
    fn test_operation_level_parameter_overrides_path_level() {
        let op = compile(Method::GET, "/users/{id}");
        assert_eq!(op.parameters().len(), 2);
        let id = &op.parameters()[0];
        assert_eq!(id.name, "id");
        assert_eq!(id.schema.as_ref().unwrap().declared_type(), Some("integer"));
    }

    #[test]
    fn test_path_parameters_are_always_required() {
        let op = compile(Method::DELETE, "/users/{id}");
        assert!(op.parameters()[0].required);
        assert!(!op.parameters()[1].required);
    }

    #[test]
    fn test_synthetic_id() {
        assert_eq!(compile(Method::DELETE, "/users/{id}").id(), "DELETE /users/{id}");
        assert_eq!(compile(Method::GET, "/users/{id}").id(), "getUser");
    }

    #[test]
    fn test_response_selection_order() {
        let op = compile(Method::GET, "/users/{id}");
        let ok = op.response_for(StatusCode::OK).unwrap();
        assert_eq!(ok.media_types()[0].range, "application/json");
        assert!(op.response_for(StatusCode::NOT_FOUND).unwrap().is_empty());
        let other = op.response_for(StatusCode::INTERNAL_SERVER_ERROR).unwrap();
        assert_eq!(other.media_types()[0].range, "text/*");
        assert!(compile(Method::DELETE, "/users/{id}")
            .response_for(StatusCode::OK)
            .is_none());
    }

    #[test]
    fn test_referenced_request_body_compiles() {
        let doc = ContractLoader::from_value(json!({
            "openapi": "3.0.3",
            "paths": {
                "/users": {
                    "post": {
                        "operationId": "createUser",
                        "requestBody": {"$ref": "#/components/requestBodies/NewUser"},
                        "responses": {}
                    }
                }
            },
            "components": {
                "requestBodies": {
                    "NewUser": {
                        "required": true,
                        "content": {"application/json": {"schema": {"type": "object"}}}
                    }
                }
            }
        }))
        .unwrap();
        let item = &doc.paths["/users"];
        let (_, spec) = item.operations().next().unwrap();
        let op = Operation::compile(&doc, SchemaDialect::Draft4, "/users", item, Method::POST, spec)
            .unwrap();

        let body = op.request_body().unwrap();
        assert!(body.required);
        assert_eq!(body.content.media_types()[0].range, "application/json");
        assert!(body.content.media_types()[0].schema.is_some());
    }

    #[test]
    fn test_content_selection() {
        let op = compile(Method::GET, "/users/{id}");
        let ok = op.response_for(StatusCode::OK).unwrap();
        assert!(ok.select(Some("application/json; charset=utf-8")).is_some());
        assert!(ok.select(None).is_some());
        assert!(ok.select(Some("text/html")).is_none());
    }
}
