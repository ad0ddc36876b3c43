//! Contract document model and loading.
//!
//! The model covers the part of an OpenAPI 3.x document that routing and
//! validation need. Everything else in the document is ignored. The raw
//! JSON is retained so `$ref` pointers can be followed anywhere inside it.

use std::path::Path;

use http::Method;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{ContractError, ContractResult};

/// Maximum length of a `$ref` chain.
pub const MAX_REFERENCE_DEPTH: usize = 32;

/// A parsed contract document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiDocument {
    /// Declared OpenAPI version (`3.0.3`, `3.1.0`, ...).
    #[serde(default)]
    pub openapi: String,
    /// Document metadata.
    #[serde(default)]
    pub info: Info,
    /// Server entries; their URL paths become required prefixes.
    #[serde(default)]
    pub servers: Vec<Server>,
    /// Path templates and their operations.
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,
    #[serde(skip)]
    raw: Value,
}

/// Document metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Info {
    /// API title.
    #[serde(default)]
    pub title: String,
    /// API version.
    #[serde(default)]
    pub version: String,
}

/// A server entry.
#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    /// Absolute or relative server URL.
    pub url: String,
}

impl Server {
    /// Path component of the URL without a trailing slash.
    ///
    /// `https://api.example.com/v1/` yields `/v1`; a bare host yields `""`.
    #[must_use]
    pub fn base_path(&self) -> &str {
        let after_scheme = match self.url.find("://") {
            Some(i) => &self.url[i + 3..],
            None => self.url.as_str(),
        };
        let path = if self.url.contains("://") {
            after_scheme.find('/').map_or("", |i| &after_scheme[i..])
        } else {
            after_scheme
        };
        path.trim_end_matches('/')
    }
}

/// Either an inline object or a `$ref` to one.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    /// A `$ref` pointer.
    Ref {
        /// Pointer text, e.g. `#/components/parameters/UserId`.
        #[serde(rename = "$ref")]
        reference: String,
    },
    /// An inline object.
    Item(T),
}

/// Operations registered on one path template.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathItem {
    /// Parameters shared by every operation on the path.
    #[serde(default)]
    pub parameters: Vec<RefOr<ParameterSpec>>,
    #[serde(default)]
    get: Option<OperationSpec>,
    #[serde(default)]
    put: Option<OperationSpec>,
    #[serde(default)]
    post: Option<OperationSpec>,
    #[serde(default)]
    delete: Option<OperationSpec>,
    #[serde(default)]
    options: Option<OperationSpec>,
    #[serde(default)]
    head: Option<OperationSpec>,
    #[serde(default)]
    patch: Option<OperationSpec>,
    #[serde(default)]
    trace: Option<OperationSpec>,
}

impl PathItem {
    /// Declared operations with their methods.
    pub fn operations(&self) -> impl Iterator<Item = (Method, &OperationSpec)> {
        [
            (Method::GET, &self.get),
            (Method::PUT, &self.put),
            (Method::POST, &self.post),
            (Method::DELETE, &self.delete),
            (Method::OPTIONS, &self.options),
            (Method::HEAD, &self.head),
            (Method::PATCH, &self.patch),
            (Method::TRACE, &self.trace),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
    }
}

/// One operation as written in the document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationSpec {
    /// Operation id, if declared.
    #[serde(rename = "operationId", default)]
    pub operation_id: Option<String>,
    /// Operation parameters.
    #[serde(default)]
    pub parameters: Vec<RefOr<ParameterSpec>>,
    /// Request body.
    #[serde(rename = "requestBody", default)]
    pub request_body: Option<RefOr<RequestBodySpec>>,
    /// Responses keyed by status code, `NXX` range or `default`.
    #[serde(default)]
    pub responses: IndexMap<String, RefOr<ResponseSpec>>,
}

/// Where a parameter lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// Templated path segment.
    Path,
    /// Query string.
    Query,
    /// Request header.
    Header,
    /// Cookie. Declared but not checked.
    Cookie,
}

/// A parameter declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct ParameterSpec {
    /// Parameter name.
    pub name: String,
    /// Parameter location.
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// Whether the parameter must be present.
    #[serde(default)]
    pub required: bool,
    /// Value schema.
    #[serde(default)]
    pub schema: Option<Value>,
}

/// A request body declaration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestBodySpec {
    /// Whether an empty body is rejected.
    #[serde(default)]
    pub required: bool,
    /// Schemas keyed by media range.
    #[serde(default)]
    pub content: IndexMap<String, MediaTypeSpec>,
}

/// A response declaration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseSpec {
    /// Free text description.
    #[serde(default)]
    pub description: String,
    /// Schemas keyed by media range. Empty means any body is accepted.
    #[serde(default)]
    pub content: IndexMap<String, MediaTypeSpec>,
}

/// A media type entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaTypeSpec {
    /// Body schema.
    #[serde(default)]
    pub schema: Option<Value>,
}

impl ApiDocument {
    /// The raw document JSON.
    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// True when the document targets OpenAPI 3.1 (JSON Schema 2020-12).
    #[must_use]
    pub fn is_openapi_31(&self) -> bool {
        self.openapi.starts_with("3.1")
    }

    /// Looks up a local `$ref` pointer.
    pub fn lookup(&self, reference: &str) -> ContractResult<&Value> {
        reference
            .strip_prefix('#')
            .and_then(|pointer| self.raw.pointer(pointer))
            .ok_or_else(|| ContractError::UnresolvedReference(reference.to_string()))
    }

    /// Resolves an inline-or-reference entry, following `$ref` chains.
    pub fn resolve<T>(&self, entry: &RefOr<T>) -> ContractResult<T>
    where
        T: DeserializeOwned + Clone,
    {
        let mut reference = match entry {
            RefOr::Item(item) => return Ok(item.clone()),
            RefOr::Ref { reference } => reference.clone(),
        };

        for _ in 0..MAX_REFERENCE_DEPTH {
            let target = self.lookup(&reference)?;
            match target.get("$ref").and_then(Value::as_str) {
                Some(next) => reference = next.to_string(),
                None => return Ok(T::deserialize(target)?),
            }
        }

        Err(ContractError::ReferenceDepth {
            reference,
            limit: MAX_REFERENCE_DEPTH,
        })
    }
}

/// Loads contract documents.
pub struct ContractLoader;

impl ContractLoader {
    /// Loads a JSON document from disk.
    pub async fn from_file(path: impl AsRef<Path>) -> ContractResult<ApiDocument> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading contract document");

        let content = fs::read_to_string(path)
            .await
            .map_err(|source| ContractError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        Self::from_json(&content)
    }

    /// Parses a JSON document.
    pub fn from_json(json: &str) -> ContractResult<ApiDocument> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Builds a document from already-parsed JSON.
    pub fn from_value(value: Value) -> ContractResult<ApiDocument> {
        let mut document = ApiDocument::deserialize(&value)?;
        document.raw = value;

        debug!(
            title = %document.info.title,
            version = %document.info.version,
            paths = document.paths.len(),
            "contract document parsed"
        );

        Ok(document)
    }
}
