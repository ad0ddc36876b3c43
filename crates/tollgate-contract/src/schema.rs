//! Schema preparation and compiled validators.
//!
//! Before compiling, every local `$ref` is inlined and OpenAPI 3.0
//! `nullable` is rewritten into plain JSON Schema. Inlining keeps the
//! schema self-contained, so the fragment that failed can be reported by
//! following the validator's schema path through the prepared schema.

use std::fmt;

use jsonschema::error::ValidationErrorKind;
use jsonschema::Validator;
use serde_json::{json, Map, Value};

use crate::document::{ApiDocument, MAX_REFERENCE_DEPTH};
use crate::error::{ContractError, ContractResult, SchemaViolation};

/// Keys whose values are instance data, never schemas.
const DATA_KEYWORDS: [&str; 5] = ["example", "examples", "enum", "const", "default"];

/// JSON Schema dialect used to compile a document's schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaDialect {
    /// OpenAPI 3.0 schemas.
    Draft4,
    /// OpenAPI 3.1 schemas.
    Draft202012,
}

impl SchemaDialect {
    /// Picks the dialect matching the document's OpenAPI version.
    #[must_use]
    pub fn for_document(document: &ApiDocument) -> Self {
        if document.is_openapi_31() {
            Self::Draft202012
        } else {
            Self::Draft4
        }
    }
}

/// A prepared schema together with its validator.
pub struct CompiledSchema {
    raw: Value,
    validator: Validator,
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("raw", &self.raw)
            .finish_non_exhaustive()
    }
}

impl CompiledSchema {
    /// Prepares and compiles `schema`, taken from `document` at `location`.
    pub fn compile(
        document: &ApiDocument,
        schema: &Value,
        dialect: SchemaDialect,
        location: &str,
    ) -> ContractResult<Self> {
        let raw = inline(document, schema.clone(), 0)?;
        let compiled = match dialect {
            SchemaDialect::Draft4 => jsonschema::draft4::new(&raw),
            SchemaDialect::Draft202012 => jsonschema::draft202012::new(&raw),
        };
        let validator = compiled.map_err(|e| ContractError::InvalidSchema {
            location: location.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { raw, validator })
    }

    /// The prepared schema.
    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// First non-null entry of the schema's `type` keyword.
    #[must_use]
    pub fn declared_type(&self) -> Option<&str> {
        declared_type(&self.raw)
    }

    /// Schema applied to array items, if declared.
    #[must_use]
    pub fn item_type(&self) -> Option<&str> {
        self.raw.get("items").and_then(declared_type)
    }

    /// Checks `instance`, reporting the first violation.
    pub fn validate(&self, instance: &Value) -> Result<(), SchemaViolation> {
        let Some(error) = self.validator.iter_errors(instance).next() else {
            return Ok(());
        };

        let reason = error.to_string();
        let mut field = error.instance_path.to_string();
        if let ValidationErrorKind::Required { property } = &error.kind {
            let name = property
                .as_str()
                .map_or_else(|| property.to_string(), str::to_string);
            field.push('/');
            field.push_str(&name.replace('~', "~0").replace('/', "~1"));
        }

        let schema_path = error.schema_path.to_string();
        let parent = schema_path.rsplit_once('/').map_or("", |(parent, _)| parent);
        let schema = self
            .raw
            .pointer(parent)
            .cloned()
            .unwrap_or_else(|| self.raw.clone());

        Err(SchemaViolation {
            reason,
            field,
            value: error.instance.into_owned(),
            schema,
        })
    }
}

fn declared_type(schema: &Value) -> Option<&str> {
    match schema.get("type")? {
        Value::String(t) => Some(t.as_str()),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null"),
        _ => None,
    }
}

/// Inlines local references and rewrites `nullable`.
///
/// Siblings of `$ref` are dropped, matching OpenAPI 3.0 semantics.
/// Self-referencing schemas hit the depth limit and are rejected.
fn inline(document: &ApiDocument, value: Value, depth: usize) -> ContractResult<Value> {
    match value {
        Value::Object(mut map) => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                if depth >= MAX_REFERENCE_DEPTH {
                    return Err(ContractError::ReferenceDepth {
                        reference: reference.clone(),
                        limit: MAX_REFERENCE_DEPTH,
                    });
                }
                let target = document.lookup(reference)?.clone();
                return inline(document, target, depth + 1);
            }

            if let Some(Value::Bool(nullable)) = map.get("nullable") {
                let nullable = *nullable;
                map.remove("nullable");
                if nullable {
                    let inner = inline(document, Value::Object(map), depth)?;
                    return Ok(json!({"anyOf": [inner, {"type": "null"}]}));
                }
            }

            let mut out = Map::with_capacity(map.len());
            for (key, child) in map {
                let child = if DATA_KEYWORDS.contains(&key.as_str()) {
                    child
                } else {
                    inline(document, child, depth)?
                };
                out.insert(key, child);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .into_iter()
            .map(|item| inline(document, item, depth))
            .collect::<ContractResult<Vec<_>>>()
            .map(Value::Array),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ContractLoader;

    fn document() -> ApiDocument {
        ContractLoader::from_value(json!({
            "openapi": "3.0.3",
            "paths": {},
            "components": {
                "schemas": {
                    "User": {
                        "type": "object",
                        "required": ["id", "name"],
                        "properties": {
                            "id": {"type": "integer"},
                            "name": {"type": "string"},
                            "nickname": {"type": "string", "nullable": true},
                            "age": {"$ref": "#/components/schemas/Age"}
                        }
                    },
                    "Age": {"type": "integer", "minimum": 0},
                    "Loop": {"$ref": "#/components/schemas/Loop"}
                }
            }
        }))
        .unwrap()
    }

    fn user_schema() -> CompiledSchema {
        let doc = document();
        CompiledSchema::compile(
            &doc,
            &json!({"$ref": "#/components/schemas/User"}),
            SchemaDialect::Draft4,
            "test",
        )
        .unwrap()
    }

    #[test]
    fn test_refs_are_inlined() {
        let schema = user_schema();
        assert_eq!(schema.raw()["properties"]["age"]["minimum"], 0);
        assert_eq!(schema.declared_type(), Some("object"));
    }

    #[test]
    fn test_nullable_becomes_any_of() {
        let schema = user_schema();
        assert_eq!(
            schema.raw()["properties"]["nickname"]["anyOf"][1],
            json!({"type": "null"})
        );
        assert!(schema
            .validate(&json!({"id": 1, "name": "aereal", "nickname": null}))
            .is_ok());
    }

    #[test]
    fn test_type_violation() {
        let violation = user_schema()
            .validate(&json!({"id": 1, "name": "aereal", "age": "abc"}))
            .unwrap_err();
        assert_eq!(violation.field, "/age");
        assert_eq!(violation.value, json!("abc"));
        assert_eq!(violation.schema, json!({"type": "integer", "minimum": 0}));
    }

    #[test]
    fn test_required_violation_names_property() {
        let violation = user_schema()
            .validate(&json!({"name": "aereal", "age": 17}))
            .unwrap_err();
        assert_eq!(violation.field, "/id");
        assert!(violation.reason.contains("id"));
        assert_eq!(violation.schema["type"], "object");
    }

    #[test]
    fn test_self_reference_is_rejected() {
        let doc = document();
        let err = CompiledSchema::compile(
            &doc,
            &json!({"$ref": "#/components/schemas/Loop"}),
            SchemaDialect::Draft4,
            "test",
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::ReferenceDepth { .. }));
    }

    #[test]
    fn test_data_keywords_are_untouched() {
        let doc = document();
        let schema = CompiledSchema::compile(
            &doc,
            &json!({"type": "object", "example": {"$ref": "not-a-pointer"}}),
            SchemaDialect::Draft202012,
            "test",
        )
        .unwrap();
        assert_eq!(schema.raw()["example"]["$ref"], "not-a-pointer");
    }

    #[test]
    fn test_declared_type_skips_null() {
        assert_eq!(declared_type(&json!({"type": ["null", "integer"]})), Some("integer"));
        assert_eq!(declared_type(&json!({})), None);
    }
}
