//! String to JSON coercion for parameters.
//!
//! Path segments, query values and headers all arrive as text. Before a
//! parameter schema can be checked the text is turned into the JSON type
//! the schema declares. Text that does not parse is kept as a string so
//! the schema reports the type mismatch itself.

use serde_json::{Number, Value};

use crate::schema::CompiledSchema;

/// Coerces the raw values of one parameter.
///
/// `values` holds every occurrence of the parameter; only arrays use more
/// than the first.
pub(crate) fn coerce(values: &[&str], schema: &CompiledSchema) -> Value {
    match schema.declared_type() {
        Some("array") => {
            let items: Vec<&str> = match values {
                [single] => single.split(',').collect(),
                many => many.to_vec(),
            };
            let item_type = schema.item_type();
            Value::Array(items.into_iter().map(|raw| scalar(raw, item_type)).collect())
        }
        declared => values
            .first()
            .map_or(Value::Null, |raw| scalar(raw, declared)),
    }
}

fn scalar(raw: &str, declared: Option<&str>) -> Value {
    let parsed = match declared {
        Some("integer") => raw.parse::<i64>().ok().map(Value::from),
        Some("number") => raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        Some("boolean") => match raw {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    };
    parsed.unwrap_or_else(|| Value::String(raw.to_string()))
}
