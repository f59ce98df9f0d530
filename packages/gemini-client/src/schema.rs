//! Schema generation for Gemini structured output.
//!
//! Uses the `schemars` crate to generate JSON schemas from Rust types,
//! then rewrites them into the OpenAPI subset `responseSchema` accepts.
//!
//! # Example
//!
//! ```rust,ignore
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//! use gemini_client::StructuredOutput;
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct Receipt {
//!     merchant: Option<String>,
//!     amount: f64,
//! }
//!
//! let schema = Receipt::gemini_schema();
//! ```

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;

/// Trait for types that can be used as Gemini structured output.
///
/// Automatically implemented for any type that implements
/// `JsonSchema + DeserializeOwned`.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Generate a Gemini-compatible JSON schema for this type.
    ///
    /// `responseSchema` takes an OpenAPI 3.0 schema subset:
    /// 1. No `$ref` references — every definition must be inlined
    /// 2. No `$schema` / `definitions` bookkeeping keys
    /// 3. No `additionalProperties`
    ///
    /// This method transforms the schemars output to meet those rules.
    fn gemini_schema() -> serde_json::Value {
        let schema = schema_for!(Self);
        to_response_schema(serde_json::to_value(schema).unwrap_or_default())
    }

    /// Get the schema name for this type.
    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

// Blanket implementation for all types that satisfy the bounds
impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

/// Rewrite a raw `schemars` schema into the OpenAPI subset
/// `responseSchema` accepts. Useful when the schema value comes from
/// elsewhere rather than a local type.
pub fn to_response_schema(mut value: serde_json::Value) -> serde_json::Value {
    inline_refs(&mut value);
    strip_unsupported_keys(&mut value);

    if let serde_json::Value::Object(map) = &mut value {
        map.remove("definitions");
        map.remove("$schema");
        map.remove("title");
    }

    value
}

/// Inline all $ref references by replacing them with the actual schema
/// from definitions.
fn inline_refs(value: &mut serde_json::Value) {
    let definitions = if let serde_json::Value::Object(map) = value {
        map.get("definitions").cloned()
    } else {
        None
    };

    if let Some(defs) = definitions {
        inline_refs_recursive(value, &defs);
    }
}

fn inline_refs_recursive(value: &mut serde_json::Value, definitions: &serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::String(ref_path)) = map.get("$ref").cloned() {
                if let Some(type_name) = ref_path.strip_prefix("#/definitions/") {
                    if let Some(def) = definitions.get(type_name) {
                        *value = def.clone();
                        inline_refs_recursive(value, definitions);
                        return;
                    }
                }
            }

            for (_, v) in map.iter_mut() {
                inline_refs_recursive(v, definitions);
            }
        }
        serde_json::Value::Array(arr) => {
            for item in arr.iter_mut() {
                inline_refs_recursive(item, definitions);
            }
        }
        _ => {}
    }
}

/// Remove schema keys the Gemini API rejects.
fn strip_unsupported_keys(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            map.remove("additionalProperties");
            for (_, v) in map.iter_mut() {
                strip_unsupported_keys(v);
            }
        }
        serde_json::Value::Array(arr) => {
            for item in arr.iter_mut() {
                strip_unsupported_keys(item);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    struct Line {
        label: String,
        total: f64,
    }

    #[derive(Deserialize, JsonSchema)]
    struct Document {
        merchant: Option<String>,
        lines: Vec<Line>,
    }

    #[test]
    fn nested_types_are_inlined() {
        let schema = Document::gemini_schema();
        let schema_str = serde_json::to_string(&schema).unwrap();

        assert!(!schema_str.contains("$ref"), "refs should be inlined");
        assert!(!schema_str.contains("definitions"));

        let items = &schema["properties"]["lines"]["items"];
        assert_eq!(items["type"], "object");
        assert!(items["properties"].get("label").is_some());
    }

    #[test]
    fn bookkeeping_keys_are_stripped() {
        let schema = Document::gemini_schema();
        let obj = schema.as_object().unwrap();

        assert!(!obj.contains_key("$schema"));
        assert!(!obj.contains_key("title"));
        assert!(!serde_json::to_string(&schema)
            .unwrap()
            .contains("additionalProperties"));
    }

    #[test]
    fn optional_fields_are_not_required() {
        let schema = Document::gemini_schema();
        let required = schema["required"].as_array().unwrap();
        let names: Vec<&str> = required.iter().filter_map(|v| v.as_str()).collect();

        assert!(names.contains(&"lines"));
        assert!(!names.contains(&"merchant"));
    }
}
