//! Validate a document fragment against one sub-schema of a larger schema.
//!
//! A sub-schema lifted out of its document still refers to the rest of that
//! document through local references (`#/definitions/...`). Those must keep
//! pointing at the full document, so the probe serves the document under an
//! internal URI and rewrites the sub-schema's local references to target it.

use serde_json::{Map, Value};

use crate::error::ExplainError;

/// URI the full schema document is served under while probing.
const DOCUMENT_URI: &str = "urn:workflow-explain:document";

/// Serves the full schema document to the validator.
struct DocumentRetriever {
    document: Value,
}

impl jsonschema::Retrieve for DocumentRetriever {
    fn retrieve(
        &self,
        uri: &jsonschema::Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let requested = uri.as_str().trim_end_matches('#');
        let own_id = self
            .document
            .get("$id")
            .and_then(Value::as_str)
            .map(|id| id.trim_end_matches('#'));

        if requested == DOCUMENT_URI || own_id == Some(requested) {
            Ok(self.document.clone())
        } else {
            Err(format!("schema not available for URI: {requested}").into())
        }
    }
}

/// Compile a validator for `sub_schema` whose local references resolve
/// against `document`.
///
/// The document's `$schema` is inherited so the same draft applies.
///
/// # Errors
///
/// Returns `ExplainError::ProbeSchema` if the validator cannot be built.
pub fn compile_sub_schema(
    document: &Value,
    sub_schema: &Value,
) -> Result<jsonschema::Validator, ExplainError> {
    let mut schema = anchor_local_refs(sub_schema);
    if let (Value::Object(map), Some(draft)) = (&mut schema, document.get("$schema")) {
        map.entry("$schema").or_insert_with(|| draft.clone());
    }

    tracing::debug!("compiling sub-schema probe");

    jsonschema::options()
        .with_retriever(DocumentRetriever {
            document: document.clone(),
        })
        .build(&schema)
        .map_err(|e| ExplainError::ProbeSchema {
            message: e.to_string(),
        })
}

/// Whether `sub_instance` is valid against `sub_schema`, a part of `document`.
///
/// # Errors
///
/// Returns `ExplainError::ProbeSchema` if the sub-schema cannot be compiled.
pub fn is_valid_for_sub_schema(
    document: &Value,
    sub_schema: &Value,
    sub_instance: &Value,
) -> Result<bool, ExplainError> {
    let validator = compile_sub_schema(document, sub_schema)?;
    Ok(validator.is_valid(sub_instance))
}

/// Keywords whose values are instance data, not schemas.
const LITERAL_KEYWORDS: &[&str] = &["const", "enum", "default", "examples"];

/// Keywords whose values map names to schemas.
const SCHEMA_MAP_KEYWORDS: &[&str] = &[
    "properties",
    "patternProperties",
    "definitions",
    "$defs",
    "dependentSchemas",
];

/// Copy of `value` with every local `$ref` (`#...`) pointed at the full document.
fn anchor_local_refs(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let anchored: Map<String, Value> = map
                .iter()
                .map(|(key, val)| {
                    let val = match (key.as_str(), val) {
                        ("$ref", Value::String(r)) if r.starts_with('#') => {
                            Value::String(format!("{DOCUMENT_URI}{r}"))
                        }
                        (k, _) if LITERAL_KEYWORDS.contains(&k) => val.clone(),
                        (k, Value::Object(named)) if SCHEMA_MAP_KEYWORDS.contains(&k) => {
                            Value::Object(
                                named
                                    .iter()
                                    .map(|(name, schema)| (name.clone(), anchor_local_refs(schema)))
                                    .collect(),
                            )
                        }
                        _ => anchor_local_refs(val),
                    };
                    (key.clone(), val)
                })
                .collect();
            Value::Object(anchored)
        }
        Value::Array(items) => Value::Array(items.iter().map(anchor_local_refs).collect()),
        other => other.clone(),
    }
}
