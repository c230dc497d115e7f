//! Schema traversal with transparent `$ref` following.
//!
//! Schema paths reported by validators pass through references as if the
//! referent had been substituted in place. Walking such a path means
//! following every `$ref` met on the way, and every reference is absolute:
//! traversal restarts from the document root, not from the node holding it.

use std::collections::HashSet;

use serde_json::Value;

use crate::error::ExplainError;
use crate::types::{json_type_name, pointer_string, PathToken};

/// Returns the reference string if `node` is a reference node.
///
/// A reference node is an object with a string `$ref`; its other keys are ignored.
pub fn reference_of(node: &Value) -> Option<&str> {
    node.as_object()?.get("$ref")?.as_str()
}

/// Convert a local reference (`#` or `#/a/b`) into a path from the document root.
///
/// Tokens are always keys: an all-digit segment may name an object property
/// or an array element, and only the traversal can tell which.
pub fn reference_to_path(reference: &str) -> Result<Vec<PathToken>, ExplainError> {
    if reference == "#" {
        return Ok(Vec::new());
    }

    let pointer = reference
        .strip_prefix("#/")
        .ok_or_else(|| ExplainError::UnsupportedReference {
            reference: reference.to_string(),
        })?;

    Ok(pointer
        .split('/')
        // Unescape JSON Pointer encoding (~1 = /, ~0 = ~)
        .map(|part| PathToken::Key(part.replace("~1", "/").replace("~0", "~")))
        .collect())
}

/// Split a JSON Pointer (`/a/0/b`, or `""` for the root) into key tokens.
pub fn pointer_to_path(pointer: &str) -> Vec<PathToken> {
    if pointer.is_empty() {
        return Vec::new();
    }
    pointer
        .trim_start_matches('/')
        .split('/')
        .map(|part| PathToken::Key(part.replace("~1", "/").replace("~0", "~")))
        .collect()
}

/// Find the sub-schema addressed by `path`, relative to `node`.
///
/// `path` must not contain `$ref` segments; references are followed as they
/// are met, each one restarting from `document`.
///
/// # Errors
///
/// Returns `ExplainError::SchemaPathNotFound` if a step does not exist,
/// `ExplainError::UnsupportedReference` for non-local references and
/// `ExplainError::ReferenceCycle` if references never make progress.
pub fn extract<'a>(
    path: &[PathToken],
    document: &'a Value,
    node: &'a Value,
) -> Result<&'a Value, ExplainError> {
    let mut walk = Walk {
        seen: HashSet::new(),
        hops: 0,
        budget: (count_references(document) + count_references(node) + 1) * (path.len() + 1),
    };
    extract_inner(path, document, node, &mut walk)
}

/// Find the sub-schema addressed by `path` from the document root.
pub fn extract_from_root<'a>(
    path: &[PathToken],
    document: &'a Value,
) -> Result<&'a Value, ExplainError> {
    extract(path, document, document)
}

/// Find the sub-schema a local reference points to.
pub fn extract_by_reference<'a>(
    reference: &str,
    document: &'a Value,
) -> Result<&'a Value, ExplainError> {
    let path = reference_to_path(reference)?;
    extract_from_root(&path, document)
}

/// Follow `node` through any chain of references to a concrete schema.
pub fn dereference<'a>(node: &'a Value, document: &'a Value) -> Result<&'a Value, ExplainError> {
    extract(&[], document, node)
}

/// Reference-following state for one `extract` call.
struct Walk {
    /// Reference nodes already followed, with the path that was left at the time.
    seen: HashSet<(*const Value, Vec<PathToken>)>,
    hops: usize,
    /// Hop limit for references that keep appending to the path.
    budget: usize,
}

fn extract_inner<'a>(
    path: &[PathToken],
    document: &'a Value,
    node: &'a Value,
    walk: &mut Walk,
) -> Result<&'a Value, ExplainError> {
    if let Some(reference) = reference_of(node) {
        walk.hops += 1;
        let state = (node as *const Value, path.to_vec());
        if walk.hops > walk.budget || !walk.seen.insert(state) {
            return Err(ExplainError::ReferenceCycle {
                reference: reference.to_string(),
            });
        }

        let mut absolute = reference_to_path(reference)?;
        absolute.extend_from_slice(path);
        tracing::trace!(reference, remaining = path.len(), "following schema reference");
        return extract_inner(&absolute, document, document, walk);
    }

    let Some((token, rest)) = path.split_first() else {
        return Ok(node);
    };

    let child = step(node, token).ok_or_else(|| ExplainError::SchemaPathNotFound {
        path: pointer_string(path),
        reason: match node {
            Value::Array(items) => format!("no index {} in array of {}", token, items.len()),
            Value::Object(_) => format!("no key \"{}\" in object", token),
            other => format!("cannot step into {}", json_type_name(other)),
        },
    })?;

    extract_inner(rest, document, child, walk)
}

fn count_references(node: &Value) -> usize {
    let own = usize::from(reference_of(node).is_some());
    let nested: usize = match node {
        Value::Array(items) => items.iter().map(count_references).sum(),
        Value::Object(map) => map.values().map(count_references).sum(),
        _ => 0,
    };
    own + nested
}

/// Take one step into `node`. Arrays coerce the token to an index; objects
/// look it up by its string form.
fn step<'a>(node: &'a Value, token: &PathToken) -> Option<&'a Value> {
    match node {
        Value::Array(items) => items.get(token.as_index()?),
        Value::Object(map) => map.get(&token.to_string()),
        _ => None,
    }
}

/// Type a validator-reported schema path against the schema it came from.
///
/// Steps into arrays become `Index` tokens, `$ref` segments reported while
/// standing on a reference node are dropped, and the node the path ends on
/// is returned alongside.
pub(crate) fn normalize_schema_path<'a>(
    path: &[PathToken],
    document: &'a Value,
    start: &'a Value,
) -> Result<(Vec<PathToken>, &'a Value), ExplainError> {
    let mut node = start;
    let mut typed = Vec::with_capacity(path.len());

    for (i, token) in path.iter().enumerate() {
        if reference_of(node).is_some() {
            node = dereference(node, document)?;
            if token.is_key("$ref") {
                continue;
            }
        }

        let typed_token = match node {
            Value::Array(_) => token.as_index().map(PathToken::Index),
            Value::Object(_) => Some(PathToken::Key(token.to_string())),
            _ => None,
        };
        let next = typed_token.as_ref().and_then(|t| step(node, t));

        match (typed_token, next) {
            (Some(t), Some(child)) => {
                typed.push(t);
                node = child;
            }
            _ => {
                return Err(ExplainError::SchemaPathNotFound {
                    path: pointer_string(&path[i..]),
                    reason: format!("cannot step into {} with \"{}\"", json_type_name(node), token),
                })
            }
        }
    }

    Ok((typed, node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(tokens: &[&str]) -> Vec<PathToken> {
        tokens.iter().map(|t| PathToken::from(*t)).collect()
    }

    #[test]
    fn reference_to_path_forms() {
        assert!(reference_to_path("#").unwrap().is_empty());
        assert_eq!(
            reference_to_path("#/definitions/a~1b/0").unwrap(),
            keys(&["definitions", "a/b", "0"])
        );
        assert!(matches!(
            reference_to_path("other.json#/x"),
            Err(ExplainError::UnsupportedReference { .. })
        ));
    }

    #[test]
    fn pointer_to_path_forms() {
        assert!(pointer_to_path("").is_empty());
        assert_eq!(pointer_to_path("/tasks/0"), keys(&["tasks", "0"]));
        assert_eq!(pointer_to_path("/a~0b"), keys(&["a~b"]));
    }

    #[test]
    fn digits_index_arrays_but_key_objects() {
        let schema = json!({
            "oneOf": [{ "title": "first" }, { "title": "second" }],
            "properties": { "1": { "title": "digit key" } }
        });
        let alt = extract_from_root(&keys(&["oneOf", "1"]), &schema).unwrap();
        assert_eq!(alt["title"], "second");

        let prop = extract_from_root(&keys(&["properties", "1"]), &schema).unwrap();
        assert_eq!(prop["title"], "digit key");
    }

    #[test]
    fn index_zero_is_a_real_step() {
        let schema = json!({ "oneOf": [{ "title": "zero" }] });
        let path = vec![PathToken::from("oneOf"), PathToken::Index(0)];
        assert_eq!(extract_from_root(&path, &schema).unwrap()["title"], "zero");
    }

    #[test]
    fn references_restart_from_root() {
        let schema = json!({
            "definitions": {
                "name": { "type": "string", "title": "Name" },
                "wrapper": { "properties": { "inner": { "$ref": "#/definitions/name" } } }
            },
            "properties": { "a": { "$ref": "#/definitions/wrapper" } }
        });
        let found = extract_from_root(&keys(&["properties", "a", "properties", "inner"]), &schema)
            .unwrap();
        assert_eq!(found["title"], "Name");
    }

    #[test]
    fn siblings_of_ref_are_ignored() {
        let schema = json!({
            "definitions": { "x": { "title": "X" } },
            "properties": { "a": { "$ref": "#/definitions/x", "title": "ignored" } }
        });
        let found = extract_from_root(&keys(&["properties", "a"]), &schema).unwrap();
        assert_eq!(found["title"], "X");
    }

    #[test]
    fn pre_dereferencing_gives_same_result() {
        let schema = json!({
            "definitions": {
                "step": { "properties": { "deps": { "items": { "title": "Dep" } } } }
            }
        });
        let reference_node = json!({ "$ref": "#/definitions/step" });
        let path = keys(&["properties", "deps", "items"]);

        let via_ref = extract(&path, &schema, &reference_node).unwrap();
        let target = extract_by_reference("#/definitions/step", &schema).unwrap();
        let direct = extract(&path, &schema, target).unwrap();
        assert_eq!(via_ref, direct);
    }

    #[test]
    fn hash_reference_is_whole_document() {
        let schema = json!({
            "title": "Root",
            "properties": { "child": { "$ref": "#" } }
        });
        let found = extract_from_root(&keys(&["properties", "child", "properties"]), &schema)
            .unwrap();
        assert!(found.get("child").is_some());
    }

    #[test]
    fn recursive_schema_walks_deep() {
        let schema = json!({
            "definitions": {
                "node": {
                    "properties": { "children": { "items": { "$ref": "#/definitions/node" } } }
                }
            },
            "$ref": "#/definitions/node"
        });
        let path = keys(&[
            "properties", "children", "items", "properties", "children", "items",
        ]);
        let found = extract_from_root(&path, &schema).unwrap();
        assert!(found.get("properties").is_some());
    }

    #[test]
    fn missing_step_is_reported() {
        let schema = json!({ "properties": {} });
        let err = extract_from_root(&keys(&["properties", "nope"]), &schema).unwrap_err();
        assert!(matches!(err, ExplainError::SchemaPathNotFound { .. }));
        assert!(err.to_string().contains("no key \"nope\""));
    }

    #[test]
    fn non_numeric_step_into_array_is_reported() {
        let schema = json!({ "oneOf": [true] });
        let err = extract_from_root(&keys(&["oneOf", "first"]), &schema).unwrap_err();
        assert!(matches!(err, ExplainError::SchemaPathNotFound { .. }));
    }

    #[test]
    fn self_reference_cycle_is_detected() {
        let schema = json!({ "$ref": "#" });
        assert!(matches!(
            extract_from_root(&[], &schema),
            Err(ExplainError::ReferenceCycle { .. })
        ));
    }

    #[test]
    fn growing_reference_cycle_is_detected() {
        let schema = json!({ "a": { "$ref": "#/a/b" } });
        assert!(matches!(
            extract_from_root(&keys(&["a"]), &schema),
            Err(ExplainError::ReferenceCycle { .. })
        ));
    }

    #[test]
    fn mutual_reference_cycle_is_detected() {
        let schema = json!({
            "definitions": {
                "a": { "$ref": "#/definitions/b" },
                "b": { "$ref": "#/definitions/a" }
            }
        });
        assert!(matches!(
            extract_by_reference("#/definitions/a", &schema),
            Err(ExplainError::ReferenceCycle { .. })
        ));
    }

    #[test]
    fn revisiting_a_reference_with_a_different_path_is_not_a_cycle() {
        // /a -> /b/x/q -> /a/y/z/q -> /b/y/z/q
        let schema = json!({
            "a": { "$ref": "#/b" },
            "b": {
                "x": { "$ref": "#/a/y/z" },
                "y": { "z": { "q": { "title": "ok" } } }
            }
        });
        let found = extract_from_root(&keys(&["a", "x", "q"]), &schema).unwrap();
        assert_eq!(found, &json!({ "title": "ok" }));
    }

    #[test]
    fn normalize_types_indices_and_drops_ref_segments() {
        let schema = json!({
            "definitions": { "choice": { "oneOf": [{ "type": "string" }, { "type": "integer" }] } },
            "properties": { "p": { "$ref": "#/definitions/choice" } }
        });
        let reported = keys(&["properties", "p", "$ref", "oneOf", "1", "type"]);
        let (typed, node) = normalize_schema_path(&reported, &schema, &schema).unwrap();
        assert_eq!(
            typed,
            vec![
                PathToken::from("properties"),
                PathToken::from("p"),
                PathToken::from("oneOf"),
                PathToken::Index(1),
                PathToken::from("type"),
            ]
        );
        assert_eq!(node, &json!("integer"));
    }

    #[test]
    fn normalize_accepts_ref_transparent_paths() {
        let schema = json!({
            "definitions": { "choice": { "oneOf": [true, false] } },
            "properties": { "p": { "$ref": "#/definitions/choice" } }
        });
        let (typed, node) =
            normalize_schema_path(&keys(&["properties", "p", "oneOf"]), &schema, &schema).unwrap();
        assert_eq!(typed.len(), 3);
        assert!(node.is_array());
    }
}
