//! Display names for `oneOf` alternatives.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::ExplainError;
use crate::reference::{dereference, reference_of};

/// Name each alternative sub-schema, in order.
///
/// Names come from the (dereferenced) alternative's `title`, falling back to
/// `Alternative #<n>`. Repeated names get a counter suffix: `A`, `A(2)`, `A(3)`.
///
/// # Errors
///
/// Fails only if a reference alternative cannot be followed.
pub fn alternative_names(
    alternatives: &[Value],
    document: &Value,
) -> Result<Vec<String>, ExplainError> {
    let mut name_counts: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(alternatives.len());

    for (idx, alternative) in alternatives.iter().enumerate() {
        let alternative = if reference_of(alternative).is_some() {
            dereference(alternative, document)?
        } else {
            alternative
        };

        // Boolean schemas and untitled alternatives get a positional name.
        let name = match alternative.get("title").and_then(Value::as_str) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => format!("Alternative #{}", idx + 1),
        };

        let count = name_counts.entry(name.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            names.push(name);
        } else {
            names.push(format!("{}({})", name, count));
        }
    }

    Ok(names)
}

/// The alternatives listed in a `oneOf` keyword value.
///
/// A value that is not an array has no alternatives.
pub fn alternatives_of(validator_value: &Value) -> &[Value] {
    validator_value.as_array().map(Vec::as_slice).unwrap_or(&[])
}
