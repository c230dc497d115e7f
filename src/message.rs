//! Turn validation failures into messages an experiment author can act on.
//!
//! A message says *where* the failure is, in terms of the experiment
//! description, and *what* went wrong. `oneOf` failures get a dedicated
//! explanation naming the alternatives; all other keywords use the
//! validator's own message.

use serde_json::Value;

use crate::alternatives::{alternative_names, alternatives_of};
use crate::error::ExplainError;
use crate::locator::locate;
use crate::probe::is_valid_for_sub_schema;
use crate::types::{pointer_string, Keyword, ValidationFailure, INDENT_SIZE};

/// Explain one failure as a single, possibly multi-line, string.
///
/// # Errors
///
/// Returns `ExplainError` if the failure or schema are inconsistent with
/// each other (see [`explain`]).
pub fn explain_one(failure: &ValidationFailure, schema: &Value) -> Result<String, ExplainError> {
    Ok(explain(failure, schema)?.join("\n"))
}

/// Explain several failures, separated by blank lines.
///
/// No failures produce an empty string.
pub fn explain_all<'a, I>(failures: I, schema: &Value) -> Result<String, ExplainError>
where
    I: IntoIterator<Item = &'a ValidationFailure>,
{
    let messages = failures
        .into_iter()
        .map(|failure| explain_one(failure, schema))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(messages.join("\n\n"))
}

/// Explain one failure as message lines.
///
/// Returning lines lets callers nest a message inside another with extra
/// indentation.
///
/// # Errors
///
/// Returns `ExplainError` if an alternative reference cannot be followed,
/// a nested failure does not point at an alternative, or an alternative
/// cannot be compiled for probing.
pub fn explain(failure: &ValidationFailure, schema: &Value) -> Result<Vec<String>, ExplainError> {
    let location = locate(&failure.instance_path);

    let what = match failure.keyword {
        Keyword::OneOf if !failure.context.is_empty() => none_satisfied_lines(failure, schema)?,
        Keyword::OneOf => too_many_satisfied_lines(failure, schema)?,
        Keyword::Other(_) => vec![failure.message.clone()],
    };

    if let [only] = what.as_slice() {
        return Ok(vec![format!("In {}: {}", location, only)]);
    }

    let mut lines = Vec::with_capacity(what.len() + 1);
    lines.push(format!("In {}:", location));
    lines.extend(indent_lines(what));
    Ok(lines)
}

/// `oneOf` where no alternative matched: list the errors per alternative.
fn none_satisfied_lines(
    failure: &ValidationFailure,
    schema: &Value,
) -> Result<Vec<String>, ExplainError> {
    let names = alternative_names(alternatives_of(&failure.validator_value), schema)?;

    let mut lines = vec![format!(
        "Must be exactly one of: {}; all alternatives failed validation.",
        names.join(", ")
    )];

    // Alternative index -> its nested failures, in first-seen order.
    let mut by_alternative: Vec<(usize, Vec<&ValidationFailure>)> = Vec::new();
    for nested in &failure.context {
        let idx = alternative_index(failure, nested, names.len())?;
        match by_alternative.iter_mut().find(|(i, _)| *i == idx) {
            Some((_, group)) => group.push(nested),
            None => by_alternative.push((idx, vec![nested])),
        }
    }

    for (idx, group) in by_alternative {
        lines.push(format!(
            "Errors associated with alternative \"{}\":",
            names[idx]
        ));
        for nested in group {
            lines.extend(indent_lines(explain(nested, schema)?));
        }
    }

    Ok(lines)
}

/// The alternative a nested failure came from.
///
/// Its schema path extends the `oneOf` failure's schema path with the
/// alternative's index.
fn alternative_index(
    failure: &ValidationFailure,
    nested: &ValidationFailure,
    alternative_count: usize,
) -> Result<usize, ExplainError> {
    let prefix_len = failure.schema_path.len();
    nested
        .schema_path
        .get(..prefix_len)
        .filter(|prefix| *prefix == failure.schema_path.as_slice())
        .and_then(|_| nested.schema_path.get(prefix_len))
        .and_then(|token| token.as_index())
        .filter(|idx| *idx < alternative_count)
        .ok_or_else(|| ExplainError::AlternativeIndex {
            path: pointer_string(&nested.schema_path),
        })
}

/// `oneOf` where several alternatives matched: name the ones that did.
///
/// The satisfied list comes from probing each alternative locally, so it can
/// disagree with the validator that reported the failure, and may be empty.
fn too_many_satisfied_lines(
    failure: &ValidationFailure,
    schema: &Value,
) -> Result<Vec<String>, ExplainError> {
    let alternatives = alternatives_of(&failure.validator_value);
    let names = alternative_names(alternatives, schema)?;

    let mut satisfied = Vec::new();
    for (name, alternative) in names.iter().zip(alternatives) {
        if is_valid_for_sub_schema(schema, alternative, &failure.instance)? {
            satisfied.push(name.as_str());
        }
    }

    Ok(vec![format!(
        "Must be exactly one of: {}.  Content satisfied more than one alternative: {}.",
        names.join(", "),
        satisfied.join(", ")
    )])
}

fn indent_lines(lines: Vec<String>) -> impl Iterator<Item = String> {
    let indent = " ".repeat(INDENT_SIZE);
    lines.into_iter().map(move |line| format!("{}{}", indent, line))
}
