//! Workflow validation with explained failures.

use jsonschema::error::ValidationErrorKind;
use serde_json::Value;

use crate::alternatives::alternatives_of;
use crate::error::{ExplainError, ValidateError};
use crate::message::explain_all;
use crate::probe::compile_sub_schema;
use crate::reference::{normalize_schema_path, pointer_to_path};
use crate::types::{Keyword, PathToken, ValidationFailure};

/// Validate a workflow description against its schema.
///
/// # Errors
///
/// Returns `ValidateError::Invalid` with every failure and their rendered
/// explanation if the workflow doesn't match the schema,
/// `ValidateError::InvalidSchema` if the schema cannot be compiled, or
/// `ValidateError::Explain` if the failures cannot be explained.
pub fn validate_workflow(schema: &Value, workflow: &Value) -> Result<(), ValidateError> {
    let failures = validate_workflow_with_failures(schema, workflow)?;
    if failures.is_empty() {
        return Ok(());
    }

    let message = explain_all(&failures, schema)?;
    Err(ValidateError::Invalid { failures, message })
}

/// Validate a workflow description and return its failures without rendering them.
///
/// An empty list means the workflow is valid.
pub fn validate_workflow_with_failures(
    schema: &Value,
    workflow: &Value,
) -> Result<Vec<ValidationFailure>, ValidateError> {
    let validator =
        jsonschema::validator_for(schema).map_err(|e| ValidateError::InvalidSchema {
            message: e.to_string(),
        })?;

    let origin = Origin {
        schema_node: schema,
        schema_path: Vec::new(),
        instance: workflow,
        instance_path: Vec::new(),
    };

    let failures = validator
        .iter_errors(workflow)
        .map(|error| to_failure(&error, schema, &origin))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(count = failures.len(), "validated workflow");
    Ok(failures)
}

/// Where a validator's relative paths start, within the full schema and document.
struct Origin<'a> {
    schema_node: &'a Value,
    schema_path: Vec<PathToken>,
    instance: &'a Value,
    instance_path: Vec<PathToken>,
}

fn to_failure(
    error: &jsonschema::ValidationError<'_>,
    document: &Value,
    origin: &Origin<'_>,
) -> Result<ValidationFailure, ExplainError> {
    let reported = pointer_to_path(&error.schema_path.to_string());

    let mut instance_path = origin.instance_path.clone();
    instance_path.extend(type_instance_path(
        pointer_to_path(&error.instance_path.to_string()),
        origin.instance,
    ));

    let mut schema_path = origin.schema_path.clone();
    let (mut keyword, validator_value) =
        match normalize_schema_path(&reported, document, origin.schema_node) {
            Ok((typed, node)) => {
                schema_path.extend(typed);
                (keyword_of(&schema_path), node.clone())
            }
            Err(e) => {
                // Keep the failure; without the keyword's value only the
                // generic message can be given.
                tracing::warn!(error = %e, "cannot locate failing keyword in schema");
                schema_path.extend(reported);
                let name = schema_path.last().map(ToString::to_string).unwrap_or_default();
                (Keyword::Other(name), Value::Null)
            }
        };

    if keyword == Keyword::OneOf && !validator_value.is_array() {
        keyword = Keyword::Other(keyword.as_str().to_string());
    }

    let instance = error.instance.clone().into_owned();
    let context = if keyword == Keyword::OneOf
        && matches!(error.kind, ValidationErrorKind::OneOfNotValid { .. })
    {
        alternative_failures(document, &validator_value, &schema_path, &instance, &instance_path)?
    } else {
        Vec::new()
    };

    Ok(ValidationFailure {
        keyword,
        instance_path,
        schema_path,
        instance,
        validator_value,
        context,
        message: error.to_string(),
    })
}

/// Failures of each `oneOf` alternative against `instance`, with paths made
/// absolute: schema paths continue through the alternative's index.
fn alternative_failures(
    document: &Value,
    alternatives: &Value,
    one_of_path: &[PathToken],
    instance: &Value,
    instance_path: &[PathToken],
) -> Result<Vec<ValidationFailure>, ExplainError> {
    let mut context = Vec::new();

    for (idx, alternative) in alternatives_of(alternatives).iter().enumerate() {
        let validator = compile_sub_schema(document, alternative)?;

        let mut schema_path = one_of_path.to_vec();
        schema_path.push(PathToken::Index(idx));
        let origin = Origin {
            schema_node: alternative,
            schema_path,
            instance,
            instance_path: instance_path.to_vec(),
        };

        for error in validator.iter_errors(instance) {
            context.push(to_failure(&error, document, &origin)?);
        }
    }

    tracing::trace!(count = context.len(), "collected oneOf alternative failures");
    Ok(context)
}

fn keyword_of(schema_path: &[PathToken]) -> Keyword {
    match schema_path.last() {
        Some(PathToken::Key(name)) => Keyword::parse(name),
        Some(PathToken::Index(i)) => Keyword::Other(i.to_string()),
        None => Keyword::Other(String::new()),
    }
}

/// Mark steps into arrays as indices by walking the instance alongside the path.
fn type_instance_path(tokens: Vec<PathToken>, root: &Value) -> Vec<PathToken> {
    let mut node = Some(root);
    tokens
        .into_iter()
        .map(|token| {
            let typed = match (node, token.as_index()) {
                (Some(Value::Array(_)), Some(i)) => PathToken::Index(i),
                _ => token,
            };
            node = node.and_then(|n| match (n, &typed) {
                (Value::Array(items), PathToken::Index(i)) => items.get(*i),
                (Value::Object(map), PathToken::Key(k)) => map.get(k),
                _ => None,
            });
            typed
        })
        .collect()
}
