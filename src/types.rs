//! Core types for explaining validation failures.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

/// Number of spaces added per level of message nesting.
pub const INDENT_SIZE: usize = 4;

/// Schema keyword whose failures get a tailored explanation.
pub const ONE_OF: &str = "oneOf";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One step of a path into a JSON document.
///
/// A `Key` made only of digits is still a key: it becomes an array index only
/// when a traversal reaches an array at that step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathToken {
    Key(String),
    Index(usize),
}

impl PathToken {
    /// Interpret this token as an array index, if it can be one.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathToken::Index(i) => Some(*i),
            PathToken::Key(k) if !k.is_empty() && k.bytes().all(|b| b.is_ascii_digit()) => {
                k.parse().ok()
            }
            PathToken::Key(_) => None,
        }
    }

    /// Whether this token is the key `name`.
    pub fn is_key(&self, name: &str) -> bool {
        matches!(self, PathToken::Key(k) if k == name)
    }
}

impl fmt::Display for PathToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathToken::Key(k) => f.write_str(k),
            PathToken::Index(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for PathToken {
    fn from(key: &str) -> Self {
        PathToken::Key(key.to_string())
    }
}

impl From<String> for PathToken {
    fn from(key: String) -> Self {
        PathToken::Key(key)
    }
}

impl From<usize> for PathToken {
    fn from(index: usize) -> Self {
        PathToken::Index(index)
    }
}

/// Render a path as a JSON Pointer style string (`/a/0/b`), used in internal errors.
pub fn pointer_string(path: &[PathToken]) -> String {
    path.iter().map(|t| format!("/{}", t)).collect()
}

/// The validator keyword that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyword {
    /// "Exactly one of N alternatives" (`oneOf`).
    OneOf,
    /// Any keyword explained with the validator's own message.
    Other(String),
}

impl Keyword {
    /// Classify a schema keyword by name.
    pub fn parse(name: &str) -> Self {
        if name == ONE_OF {
            Keyword::OneOf
        } else {
            Keyword::Other(name.to_string())
        }
    }

    /// The keyword's name as it appears in a schema.
    pub fn as_str(&self) -> &str {
        match self {
            Keyword::OneOf => ONE_OF,
            Keyword::Other(name) => name,
        }
    }
}

impl Serialize for Keyword {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A single schema validation failure, with enough context to explain it.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationFailure {
    /// Keyword of the failing rule.
    pub keyword: Keyword,
    /// Absolute path into the validated document.
    pub instance_path: Vec<PathToken>,
    /// Absolute, reference-transparent path into the schema, ending at the keyword.
    pub schema_path: Vec<PathToken>,
    /// The document fragment that failed.
    pub instance: Value,
    /// The keyword's configured value; the alternatives array for `oneOf`.
    pub validator_value: Value,
    /// Failures from evaluating sub-schemas of a compound keyword.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<ValidationFailure>,
    /// The validator's own description of the failure.
    pub message: String,
}

impl ValidationFailure {
    /// Create a failure at the document root with no context.
    pub fn new(keyword: Keyword, message: impl Into<String>) -> Self {
        Self {
            keyword,
            instance_path: Vec::new(),
            schema_path: Vec::new(),
            instance: Value::Null,
            validator_value: Value::Null,
            context: Vec::new(),
            message: message.into(),
        }
    }

    /// Set the instance path.
    pub fn at(mut self, instance_path: Vec<PathToken>) -> Self {
        self.instance_path = instance_path;
        self
    }

    /// Set the schema path.
    pub fn with_schema_path(mut self, schema_path: Vec<PathToken>) -> Self {
        self.schema_path = schema_path;
        self
    }

    /// Set the failing instance fragment.
    pub fn with_instance(mut self, instance: Value) -> Self {
        self.instance = instance;
        self
    }

    /// Set the keyword's configured value.
    pub fn with_validator_value(mut self, validator_value: Value) -> Self {
        self.validator_value = validator_value;
        self
    }

    /// Set the nested failures.
    pub fn with_context(mut self, context: Vec<ValidationFailure>) -> Self {
        self.context = context;
        self
    }
}
