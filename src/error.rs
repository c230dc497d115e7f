//! Error types for loading documents, validating workflows and explaining failures.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::ValidationFailure;

/// The explanation machinery was handed a schema or failure it cannot interpret.
///
/// These indicate a malformed schema document or an inconsistent failure
/// report, never a problem with the user's workflow.
#[derive(Debug, Error)]
pub enum ExplainError {
    #[error("schema path {path} not found: {reason}")]
    SchemaPathNotFound { path: String, reason: String },

    #[error("unsupported reference \"{reference}\": only local fragments (#/...) are followed")]
    UnsupportedReference { reference: String },

    #[error("reference cycle detected while following \"{reference}\"")]
    ReferenceCycle { reference: String },

    #[error("nested failure at schema path {path} does not name a oneOf alternative")]
    AlternativeIndex { path: String },

    #[error("cannot compile sub-schema for probing: {message}")]
    ProbeSchema { message: String },
}

/// Errors while reading schema or workflow documents.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML: {source}")]
    InvalidYaml {
        #[source]
        source: serde_yaml::Error,
    },
}

/// Errors while validating a workflow description.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Explain(#[from] ExplainError),

    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("validation failed with {} error(s):\n{message}", failures.len())]
    Invalid {
        failures: Vec<ValidationFailure>,
        /// Rendered explanation of every failure.
        message: String,
    },
}

impl ExplainError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Load(e) => e.exit_code(),
            ValidateError::Explain(e) => e.exit_code(),
            ValidateError::InvalidSchema { .. } => 2,
            ValidateError::Invalid { .. } => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Keyword;

    #[test]
    fn load_error_exit_codes() {
        let err = LoadError::FileNotFound {
            path: PathBuf::from("workflow.yaml"),
        };
        assert_eq!(err.exit_code(), 3);

        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = LoadError::InvalidJson { source };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn validate_error_exit_codes() {
        let err = ValidateError::Invalid {
            failures: vec![ValidationFailure::new(Keyword::Other("type".into()), "bad")],
            message: "In root level of experiment description: bad".into(),
        };
        assert_eq!(err.exit_code(), 1);

        let err = ValidateError::from(ExplainError::ReferenceCycle {
            reference: "#".into(),
        });
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn invalid_display_includes_explanation() {
        let err = ValidateError::Invalid {
            failures: vec![ValidationFailure::new(Keyword::Other("type".into()), "bad")],
            message: "In graph section: bad".into(),
        };
        assert_eq!(
            err.to_string(),
            "validation failed with 1 error(s):\nIn graph section: bad"
        );
    }

    #[test]
    fn explain_error_display() {
        let err = ExplainError::SchemaPathNotFound {
            path: "/properties/nope".into(),
            reason: "no key \"nope\" in object".into(),
        };
        assert_eq!(
            err.to_string(),
            "schema path /properties/nope not found: no key \"nope\" in object"
        );
    }
}
