//! Workflow Explain
//!
//! Human-readable explanations of JSON Schema validation failures in
//! experiment descriptions.
//!
//! Validators report failures as low-level facts: a path into the document,
//! a path into the schema, the keyword that failed. This library turns them
//! into messages phrased in terms of the experiment description (its
//! `parameters`, `tasks` and `graph` sections), and explains `oneOf` failures
//! by naming the alternatives and saying which matched or why none did.
//!
//! # Example
//!
//! ```
//! use workflow_explain::{validate_workflow, ValidateError};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {
//!         "parameters": {
//!             "oneOf": [
//!                 { "title": "Parameter mapping", "type": "object" },
//!                 { "title": "Parameter list", "type": "array" }
//!             ]
//!         }
//!     }
//! });
//! let workflow = json!({ "parameters": 42 });
//!
//! match validate_workflow(&schema, &workflow) {
//!     Err(ValidateError::Invalid { message, .. }) => {
//!         assert!(message.starts_with("In global parameters section:"));
//!         assert!(message.contains("Must be exactly one of: Parameter mapping, Parameter list"));
//!     }
//!     _ => unreachable!(),
//! }
//! ```
//!
//! # Locations
//!
//! | Instance path | Described as |
//! |---------------|--------------|
//! | (empty) | `root level of experiment description` |
//! | `/parameters/lr` | `parameter "lr"` |
//! | `/parameters/2` | `parameter #3` |
//! | `/tasks/train/outputs` | `task plugin "train" outputs` |
//! | `/graph/step1/dependencies` | `step "step1" dependencies` |
//! | anything else | `experiment description location /a/b` |

mod alternatives;
mod error;
mod loader;
mod locator;
mod message;
mod probe;
mod reference;
mod types;
mod validator;

pub use alternatives::alternative_names;
pub use error::{ExplainError, LoadError, ValidateError};
pub use loader::{is_url, load_document, load_document_auto, load_document_str, DocumentFormat};
pub use locator::{format_path, locate};
pub use message::{explain, explain_all, explain_one};
pub use probe::is_valid_for_sub_schema;
pub use reference::{
    dereference, extract, extract_by_reference, extract_from_root, reference_to_path,
};
pub use types::{Keyword, PathToken, ValidationFailure};
pub use validator::{validate_workflow, validate_workflow_with_failures};

#[cfg(feature = "remote")]
pub use loader::load_document_url;
