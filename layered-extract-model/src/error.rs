//! Error types for schemas and records.

use thiserror::Error;

/// Errors raised by field access, assignment and schema construction.
///
/// Failed merges are not errors: the merge operations return `false`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    /// A field name or keypath segment that the schema does not declare.
    #[error("{schema} has no field `{field}`")]
    UnknownField { schema: String, field: String },

    /// A value the field's declared kind cannot accept.
    #[error("field `{field}` expects {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    /// A required, non-contextual field with nothing to fill it. Only raised
    /// while interpreting a match, where it rejects the candidate.
    #[error("required field `{field}` has no value")]
    MissingRequiredField { field: String },

    #[error("invalid model configuration: {0}")]
    InvalidConfiguration(String),

    #[error("cannot deserialize {schema}: {message}")]
    Deserialize { schema: String, message: String },
}

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
