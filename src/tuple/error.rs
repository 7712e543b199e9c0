//! Error types for the tuple module.

use thiserror::Error;

use crate::datum::{DatumError, Type};

/// Errors from schema construction, schema lookups and record access.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TupleError {
    /// Schema constructed from empty or mismatched type/name lists.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// Field index outside `[0, len)`.
    #[error("field index {index} out of range for {len} fields")]
    IndexOutOfRange { index: usize, len: usize },

    /// No field carries the requested name.
    #[error("no field named \"{0}\"")]
    NoSuchField(String),

    /// Value type does not match the field type.
    #[error("type mismatch at field {index}: expected {expected}, found {found}")]
    TypeMismatch {
        index: usize,
        expected: Type,
        found: Type,
    },

    /// Record arity does not match the schema arity.
    #[error("record has {actual} fields, schema expects {expected}")]
    ArityMismatch { expected: usize, actual: usize },

    /// Field encoding error.
    #[error(transparent)]
    Datum(#[from] DatumError),
}
