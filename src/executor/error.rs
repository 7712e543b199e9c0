//! Executor-specific errors.

use thiserror::Error;

use crate::datum::Type;
use crate::heap::ScanError;
use crate::tuple::TupleError;

use super::aggregate::AggregateOp;

/// Errors from aggregator construction and feeding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    /// The aggregator does not implement this operator.
    #[error("{aggregator} does not support {op}")]
    UnsupportedOperator {
        aggregator: &'static str,
        op: AggregateOp,
    },

    /// A field holds a value of the wrong type.
    #[error("field {field}: expected {expected}, found {found}")]
    TypeMismatch {
        field: usize,
        expected: Type,
        found: Type,
    },

    /// An aggregate value does not fit its result type.
    #[error("integer overflow computing {op}")]
    IntegerOverflow { op: AggregateOp },

    /// A record is missing a field the aggregator reads.
    #[error(transparent)]
    Tuple(#[from] TupleError),
}

/// Errors from running an aggregate over a scan.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The scan failed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The aggregator rejected a record.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}
