//! Aggregate operators, the aggregator contract and grouped state.
//!
//! - [`AggregateOp`]: enum of supported aggregate operators
//! - [`Aggregator`]: trait for grouping aggregate computation
//! - [`GroupBy`]: the grouping column, or [`NO_GROUPING`]
//! - [`TupleIterator`]: snapshot of an aggregator's results

use std::collections::HashMap;
use std::fmt;

use crate::datum::{Type, Value};
use crate::tuple::{FieldDesc, Record, TupleDesc};

use super::error::AggregateError;

/// Supported aggregate operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateOp {
    /// MIN: minimum value.
    Min,
    /// MAX: maximum value.
    Max,
    /// SUM: sum of values.
    Sum,
    /// AVG: truncating integer average.
    Avg,
    /// COUNT: number of records.
    Count,
}

impl AggregateOp {
    /// Resolves an operator name (case-insensitive).
    ///
    /// Returns `None` for unknown names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "min" => Some(AggregateOp::Min),
            "max" => Some(AggregateOp::Max),
            "sum" => Some(AggregateOp::Sum),
            "avg" => Some(AggregateOp::Avg),
            "count" => Some(AggregateOp::Count),
            _ => None,
        }
    }
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateOp::Min => write!(f, "MIN"),
            AggregateOp::Max => write!(f, "MAX"),
            AggregateOp::Sum => write!(f, "SUM"),
            AggregateOp::Avg => write!(f, "AVG"),
            AggregateOp::Count => write!(f, "COUNT"),
        }
    }
}

/// Grouping column of an aggregate: its position and expected type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupBy {
    /// Position of the group-by field in input records.
    pub field: usize,
    /// Type every group-by value must have.
    pub ty: Type,
}

impl GroupBy {
    /// Creates a grouping on `field` of type `ty`.
    pub const fn new(field: usize, ty: Type) -> Self {
        Self { field, ty }
    }
}

/// Aggregate over all records as a single group.
pub const NO_GROUPING: Option<GroupBy> = None;

/// A grouping aggregate.
///
/// Records are fed one at a time with
/// [`merge_tuple_into_group`](Aggregator::merge_tuple_into_group); results are
/// read with [`iterator`](Aggregator::iterator), one record per distinct
/// group key, in the order keys were first seen.
pub trait Aggregator {
    /// Folds one input record into its group.
    fn merge_tuple_into_group(&mut self, record: &Record) -> Result<(), AggregateError>;

    /// Returns the current results.
    ///
    /// Each call snapshots the state; later merges do not affect iterators
    /// already returned.
    fn iterator(&self) -> Result<TupleIterator, AggregateError>;

    /// Returns the result schema: `[Int]` without grouping, or
    /// `[group type, Int]` with grouping.
    fn result_desc(&self) -> &TupleDesc;

    /// Returns the configured operator.
    fn op(&self) -> AggregateOp;

    /// Checks up front that records shaped like `desc` can be aggregated.
    fn check_input(&self, desc: &TupleDesc) -> Result<(), AggregateError>;
}

/// Restartable iterator over a snapshot of result records.
#[derive(Debug, Clone)]
pub struct TupleIterator {
    desc: TupleDesc,
    records: Vec<Record>,
    pos: usize,
}

impl TupleIterator {
    /// Creates an iterator over `records`, all shaped like `desc`.
    pub fn new(desc: TupleDesc, records: Vec<Record>) -> Self {
        Self {
            desc,
            records,
            pos: 0,
        }
    }

    /// Returns the schema of the records.
    pub fn desc(&self) -> &TupleDesc {
        &self.desc
    }

    /// Returns true if another record remains.
    pub fn has_next(&self) -> bool {
        self.pos < self.records.len()
    }

    /// Restarts from the first record.
    pub fn rewind(&mut self) {
        self.pos = 0;
    }
}

impl Iterator for TupleIterator {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        let record = self.records.get(self.pos)?.clone();
        self.pos += 1;
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.records.len() - self.pos;
        (left, Some(left))
    }
}

/// Group key; `None` is the single key used without grouping.
pub(super) type GroupKey = Option<Value>;

/// Per-group state kept in first-seen key order.
#[derive(Debug, Clone)]
pub(super) struct Groups<A> {
    index: HashMap<GroupKey, usize>,
    entries: Vec<(GroupKey, A)>,
}

impl<A> Default for Groups<A> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<A> Groups<A> {
    pub(super) fn get_mut(&mut self, key: &GroupKey) -> Option<&mut A> {
        let &slot = self.index.get(key)?;
        Some(&mut self.entries[slot].1)
    }

    pub(super) fn insert(&mut self, key: GroupKey, state: A) {
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, state));
    }

    pub(super) fn iter(&self) -> impl Iterator<Item = &(GroupKey, A)> {
        self.entries.iter()
    }
}

/// Extracts the group key of `record`, checking its type.
pub(super) fn group_key(
    group_by: Option<GroupBy>,
    record: &Record,
) -> Result<GroupKey, AggregateError> {
    let Some(group_by) = group_by else {
        return Ok(None);
    };
    let value = record.get(group_by.field)?;
    if value.ty() != group_by.ty {
        return Err(AggregateError::TypeMismatch {
            field: group_by.field,
            expected: group_by.ty,
            found: value.ty(),
        });
    }
    Ok(Some(value.clone()))
}

/// Builds the result schema for a grouping.
pub(super) fn result_desc(
    group_by: Option<GroupBy>,
    op: AggregateOp,
) -> Result<TupleDesc, AggregateError> {
    let aggregate = FieldDesc {
        ty: Type::Int,
        name: Some(op.to_string()),
    };
    let fields = match group_by {
        Some(group_by) => vec![
            FieldDesc {
                ty: group_by.ty,
                name: None,
            },
            aggregate,
        ],
        None => vec![aggregate],
    };
    Ok(TupleDesc::from_fields(fields)?)
}

/// Checks that `desc` has the group-by field with the expected type.
pub(super) fn check_group_field(
    group_by: Option<GroupBy>,
    desc: &TupleDesc,
) -> Result<(), AggregateError> {
    if let Some(group_by) = group_by {
        let found = desc.field_type(group_by.field)?;
        if found != group_by.ty {
            return Err(AggregateError::TypeMismatch {
                field: group_by.field,
                expected: group_by.ty,
                found,
            });
        }
    }
    Ok(())
}

/// Builds one result record for `key`.
pub(super) fn result_record(key: &GroupKey, aggregate: i32) -> Record {
    match key {
        Some(key) => Record::new(vec![key.clone(), Value::Int(aggregate)]),
        None => Record::new(vec![Value::Int(aggregate)]),
    }
}
