//! Count-only grouping aggregate.

use crate::tuple::{Record, TupleDesc};

use super::aggregate::{
    AggregateOp, Aggregator, GroupBy, Groups, TupleIterator, check_group_field, group_key,
    result_desc, result_record,
};
use super::error::AggregateError;

/// Counts records per group.
///
/// Only COUNT is supported, so the aggregate field may have any type; its
/// content is never inspected beyond checking that the record has it.
#[derive(Debug, Clone)]
pub struct StringAggregator {
    group_by: Option<GroupBy>,
    afield: usize,
    desc: TupleDesc,
    groups: Groups<i64>,
}

impl StringAggregator {
    /// Creates a counting aggregator over field `afield`.
    ///
    /// # Errors
    ///
    /// Returns `AggregateError::UnsupportedOperator` for any `op` other than
    /// `AggregateOp::Count`.
    pub fn new(
        group_by: Option<GroupBy>,
        afield: usize,
        op: AggregateOp,
    ) -> Result<Self, AggregateError> {
        if op != AggregateOp::Count {
            return Err(AggregateError::UnsupportedOperator {
                aggregator: "StringAggregator",
                op,
            });
        }
        Ok(Self {
            group_by,
            afield,
            desc: result_desc(group_by, op)?,
            groups: Groups::default(),
        })
    }
}

impl Aggregator for StringAggregator {
    fn merge_tuple_into_group(&mut self, record: &Record) -> Result<(), AggregateError> {
        let key = group_key(self.group_by, record)?;
        record.get(self.afield)?;
        match self.groups.get_mut(&key) {
            Some(count) => *count += 1,
            None => self.groups.insert(key, 1),
        }
        Ok(())
    }

    fn iterator(&self) -> Result<TupleIterator, AggregateError> {
        let records = self
            .groups
            .iter()
            .map(|(key, count)| {
                let count = i32::try_from(*count).map_err(|_| AggregateError::IntegerOverflow {
                    op: AggregateOp::Count,
                })?;
                Ok(result_record(key, count))
            })
            .collect::<Result<Vec<_>, AggregateError>>()?;
        Ok(TupleIterator::new(self.desc.clone(), records))
    }

    fn result_desc(&self) -> &TupleDesc {
        &self.desc
    }

    fn op(&self) -> AggregateOp {
        AggregateOp::Count
    }

    fn check_input(&self, desc: &TupleDesc) -> Result<(), AggregateError> {
        check_group_field(self.group_by, desc)?;
        desc.field(self.afield)?;
        Ok(())
    }
}
