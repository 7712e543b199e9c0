//! Grouping aggregate over integer fields.

use crate::datum::Type;
use crate::tuple::{Record, TupleDesc};

use super::aggregate::{
    AggregateOp, Aggregator, GroupBy, Groups, TupleIterator, check_group_field, group_key,
    result_desc, result_record,
};
use super::error::AggregateError;

/// Running statistics for one group.
///
/// The average is never stored; it is derived from `sum` and `count` when
/// results are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Accumulator {
    count: i64,
    sum: i64,
    min: i32,
    max: i32,
}

impl Accumulator {
    fn new(value: i32) -> Self {
        Self {
            count: 1,
            sum: value as i64,
            min: value,
            max: value,
        }
    }

    /// Folds `value` in. On overflow the accumulator is left unchanged.
    fn update(&mut self, value: i32, op: AggregateOp) -> Result<(), AggregateError> {
        let sum = self
            .sum
            .checked_add(value as i64)
            .ok_or(AggregateError::IntegerOverflow { op })?;
        self.count += 1;
        self.sum = sum;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        Ok(())
    }

    fn finish(&self, op: AggregateOp) -> Result<i32, AggregateError> {
        let wide = match op {
            AggregateOp::Count => self.count,
            AggregateOp::Sum => self.sum,
            AggregateOp::Avg => self.sum / self.count,
            AggregateOp::Min => return Ok(self.min),
            AggregateOp::Max => return Ok(self.max),
        };
        i32::try_from(wide).map_err(|_| AggregateError::IntegerOverflow { op })
    }
}

/// Computes COUNT, SUM, AVG, MIN or MAX of an `Int` field, optionally
/// grouped by another field.
///
/// Every group keeps its own count, sum, minimum and maximum. AVG is the
/// group's `sum / count` with truncating integer division. Sums accumulate in
/// 64 bits; a result that does not fit in an `Int` fails with
/// `AggregateError::IntegerOverflow` when emitted.
///
/// # Example
///
/// ```
/// use heapstore::datum::Value;
/// use heapstore::executor::{AggregateOp, Aggregator, IntegerAggregator, NO_GROUPING};
/// use heapstore::tuple::Record;
///
/// let mut avg = IntegerAggregator::new(NO_GROUPING, 0, AggregateOp::Avg).unwrap();
/// for v in [2, 4, 6] {
///     avg.merge_tuple_into_group(&Record::new(vec![Value::Int(v)])).unwrap();
/// }
/// let results: Vec<_> = avg.iterator().unwrap().collect();
/// assert_eq!(results, vec![Record::new(vec![Value::Int(4)])]);
/// ```
#[derive(Debug, Clone)]
pub struct IntegerAggregator {
    group_by: Option<GroupBy>,
    afield: usize,
    op: AggregateOp,
    desc: TupleDesc,
    groups: Groups<Accumulator>,
}

impl IntegerAggregator {
    /// Creates an aggregator computing `op` over field `afield`.
    pub fn new(
        group_by: Option<GroupBy>,
        afield: usize,
        op: AggregateOp,
    ) -> Result<Self, AggregateError> {
        Ok(Self {
            group_by,
            afield,
            op,
            desc: result_desc(group_by, op)?,
            groups: Groups::default(),
        })
    }

    fn aggregate_value(&self, record: &Record) -> Result<i32, AggregateError> {
        let value = record.get(self.afield)?;
        value.as_int().ok_or(AggregateError::TypeMismatch {
            field: self.afield,
            expected: Type::Int,
            found: value.ty(),
        })
    }
}

impl Aggregator for IntegerAggregator {
    fn merge_tuple_into_group(&mut self, record: &Record) -> Result<(), AggregateError> {
        let key = group_key(self.group_by, record)?;
        let value = self.aggregate_value(record)?;
        match self.groups.get_mut(&key) {
            Some(acc) => acc.update(value, self.op)?,
            None => self.groups.insert(key, Accumulator::new(value)),
        }
        Ok(())
    }

    fn iterator(&self) -> Result<TupleIterator, AggregateError> {
        let records = self
            .groups
            .iter()
            .map(|(key, acc)| Ok(result_record(key, acc.finish(self.op)?)))
            .collect::<Result<Vec<_>, AggregateError>>()?;
        Ok(TupleIterator::new(self.desc.clone(), records))
    }

    fn result_desc(&self) -> &TupleDesc {
        &self.desc
    }

    fn op(&self) -> AggregateOp {
        self.op
    }

    fn check_input(&self, desc: &TupleDesc) -> Result<(), AggregateError> {
        check_group_field(self.group_by, desc)?;
        let found = desc.field_type(self.afield)?;
        if found != Type::Int {
            return Err(AggregateError::TypeMismatch {
                field: self.afield,
                expected: Type::Int,
                found,
            });
        }
        Ok(())
    }
}
