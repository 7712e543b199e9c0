//! Record (tuple) representation and serialization.
//!
//! A [`Record`] is a single row: an ordered vector of [`Value`]s whose arity
//! and per-position types match some [`TupleDesc`]. Records can be serialized
//! to the fixed-width on-page format described in the [module
//! docs](crate::tuple).

use std::fmt;

use bytes::{Buf, BufMut};

use crate::datum::Value;

use super::desc::TupleDesc;
use super::error::TupleError;

/// A record (tuple/row) consisting of multiple values.
///
/// Where the record was stored (page and slot) is a property of the page that
/// produced it, not of the record.
///
/// # Example
///
/// ```
/// use heapstore::datum::{Type, Value};
/// use heapstore::tuple::{Record, TupleDesc};
///
/// let desc = TupleDesc::unnamed(vec![Type::Int, Type::String]).unwrap();
/// let record = Record::new(vec![Value::Int(42), Value::from("hello")]);
///
/// let mut buf = Vec::new();
/// record.serialize(&desc, &mut buf).unwrap();
/// assert_eq!(buf.len(), desc.byte_size());
///
/// let parsed = Record::deserialize(&mut buf.as_slice(), &desc).unwrap();
/// assert_eq!(parsed, record);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    /// Creates a new record with the given values.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Creates a record shaped like `desc` holding each type's default value.
    pub fn empty(desc: &TupleDesc) -> Self {
        Self {
            values: desc.types().map(|ty| ty.default_value()).collect(),
        }
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the field values in order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consumes the record and returns its values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Returns the value at `index`.
    pub fn get(&self, index: usize) -> Result<&Value, TupleError> {
        self.values.get(index).ok_or(TupleError::IndexOutOfRange {
            index,
            len: self.values.len(),
        })
    }

    /// Replaces the value at `index`.
    ///
    /// The replacement must have the same type as the current value, which
    /// keeps the record conforming to whatever schema it was built for.
    pub fn set(&mut self, index: usize, value: Value) -> Result<(), TupleError> {
        let len = self.values.len();
        let slot = self
            .values
            .get_mut(index)
            .ok_or(TupleError::IndexOutOfRange { index, len })?;
        if slot.ty() != value.ty() {
            return Err(TupleError::TypeMismatch {
                index,
                expected: slot.ty(),
                found: value.ty(),
            });
        }
        *slot = value;
        Ok(())
    }

    /// Checks that this record's arity and field types match `desc`.
    pub fn check_shape(&self, desc: &TupleDesc) -> Result<(), TupleError> {
        if self.values.len() != desc.num_fields() {
            return Err(TupleError::ArityMismatch {
                expected: desc.num_fields(),
                actual: self.values.len(),
            });
        }
        for (index, (value, expected)) in self.values.iter().zip(desc.types()).enumerate() {
            if value.ty() != expected {
                return Err(TupleError::TypeMismatch {
                    index,
                    expected,
                    found: value.ty(),
                });
            }
        }
        Ok(())
    }

    /// Serializes this record, writing exactly `desc.byte_size()` bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the record does not match `desc` or a value cannot
    /// be encoded.
    pub fn serialize<B: BufMut>(&self, desc: &TupleDesc, buf: &mut B) -> Result<usize, TupleError> {
        self.check_shape(desc)?;
        let mut written = 0;
        for value in &self.values {
            written += value.serialize(buf)?;
        }
        Ok(written)
    }

    /// Deserializes a record shaped like `desc` from the front of `buf`.
    pub fn deserialize<B: Buf>(buf: &mut B, desc: &TupleDesc) -> Result<Self, TupleError> {
        let values = desc
            .types()
            .map(|ty| Value::deserialize(buf, ty))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { values })
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, "\t")?;
            }
            write!(f, "{}", value)?;
        }
        Ok(())
    }
}

impl From<Vec<Value>> for Record {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}
