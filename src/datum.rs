//! Field types and values.
//!
//! [`Type`] is the closed set of primitive field kinds a record can hold, and
//! [`Value`] is a single field tagged with its kind. Every type has a fixed
//! serialized width so that a record's on-page size depends only on its
//! schema.

use std::cmp::Ordering;
use std::fmt;

use bytes::{Buf, BufMut};
use thiserror::Error;

/// Maximum number of bytes in a `String` field body.
pub const STRING_LEN: usize = 128;

/// Errors from value encoding and decoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatumError {
    /// Buffer too small for the operation.
    #[error("buffer too small: need {required} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes required.
        required: usize,
        /// Bytes available.
        available: usize,
    },

    /// String body longer than [`STRING_LEN`].
    #[error("string of {len} bytes exceeds the {max}-byte field limit")]
    StringTooLong { len: usize, max: usize },

    /// Invalid data format.
    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

/// Returns `DatumError::BufferTooSmall` if the buffer is too small.
macro_rules! ensure_buf_len {
    ($len:expr, $required:expr) => {
        if $len < $required {
            return Err(DatumError::BufferTooSmall {
                required: $required,
                available: $len,
            });
        }
    };
}

/// Field type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    /// 32-bit signed integer.
    Int,
    /// Text of at most [`STRING_LEN`] bytes.
    String,
}

impl Type {
    /// Returns the serialized width of a field of this type.
    ///
    /// `String` fields always occupy a 4-byte length prefix plus a padded
    /// body of [`STRING_LEN`] bytes.
    pub const fn len(self) -> usize {
        match self {
            Type::Int => 4,
            Type::String => STRING_LEN + 4,
        }
    }

    /// Returns the default value used to fill freshly created records.
    pub fn default_value(self) -> Value {
        match self {
            Type::Int => Value::Int(0),
            Type::String => Value::String(String::new()),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::String => write!(f, "string"),
        }
    }
}

/// A typed field value.
///
/// Equality and hashing are value based. Values of different kinds are never
/// equal, and [`PartialOrd`] returns `None` for them, so a `Value` can be used
/// directly as a grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// 32-bit signed integer.
    Int(i32),
    /// Bounded text.
    String(String),
}

impl Value {
    /// Returns the type of this value.
    pub fn ty(&self) -> Type {
        match self {
            Value::Int(_) => Type::Int,
            Value::String(_) => Type::String,
        }
    }

    /// Returns the integer payload, or `None` for non-integer values.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(n) => Some(*n),
            Value::String(_) => None,
        }
    }

    /// Returns the text payload, or `None` for non-string values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Int(_) => None,
        }
    }

    /// Serializes this value into `buf`, always writing exactly
    /// `self.ty().len()` bytes.
    ///
    /// # Errors
    ///
    /// Returns `DatumError::BufferTooSmall` if `buf` cannot hold the value and
    /// `DatumError::StringTooLong` if a string body exceeds [`STRING_LEN`].
    pub fn serialize<B: BufMut>(&self, buf: &mut B) -> Result<usize, DatumError> {
        let width = self.ty().len();
        ensure_buf_len!(buf.remaining_mut(), width);
        match self {
            Value::Int(n) => buf.put_i32(*n),
            Value::String(s) => {
                let data = s.as_bytes();
                if data.len() > STRING_LEN {
                    return Err(DatumError::StringTooLong {
                        len: data.len(),
                        max: STRING_LEN,
                    });
                }
                buf.put_u32(data.len() as u32);
                buf.put_slice(data);
                buf.put_bytes(0, STRING_LEN - data.len());
            }
        }
        Ok(width)
    }

    /// Deserializes a value of type `ty` from the front of `buf`, consuming
    /// exactly `ty.len()` bytes.
    ///
    /// # Errors
    ///
    /// Returns `DatumError::BufferTooSmall` if the buffer is too short and
    /// `DatumError::InvalidFormat` for malformed string bodies.
    pub fn deserialize<B: Buf>(buf: &mut B, ty: Type) -> Result<Self, DatumError> {
        ensure_buf_len!(buf.remaining(), ty.len());
        match ty {
            Type::Int => Ok(Value::Int(buf.get_i32())),
            Type::String => {
                let len = buf.get_u32() as usize;
                if len > STRING_LEN {
                    return Err(DatumError::InvalidFormat(format!(
                        "string length {} exceeds {}",
                        len, STRING_LEN
                    )));
                }
                let mut body = [0u8; STRING_LEN];
                buf.copy_to_slice(&mut body);
                let s = std::str::from_utf8(&body[..len])
                    .map_err(|e| DatumError::InvalidFormat(e.to_string()))?;
                Ok(Value::String(s.to_owned()))
            }
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}
