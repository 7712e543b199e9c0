//! Schema descriptor for records.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::datum::Type;

use super::error::TupleError;

/// One entry of a [`TupleDesc`]: a field type with an optional name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDesc {
    /// Type of the field.
    pub ty: Type,
    /// Name of the field, if any.
    pub name: Option<String>,
}

impl fmt::Display for FieldDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.ty, self.name.as_deref().unwrap_or("null"))
    }
}

/// Ordered description of a record's fields.
///
/// Two descriptors are equal when they have the same number of fields and the
/// same type at every position. Field names take no part in equality or
/// hashing, so `[int a]` equals `[int b]`.
///
/// A descriptor always has at least one field and never changes after
/// construction.
#[derive(Debug, Clone)]
pub struct TupleDesc {
    fields: Vec<FieldDesc>,
}

impl TupleDesc {
    /// Creates a descriptor from parallel type and name lists.
    ///
    /// # Errors
    ///
    /// Returns `TupleError::InvalidSchema` if `types` is empty or the two
    /// lists differ in length.
    pub fn new<N: Into<String>>(
        types: Vec<Type>,
        names: Vec<Option<N>>,
    ) -> Result<Self, TupleError> {
        if types.len() != names.len() {
            return Err(TupleError::InvalidSchema(format!(
                "{} types but {} names",
                types.len(),
                names.len()
            )));
        }
        let fields = types
            .into_iter()
            .zip(names)
            .map(|(ty, name)| FieldDesc {
                ty,
                name: name.map(Into::into),
            })
            .collect();
        Self::from_fields(fields)
    }

    /// Creates a descriptor with anonymous fields.
    ///
    /// # Errors
    ///
    /// Returns `TupleError::InvalidSchema` if `types` is empty.
    pub fn unnamed(types: Vec<Type>) -> Result<Self, TupleError> {
        let fields = types
            .into_iter()
            .map(|ty| FieldDesc { ty, name: None })
            .collect();
        Self::from_fields(fields)
    }

    /// Creates a descriptor from prepared field entries.
    ///
    /// # Errors
    ///
    /// Returns `TupleError::InvalidSchema` if `fields` is empty.
    pub fn from_fields(fields: Vec<FieldDesc>) -> Result<Self, TupleError> {
        if fields.is_empty() {
            return Err(TupleError::InvalidSchema(
                "a schema needs at least one field".to_string(),
            ));
        }
        Ok(Self { fields })
    }

    /// Returns the number of fields.
    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    /// Returns the field entry at `index`.
    pub fn field(&self, index: usize) -> Result<&FieldDesc, TupleError> {
        self.fields.get(index).ok_or(TupleError::IndexOutOfRange {
            index,
            len: self.fields.len(),
        })
    }

    /// Returns the (possibly absent) name of the field at `index`.
    pub fn field_name(&self, index: usize) -> Result<Option<&str>, TupleError> {
        Ok(self.field(index)?.name.as_deref())
    }

    /// Returns the type of the field at `index`.
    pub fn field_type(&self, index: usize) -> Result<Type, TupleError> {
        Ok(self.field(index)?.ty)
    }

    /// Returns the index of the first field named `name`.
    ///
    /// Unnamed fields and empty names never match.
    pub fn index_of(&self, name: &str) -> Result<usize, TupleError> {
        if name.is_empty() {
            return Err(TupleError::NoSuchField(String::new()));
        }
        self.fields
            .iter()
            .position(|field| field.name.as_deref() == Some(name))
            .ok_or_else(|| TupleError::NoSuchField(name.to_string()))
    }

    /// Returns the serialized size of a record with this shape.
    pub fn byte_size(&self) -> usize {
        self.fields.iter().map(|field| field.ty.len()).sum()
    }

    /// Returns the field types in order.
    pub fn types(&self) -> impl Iterator<Item = Type> + '_ {
        self.fields.iter().map(|field| field.ty)
    }

    /// Returns an iterator over the field entries.
    pub fn iter(&self) -> std::slice::Iter<'_, FieldDesc> {
        self.fields.iter()
    }

    /// Concatenates two descriptors: `a`'s fields followed by `b`'s.
    pub fn merge(a: &TupleDesc, b: &TupleDesc) -> TupleDesc {
        let mut fields = Vec::with_capacity(a.fields.len() + b.fields.len());
        fields.extend(a.fields.iter().cloned());
        fields.extend(b.fields.iter().cloned());
        TupleDesc { fields }
    }
}

impl PartialEq for TupleDesc {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len() && self.types().eq(other.types())
    }
}

impl Eq for TupleDesc {}

impl Hash for TupleDesc {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fields.len().hash(state);
        for ty in self.types() {
            ty.hash(state);
        }
    }
}

impl fmt::Display for TupleDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", field)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a TupleDesc {
    type Item = &'a FieldDesc;
    type IntoIter = std::slice::Iter<'a, FieldDesc>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
