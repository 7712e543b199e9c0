//! Record shapes and record values.
//!
//! - [`TupleDesc`]: ordered list of field types (with optional names) that
//!   describes a record's shape and serialized size
//! - [`Record`]: a fixed-arity vector of [`Value`](crate::datum::Value)s
//!
//! # Record Serialization
//!
//! Every field type has a fixed width, so a record is the concatenation of
//! its serialized fields and always occupies exactly
//! [`TupleDesc::byte_size`] bytes:
//!
//! ```text
//! +-----------+-----------+-----+-----------+
//! | Field[0]  | Field[1]  | ... | Field[n]  |
//! +-----------+-----------+-----+-----------+
//! ```

mod desc;
mod error;
mod record;

pub use desc::{FieldDesc, TupleDesc};
pub use error::TupleError;
pub use record::Record;
