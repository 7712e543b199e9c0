//! Grouping aggregation over heap scans.
//!
//! # Architecture
//!
//! ```text
//! HeapScan (records in page order)
//!       |
//!       |  aggregate_scan
//!       v
//! Aggregator (IntegerAggregator | StringAggregator)
//!       |
//!       |  iterator()
//!       v
//! TupleIterator (one record per group, first-seen order)
//! ```
//!
//! # Components
//!
//! - [`Aggregator`]: Feed/read contract shared by both aggregators
//! - [`IntegerAggregator`]: COUNT, SUM, AVG, MIN, MAX over `Int` fields
//! - [`StringAggregator`]: COUNT over fields of any type
//! - [`aggregate_scan`]: Drives an open scan into an aggregator

mod aggregate;
mod error;
mod integer;
mod string;

pub use aggregate::{AggregateOp, Aggregator, GroupBy, NO_GROUPING, TupleIterator};
pub use error::{AggregateError, ExecError};
pub use integer::IntegerAggregator;
pub use string::StringAggregator;

use tracing::debug;

use crate::heap::HeapScan;
use crate::storage::{PageCache, Storage};

/// Feeds every remaining record of an open scan into `aggregator`.
///
/// The scan's schema is checked against the aggregator before any record is
/// read. Returns the number of records merged.
///
/// # Errors
///
/// Scan failures (including cache refusals) surface as `ExecError::Scan`,
/// aggregator rejections as `ExecError::Aggregate`. Records merged before a
/// failure stay merged.
pub async fn aggregate_scan<S, C, A>(
    scan: &mut HeapScan<'_, S, C>,
    aggregator: &mut A,
) -> Result<usize, ExecError>
where
    S: Storage,
    C: PageCache,
    A: Aggregator + ?Sized,
{
    aggregator.check_input(scan.desc())?;

    let mut merged = 0;
    while scan.has_next().await? {
        let record = scan.next().await?;
        aggregator.merge_tuple_into_group(&record)?;
        merged += 1;
    }
    debug!(merged, op = %aggregator.op(), "aggregated scan");
    Ok(merged)
}
