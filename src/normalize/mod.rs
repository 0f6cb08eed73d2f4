//! Normalization of decoded rows into canonical schedule records.
//!
//! - [`time`]: 12/24-hour time-of-day parsing
//! - [`record`]: per-row conversion with derived keys
//!
//! [`normalize_rows`] folds a decoded file into accepted records and rejected rows in a
//! single pass, preserving file order on both sides.

pub mod record;
pub mod time;

pub use record::{normalize_row, parse_popularity_lenient};
pub use time::{ClockTime, normalize_time};

use crate::error::RowError;
use crate::types::{CanonicalRecord, RawRow};

/// A row that failed normalization, with its 1-based position among the decoded rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub position: usize,
    pub error: RowError,
}

/// Records that normalized cleanly, and the rows that did not.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub records: Vec<CanonicalRecord>,
    pub rejected: Vec<RejectedRow>,
}

/// Normalize every row, partitioning successes from failures.
pub fn normalize_rows<'a, I>(rows: I) -> NormalizedBatch
where
    I: IntoIterator<Item = &'a RawRow>,
{
    rows.into_iter()
        .map(normalize_row)
        .enumerate()
        .fold(NormalizedBatch::default(), |mut acc, (idx0, result)| {
            match result {
                Ok(record) => acc.records.push(record),
                Err(error) => acc.rejected.push(RejectedRow {
                    position: idx0 + 1,
                    error,
                }),
            }
            acc
        })
}
