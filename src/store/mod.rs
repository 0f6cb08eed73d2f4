//! Keyed record store collaborator and the batch upserter that writes to it.
//!
//! Records are keyed by `(Performer, Performance)`. A write whose key matches an existing
//! entry replaces it entirely (last write wins, no field merge).

pub mod memory;

pub use memory::InMemoryRecordStore;

use tracing::debug;

use crate::error::StoreError;
use crate::types::CanonicalRecord;

/// Write access to the keyed schedule store.
pub trait RecordStore: Send + Sync {
    /// Upsert one batch of records, in order.
    ///
    /// Returns how many records the store accepted. An error means the remainder of the
    /// batch was not written.
    fn put_batch(&self, batch: &[CanonicalRecord]) -> Result<usize, StoreError>;
}

/// Writes records to a [`RecordStore`] in fixed-size batches.
///
/// Fail-fast: the first store error aborts the remaining batches and is returned to the
/// caller. Records already accepted stay written.
pub struct BatchUpserter<'a> {
    store: &'a dyn RecordStore,
    batch_size: usize,
}

impl<'a> BatchUpserter<'a> {
    /// Create an upserter. A `batch_size` of zero is treated as one.
    pub fn new(store: &'a dyn RecordStore, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
        }
    }

    /// Write all `records`, returning the number accepted by the store.
    pub fn upsert(&self, records: &[CanonicalRecord]) -> Result<usize, StoreError> {
        let mut written = 0usize;
        for (idx, batch) in records.chunks(self.batch_size).enumerate() {
            let accepted = self.store.put_batch(batch)?;
            debug!(batch = idx, size = batch.len(), accepted, "batch written");
            written += accepted;
        }
        Ok(written)
    }
}
