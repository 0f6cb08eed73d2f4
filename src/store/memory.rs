//! In-memory keyed store with the schedule access patterns.
//!
//! Besides the primary `(Performer, Performance)` key, the store answers the secondary
//! lookups the persisted attributes exist for:
//!
//! - stage index: `Stage` + `DateStart`
//! - date index: `Date` + `StartSort`
//! - popularity index: sparse over `PopularityBucket`, ordered by `Popularity`
//!
//! Snapshots are JSON arrays of [`crate::types::StoreItem`]s.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use super::RecordStore;
use crate::error::StoreError;
use crate::types::{CanonicalRecord, CompositeKey};

/// A thread-safe, last-write-wins record map.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: Mutex<BTreeMap<CompositeKey, CanonicalRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot written by [`Self::save`]. A missing file yields an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e.into()),
        };
        let records: Vec<CanonicalRecord> = serde_json::from_str(&text)?;
        debug!(path = %path.display(), records = records.len(), "store snapshot loaded");
        Ok(Self::from_records(records))
    }

    /// Build a store from records; later duplicates replace earlier ones.
    pub fn from_records(records: impl IntoIterator<Item = CanonicalRecord>) -> Self {
        let map = records.into_iter().map(|r| (r.key(), r)).collect();
        Self {
            records: Mutex::new(map),
        }
    }

    /// Write all records, in key order, as a pretty-printed JSON snapshot.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let records = self.records()?;
        fs::write(path, serde_json::to_vec_pretty(&records)?)?;
        debug!(path = %path.display(), records = records.len(), "store snapshot saved");
        Ok(())
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.guard().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records in primary-key order.
    pub fn records(&self) -> Result<Vec<CanonicalRecord>, StoreError> {
        Ok(self.guard()?.values().cloned().collect())
    }

    /// Point lookup by composite key.
    pub fn get(&self, performer: &str, performance: &str) -> Result<Option<CanonicalRecord>, StoreError> {
        let key = CompositeKey {
            performer: performer.to_owned(),
            performance: performance.to_owned(),
        };
        Ok(self.guard()?.get(&key).cloned())
    }

    /// Every performance of one performer, ordered by `Performance`.
    pub fn by_performer(&self, performer: &str) -> Result<Vec<CanonicalRecord>, StoreError> {
        Ok(self
            .guard()?
            .iter()
            .filter(|(k, _)| k.performer == performer)
            .map(|(_, r)| r.clone())
            .collect())
    }

    /// Performances on one stage, ordered by `DateStart`.
    ///
    /// `date_start_prefix` narrows the range (`"2025-07-12"` for a day,
    /// `"2025-07-12#20"` for an hour).
    pub fn by_stage(
        &self,
        stage: &str,
        date_start_prefix: Option<&str>,
    ) -> Result<Vec<CanonicalRecord>, StoreError> {
        let prefix = date_start_prefix.unwrap_or("");
        let mut out: Vec<CanonicalRecord> = self
            .guard()?
            .values()
            .filter(|r| r.stage() == stage && r.date_stage_key().starts_with(prefix))
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            a.date_stage_key()
                .cmp(b.date_stage_key())
                .then_with(|| a.performer().cmp(b.performer()))
        });
        Ok(out)
    }

    /// Performances on one date, ordered by `StartSort`.
    pub fn by_date(&self, date: &str) -> Result<Vec<CanonicalRecord>, StoreError> {
        let mut out: Vec<CanonicalRecord> = self
            .guard()?
            .values()
            .filter(|r| r.date() == date)
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            a.start()
                .cmp(&b.start())
                .then_with(|| a.stage().cmp(b.stage()))
                .then_with(|| a.performer().cmp(b.performer()))
        });
        Ok(out)
    }

    /// Records carrying a popularity, most popular first.
    pub fn popular(&self, min_popularity: Option<i64>) -> Result<Vec<CanonicalRecord>, StoreError> {
        let floor = min_popularity.unwrap_or(i64::MIN);
        let mut out: Vec<CanonicalRecord> = self
            .guard()?
            .values()
            .filter(|r| r.popularity_bucket().is_some())
            .filter(|r| r.popularity().is_some_and(|p| p >= floor))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.popularity().cmp(&a.popularity()).then_with(|| a.key().cmp(&b.key())));
        Ok(out)
    }

    fn guard(&self) -> Result<MutexGuard<'_, BTreeMap<CompositeKey, CanonicalRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("record map lock poisoned".to_string()))
    }
}

impl RecordStore for InMemoryRecordStore {
    fn put_batch(&self, batch: &[CanonicalRecord]) -> Result<usize, StoreError> {
        let mut map = self.guard()?;
        for record in batch {
            map.insert(record.key(), record.clone());
        }
        Ok(batch.len())
    }
}
