//! Core data model types for schedule ingestion.
//!
//! Decoders produce loosely-typed [`RawRow`]s; the normalizer turns each into a
//! [`CanonicalRecord`], which is what the keyed store persists (as a [`StoreItem`]).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::normalize::time::{ClockTime, normalize_time};

/// Discriminator written next to `Popularity` so a sparse index only sees popular rows.
pub const POPULARITY_BUCKET: &str = "POPULARITY";

/// An unordered mapping from field name to value, as decoded from a CSV or JSON source.
///
/// A value of `None` means the field was present but had no value (JSON `null`, or a
/// CSV row shorter than its header). Untrusted input: nothing is validated here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow(BTreeMap<String, Option<String>>);

impl RawRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field value, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: Option<String>) {
        self.0.insert(name.into(), value);
    }

    /// Returns the value of `name`, or `None` if the field is absent or null.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|v| v.as_deref())
    }

    /// Returns true if the field is present (even if null).
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

impl<K, V> FromIterator<(K, V)> for RawRow
where
    K: Into<String>,
    V: Into<Option<String>>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl fmt::Display for RawRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.0) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{:?}", self.0),
        }
    }
}

/// Where a payload lives in object storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    /// Create a location from bucket and (already unescaped) key.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// The primary key of a stored record: `(Performer, Performance)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompositeKey {
    pub performer: String,
    pub performance: String,
}

/// A normalized schedule entry.
///
/// Fields are private so the derived values (minutes, keys, popularity bucket) can only
/// be produced together by [`CanonicalRecord::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "StoreItem", try_from = "StoreItem")]
pub struct CanonicalRecord {
    performer: String,
    stage: String,
    date: String,
    start: ClockTime,
    end: ClockTime,
    performance_key: String,
    date_stage_key: String,
    popularity: Option<i64>,
}

impl CanonicalRecord {
    /// Build a record and derive its secondary keys.
    ///
    /// `performer`, `stage` and `date` are expected to be trimmed already.
    pub fn new(
        performer: impl Into<String>,
        stage: impl Into<String>,
        date: impl Into<String>,
        start: ClockTime,
        end: ClockTime,
        popularity: Option<i64>,
    ) -> Self {
        let performer = performer.into();
        let stage = stage.into();
        let date = date.into();
        let date_stage_key = format!("{date}#{}", start.hhmm());
        let performance_key = format!("{date_stage_key}#{stage}");
        Self {
            performer,
            stage,
            date,
            start,
            end,
            performance_key,
            date_stage_key,
            popularity,
        }
    }

    pub fn performer(&self) -> &str {
        &self.performer
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn start(&self) -> ClockTime {
        self.start
    }

    pub fn end(&self) -> ClockTime {
        self.end
    }

    /// `Date#StartTime#Stage`; the sort key of the primary index.
    pub fn performance_key(&self) -> &str {
        &self.performance_key
    }

    /// `Date#StartTime`; the sort key of the stage index.
    pub fn date_stage_key(&self) -> &str {
        &self.date_stage_key
    }

    pub fn popularity(&self) -> Option<i64> {
        self.popularity
    }

    /// `Some("POPULARITY")` exactly when [`Self::popularity`] is set.
    pub fn popularity_bucket(&self) -> Option<&'static str> {
        self.popularity.map(|_| POPULARITY_BUCKET)
    }

    /// The `(Performer, Performance)` pair identifying this record in the store.
    pub fn key(&self) -> CompositeKey {
        CompositeKey {
            performer: self.performer.clone(),
            performance: self.performance_key.clone(),
        }
    }

    /// Render the persisted attribute set.
    pub fn to_item(&self) -> StoreItem {
        StoreItem::from(self.clone())
    }
}

/// The persisted shape of a [`CanonicalRecord`], using the store's attribute names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StoreItem {
    pub performer: String,
    pub performance: String,
    pub stage: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub start_minutes: u32,
    pub end_minutes: u32,
    pub date_start: String,
    pub start_sort: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity_bucket: Option<String>,
}

impl From<CanonicalRecord> for StoreItem {
    fn from(r: CanonicalRecord) -> Self {
        let popularity_bucket = r.popularity_bucket().map(str::to_owned);
        Self {
            start_time: r.start.hhmm(),
            end_time: r.end.hhmm(),
            start_minutes: r.start.minutes(),
            end_minutes: r.end.minutes(),
            start_sort: r.start.hhmm(),
            performer: r.performer,
            performance: r.performance_key,
            stage: r.stage,
            date: r.date,
            date_start: r.date_stage_key,
            popularity: r.popularity,
            popularity_bucket,
        }
    }
}

impl TryFrom<StoreItem> for CanonicalRecord {
    type Error = String;

    /// Rebuilds a record from a stored item, re-deriving every computed attribute.
    fn try_from(item: StoreItem) -> Result<Self, Self::Error> {
        let start = normalize_time(&item.start_time).map_err(|e| format!("StartTime: {e}"))?;
        let end = normalize_time(&item.end_time).map_err(|e| format!("EndTime: {e}"))?;
        if item.popularity.is_some() != item.popularity_bucket.is_some() {
            return Err("Popularity and PopularityBucket must be set together".to_string());
        }
        let record = CanonicalRecord::new(
            item.performer,
            item.stage,
            item.date,
            start,
            end,
            item.popularity,
        );
        if record.performance_key != item.performance {
            return Err(format!(
                "Performance '{}' does not match derived key '{}'",
                item.performance, record.performance_key
            ));
        }
        Ok(record)
    }
}
