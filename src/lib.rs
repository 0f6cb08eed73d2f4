//! `festival-loader` ingests festival schedule files (CSV or JSON) announced by
//! object-storage notifications, normalizes every row into a [`types::CanonicalRecord`],
//! and upserts the records into a keyed store.
//!
//! The primary entrypoint is [`orchestrator::IngestionOrchestrator`], which is built from
//! three injected collaborators:
//!
//! - an [`storage::ObjectStorage`] to read file bytes
//! - a [`store::RecordStore`] to write records
//! - optionally, a [`notify::Notifier`] that receives exactly one outcome notification
//!   per invocation
//!
//! ## Accepted files
//!
//! - **CSV**: `.csv`, header row + data rows
//! - **JSON**: `.json`, a list of objects or `{"items": [...]}`
//! - anything else is probed as JSON, then CSV
//!
//! Each row needs `Performer`, `Stage`, `Date`, `Start` and `End`; `Popularity` is
//! optional. Times may be 12-hour (`8:00pm`) or 24-hour (`20:00`).
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use festival_loader::envelope::Envelope;
//! use festival_loader::orchestrator::IngestionOrchestrator;
//! use festival_loader::storage::InMemoryObjectStorage;
//! use festival_loader::store::InMemoryRecordStore;
//! use festival_loader::types::ObjectLocation;
//!
//! # fn main() -> Result<(), festival_loader::LoaderError> {
//! let storage = Arc::new(InMemoryObjectStorage::new().with_object(
//!     "fest",
//!     "day 1.csv",
//!     "Performer,Stage,Date,Start,End,Popularity\nThe Midnight,Main,2025-07-12,8:00pm,9:15pm,87\n",
//! ));
//! let store = Arc::new(InMemoryRecordStore::new());
//! let orchestrator = IngestionOrchestrator::new(storage, store.clone());
//!
//! let envelope = Envelope::for_locations(&[ObjectLocation::new("fest", "day 1.csv")]);
//! let summary = orchestrator.run(&envelope)?;
//! assert_eq!(summary.written, 1);
//!
//! let sets = store.by_stage("Main", Some("2025-07-12"))?;
//! assert_eq!(sets[0].performance_key(), "2025-07-12#20:00#Main");
//! # Ok(())
//! # }
//! ```
//!
//! ## Error granularity
//!
//! - a bad row is skipped and reported; the rest of the file is written
//! - a bad transport entry is skipped and reported; other entries are processed
//! - a file that cannot be fetched or decoded, or a store failure, aborts the invocation
//! - an invocation that processed no files but recorded errors fails as a whole
//!
//! ## Modules
//!
//! - [`payload`]: CSV/JSON decoding into [`types::RawRow`]s
//! - [`normalize`]: time parsing and row normalization
//! - [`store`]: keyed record store and batch upserts
//! - [`storage`]: object storage access
//! - [`envelope`]: transport entries and notification documents
//! - [`orchestrator`]: the per-invocation state machine
//! - [`notify`]: outcome notifications
//! - [`config`]: options and TOML configuration
//! - [`error`]: error types

pub mod config;
pub mod envelope;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod notify;
pub mod orchestrator;
pub mod payload;
pub mod storage;
pub mod store;
pub mod types;

pub use error::{ErrorScope, LoaderError, LoaderResult};
