//! Invocation orchestration.
//!
//! One invocation walks `Start -> entries -> file locations -> Finalize`, strictly in
//! order:
//!
//! - Entry-level problems (unparseable body, no file locations) are recorded and the next
//!   entry is processed.
//! - Row-level problems are recorded and the rest of the file is still written.
//! - File-level problems (fetch, decode) and store failures abort the invocation.
//!
//! Exactly one notification is sent per invocation when a [`Notifier`] is attached:
//! success, partial success, or failure. A failure notification is sent before the error
//! is returned.

mod outcome;

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::config::LoaderOptions;
use crate::envelope::{Envelope, TransportEntry};
use crate::error::{LoaderError, LoaderResult};
use crate::normalize::normalize_rows;
use crate::notify::{Notification, NotificationComposer, Notifier};
use crate::payload::decode_payload;
use crate::storage::ObjectStorage;
use crate::store::{BatchUpserter, RecordStore};
use crate::types::ObjectLocation;

pub use outcome::{IngestionOutcome, InvocationStatus, InvocationSummary};

/// Error recorded for an entry whose body is not a notification document.
pub const INVALID_ENVELOPE_BODY: &str = "Invalid envelope body";
/// Error recorded for an entry that names no files.
pub const NO_FILE_LOCATIONS: &str = "No file locations in entry";

/// Runs the ingestion pipeline against injected collaborators.
pub struct IngestionOrchestrator {
    storage: Arc<dyn ObjectStorage>,
    store: Arc<dyn RecordStore>,
    notifier: Option<Arc<dyn Notifier>>,
    options: LoaderOptions,
    composer: NotificationComposer,
}

impl IngestionOrchestrator {
    /// Create an orchestrator with default options and no notification target.
    pub fn new(storage: Arc<dyn ObjectStorage>, store: Arc<dyn RecordStore>) -> Self {
        let options = LoaderOptions::default();
        Self {
            storage,
            store,
            notifier: None,
            composer: NotificationComposer::from_options(&options),
            options,
        }
    }

    /// Attach a notification target.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Replace the options.
    pub fn with_options(mut self, options: LoaderOptions) -> Self {
        self.composer = NotificationComposer::from_options(&options);
        self.options = options;
        self
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Parse a raw transport event and run it.
    ///
    /// An event that cannot be parsed at all is an invocation failure (and is notified as
    /// one).
    pub fn handle_event_json(&self, text: &str) -> LoaderResult<InvocationSummary> {
        match Envelope::from_json(text) {
            Ok(envelope) => self.run(&envelope),
            Err(err) => {
                self.notify_failure(&err);
                Err(err)
            }
        }
    }

    /// Run one invocation end to end, including the outcome notification.
    pub fn run(&self, envelope: &Envelope) -> LoaderResult<InvocationSummary> {
        let result = self
            .process(envelope)
            .and_then(|outcome| outcome.finalize().map(|summary| (outcome, summary)));

        match result {
            Ok((outcome, summary)) => {
                info!(
                    files = summary.files_processed,
                    written = summary.written,
                    errors = summary.errors,
                    status = ?summary.status,
                    "invocation finished"
                );
                self.send(self.composer.compose_outcome(&outcome, Utc::now()));
                Ok(summary)
            }
            Err(err) => {
                error!(error = %err, scope = ?err.scope(), "invocation failed");
                self.notify_failure(&err);
                Err(err)
            }
        }
    }

    /// Walk every entry and file without finalizing or notifying.
    ///
    /// Recoverable errors end up in the returned outcome; fatal ones are returned as `Err`.
    pub fn process(&self, envelope: &Envelope) -> LoaderResult<IngestionOutcome> {
        let mut outcome = IngestionOutcome::new(self.options.max_recorded_errors);
        debug!(entries = envelope.entries.len(), "invocation started");

        for (idx, entry) in envelope.entries.iter().enumerate() {
            let Some(locations) = self.entry_locations(idx, entry, &mut outcome) else {
                continue;
            };
            for location in &locations {
                self.ingest_location(location, &mut outcome)?;
            }
        }

        Ok(outcome)
    }

    /// Fetch, decode, normalize and write one file.
    ///
    /// Rejected rows are recorded in `outcome`. Returns the number of records written.
    pub fn ingest_location(
        &self,
        location: &ObjectLocation,
        outcome: &mut IngestionOutcome,
    ) -> LoaderResult<usize> {
        let bytes = self.storage.fetch(location)?;
        let rows = decode_payload(&location.key, &bytes, self.options.format)?;
        let batch = normalize_rows(&rows);

        for rejected in &batch.rejected {
            warn!(
                bucket = %location.bucket,
                key = %location.key,
                row = rejected.position,
                cause = %rejected.error.cause,
                "row skipped"
            );
            outcome.record_error(format!(
                "Bad row skipped ({}) in {location} row {}: {}",
                rejected.error.cause, rejected.position, rejected.error.row
            ));
        }

        let written = BatchUpserter::new(self.store.as_ref(), self.options.batch_size)
            .upsert(&batch.records)?;
        outcome.record_file(written);

        info!(
            bucket = %location.bucket,
            key = %location.key,
            rows = rows.len(),
            written,
            rejected = batch.rejected.len(),
            "file processed"
        );
        Ok(written)
    }

    fn entry_locations(
        &self,
        idx: usize,
        entry: &TransportEntry,
        outcome: &mut IngestionOutcome,
    ) -> Option<Vec<ObjectLocation>> {
        match entry.locations() {
            Ok(locations) if locations.is_empty() => {
                warn!(entry = idx, message_id = ?entry.message_id, "entry names no files");
                outcome.record_error(NO_FILE_LOCATIONS);
                None
            }
            Ok(locations) => Some(locations),
            Err(err) => {
                warn!(entry = idx, message_id = ?entry.message_id, error = %err, "invalid entry body");
                let preview: String = entry
                    .body_text()
                    .chars()
                    .take(self.options.envelope_preview_chars)
                    .collect();
                outcome.record_error(format!("{INVALID_ENVELOPE_BODY}: {preview}"));
                None
            }
        }
    }

    fn notify_failure(&self, err: &LoaderError) {
        self.send(self.composer.compose_failure(err));
    }

    fn send(&self, notification: Notification) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        if let Err(e) = notifier.publish(&notification) {
            error!(subject = %notification.subject, error = %e, "notification delivery failed");
        }
    }
}
