use serde::Serialize;

use crate::error::{LoaderError, LoaderResult};

/// Counts and error descriptions accumulated over one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionOutcome {
    files_processed: usize,
    items_written: usize,
    error_count: usize,
    errors: Vec<String>,
    max_recorded_errors: usize,
}

impl IngestionOutcome {
    /// Start an empty outcome that retains at most `max_recorded_errors` messages.
    pub fn new(max_recorded_errors: usize) -> Self {
        Self {
            files_processed: 0,
            items_written: 0,
            error_count: 0,
            errors: Vec::new(),
            max_recorded_errors,
        }
    }

    /// Record a recovered error. Messages past the retention bound are counted only.
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.error_count += 1;
        if self.errors.len() < self.max_recorded_errors {
            self.errors.push(message.into());
        }
    }

    /// Record a fully processed file and the records it wrote.
    pub fn record_file(&mut self, written: usize) {
        self.files_processed += 1;
        self.items_written += written;
    }

    pub fn files_processed(&self) -> usize {
        self.files_processed
    }

    pub fn items_written(&self) -> usize {
        self.items_written
    }

    /// Exact number of recovered errors.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Retained error messages, in the order they occurred.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Classify the invocation.
    ///
    /// Nothing processed but errors recorded escalates to [`LoaderError::NoFilesProcessed`].
    /// Anything else is a success, partial when errors were recorded.
    pub fn finalize(&self) -> LoaderResult<InvocationSummary> {
        if self.files_processed == 0 && self.has_errors() {
            return Err(LoaderError::NoFilesProcessed {
                errors: self.error_count,
            });
        }
        let status = if self.has_errors() {
            InvocationStatus::PartialSuccess
        } else {
            InvocationStatus::Success
        };
        Ok(InvocationSummary {
            status,
            files_processed: self.files_processed,
            written: self.items_written,
            errors: self.error_count,
        })
    }
}

/// Success flavour of a finished invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationStatus {
    Success,
    PartialSuccess,
}

/// Result handed back to the transport for a successful (possibly partial) invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InvocationSummary {
    pub status: InvocationStatus,
    pub files_processed: usize,
    pub written: usize,
    pub errors: usize,
}
