//! Notification subject and body composition.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::Notification;
use crate::config::LoaderOptions;
use crate::error::LoaderError;
use crate::orchestrator::IngestionOutcome;

/// Builds operator notifications from invocation results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationComposer {
    subject_prefix: String,
    max_reported_errors: usize,
}

#[derive(Debug, Serialize)]
struct OutcomeReport<'a> {
    files_processed: usize,
    items_written: usize,
    error_count: usize,
    errors: &'a [String],
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct FailureReport {
    error: String,
}

impl NotificationComposer {
    pub fn new(subject_prefix: impl Into<String>, max_reported_errors: usize) -> Self {
        Self {
            subject_prefix: subject_prefix.into(),
            max_reported_errors,
        }
    }

    pub fn from_options(options: &LoaderOptions) -> Self {
        Self::new(options.subject_prefix.clone(), options.max_reported_errors)
    }

    /// `Success: N items`, or `Partial Success: N items, M errors` when errors were recorded.
    pub fn outcome_subject(&self, outcome: &IngestionOutcome) -> String {
        let text = if outcome.has_errors() {
            format!(
                "Partial Success: {} items, {} errors",
                outcome.items_written(),
                outcome.error_count()
            )
        } else {
            format!("Success: {} items", outcome.items_written())
        };
        self.subject(&text)
    }

    /// Success or partial-success notification, stamped with `at`.
    pub fn compose_outcome(&self, outcome: &IngestionOutcome, at: DateTime<Utc>) -> Notification {
        let errors = outcome.errors();
        let report = OutcomeReport {
            files_processed: outcome.files_processed(),
            items_written: outcome.items_written(),
            error_count: outcome.error_count(),
            errors: &errors[..errors.len().min(self.max_reported_errors)],
            timestamp: at.to_rfc3339_opts(SecondsFormat::Micros, true),
        };
        Notification {
            subject: self.outcome_subject(outcome),
            body: render(&report),
        }
    }

    /// Failure notification carrying only the top-level error message.
    pub fn compose_failure(&self, error: &LoaderError) -> Notification {
        let report = FailureReport {
            error: error.to_string(),
        };
        Notification {
            subject: self.subject("FAILURE"),
            body: render(&report),
        }
    }

    fn subject(&self, text: &str) -> String {
        if self.subject_prefix.is_empty() {
            text.to_owned()
        } else {
            format!("{} {text}", self.subject_prefix)
        }
    }
}

fn render<T: Serialize>(report: &T) -> String {
    // Reports only hold strings and integers, which always serialize.
    serde_json::to_string_pretty(report).unwrap_or_default()
}
