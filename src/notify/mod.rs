//! Operator notifications.
//!
//! [`NotificationComposer`] turns an invocation result into a [`Notification`]; a
//! [`Notifier`] delivers it. Implementations:
//!
//! - [`TracingNotifier`]: emits the notification as a log event
//! - [`FileNotifier`]: appends one JSON line per notification to a file
//! - [`CompositeNotifier`]: fans out to several notifiers

mod compose;

pub use compose::NotificationComposer;

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{error, info};

use crate::error::NotifyError;

/// A subject line plus a JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

impl Notification {
    /// Returns true for failure notifications.
    pub fn is_failure(&self) -> bool {
        self.subject.ends_with("FAILURE")
    }
}

/// Delivery interface for operator notifications.
pub trait Notifier: Send + Sync {
    fn publish(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// A notifier that fans out to a list of notifiers.
///
/// Every notifier is tried; the first delivery error is returned.
#[derive(Default)]
pub struct CompositeNotifier {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl CompositeNotifier {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        Self { notifiers }
    }
}

impl fmt::Debug for CompositeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeNotifier")
            .field("notifiers_len", &self.notifiers.len())
            .finish()
    }
}

impl Notifier for CompositeNotifier {
    fn publish(&self, notification: &Notification) -> Result<(), NotifyError> {
        let mut first_err = None;
        for n in &self.notifiers {
            if let Err(e) = n.publish(notification) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

/// Emits notifications as log events.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn publish(&self, notification: &Notification) -> Result<(), NotifyError> {
        if notification.is_failure() {
            error!(subject = %notification.subject, body = %notification.body, "notification");
        } else {
            info!(subject = %notification.subject, body = %notification.body, "notification");
        }
        Ok(())
    }
}

/// Appends notifications to a local file, one JSON object per line.
#[derive(Debug)]
pub struct FileNotifier {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileNotifier {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Notifier for FileNotifier {
    fn publish(&self, notification: &Notification) -> Result<(), NotifyError> {
        let line = serde_json::to_string(notification)
            .map_err(|e| NotifyError::Rejected(e.to_string()))?;
        let _guard = self.lock.lock().ok();
        let mut f = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(f, "{line}")?;
        Ok(())
    }
}
