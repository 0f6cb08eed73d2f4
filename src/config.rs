//! Loader configuration.
//!
//! [`LoaderOptions`] holds the knobs the pipeline itself reads; [`LoaderConfig`] adds the
//! locations the binary wires collaborators to, and is loaded from a TOML file:
//!
//! ```toml
//! storage_root = "/srv/festival/objects"
//! store_path = "/srv/festival/schedule.json"
//! notification_log = "/var/log/festival/notifications.jsonl"
//!
//! [options]
//! subject_prefix = "[Festival Loader]"
//! max_reported_errors = 20
//! batch_size = 25
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LoaderError, LoaderResult};
use crate::payload::PayloadFormat;

/// Options controlling one invocation.
///
/// Use [`Default`] for common cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderOptions {
    /// If `None`, pick the decoder from the object key suffix.
    pub format: Option<PayloadFormat>,
    /// Prepended to every notification subject.
    pub subject_prefix: String,
    /// How many error strings a notification body carries.
    pub max_reported_errors: usize,
    /// How many error strings an invocation keeps; the error count stays exact.
    pub max_recorded_errors: usize,
    /// How much of a malformed entry body is quoted in its error.
    pub envelope_preview_chars: usize,
    /// Records per store batch.
    pub batch_size: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            format: None,
            subject_prefix: "[Festival Loader]".to_string(),
            max_reported_errors: 20,
            max_recorded_errors: 1_000,
            envelope_preview_chars: 200,
            batch_size: 25,
        }
    }
}

impl LoaderOptions {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> LoaderResult<()> {
        if self.batch_size == 0 {
            return Err(LoaderError::Config {
                message: "batch_size must be > 0".to_string(),
            });
        }
        if self.max_recorded_errors < self.max_reported_errors {
            return Err(LoaderError::Config {
                message: format!(
                    "max_recorded_errors ({}) must be >= max_reported_errors ({})",
                    self.max_recorded_errors, self.max_reported_errors
                ),
            });
        }
        Ok(())
    }
}

/// File-level configuration for the `festival-loader` binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Root directory for local object storage (`<root>/<bucket>/<key>`).
    pub storage_root: PathBuf,
    /// Snapshot file of the record store.
    pub store_path: PathBuf,
    /// Where notifications are appended. `None` means they are only logged.
    pub notification_log: Option<PathBuf>,
    pub options: LoaderOptions,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("."),
            store_path: PathBuf::from("schedule-store.json"),
            notification_log: None,
            options: LoaderOptions::default(),
        }
    }
}

impl LoaderConfig {
    /// Parse and validate a TOML config document.
    pub fn from_toml_str(text: &str) -> LoaderResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| LoaderError::Config {
            message: e.to_string(),
        })?;
        config.options.validate()?;
        Ok(config)
    }

    /// Load a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> LoaderResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| LoaderError::Config {
            message: format!("reading {}: {e}", path.display()),
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{LoaderConfig, LoaderOptions};
    use crate::error::LoaderError;
    use crate::payload::PayloadFormat;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = LoaderConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, LoaderConfig::default());
        assert_eq!(cfg.options.max_reported_errors, 20);
    }

    #[test]
    fn partial_options_keep_other_defaults() {
        let cfg = LoaderConfig::from_toml_str(
            r#"
store_path = "out/store.json"
notification_log = "out/notify.jsonl"

[options]
format = "csv"
batch_size = 10
"#,
        )
        .unwrap();
        assert_eq!(cfg.store_path, PathBuf::from("out/store.json"));
        assert_eq!(cfg.notification_log, Some(PathBuf::from("out/notify.jsonl")));
        assert_eq!(cfg.options.format, Some(PayloadFormat::Csv));
        assert_eq!(cfg.options.batch_size, 10);
        assert_eq!(cfg.options.subject_prefix, LoaderOptions::default().subject_prefix);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let err = LoaderConfig::from_toml_str("[options]\nbatch_size = 0\n").unwrap_err();
        assert!(matches!(err, LoaderError::Config { .. }));
        assert!(err.to_string().contains("batch_size"));

        let err = LoaderConfig::from_toml_str("storage_root = 5\n").unwrap_err();
        assert!(matches!(err, LoaderError::Config { .. }));
    }
}
