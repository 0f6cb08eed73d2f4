//! Unified payload decoding.
//!
//! Most callers should use [`decode_payload`], which turns the raw bytes of one object
//! into [`RawRow`]s.
//!
//! - The bytes must be UTF-8; a leading byte-order mark is stripped.
//! - If `format` is `None`, the decoder is chosen from the name suffix (`.json`, `.csv`,
//!   case-insensitive).
//! - Names with any other suffix are probed with an ordered chain of candidate decoders
//!   (JSON, then CSV). The first candidate that yields at least one row wins.

use std::path::Path;

use tracing::debug;

use crate::error::{LoaderError, LoaderResult};
use crate::types::RawRow;

use super::{csv, json};

const BOM: char = '\u{feff}';

/// Supported payload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// Header-driven comma-separated values.
    Csv,
    /// JSON list of objects, or `{"items": [...]}`.
    Json,
}

impl PayloadFormat {
    /// Parse a payload format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Infer the format from an object key or file name.
    pub fn from_name(name: &str) -> Option<Self> {
        Path::new(name)
            .extension()
            .and_then(|s| s.to_str())
            .and_then(Self::from_extension)
    }

    /// Decode text strictly as this format.
    pub fn decode(self, text: &str) -> LoaderResult<Vec<RawRow>> {
        match self {
            Self::Csv => csv::decode_csv_str(text),
            Self::Json => json::decode_json_str(text),
        }
    }
}

/// One step of the probing chain used for names without a known suffix.
pub trait CandidateDecoder {
    /// Format this candidate decodes.
    fn format(&self) -> PayloadFormat;

    /// Attempt to decode `text`. An empty result counts as "no match".
    fn try_decode(&self, text: &str) -> LoaderResult<Vec<RawRow>> {
        self.format().decode(text)
    }
}

impl CandidateDecoder for PayloadFormat {
    fn format(&self) -> PayloadFormat {
        *self
    }
}

/// Probing order for names without a recognized suffix.
pub const PROBE_ORDER: [PayloadFormat; 2] = [PayloadFormat::Json, PayloadFormat::Csv];

/// Decode the bytes of one object into raw rows.
///
/// `name` is only used as a format hint and in error messages.
pub fn decode_payload(
    name: &str,
    bytes: &[u8],
    format: Option<PayloadFormat>,
) -> LoaderResult<Vec<RawRow>> {
    let text = decode_text(name, bytes)?;

    match format.or_else(|| PayloadFormat::from_name(name)) {
        Some(fmt) => fmt.decode(text),
        None => probe(name, text, &PROBE_ORDER),
    }
}

/// Run `candidates` in order; the first non-empty success wins.
pub fn probe<D: CandidateDecoder>(
    name: &str,
    text: &str,
    candidates: &[D],
) -> LoaderResult<Vec<RawRow>> {
    for candidate in candidates {
        match candidate.try_decode(text) {
            Ok(rows) if !rows.is_empty() => {
                debug!(name, format = ?candidate.format(), rows = rows.len(), "probe matched");
                return Ok(rows);
            }
            Ok(_) => debug!(name, format = ?candidate.format(), "probe yielded no rows"),
            Err(err) => debug!(name, format = ?candidate.format(), error = %err, "probe failed"),
        }
    }

    Err(LoaderError::UnsupportedFileFormat {
        name: name.to_owned(),
    })
}

/// UTF-8 decode, stripping a leading byte-order mark.
fn decode_text<'a>(name: &str, bytes: &'a [u8]) -> LoaderResult<&'a str> {
    let text = std::str::from_utf8(bytes).map_err(|source| LoaderError::InvalidEncoding {
        name: name.to_owned(),
        source,
    })?;
    Ok(text.strip_prefix(BOM).unwrap_or(text))
}
