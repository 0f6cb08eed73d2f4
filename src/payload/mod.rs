//! Payload decoding entrypoints and implementations.
//!
//! Most callers should use [`decode_payload`] (from [`unified`]) which:
//!
//! - strips a UTF-8 byte-order mark
//! - picks the decoder from the object name suffix (or you can force a [`PayloadFormat`])
//! - falls back to probing JSON then CSV when the suffix is not recognized
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - [`json`]

pub mod csv;
pub mod json;
pub mod unified;

pub use unified::{CandidateDecoder, PROBE_ORDER, PayloadFormat, decode_payload, probe};
