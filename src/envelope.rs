//! Invocation envelopes.
//!
//! An invocation receives a batch of transport entries (queue messages). Each entry body is
//! an object-storage notification document:
//!
//! ```json
//! {"Records": [{"s3": {"bucket": {"name": "fest"}, "object": {"key": "day+1.csv"}}}]}
//! ```
//!
//! Object keys arrive URL-encoded, with `+` standing for a space.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{LoaderError, LoaderResult};
use crate::types::ObjectLocation;

/// Characters left unescaped when building notification keys.
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Top-level invocation input: a batch of transport entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "Records", default)]
    pub entries: Vec<TransportEntry>,
}

/// One queued message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportEntry {
    #[serde(rename = "messageId", default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Raw message body; a missing body is treated as `{}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NotificationBody {
    #[serde(rename = "Records", default)]
    records: Vec<NotificationRecord>,
}

#[derive(Debug, Deserialize)]
struct NotificationRecord {
    s3: S3Entity,
}

#[derive(Debug, Deserialize)]
struct S3Entity {
    bucket: NamedRef,
    object: KeyRef,
}

#[derive(Debug, Deserialize)]
struct NamedRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct KeyRef {
    key: String,
}

impl Envelope {
    /// Parse the top-level invocation event.
    pub fn from_json(text: &str) -> LoaderResult<Self> {
        serde_json::from_str(text).map_err(|e| LoaderError::InvalidEvent {
            message: e.to_string(),
        })
    }

    /// Build an envelope with a single entry notifying about `locations`.
    ///
    /// Keys are URL-encoded the way storage notifications encode them.
    pub fn for_locations<'a>(locations: impl IntoIterator<Item = &'a ObjectLocation>) -> Self {
        let records: Vec<_> = locations
            .into_iter()
            .map(|loc| {
                json!({
                    "s3": {
                        "bucket": { "name": loc.bucket },
                        "object": { "key": escape_key(&loc.key) },
                    }
                })
            })
            .collect();
        Self {
            entries: vec![TransportEntry {
                message_id: None,
                body: Some(json!({ "Records": records }).to_string()),
            }],
        }
    }
}

impl TransportEntry {
    /// The body to parse, defaulting to an empty document.
    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or("{}")
    }

    /// Extract the object locations named by this entry, with keys unescaped.
    ///
    /// An unparseable body, or one whose records lack a bucket name or object key, is an
    /// [`LoaderError::InvalidEnvelope`]. A well-formed body without records yields an
    /// empty list.
    pub fn locations(&self) -> LoaderResult<Vec<ObjectLocation>> {
        let body: NotificationBody =
            serde_json::from_str(self.body_text()).map_err(|e| LoaderError::InvalidEnvelope {
                message: e.to_string(),
            })?;
        Ok(body
            .records
            .into_iter()
            .map(|r| ObjectLocation::new(r.s3.bucket.name, unescape_key(&r.s3.object.key)))
            .collect())
    }
}

/// Decode a notification object key: `+` becomes a space, then `%XX` escapes are decoded.
pub fn unescape_key(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Inverse of [`unescape_key`].
pub fn escape_key(key: &str) -> String {
    utf8_percent_encode(key, KEY_ENCODE_SET)
        .to_string()
        .replace("%20", "+")
}

#[cfg(test)]
mod tests {
    use super::{Envelope, TransportEntry, escape_key, unescape_key};
    use crate::error::LoaderError;
    use crate::types::ObjectLocation;

    fn entry(body: &str) -> TransportEntry {
        TransportEntry {
            message_id: None,
            body: Some(body.to_string()),
        }
    }

    #[test]
    fn unescape_plus_and_percent() {
        assert_eq!(unescape_key("lineup+day+1.csv"), "lineup day 1.csv");
        assert_eq!(unescape_key("a%2Bb.json"), "a+b.json");
        assert_eq!(unescape_key("caf%C3%A9/sched.csv"), "café/sched.csv");
        assert_eq!(unescape_key("plain/key.json"), "plain/key.json");
    }

    #[test]
    fn escape_round_trips_through_unescape() {
        for key in ["lineup day 1.csv", "a+b.json", "café/sched.csv", "x/y_z-1.json"] {
            assert_eq!(unescape_key(&escape_key(key)), key);
        }
    }

    #[test]
    fn entry_locations_are_unescaped() {
        let e = entry(
            r#"{"Records":[{"s3":{"bucket":{"name":"fest"},"object":{"key":"uploads/day+2.json"}}}]}"#,
        );
        assert_eq!(
            e.locations().unwrap(),
            vec![ObjectLocation::new("fest", "uploads/day 2.json")]
        );
    }

    #[test]
    fn entry_without_records_yields_nothing() {
        assert!(entry(r#"{"Event":"s3:TestEvent"}"#).locations().unwrap().is_empty());
        assert!(TransportEntry::default().locations().unwrap().is_empty());
    }

    #[test]
    fn malformed_bodies_are_invalid_envelopes() {
        for body in ["not json", "[1,2]", r#"{"Records":[{"s3":{}}]}"#] {
            assert!(
                matches!(entry(body).locations(), Err(LoaderError::InvalidEnvelope { .. })),
                "body {body}"
            );
        }
    }

    #[test]
    fn synthetic_envelope_round_trips() {
        let locs = vec![
            ObjectLocation::new("fest", "day 1.csv"),
            ObjectLocation::new("fest", "extra/items.json"),
        ];
        let env = Envelope::for_locations(&locs);
        let text = serde_json::to_string(&env).unwrap();
        let parsed = Envelope::from_json(&text).unwrap();
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.entries[0].locations().unwrap(), locs);
    }

    #[test]
    fn top_level_garbage_is_invalid_event() {
        assert!(matches!(
            Envelope::from_json("{"),
            Err(LoaderError::InvalidEvent { .. })
        ));
    }
}
