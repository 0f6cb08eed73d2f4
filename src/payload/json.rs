//! JSON decoding.
//!
//! Supported inputs:
//! - A JSON array of objects: `[{"Performer":"A"}, {"Performer":"B"}]`
//! - An object wrapping that array under `items`: `{"items": [...]}`
//!
//! An object without `items` decodes to zero rows.

use serde_json::{Map, Value};

use crate::error::{LoaderError, LoaderResult};
use crate::types::RawRow;

/// Field holding the row list when the document is an object.
pub const ITEMS_FIELD: &str = "items";

/// Decode JSON text into raw rows.
pub fn decode_json_str(text: &str) -> LoaderResult<Vec<RawRow>> {
    let value: Value = serde_json::from_str(text)?;
    decode_json_value(value)
}

/// Decode an already-parsed JSON document into raw rows.
pub fn decode_json_value(value: Value) -> LoaderResult<Vec<RawRow>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove(ITEMS_FIELD) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(LoaderError::UnsupportedPayloadShape {
                    message: format!("'{ITEMS_FIELD}' must be a list, got {}", kind(&other)),
                });
            }
        },
        other => {
            return Err(LoaderError::UnsupportedPayloadShape {
                message: format!("json must be a list of records, got {}", kind(&other)),
            });
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx0, item)| match item {
            Value::Object(obj) => Ok(object_to_row(obj)),
            other => Err(LoaderError::UnsupportedPayloadShape {
                message: format!("row {} is not a json object ({})", idx0 + 1, kind(&other)),
            }),
        })
        .collect()
}

fn object_to_row(obj: Map<String, Value>) -> RawRow {
    obj.into_iter()
        .map(|(name, value)| (name, scalar_text(value)))
        .collect()
}

/// Render a JSON value the way a CSV cell would carry it.
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        nested @ (Value::Array(_) | Value::Object(_)) => Some(nested.to_string()),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
