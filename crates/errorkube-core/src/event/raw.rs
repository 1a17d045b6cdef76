//! Wire shape of an event record as delivered by the snapshot endpoint and the
//! live feed.
//!
//! Two shapes arrive in practice:
//!
//! ```text
//! {"uid": "…", "data": {"Subtype": 0, "Data": "<base64 JSON>"}}   // snapshot (stored copy)
//! {"uid": "…", "data": { …core/v1 Event… }}                        // live feed
//! ```
//!
//! The first is what the server's document store hands back for a raw JSON
//! blob; the second is the event object inlined as-is.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Name of the field inside `data` that carries the base64-encoded body.
pub const PAYLOAD_FIELD: &str = "Data";

/// One record as received, before decoding.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawEvent {
    /// Top-level resource UID attached by the server; used as a fallback identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,

    /// Either the structured event body or an object wrapping an encoded payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RawEvent {
    /// Parse a single record from JSON text (one live-feed message).
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when `text` is not a JSON object of the
    /// expected shape.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Parse a snapshot response body: a JSON array of records, or `null` for
    /// an empty store.
    ///
    /// Array entries that are not records at all are skipped with a warning;
    /// everything else is returned in order.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the body is not an array or `null`.
    pub fn parse_array(text: &str) -> Result<Vec<Self>, serde_json::Error> {
        let values: Option<Vec<Value>> = serde_json::from_str(text)?;
        Ok(values
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(raw) => Some(raw),
                Err(err) => {
                    warn!(index, "skipping snapshot entry that is not an event record: {err}");
                    None
                }
            })
            .collect())
    }

    /// Build a record whose body is already structured.
    #[must_use]
    pub fn inline(uid: Option<&str>, data: Value) -> Self {
        Self {
            uid: uid.map(str::to_string),
            data: Some(data),
        }
    }

    /// Build a record in the stored-copy shape, base64-encoding `payload`.
    #[must_use]
    pub fn encoded(uid: Option<&str>, payload: &[u8]) -> Self {
        let mut wrapper = serde_json::Map::new();
        wrapper.insert("Subtype".to_string(), Value::from(0));
        wrapper.insert(
            PAYLOAD_FIELD.to_string(),
            Value::String(STANDARD.encode(payload)),
        );
        Self {
            uid: uid.map(str::to_string),
            data: Some(Value::Object(wrapper)),
        }
    }

    /// The encoded payload string, when `data.Data` is a non-empty string.
    #[must_use]
    pub fn encoded_payload(&self) -> Option<&str> {
        match self.data.as_ref()?.get(PAYLOAD_FIELD)? {
            Value::String(encoded) if !encoded.is_empty() => Some(encoded.as_str()),
            _ => None,
        }
    }
}
