//! Raw record → [`Event`] normalization.
//!
//! Decoding is total: every [`RawEvent`] yields exactly one [`Event`]. When
//! the payload is broken the event keeps whatever could be recovered (the
//! decoded text, or nothing) and the failure is logged, so one bad record
//! never stops the pipeline.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use tracing::{debug, warn};

use super::{Event, EventBody, KubeEvent, RawEvent};

/// Why a payload could not be turned into a structured body.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload is JSON but not an object (found {0})")]
    NotAnObject(&'static str),
}

/// How a record's body was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Base64 payload decoded and parsed into a structured event.
    Structured,
    /// `data` was already the structured event.
    Passthrough,
    /// Payload present but broken; body kept as text or empty.
    Degraded,
    /// The record carried no `data` at all.
    Missing,
}

/// Result of decoding one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub event: Event,
    pub outcome: DecodeOutcome,
}

/// Decode a raw record into an [`Event`].
#[must_use]
pub fn decode(raw: RawEvent) -> Event {
    decode_with_outcome(raw).event
}

/// Decode a raw record, also reporting how the body was obtained.
#[must_use]
pub fn decode_with_outcome(raw: RawEvent) -> Decoded {
    let (body, outcome) = match raw.encoded_payload() {
        Some(encoded) => decode_payload(encoded, raw.uid.as_deref()),
        None => match raw.data {
            None => (EventBody::Empty, DecodeOutcome::Missing),
            Some(ref value) => passthrough(value, raw.uid.as_deref()),
        },
    };
    Decoded {
        event: Event::new(body, raw.uid),
        outcome,
    }
}

fn decode_payload(encoded: &str, uid: Option<&str>) -> (EventBody, DecodeOutcome) {
    let text = match decode_base64(encoded) {
        Ok(text) => text,
        Err(err) => {
            warn!(uid = uid.unwrap_or("-"), "dropping undecodable event payload: {err}");
            return (EventBody::Empty, DecodeOutcome::Degraded);
        }
    };

    match parse_body(&text) {
        Ok(kube) => (
            EventBody::Structured(Box::new(kube)),
            DecodeOutcome::Structured,
        ),
        Err(err) => {
            warn!(uid = uid.unwrap_or("-"), "keeping event payload as text: {err}");
            (EventBody::Text(text), DecodeOutcome::Degraded)
        }
    }
}

fn passthrough(value: &Value, uid: Option<&str>) -> (EventBody, DecodeOutcome) {
    match structured_from_value(value.clone()) {
        Ok(kube) => (
            EventBody::Structured(Box::new(kube)),
            DecodeOutcome::Passthrough,
        ),
        Err(err) => {
            debug!(uid = uid.unwrap_or("-"), "inline event body is not an event object: {err}");
            (EventBody::Text(value.to_string()), DecodeOutcome::Degraded)
        }
    }
}

fn decode_base64(encoded: &str) -> Result<String, DecodeError> {
    let bytes = STANDARD.decode(encoded.trim())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn parse_body(text: &str) -> Result<KubeEvent, DecodeError> {
    let value: Value = serde_json::from_str(text)?;
    structured_from_value(value)
}

fn structured_from_value(value: Value) -> Result<KubeEvent, DecodeError> {
    match value {
        Value::Object(_) => Ok(serde_json::from_value(value)?),
        Value::Null => Err(DecodeError::NotAnObject("null")),
        Value::Bool(_) => Err(DecodeError::NotAnObject("a boolean")),
        Value::Number(_) => Err(DecodeError::NotAnObject("a number")),
        Value::String(_) => Err(DecodeError::NotAnObject("a string")),
        Value::Array(_) => Err(DecodeError::NotAnObject("an array")),
    }
}
