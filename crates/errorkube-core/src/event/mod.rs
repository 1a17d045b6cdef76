//! Event data model for the errorkube pipeline.
//!
//! A [`RawEvent`] is what the snapshot endpoint and the live feed deliver. The
//! decoder turns it into an [`Event`]: a stable optional identity plus a body
//! that is either a structured [`KubeEvent`] or a degraded fallback. Events are
//! immutable once decoded; the pipeline only ever clones, reorders, or selects
//! them.

pub mod decode;
pub mod kube;
pub mod raw;

pub use decode::{DecodeError, DecodeOutcome, Decoded, decode, decode_with_outcome};
pub use kube::{EventSource, KubeEvent, ObjectMeta, ObjectReference, parse_timestamp};
pub use raw::{PAYLOAD_FIELD, RawEvent};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Decoded body of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EventBody {
    /// A parsed Kubernetes event.
    Structured(Box<KubeEvent>),
    /// Payload decoded but not parseable as an event; kept verbatim.
    Text(String),
    /// No usable body (malformed base64, or no `data` at all).
    Empty,
}

/// The canonical unit flowing through the pipeline.
///
/// # Identity
///
/// `identity` is `metadata.uid` from the body when present, otherwise the
/// top-level `uid` of the raw record. When neither exists the event has no
/// identity and is never deduplicated: two such events are always distinct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub identity: Option<String>,
    pub body: EventBody,
}

impl Event {
    /// Build an event, deriving its identity from the body with `fallback_uid`
    /// (the raw record's top-level `uid`) as the second choice.
    #[must_use]
    pub fn new(body: EventBody, fallback_uid: Option<String>) -> Self {
        let identity = match &body {
            EventBody::Structured(kube) => kube.uid().map(str::to_string),
            EventBody::Text(_) | EventBody::Empty => None,
        }
        .or_else(|| fallback_uid.filter(|uid| !uid.is_empty()));
        Self { identity, body }
    }

    #[must_use]
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// The structured body, if decoding produced one.
    #[must_use]
    pub fn kube(&self) -> Option<&KubeEvent> {
        match &self.body {
            EventBody::Structured(kube) => Some(kube),
            EventBody::Text(_) | EventBody::Empty => None,
        }
    }

    /// True when the body is a degraded fallback rather than a parsed event.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        !matches!(self.body, EventBody::Structured(_))
    }

    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.kube()?.metadata.namespace.as_deref()
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.kube()?.metadata.name.as_deref()
    }

    /// `involvedObject.kind`.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.kube()?.involved_object.kind.as_deref()
    }

    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.kube()?.reason.as_deref()
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.kube()?.message.as_deref()
    }

    #[must_use]
    pub fn event_type(&self) -> Option<&str> {
        self.kube()?.event_type.as_deref()
    }

    /// `metadata.creationTimestamp` as an instant; `None` when absent or unparseable.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.kube()?.created_at()
    }
}
