//! Session reducer.
//!
//! A [`Session`] owns everything the viewer shows: the merged collection, the
//! operator's filter and the lifecycle of both sources. It changes only
//! through [`Session::apply`], which folds one [`Action`] at a time:
//!
//! ```text
//! SessionInput ──► decode ──► merge ──► sort ──► Session.events
//! FilterChange ──────────────────────────────► Session.filter
//! Teardown     ──► every later action is ignored
//! ```
//!
//! The display view is the pure function [`Session::visible`].
//!
//! # Lifecycle rules
//!
//! - The snapshot is accepted once; a second snapshot outcome is ignored.
//! - Stream events are merged until the stream reports an error or closes.
//! - After [`Action::Teardown`] no input or filter change has any effect, so
//!   late deliveries from a source that is still winding down are discarded.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::collection::{merge_events, sort_descending_by_creation};
use crate::event::{DecodeOutcome, Event, RawEvent, decode_with_outcome};
use crate::filter::{FilterState, RecencyWindow, distinct_kinds, distinct_namespaces};

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// A signal from one of the two event sources.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionInput {
    /// The snapshot fetch completed with these records, in server order.
    SnapshotLoaded(Vec<RawEvent>),
    /// The snapshot fetch failed; the collection stays as it is.
    SnapshotFailed(String),
    /// The live feed connection is open.
    StreamOpened,
    /// One record arrived on the live feed.
    StreamEvent(RawEvent),
    /// The live feed failed; no further stream events are merged.
    StreamError(String),
    /// The live feed was closed by the peer.
    StreamClosed,
}

/// An operator change to the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    Namespace(Option<String>),
    Kind(Option<String>),
    Search(String),
    Window(RecencyWindow),
    /// Remove every constraint.
    Reset,
}

/// Anything that can change a session.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Input(SessionInput),
    Filter(FilterChange),
    Teardown,
}

impl From<SessionInput> for Action {
    fn from(input: SessionInput) -> Self {
        Self::Input(input)
    }
}

impl From<FilterChange> for Action {
    fn from(change: FilterChange) -> Self {
        Self::Filter(change)
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Progress of the one-shot snapshot fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SnapshotState {
    #[default]
    Pending,
    Loaded {
        records: usize,
    },
    Failed(String),
}

/// Lifecycle of the live feed connection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StreamState {
    #[default]
    Connecting,
    Open,
    Errored(String),
    Closed,
}

impl StreamState {
    /// Short label for status lines.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "live",
            Self::Errored(_) => "error",
            Self::Closed => "closed",
        }
    }

    /// True once the stream can no longer deliver events.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Errored(_) | Self::Closed)
    }
}

/// Running counters, for status lines and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    /// Records received from either source.
    pub received: usize,
    /// Records dropped because their identity was already present.
    pub duplicates_skipped: usize,
    /// Records whose body could not be parsed.
    pub degraded: usize,
}

/// Reducer state for one viewing session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    events: Vec<Event>,
    filter: FilterState,
    snapshot: SnapshotState,
    stream: StreamState,
    stats: SessionStats,
    torn_down: bool,
}

impl Session {
    /// An empty session with no filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty session starting from `filter`.
    #[must_use]
    pub fn with_filter(filter: FilterState) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Fold one action into the session.
    #[must_use]
    pub fn apply(mut self, action: Action) -> Self {
        if self.torn_down {
            debug!(?action, "ignoring action after teardown");
            return self;
        }
        match action {
            Action::Input(input) => self.apply_input(input),
            Action::Filter(change) => self.apply_filter(change),
            Action::Teardown => {
                info!(events = self.events.len(), "session torn down");
                self.torn_down = true;
            }
        }
        self
    }

    fn apply_input(&mut self, input: SessionInput) {
        match input {
            SessionInput::SnapshotLoaded(records) => {
                if self.snapshot != SnapshotState::Pending {
                    warn!("ignoring repeated snapshot delivery");
                    return;
                }
                let count = records.len();
                self.snapshot = SnapshotState::Loaded { records: count };
                let added = self.ingest(records);
                info!(records = count, added, "snapshot loaded");
            }
            SessionInput::SnapshotFailed(reason) => {
                if self.snapshot != SnapshotState::Pending {
                    return;
                }
                warn!("snapshot failed: {reason}");
                self.snapshot = SnapshotState::Failed(reason);
            }
            SessionInput::StreamOpened => {
                if self.stream == StreamState::Connecting {
                    info!("live feed open");
                    self.stream = StreamState::Open;
                }
            }
            SessionInput::StreamEvent(raw) => {
                if self.stream.is_finished() {
                    debug!("ignoring stream event after stream ended");
                    return;
                }
                self.ingest(vec![raw]);
            }
            SessionInput::StreamError(reason) => {
                if !self.stream.is_finished() {
                    warn!("live feed error: {reason}");
                    self.stream = StreamState::Errored(reason);
                }
            }
            SessionInput::StreamClosed => {
                if !self.stream.is_finished() {
                    info!("live feed closed");
                    self.stream = StreamState::Closed;
                }
            }
        }
    }

    fn apply_filter(&mut self, change: FilterChange) {
        match change {
            FilterChange::Namespace(namespace) => {
                self.filter.set_namespace(namespace);
            }
            FilterChange::Kind(kind) => self.filter.set_kind(kind),
            FilterChange::Search(query) => self.filter.search_query = query,
            FilterChange::Window(window) => self.filter.window = window,
            FilterChange::Reset => self.filter.reset(),
        }
    }

    /// Decode, merge and re-sort. Returns the number of events added.
    fn ingest(&mut self, records: Vec<RawEvent>) -> usize {
        self.stats.received += records.len();
        let decoded: Vec<Event> = records
            .into_iter()
            .map(|raw| {
                let decoded = decode_with_outcome(raw);
                if decoded.outcome == DecodeOutcome::Degraded {
                    self.stats.degraded += 1;
                }
                decoded.event
            })
            .collect();

        let merged = merge_events(std::mem::take(&mut self.events), decoded);
        self.stats.duplicates_skipped += merged.duplicates_skipped;
        self.events = merged.events;
        sort_descending_by_creation(&mut self.events);
        merged.added
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The merged collection, newest first.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Events passing the current filter at `now`, newest first.
    #[must_use]
    pub fn visible(&self, now: DateTime<Utc>) -> Vec<&Event> {
        self.filter.apply(&self.events, now)
    }

    /// Distinct namespaces across the whole collection.
    #[must_use]
    pub fn namespaces(&self) -> Vec<String> {
        distinct_namespaces(&self.events)
    }

    /// Distinct object kinds within the selected namespace.
    #[must_use]
    pub fn kinds(&self) -> Vec<String> {
        distinct_kinds(&self.events, self.filter.namespace.as_deref())
    }

    /// Look up an event by identity.
    #[must_use]
    pub fn find(&self, identity: &str) -> Option<&Event> {
        self.events
            .iter()
            .find(|event| event.identity() == Some(identity))
    }

    #[must_use]
    pub const fn filter(&self) -> &FilterState {
        &self.filter
    }

    #[must_use]
    pub const fn snapshot(&self) -> &SnapshotState {
        &self.snapshot
    }

    #[must_use]
    pub const fn stream(&self) -> &StreamState {
        &self.stream
    }

    #[must_use]
    pub const fn stats(&self) -> SessionStats {
        self.stats
    }

    #[must_use]
    pub const fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn record(uid: &str, ns: &str, created: &str) -> RawEvent {
        let body = json!({
            "metadata": {"uid": uid, "namespace": ns, "creationTimestamp": created},
            "involvedObject": {"kind": "Pod"},
            "reason": "BackOff"
        });
        let payload = serde_json::to_vec(&body).unwrap();
        RawEvent::encoded(Some(uid), &payload)
    }

    fn ids(events: &[&Event]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| e.identity().map(str::to_string))
            .collect()
    }

    fn loaded() -> Session {
        Session::new().apply(
            SessionInput::SnapshotLoaded(vec![
                record("u1", "default", "2024-05-01T10:00:00Z"),
                record("u2", "kube-system", "2024-05-01T11:00:00Z"),
            ])
            .into(),
        )
    }

    #[test]
    fn snapshot_populates_sorted_collection() {
        let session = loaded();
        assert_eq!(ids(&session.visible(now())), vec!["u2", "u1"]);
        assert_eq!(session.snapshot(), &SnapshotState::Loaded { records: 2 });
    }

    #[test]
    fn stream_event_is_merged_and_sorted() {
        let session = loaded()
            .apply(SessionInput::StreamOpened.into())
            .apply(SessionInput::StreamEvent(record("u3", "default", "2024-05-01T11:30:00Z")).into());
        assert_eq!(ids(&session.visible(now())), vec!["u3", "u2", "u1"]);
        assert_eq!(session.stream(), &StreamState::Open);
    }

    #[test]
    fn replayed_stream_event_is_deduplicated() {
        let session = loaded()
            .apply(SessionInput::StreamEvent(record("u1", "default", "2024-05-01T10:00:00Z")).into());
        assert_eq!(session.events().len(), 2);
        assert_eq!(session.stats().duplicates_skipped, 1);
        assert_eq!(session.stats().received, 3);
    }

    #[test]
    fn second_snapshot_is_ignored() {
        let session = loaded().apply(
            SessionInput::SnapshotLoaded(vec![record("u9", "default", "2024-05-01T09:00:00Z")])
                .into(),
        );
        assert_eq!(session.events().len(), 2);
        assert!(session.find("u9").is_none());
    }

    #[test]
    fn snapshot_failure_leaves_collection_empty() {
        let session = Session::new().apply(SessionInput::SnapshotFailed("503".to_string()).into());
        assert!(session.events().is_empty());
        assert_eq!(session.snapshot(), &SnapshotState::Failed("503".to_string()));
    }

    #[test]
    fn stream_events_after_close_are_ignored() {
        let session = loaded()
            .apply(SessionInput::StreamClosed.into())
            .apply(SessionInput::StreamEvent(record("u3", "default", "2024-05-01T11:30:00Z")).into());
        assert_eq!(session.events().len(), 2);
        assert_eq!(session.stream().label(), "closed");
    }

    #[test]
    fn stream_error_is_sticky() {
        let session = loaded()
            .apply(SessionInput::StreamError("reset by peer".to_string()).into())
            .apply(SessionInput::StreamClosed.into())
            .apply(SessionInput::StreamOpened.into());
        assert_eq!(session.stream(), &StreamState::Errored("reset by peer".to_string()));
    }

    #[test]
    fn teardown_discards_late_inputs() {
        let session = Session::new()
            .apply(Action::Teardown)
            .apply(SessionInput::SnapshotLoaded(vec![record("u1", "default", "2024-05-01T10:00:00Z")]).into())
            .apply(FilterChange::Search("x".to_string()).into());
        assert!(session.is_torn_down());
        assert!(session.events().is_empty());
        assert!(session.filter().is_empty());
    }

    #[test]
    fn filter_changes_narrow_the_view() {
        let session = loaded().apply(FilterChange::Namespace(Some("default".to_string())).into());
        assert_eq!(ids(&session.visible(now())), vec!["u1"]);
        assert_eq!(session.events().len(), 2);

        let session = session.apply(FilterChange::Reset.into());
        assert_eq!(session.visible(now()).len(), 2);
    }

    #[test]
    fn namespace_change_resets_kind() {
        let session = loaded()
            .apply(FilterChange::Kind(Some("Pod".to_string())).into())
            .apply(FilterChange::Namespace(Some("kube-system".to_string())).into());
        assert!(session.filter().kind.is_none());
    }

    #[test]
    fn degraded_records_are_counted_and_kept() {
        let broken = RawEvent::inline(Some("bad"), json!({"Data": "!!!"}));
        let session = Session::new().apply(SessionInput::SnapshotLoaded(vec![broken]).into());
        assert_eq!(session.stats().degraded, 1);
        assert!(session.find("bad").is_some());
    }

    #[test]
    fn facets_follow_selected_namespace() {
        let session = loaded();
        assert_eq!(session.namespaces(), vec!["kube-system", "default"]);
        assert_eq!(session.kinds(), vec!["Pod"]);
    }
}
