//! Newest-first ordering of the collection.

use std::cmp::Reverse;

use crate::event::Event;

/// Sort `events` descending by creation time.
///
/// The sort is stable: events with equal timestamps keep their relative
/// order, so the result is deterministic for a given input sequence. Events
/// whose `creationTimestamp` is absent or unparseable sort after every dated
/// event.
pub fn sort_descending_by_creation(events: &mut [Event]) {
    // `None < Some(_)`, so reversing puts undated events last.
    events.sort_by_cached_key(|event| Reverse(event.created_at()));
}

/// True when every adjacent pair is in newest-first order.
#[must_use]
pub fn is_sorted_descending(events: &[Event]) -> bool {
    events
        .windows(2)
        .all(|pair| pair[0].created_at() >= pair[1].created_at())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventBody, KubeEvent};

    fn at(uid: &str, created: Option<&str>) -> Event {
        let mut kube = KubeEvent::default();
        kube.metadata.uid = Some(uid.to_string());
        kube.metadata.creation_timestamp = created.map(str::to_string);
        Event::new(EventBody::Structured(Box::new(kube)), None)
    }

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().filter_map(Event::identity).collect()
    }

    #[test]
    fn newest_first() {
        let mut events = vec![
            at("old", Some("2024-05-01T10:00:00Z")),
            at("new", Some("2024-05-01T11:00:00Z")),
            at("mid", Some("2024-05-01T10:30:00Z")),
        ];
        sort_descending_by_creation(&mut events);
        assert_eq!(ids(&events), vec!["new", "mid", "old"]);
        assert!(is_sorted_descending(&events));
    }

    #[test]
    fn ties_keep_arrival_order() {
        let mut events = vec![
            at("first", Some("2024-05-01T10:00:00Z")),
            at("second", Some("2024-05-01T10:00:00Z")),
            at("later", Some("2024-05-01T12:00:00Z")),
        ];
        sort_descending_by_creation(&mut events);
        assert_eq!(ids(&events), vec!["later", "first", "second"]);
    }

    #[test]
    fn undated_events_sort_last_in_arrival_order() {
        let mut events = vec![
            at("bad", Some("not a time")),
            at("dated", Some("2020-01-01T00:00:00Z")),
            at("missing", None),
        ];
        sort_descending_by_creation(&mut events);
        assert_eq!(ids(&events), vec!["dated", "bad", "missing"]);
        assert!(is_sorted_descending(&events));
    }

    #[test]
    fn offsets_compare_as_instants() {
        let mut events = vec![
            at("utc", Some("2024-05-01T10:30:00Z")),
            at("plus2", Some("2024-05-01T12:00:00+02:00")),
        ];
        sort_descending_by_creation(&mut events);
        assert_eq!(ids(&events), vec!["utc", "plus2"]);
    }

    #[test]
    fn degraded_bodies_count_as_undated() {
        let mut events = vec![
            Event::new(EventBody::Text("x".to_string()), Some("text".to_string())),
            at("dated", Some("2024-05-01T10:00:00Z")),
        ];
        sort_descending_by_creation(&mut events);
        assert_eq!(ids(&events), vec!["dated", "text"]);
    }
}
