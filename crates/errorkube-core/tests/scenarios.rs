//! End-to-end pipeline scenarios driven through the session reducer.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use errorkube_core::{
    Action, Event, FilterChange, RawEvent, RecencyWindow, Session, SessionInput,
};
use serde_json::json;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn record(uid: &str, namespace: &str, kind: &str, created: DateTime<Utc>) -> RawEvent {
    let body = json!({
        "metadata": {
            "uid": uid,
            "name": format!("{uid}.17c1"),
            "namespace": namespace,
            "creationTimestamp": created.to_rfc3339(),
        },
        "involvedObject": {"kind": kind, "name": uid},
        "reason": "BackOff",
        "message": "Back-off restarting failed container",
        "type": "Warning",
    });
    RawEvent::encoded(Some(uid), &serde_json::to_vec(&body).unwrap())
}

fn snapshot(records: Vec<RawEvent>) -> Action {
    SessionInput::SnapshotLoaded(records).into()
}

fn ids(events: &[&Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| e.identity().map(str::to_string))
        .collect()
}

#[test]
fn scenario_a_snapshot_is_ordered_newest_first() {
    let session = Session::new().apply(snapshot(vec![
        record("u1", "default", "Pod", t0()),
        record("u2", "default", "Pod", t0() + TimeDelta::hours(1)),
    ]));
    let visible = session.visible(t0() + TimeDelta::hours(2));
    assert_eq!(ids(&visible), vec!["u2", "u1"]);
}

#[test]
fn scenario_b_replayed_stream_event_does_not_grow_collection() {
    let session = Session::new()
        .apply(snapshot(vec![record("u1", "default", "Pod", t0())]))
        .apply(SessionInput::StreamOpened.into());
    let before = session.events().len();

    // The live feed sends the inline shape, the snapshot the encoded one.
    let replay = RawEvent::inline(
        Some("u1"),
        json!({"metadata": {"uid": "u1", "namespace": "default"}, "reason": "Replayed"}),
    );
    let session = session.apply(SessionInput::StreamEvent(replay).into());

    assert_eq!(session.events().len(), before);
    assert_eq!(session.events()[0].reason(), Some("BackOff"));
}

#[test]
fn scenario_c_namespace_filter_selects_exactly_matching_events() {
    let session = Session::new()
        .apply(snapshot(vec![
            record("u1", "kube-system", "Pod", t0()),
            record("u2", "default", "Pod", t0()),
            record("u3", "kube-system", "Node", t0()),
        ]))
        .apply(FilterChange::Namespace(Some("kube-system".to_string())).into());

    let mut visible = ids(&session.visible(t0()));
    visible.sort();
    assert_eq!(visible, vec!["u1", "u3"]);
}

#[test]
fn scenario_d_one_hour_window() {
    let session = Session::new()
        .apply(snapshot(vec![
            record("recent", "default", "Pod", t0() - TimeDelta::minutes(30)),
            record("stale", "default", "Pod", t0() - TimeDelta::hours(2)),
        ]))
        .apply(FilterChange::Window(RecencyWindow::LastHour).into());

    assert_eq!(ids(&session.visible(t0())), vec!["recent"]);
}

#[test]
fn scenario_e_changing_namespace_resets_kind() {
    let session = Session::new()
        .apply(snapshot(vec![
            record("u1", "default", "Pod", t0()),
            record("u2", "kube-system", "Node", t0()),
        ]))
        .apply(FilterChange::Namespace(Some("default".to_string())).into())
        .apply(FilterChange::Kind(Some("Pod".to_string())).into())
        .apply(FilterChange::Namespace(Some("kube-system".to_string())).into());

    assert!(session.filter().kind.is_none());
    assert_eq!(session.kinds(), vec!["Node"]);
    assert_eq!(ids(&session.visible(t0())), vec!["u2"]);
}

#[test]
fn undecodable_payload_still_shows_up() {
    let broken = RawEvent::inline(Some("broken"), json!({"Subtype": 0, "Data": "@@not-base64@@"}));
    let session = Session::new().apply(snapshot(vec![broken, record("ok", "default", "Pod", t0())]));

    assert_eq!(session.events().len(), 2);
    assert_eq!(session.stats().degraded, 1);
    // Undated events sort to the end.
    assert_eq!(session.events()[1].identity(), Some("broken"));
}

#[test]
fn stream_after_teardown_is_discarded() {
    let session = Session::new()
        .apply(snapshot(vec![record("u1", "default", "Pod", t0())]))
        .apply(Action::Teardown)
        .apply(SessionInput::StreamEvent(record("u2", "default", "Pod", t0())).into());
    assert_eq!(session.events().len(), 1);
}
