use std::collections::HashSet;

use errorkube_core::collection::is_sorted_descending;
use errorkube_core::event::decode_with_outcome;
use errorkube_core::{
    Event, FilterState, RecencyWindow, apply_filters, merge_events, sort_descending_by_creation,
};
use proptest::prelude::*;

use generators::*;

fn with_identity(events: Vec<Event>) -> Vec<Event> {
    events.into_iter().filter(|e| e.identity().is_some()).collect()
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(2000))]

    // Merge

    #[test]
    fn merge_idempotent(a in arb_events(40), b in arb_events(40)) {
        let a = with_identity(a);
        let b = with_identity(b);
        let once = merge_events(a, b.clone());
        let twice = merge_events(once.events.clone(), b);
        prop_assert_eq!(once.events, twice.events);
        prop_assert_eq!(twice.added, 0);
    }

    #[test]
    fn merge_has_no_repeated_identity(a in arb_events(40), b in arb_events(40)) {
        let bound = a.len() + b.len();
        let merged = merge_events(a, b);
        prop_assert!(merged.events.len() <= bound);
        prop_assert_eq!(merged.events.len() + merged.duplicates_skipped, bound);

        let mut seen = HashSet::new();
        for event in &merged.events {
            if let Some(identity) = event.identity() {
                prop_assert!(seen.insert(identity.to_string()), "repeated identity {}", identity);
            }
        }
    }

    #[test]
    fn merge_keeps_every_anonymous_event(a in arb_events(30), b in arb_events(30)) {
        let anonymous = a.iter().chain(&b).filter(|e| e.identity().is_none()).count();
        let merged = merge_events(a, b);
        let kept = merged.events.iter().filter(|e| e.identity().is_none()).count();
        prop_assert_eq!(kept, anonymous);
    }

    // Ordering

    #[test]
    fn sort_orders_newest_first(events in arb_events(60)) {
        let mut events = events;
        sort_descending_by_creation(&mut events);
        prop_assert!(is_sorted_descending(&events));
    }

    #[test]
    fn sort_keeps_input_order_for_equal_keys(events in arb_events(60)) {
        let mut sorted = events.clone();
        sort_descending_by_creation(&mut sorted);

        // Undated events share one key, so ties are common; each key group
        // must list its events in their original relative order.
        let mut keys: Vec<_> = events.iter().map(Event::created_at).collect();
        keys.sort_unstable();
        keys.dedup();
        for key in keys {
            let before: Vec<&Event> = events.iter().filter(|e| e.created_at() == key).collect();
            let after: Vec<&Event> = sorted.iter().filter(|e| e.created_at() == key).collect();
            prop_assert_eq!(before, after);
        }
    }

    // Filtering

    #[test]
    fn filter_never_changes_collection(events in arb_events(40), filter in arb_filter()) {
        let before = events.clone();
        let _ = apply_filters(&events, &filter, reference_now());
        prop_assert_eq!(events, before);
    }

    #[test]
    fn adding_a_constraint_narrows(events in arb_events(40), filter in arb_filter(), window in arb_window()) {
        let loose = FilterState {
            namespace: None,
            window: RecencyWindow::AllTime,
            ..filter.clone()
        };
        let tight = FilterState { window, ..filter };
        let now = reference_now();
        let loose_view = apply_filters(&events, &loose, now);
        let tight_view = apply_filters(&events, &tight, now);
        prop_assert!(tight_view.len() <= loose_view.len());
        for event in tight_view {
            prop_assert!(loose_view.iter().any(|e| std::ptr::eq(*e, event)));
        }
    }

    #[test]
    fn empty_filter_shows_everything(events in arb_events(40)) {
        let visible = apply_filters(&events, &FilterState::default(), reference_now());
        prop_assert_eq!(visible.len(), events.len());
    }

    // Decoding

    #[test]
    fn decode_never_drops_a_record(raw in arb_raw_event()) {
        let uid = raw.uid.clone().filter(|uid| !uid.is_empty());
        let decoded = decode_with_outcome(raw);
        if decoded.event.kube().is_none() {
            prop_assert_eq!(decoded.event.identity().map(str::to_string), uid);
        }
    }
}
