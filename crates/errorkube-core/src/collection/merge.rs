//! First-seen-wins merge of event batches.
//!
//! # Merge Semantics
//!
//! The merge walks `existing ++ incoming` in order and keeps the first
//! occurrence of every identity. Events without an identity cannot be
//! recognised again, so each one is kept. Nothing already in the collection is
//! ever replaced: a later copy of a known event (for example the live feed
//! replaying an event already present in the snapshot) is dropped.
//!
//! Ordering is not touched here; see [`super::order`].

use std::collections::HashSet;

use tracing::trace;

use crate::event::Event;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// The result of merging a batch into the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    /// Merged events, in first-seen order (not yet sorted by time).
    pub events: Vec<Event>,
    /// Number of events from `incoming` that were kept.
    pub added: usize,
    /// Number of input events dropped because their identity was already seen.
    pub duplicates_skipped: usize,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Merge `incoming` into `existing`, keeping the first event seen for each
/// identity.
///
/// Duplicates inside `existing` itself are collapsed too, so the result
/// satisfies the one-event-per-identity invariant even when the input does
/// not.
///
/// # Examples
///
/// ```
/// use errorkube_core::collection::merge::merge_events;
///
/// let merged = merge_events(Vec::new(), Vec::new());
/// assert!(merged.events.is_empty());
/// assert_eq!(merged.added, 0);
/// ```
#[must_use]
pub fn merge_events(existing: Vec<Event>, incoming: Vec<Event>) -> MergeResult {
    let total = existing.len() + incoming.len();
    let existing_len = existing.len();

    let mut seen: HashSet<String> = HashSet::with_capacity(total);
    let mut events: Vec<Event> = Vec::with_capacity(total);
    let mut added = 0;

    for (position, event) in existing.into_iter().chain(incoming).enumerate() {
        let fresh = match event.identity() {
            Some(identity) => seen.insert(identity.to_string()),
            None => true,
        };
        if !fresh {
            trace!(identity = event.identity(), "skipping duplicate event");
            continue;
        }
        if position >= existing_len {
            added += 1;
        }
        events.push(event);
    }

    let duplicates_skipped = total - events.len();

    MergeResult {
        events,
        added,
        duplicates_skipped,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
