//! The merged event collection: identity-based deduplication and
//! newest-first ordering.
//!
//! The collection is a plain `Vec<Event>`. It only ever grows by merging and
//! is re-sorted after every merge, so callers always hold the
//! invariant-respecting form:
//!
//! - at most one event per identity (events without identity are all kept),
//! - sorted descending by `metadata.creationTimestamp`, stable on ties.

pub mod merge;
pub mod order;

pub use merge::{MergeResult, merge_events};
pub use order::{is_sorted_descending, sort_descending_by_creation};
