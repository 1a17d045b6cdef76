//! errorkube-core library.
//!
//! Pure event pipeline for the errorkube viewer: decode raw records, merge them
//! into one deduplicated collection, keep it ordered newest-first, and select a
//! filtered view of it. Nothing in this crate touches the network.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums at module seams, `anyhow::Result`
//!   for config loading.
//! - **Logging**: use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
//!   Decode and merge problems are logged, never raised.

pub mod collection;
pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod session;

pub use collection::{MergeResult, merge_events, sort_descending_by_creation};
pub use config::{Config, Endpoints, load_config};
pub use error::ErrorCode;
pub use event::{DecodeOutcome, Event, EventBody, KubeEvent, RawEvent, decode};
pub use filter::{FilterState, RecencyWindow, apply_filters, distinct_kinds, distinct_namespaces};
pub use session::{
    Action, FilterChange, Session, SessionInput, SessionStats, SnapshotState, StreamState,
};
