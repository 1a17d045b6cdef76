//! errorkube-feed: the two event sources behind an errorkube session.
//!
//! - [`snapshot`]: one-shot bulk fetch of stored events, over HTTP or from a
//!   local file.
//! - [`live`]: the WebSocket live feed, read one message at a time.
//! - [`session_feed`]: a producer thread that runs the snapshot and then the
//!   live feed, handing every outcome to the consumer as a
//!   [`SessionInput`](errorkube_core::SessionInput) over a channel.
//!
//! Everything here is blocking; the consumer owns the only event loop.

pub mod error;
pub mod live;
pub mod session_feed;
pub mod snapshot;

pub use error::SourceError;
pub use live::{LiveFeed, Poll};
pub use session_feed::{FeedHandle, StreamOptions, spawn_session_feed};
pub use snapshot::{FileSnapshot, HttpSnapshot, SnapshotSource};
