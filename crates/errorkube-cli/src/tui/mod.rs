//! Interactive terminal UI.

pub mod watch;

pub use watch::WatchView;
