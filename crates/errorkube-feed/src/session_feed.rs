//! Producer thread feeding a session.
//!
//! One thread per session runs the snapshot fetch and then the live feed,
//! sending each outcome down a channel as a [`SessionInput`]. A single
//! producer means the snapshot is always delivered before any stream event.
//!
//! # Teardown
//!
//! [`FeedHandle::shutdown`] (or dropping the handle) clears a shared liveness
//! flag. The producer checks it after the snapshot returns, discarding a late
//! response, while the live-feed handshake is pending, and between live-feed
//! reads, closing the connection. Dropping the
//! receiver has the same effect on the next send.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use errorkube_core::SessionInput;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::SourceError;
use crate::live::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_POLL_INTERVAL, LiveFeed, Poll};
use crate::snapshot::SnapshotSource;

/// Where the live feed lives and how often the producer checks for teardown.
#[derive(Debug, Clone)]
pub struct StreamOptions {
    pub url: Url,
    pub poll_interval: Duration,
    /// Limit on connecting and completing the handshake.
    pub connect_timeout: Duration,
}

impl StreamOptions {
    #[must_use]
    pub const fn new(url: Url) -> Self {
        Self {
            url,
            poll_interval: DEFAULT_POLL_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Consumer side of a running session feed.
pub struct FeedHandle {
    inputs: Receiver<SessionInput>,
    alive: Arc<AtomicBool>,
    producer: Option<JoinHandle<()>>,
}

impl FeedHandle {
    /// Next input if one is ready.
    ///
    /// Returns `None` both when nothing is pending and when the producer has
    /// finished; use [`FeedHandle::is_finished`] to tell them apart.
    #[must_use]
    pub fn try_next(&self) -> Option<SessionInput> {
        match self.inputs.try_recv() {
            Ok(input) => Some(input),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Wait up to `timeout` for the next input. `None` on timeout or when the
    /// producer has finished.
    #[must_use]
    pub fn next_timeout(&self, timeout: Duration) -> Option<SessionInput> {
        match self.inputs.recv_timeout(timeout) {
            Ok(input) => Some(input),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Block until the next input; `None` once the producer has finished and
    /// every input has been drained.
    #[must_use]
    pub fn next_blocking(&self) -> Option<SessionInput> {
        self.inputs.recv().ok()
    }

    /// True when the producer thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.producer.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stop the producer and wait for it to exit.
    pub fn shutdown(mut self) {
        self.stop();
        if let Some(producer) = self.producer.take() {
            if producer.join().is_err() {
                warn!("session feed thread panicked");
            }
        }
    }

    fn stop(&self) {
        self.alive.store(false, Ordering::Release);
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        // Not joined: a snapshot request may still be in flight.
        self.stop();
    }
}

/// Start the producer thread for one session.
///
/// With `stream` set to `None` only the snapshot is delivered and the channel
/// then closes.
///
/// # Errors
///
/// Returns an error if the thread cannot be spawned.
pub fn spawn_session_feed(
    source: Box<dyn SnapshotSource>,
    stream: Option<StreamOptions>,
) -> std::io::Result<FeedHandle> {
    let (tx, rx) = mpsc::channel();
    let alive = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&alive);

    let producer = thread::Builder::new()
        .name("errorkube-feed".to_string())
        .spawn(move || run_producer(source.as_ref(), stream, &tx, &flag))?;

    Ok(FeedHandle {
        inputs: rx,
        alive,
        producer: Some(producer),
    })
}

fn run_producer(
    source: &dyn SnapshotSource,
    stream: Option<StreamOptions>,
    tx: &Sender<SessionInput>,
    alive: &AtomicBool,
) {
    let snapshot = match source.fetch() {
        Ok(records) => SessionInput::SnapshotLoaded(records),
        Err(err) => {
            warn!(source = %source.describe(), "snapshot fetch failed: {err}");
            SessionInput::SnapshotFailed(err.to_string())
        }
    };
    if !alive.load(Ordering::Acquire) {
        debug!("session closed while snapshot was in flight; discarding it");
        return;
    }
    if tx.send(snapshot).is_err() {
        return;
    }

    let Some(stream) = stream else {
        return;
    };
    let connected = LiveFeed::connect_while(
        &stream.url,
        stream.poll_interval,
        stream.connect_timeout,
        || alive.load(Ordering::Acquire),
    );
    let mut feed = match connected {
        Ok(feed) => feed,
        Err(SourceError::Cancelled { .. }) => {
            info!("session closed while the live feed was connecting");
            return;
        }
        Err(err) => {
            let _ = tx.send(SessionInput::StreamError(err.to_string()));
            return;
        }
    };
    if tx.send(SessionInput::StreamOpened).is_err() {
        feed.close();
        return;
    }

    loop {
        if !alive.load(Ordering::Acquire) {
            info!("session closed; closing live feed");
            feed.close();
            return;
        }
        let input = match feed.poll() {
            Ok(Poll::Idle) => continue,
            Ok(Poll::Event(raw)) => SessionInput::StreamEvent(raw),
            Ok(Poll::Closed) => {
                let _ = tx.send(SessionInput::StreamClosed);
                return;
            }
            Err(err) => {
                let _ = tx.send(SessionInput::StreamError(err.to_string()));
                return;
            }
        };
        if tx.send(input).is_err() {
            debug!("session receiver dropped; closing live feed");
            feed.close();
            return;
        }
    }
}
