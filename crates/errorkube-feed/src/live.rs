//! WebSocket live feed.
//!
//! The server pushes one JSON record per text message for as long as the
//! connection lives. [`LiveFeed::poll`] reads at most one message and returns
//! after the read timeout when the feed is quiet, so the caller can check
//! whether it should keep going.

use std::io::{self, ErrorKind};
use std::net::TcpStream;
use std::time::{Duration, Instant};

use errorkube_core::RawEvent;
use tracing::{debug, info, instrument, warn};
use tungstenite::handshake::HandshakeError;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};
use url::Url;

use crate::error::SourceError;

/// Read timeout used when the caller does not pick one.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Upper bound on TCP connect plus the WebSocket handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of one [`LiveFeed::poll`].
#[derive(Debug, Clone, PartialEq)]
pub enum Poll {
    /// A record arrived.
    Event(RawEvent),
    /// Nothing usable arrived before the timeout (or only control frames or
    /// unparseable text did).
    Idle,
    /// The peer closed the connection.
    Closed,
}

/// An open live-feed connection.
pub struct LiveFeed {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
    url: Url,
}

impl LiveFeed {
    /// Connect to the feed at `url` (`ws://` or `wss://`), giving up after
    /// [`DEFAULT_CONNECT_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// See [`LiveFeed::connect_while`].
    pub fn connect(url: &Url, poll_interval: Duration) -> Result<Self, SourceError> {
        Self::connect_while(url, poll_interval, DEFAULT_CONNECT_TIMEOUT, || true)
    }

    /// Connect to the feed at `url`, checking `keep_going` every
    /// `poll_interval` while the server has not finished the handshake.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Cancelled`] once `keep_going` returns false,
    /// and [`SourceError::Connect`] if the TCP connect or the handshake fails
    /// or does not finish within `timeout`.
    #[instrument(skip_all, fields(url = %url))]
    pub fn connect_while(
        url: &Url,
        poll_interval: Duration,
        timeout: Duration,
        keep_going: impl Fn() -> bool,
    ) -> Result<Self, SourceError> {
        let connect_err = |source: tungstenite::Error| SourceError::Connect {
            url: url.to_string(),
            source: Box::new(source),
        };
        let deadline = Instant::now() + timeout;

        let tcp = open_tcp(url, timeout).map_err(|err| connect_err(err.into()))?;
        tcp.set_read_timeout(Some(poll_interval))
            .and_then(|()| tcp.set_write_timeout(Some(timeout)))
            .map_err(|err| connect_err(err.into()))?;

        let mut attempt = tungstenite::client_tls(url.as_str(), tcp);
        let (socket, response) = loop {
            match attempt {
                Ok(done) => break done,
                Err(HandshakeError::Failure(err)) => return Err(connect_err(err)),
                Err(HandshakeError::Interrupted(mid)) => {
                    if !keep_going() {
                        debug!("live feed handshake abandoned");
                        return Err(SourceError::Cancelled {
                            url: url.to_string(),
                        });
                    }
                    if Instant::now() >= deadline {
                        let err = io::Error::new(ErrorKind::TimedOut, "handshake timed out");
                        return Err(connect_err(err.into()));
                    }
                    attempt = mid.handshake();
                }
            }
        };
        debug!(status = %response.status(), "live feed handshake complete");

        info!("live feed connected");
        Ok(Self {
            socket,
            url: url.clone(),
        })
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Read at most one message.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::WebSocket`] when the connection fails. The feed
    /// is unusable afterwards.
    pub fn poll(&mut self) -> Result<Poll, SourceError> {
        let message = match self.socket.read() {
            Ok(message) => message,
            Err(tungstenite::Error::Io(err))
                if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                return Ok(Poll::Idle);
            }
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                return Ok(Poll::Closed);
            }
            Err(err) => return Err(err.into()),
        };

        match message {
            Message::Text(text) => Ok(parse_message(&text)),
            Message::Binary(bytes) => match String::from_utf8(bytes) {
                Ok(text) => Ok(parse_message(&text)),
                Err(err) => {
                    warn!("skipping binary feed message that is not UTF-8: {err}");
                    Ok(Poll::Idle)
                }
            },
            Message::Close(frame) => {
                info!(?frame, "live feed closed by server");
                // Send the queued close reply.
                let _ = self.socket.flush();
                Ok(Poll::Closed)
            }
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Ok(Poll::Idle),
        }
    }

    /// Send a close frame and flush it. Errors are ignored; the connection is
    /// going away either way.
    pub fn close(&mut self) {
        if let Err(err) = self.socket.close(None) {
            debug!("close frame not sent: {err}");
        }
        let _ = self.socket.flush();
    }
}

fn parse_message(text: &str) -> Poll {
    match RawEvent::from_json(text) {
        Ok(raw) => Poll::Event(raw),
        Err(err) => {
            warn!("skipping live feed message that is not an event record: {err}");
            Poll::Idle
        }
    }
}

/// First address of `url` that accepts a TCP connection within `timeout`.
fn open_tcp(url: &Url, timeout: Duration) -> io::Result<TcpStream> {
    let addrs = url.socket_addrs(|| None)?;
    let mut last_err =
        io::Error::new(ErrorKind::NotFound, format!("{url} resolved to no address"));
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(tcp) => return Ok(tcp),
            Err(err) => {
                debug!(%addr, "live feed connect failed: {err}");
                last_err = err;
            }
        }
    }
    Err(last_err)
}
