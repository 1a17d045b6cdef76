use std::io;
use std::path::PathBuf;

use errorkube_core::ErrorCode;

/// Failure talking to one of the event sources.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("event '{uid}' not found")]
    NotFound { uid: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid event JSON from {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("cannot connect to live feed at {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: Box<tungstenite::Error>,
    },

    #[error("connection to {url} abandoned: session closed")]
    Cancelled { url: String },

    #[error("live feed failed: {0}")]
    WebSocket(#[source] Box<tungstenite::Error>),
}

impl SourceError {
    /// Operator-facing classification of this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Status { .. } => ErrorCode::SnapshotStatusError,
            Self::Transport { .. } => ErrorCode::SnapshotFetchFailed,
            Self::NotFound { .. } => ErrorCode::EventNotFound,
            Self::Io { .. } => ErrorCode::SnapshotFileUnreadable,
            Self::Json { .. } => ErrorCode::SnapshotDecodeFailed,
            Self::Url(_) => ErrorCode::InvalidServerUrl,
            Self::Connect { .. } | Self::Cancelled { .. } => ErrorCode::StreamConnectFailed,
            Self::WebSocket(_) => ErrorCode::StreamTransportFailed,
        }
    }
}

impl From<tungstenite::Error> for SourceError {
    fn from(err: tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(err))
    }
}
