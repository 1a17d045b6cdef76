//! One-shot snapshot sources.
//!
//! The HTTP source asks the event server for everything it has stored; the
//! file source reads the same JSON document from disk. Both hand back records
//! in the order they were delivered. Decoding is left to the session.

use std::path::{Path, PathBuf};

use errorkube_core::config::Endpoints;
use errorkube_core::event::decode;
use errorkube_core::RawEvent;
use tracing::{debug, info, instrument};

use crate::error::SourceError;

/// A place the initial batch of events comes from.
pub trait SnapshotSource: Send {
    /// Fetch every stored record.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the source is unreachable, answers with
    /// an error, or does not hold a JSON array of records.
    fn fetch(&self) -> Result<Vec<RawEvent>, SourceError>;

    /// Fetch the record whose identity is `uid`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::NotFound`] when no such record exists, or any
    /// error [`SnapshotSource::fetch`] can return.
    fn fetch_one(&self, uid: &str) -> Result<RawEvent, SourceError>;

    /// Short description for logs (`http://…/api/events`, a file path).
    fn describe(&self) -> String;
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// Snapshot served by the errorkube server's REST API.
pub struct HttpSnapshot {
    agent: ureq::Agent,
    endpoints: Endpoints,
}

impl HttpSnapshot {
    #[must_use]
    pub fn new(endpoints: Endpoints) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(endpoints.timeout)
            .user_agent(concat!("errorkube/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent, endpoints }
    }

    fn get_text(&self, url: &str) -> Result<String, SourceError> {
        let response = self
            .agent
            .get(url)
            .set("Accept", "application/json")
            .call()
            .map_err(|err| match err {
                ureq::Error::Status(status, _) => SourceError::Status {
                    url: url.to_string(),
                    status,
                },
                ureq::Error::Transport(transport) => SourceError::Transport {
                    url: url.to_string(),
                    message: transport.to_string(),
                },
            })?;

        response.into_string().map_err(|err| SourceError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        })
    }
}

impl SnapshotSource for HttpSnapshot {
    #[instrument(skip(self), fields(url = %self.endpoints.snapshot))]
    fn fetch(&self) -> Result<Vec<RawEvent>, SourceError> {
        let url = self.endpoints.snapshot.as_str();
        let body = self.get_text(url)?;
        let records = RawEvent::parse_array(&body).map_err(|source| SourceError::Json {
            origin: url.to_string(),
            source,
        })?;
        info!(records = records.len(), "snapshot fetched");
        Ok(records)
    }

    #[instrument(skip(self))]
    fn fetch_one(&self, uid: &str) -> Result<RawEvent, SourceError> {
        let url = self
            .endpoints
            .event_url(uid)
            .map_err(|err| SourceError::Transport {
                url: self.endpoints.snapshot.to_string(),
                message: err.to_string(),
            })?;

        let body = match self.get_text(url.as_str()) {
            Err(SourceError::Status { status: 404, .. }) => {
                return Err(SourceError::NotFound {
                    uid: uid.to_string(),
                });
            }
            other => other?,
        };
        debug!(bytes = body.len(), "event fetched");
        RawEvent::from_json(&body).map_err(|source| SourceError::Json {
            origin: url.to_string(),
            source,
        })
    }

    fn describe(&self) -> String {
        self.endpoints.snapshot.to_string()
    }
}

// ---------------------------------------------------------------------------
// File
// ---------------------------------------------------------------------------

/// Snapshot read from a local JSON file (same shape as the HTTP response).
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    path: PathBuf,
}

impl FileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSource for FileSnapshot {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn fetch(&self) -> Result<Vec<RawEvent>, SourceError> {
        let body = std::fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        let records = RawEvent::parse_array(&body).map_err(|source| SourceError::Json {
            origin: self.path.display().to_string(),
            source,
        })?;
        info!(records = records.len(), "snapshot loaded from file");
        Ok(records)
    }

    fn fetch_one(&self, uid: &str) -> Result<RawEvent, SourceError> {
        self.fetch()?
            .into_iter()
            .find(|raw| decode(raw.clone()).identity() == Some(uid))
            .ok_or_else(|| SourceError::NotFound {
                uid: uid.to_string(),
            })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
