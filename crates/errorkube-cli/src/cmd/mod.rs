//! Subcommand implementations and the plumbing they share.

pub mod completions;
pub mod facets;
pub mod list;
pub mod show;
pub mod watch;

use crate::output::CodedError;
use anyhow::Result;
use clap::Args;
use errorkube_core::config::ServerConfig;
use errorkube_core::{Endpoints, ErrorCode, FilterState, RecencyWindow, Session, SessionInput};
use errorkube_feed::{FileSnapshot, HttpSnapshot, SnapshotSource, StreamOptions};
use std::path::PathBuf;
use tracing::debug;

/// Where events come from for one invocation.
#[derive(Debug, Clone)]
pub struct Sources {
    /// Resolved server base URL (flag > env > config).
    pub server_url: String,
    /// Read the snapshot from this file instead of the server.
    pub snapshot_file: Option<PathBuf>,
    pub server: ServerConfig,
}

impl Sources {
    pub fn endpoints(&self) -> Result<Endpoints> {
        self.server
            .endpoints(&self.server_url)
            .map_err(|err| CodedError::new(ErrorCode::InvalidServerUrl, format!("{err:#}")).into())
    }

    pub fn snapshot_source(&self) -> Result<Box<dyn SnapshotSource>> {
        match self.snapshot_file {
            Some(ref path) => Ok(Box::new(FileSnapshot::new(path.clone()))),
            None => Ok(Box::new(HttpSnapshot::new(self.endpoints()?))),
        }
    }

    /// Live feed settings. A snapshot file has no live feed.
    pub fn stream_options(&self) -> Result<Option<StreamOptions>> {
        if self.snapshot_file.is_some() {
            return Ok(None);
        }
        let endpoints = self.endpoints()?;
        let mut options = StreamOptions::new(endpoints.stream);
        options.connect_timeout = endpoints.timeout;
        Ok(Some(options))
    }

    /// Fetch the snapshot and fold it into a fresh session.
    pub fn load_session(&self, filter: FilterState) -> Result<Session> {
        let source = self.snapshot_source()?;
        debug!(source = %source.describe(), "loading snapshot");
        let records = source.fetch()?;
        Ok(Session::with_filter(filter).apply(SessionInput::SnapshotLoaded(records).into()))
    }
}

/// Filter flags shared by `list` and `watch`.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only events in this namespace.
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Only events about this object kind (Pod, Node, ...).
    #[arg(short, long)]
    pub kind: Option<String>,

    /// Case-insensitive substring match on the event reason.
    #[arg(short, long)]
    pub search: Option<String>,

    /// Recency window: all, 1h, 10h, 24h, 1w, 30d. Defaults to the config value.
    #[arg(short, long)]
    pub window: Option<RecencyWindow>,
}

impl FilterArgs {
    /// Build the initial filter, falling back to `default_window`.
    pub fn to_filter(&self, default_window: RecencyWindow) -> FilterState {
        let mut filter = FilterState {
            window: self.window.unwrap_or(default_window),
            search_query: self.search.clone().unwrap_or_default(),
            ..FilterState::default()
        };
        filter.set_namespace(self.namespace.clone());
        filter.set_kind(self.kind.clone());
        filter
    }
}
