use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::filter::RecencyWindow;

/// Server the viewer talks to when nothing else is configured.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
    #[serde(default = "default_stream_path")]
    pub stream_path: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            snapshot_path: default_snapshot_path(),
            stream_path: default_stream_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Initial recency window (`all`, `1h`, `10h`, `24h`, `1w`, `30d`).
    #[serde(default)]
    pub window: RecencyWindow,
    /// Preferred output mode for one-shot commands (`pretty`, `text`, `json`).
    #[serde(default)]
    pub output: Option<String>,
}

/// Fully resolved network endpoints for one server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// `GET` target returning the snapshot array.
    pub snapshot: Url,
    /// WebSocket URL of the live feed.
    pub stream: Url,
    /// Timeout applied to snapshot requests.
    pub timeout: Duration,
}

impl Endpoints {
    /// URL of a single stored event.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot URL cannot carry path segments.
    pub fn event_url(&self, uid: &str) -> Result<Url> {
        let mut url = self.snapshot.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("{} cannot be a base URL", self.snapshot))?
            .pop_if_empty()
            .push(uid);
        Ok(url)
    }
}

impl ServerConfig {
    /// Derive the snapshot and stream endpoints from `base`.
    ///
    /// Configured paths are appended to whatever path `base` already has, so
    /// a server mounted under a prefix keeps it. The stream URL switches
    /// scheme `http → ws` and `https → wss`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base` is not an absolute http(s) URL.
    pub fn endpoints(&self, base: &str) -> Result<Endpoints> {
        let base = Url::parse(base.trim()).with_context(|| format!("Invalid server URL '{base}'"))?;
        let stream_scheme = match base.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => bail!("Unsupported server URL scheme '{other}' (expected http or https)"),
        };

        let snapshot = append_path(&base, &self.snapshot_path)?;
        let mut stream = append_path(&base, &self.stream_path)?;
        stream
            .set_scheme(stream_scheme)
            .map_err(|()| anyhow::anyhow!("Cannot derive a {stream_scheme} URL from {base}"))?;

        Ok(Endpoints {
            snapshot,
            stream,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}

/// `base` with the segments of `path` pushed onto its path.
fn append_path(base: &Url, path: &str) -> Result<Url> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|()| anyhow::anyhow!("{base} cannot be a base URL"))?
        .pop_if_empty()
        .extend(path.split('/').filter(|segment| !segment.is_empty()));
    Ok(url)
}

/// `<config_dir>/errorkube/config.toml`, when the platform has a config dir.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("errorkube/config.toml"))
}

/// Load configuration.
///
/// An explicit `path` must exist. Without one, the default location is used
/// when present and built-in defaults otherwise.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(Config::default()),
        },
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<Config>(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Pick the server URL: CLI flag, then `ERRORKUBE_URL`, then the config file.
#[must_use]
pub fn resolve_server_url(cli_url: Option<&str>, env_url: Option<&str>, config: &Config) -> String {
    cli_url
        .or(env_url)
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .unwrap_or(&config.server.url)
        .to_string()
}

/// Map an output-mode name (and legacy aliases) to its canonical form.
#[must_use]
pub fn normalize_output_mode(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pretty" | "human" => Some("pretty"),
        "text" | "table" => Some("text"),
        "json" => Some("json"),
        _ => None,
    }
}

fn default_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_snapshot_path() -> String {
    "/api/events".to_string()
}

fn default_stream_path() -> String {
    "/events".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}
