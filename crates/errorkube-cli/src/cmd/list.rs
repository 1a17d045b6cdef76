//! `errorkube list`: print the filtered snapshot, optionally following the live feed.

use crate::cmd::{FilterArgs, Sources};
use crate::output::{CodedError, OutputMode, Renderable, render_item, render_list};
use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use clap::Args;
use errorkube_core::{
    ErrorCode, Event, RawEvent, RecencyWindow, Session, SessionInput, StreamState, decode,
};
use errorkube_feed::{SnapshotSource, SourceError, spawn_session_feed};
use serde::Serialize;
use std::io::{self, Write};
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Maximum events to print from the snapshot (newest first).
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Keep running and print matching events as they arrive on the live feed.
    #[arg(short, long)]
    pub follow: bool,
}

/// One event as printed by `list`.
#[derive(Debug, Clone, Serialize)]
pub struct EventRow {
    pub uid: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub namespace: Option<String>,
    pub kind: Option<String>,
    pub object: Option<String>,
    pub reason: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub degraded: bool,
}

impl From<&Event> for EventRow {
    fn from(event: &Event) -> Self {
        let object = event
            .kube()
            .and_then(|kube| kube.involved_object.name.clone())
            .or_else(|| event.name().map(str::to_string));
        Self {
            uid: event.identity().map(str::to_string),
            created: event.created_at(),
            namespace: event.namespace().map(str::to_string),
            kind: event.kind().map(str::to_string),
            object,
            reason: event.reason().map(str::to_string),
            message: event.message().map(str::to_string),
            event_type: event.event_type().map(str::to_string),
            degraded: event.is_degraded(),
        }
    }
}

impl EventRow {
    /// `Kind/name`, or whichever half is known.
    fn object_label(&self) -> String {
        match (&self.kind, &self.object) {
            (Some(kind), Some(name)) => format!("{kind}/{name}"),
            (Some(only), None) | (None, Some(only)) => only.clone(),
            (None, None) => "-".to_string(),
        }
    }

    fn message_line(&self) -> String {
        if self.degraded {
            return "(undecodable payload)".to_string();
        }
        self.message
            .as_deref()
            .map_or_else(|| "-".to_string(), |msg| msg.replace('\n', " "))
    }
}

/// RFC 3339 UTC, or `-` for undated events.
pub fn format_utc(ts: Option<DateTime<Utc>>) -> String {
    ts.map_or_else(
        || "-".to_string(),
        |ts| ts.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
    )
}

/// Local wall-clock time, or `-` for undated events.
pub fn format_local(ts: Option<DateTime<Utc>>) -> String {
    ts.map_or_else(
        || "-".to_string(),
        |ts| ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

impl Renderable for EventRow {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}  {}  {}",
            format_local(self.created),
            or_dash(self.namespace.as_deref()),
            self.object_label()
        )?;
        writeln!(
            w,
            "    {}: {}",
            or_dash(self.reason.as_deref()),
            self.message_line()
        )
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(&mut *w, self)?;
        writeln!(w)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}  {}  {}  {}  {}",
            format_utc(self.created),
            or_dash(self.namespace.as_deref()),
            self.object_label(),
            or_dash(self.reason.as_deref()),
            self.message_line()
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["TIME", "NAMESPACE", "OBJECT", "REASON", "MESSAGE"]
    }
}

/// Execute `errorkube list`.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded, output cannot be
/// written, or the live feed fails while following.
pub fn run_list(
    args: &ListArgs,
    output: OutputMode,
    sources: &Sources,
    default_window: RecencyWindow,
) -> Result<()> {
    let filter = args.filter.to_filter(default_window);
    let session = sources.load_session(filter)?;
    let rows = snapshot_rows(&session, Utc::now(), args.limit);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_list(&mut out, &rows, output)?;
    out.flush()?;

    if args.follow {
        follow(session, sources, output, &mut out)?;
    }
    Ok(())
}

fn snapshot_rows(session: &Session, now: DateTime<Utc>, limit: Option<usize>) -> Vec<EventRow> {
    session
        .visible(now)
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(EventRow::from)
        .collect()
}

/// Print live arrivals that are new and pass the filter until the feed ends.
fn follow(
    session: Session,
    sources: &Sources,
    output: OutputMode,
    out: &mut dyn Write,
) -> Result<()> {
    let Some(stream) = sources.stream_options()? else {
        warn!("--follow has no effect with --snapshot-file");
        return Ok(());
    };

    // The snapshot is already in `session`; the producer only runs the feed.
    let handle = spawn_session_feed(Box::new(NoSnapshot), Some(stream))?;
    let mut session = session;
    let mut opened = false;

    while let Some(input) = handle.next_blocking() {
        if matches!(input, SessionInput::SnapshotLoaded(_)) {
            continue;
        }
        let arrival = match input {
            SessionInput::StreamEvent(ref raw) => Some(decode(raw.clone())),
            _ => None,
        };
        let before = session.events().len();
        session = session.apply(input.into());

        if let Some(event) = arrival {
            let added = session.events().len() > before;
            if added && session.filter().matches(&event, Utc::now()) {
                render_item(out, &EventRow::from(&event), output)?;
                out.flush()?;
            }
        }

        match session.stream() {
            StreamState::Open => opened = true,
            StreamState::Errored(reason) => {
                let code = if opened {
                    ErrorCode::StreamTransportFailed
                } else {
                    ErrorCode::StreamConnectFailed
                };
                let reason = reason.clone();
                handle.shutdown();
                return Err(CodedError::new(code, reason).into());
            }
            StreamState::Closed => {
                info!("live feed closed by server");
                break;
            }
            StreamState::Connecting => {}
        }
    }

    handle.shutdown();
    Ok(())
}

/// Snapshot stand-in for `--follow`, whose snapshot was fetched up front.
struct NoSnapshot;

impl SnapshotSource for NoSnapshot {
    fn fetch(&self) -> Result<Vec<RawEvent>, SourceError> {
        Ok(Vec::new())
    }

    fn fetch_one(&self, uid: &str) -> Result<RawEvent, SourceError> {
        Err(SourceError::NotFound {
            uid: uid.to_string(),
        })
    }

    fn describe(&self) -> String {
        "snapshot already loaded".to_string()
    }
}
