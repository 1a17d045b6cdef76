//! `errorkube watch`: the interactive live view.

use crate::cmd::{FilterArgs, Sources};
use crate::output::CodedError;
use crate::tui::WatchView;
use anyhow::{Context, Result};
use clap::Args;
use crossterm::{
    event::{self, Event as TermEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use errorkube_core::{ErrorCode, RecencyWindow, Session, SnapshotState, StreamState};
use errorkube_feed::{FeedHandle, spawn_session_feed};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, IsTerminal, Stdout};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Key poll timeout; also bounds how long a live arrival waits to be drawn.
const TICK: Duration = Duration::from_millis(150);

#[derive(Args, Debug, Default)]
pub struct WatchArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Write logs to this file (default: <cache dir>/errorkube/watch.log).
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl WatchArgs {
    /// Log destination while the terminal is taken over by the UI.
    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_file
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join("errorkube").join("watch.log")))
    }
}

type Term = Terminal<CrosstermBackend<Stdout>>;

/// Execute `errorkube watch`.
///
/// # Errors
///
/// Returns an error if stdout is not a terminal, the terminal cannot be set
/// up or restored, or the feed thread cannot be started.
pub fn run_watch(args: &WatchArgs, sources: &Sources, default_window: RecencyWindow) -> Result<()> {
    if !io::stdout().is_terminal() {
        return Err(CodedError::new(
            ErrorCode::TerminalSetupFailed,
            "watch needs an interactive terminal; use `errorkube list --follow` instead",
        )
        .into());
    }

    let filter = args.filter.to_filter(default_window);
    let source = sources.snapshot_source()?;
    let stream = sources.stream_options()?;
    let live = stream.is_some();
    info!(source = %source.describe(), live, "starting watch session");

    let handle = spawn_session_feed(source, stream).context("failed to start feed thread")?;
    let mut view = WatchView::new(Session::with_filter(filter), live);

    let mut terminal = setup_terminal()
        .map_err(|err| CodedError::new(ErrorCode::TerminalSetupFailed, format!("{err:#}")))?;
    let result = event_loop(&mut terminal, &mut view, &handle);
    let restored = restore_terminal(&mut terminal);

    view.teardown();
    let stats = view.session().stats();
    info!(
        received = stats.received,
        duplicates = stats.duplicates_skipped,
        degraded = stats.degraded,
        "watch session ended"
    );
    if producer_may_block(view.session()) {
        // Blocked on the snapshot request or a slow handshake; it notices the
        // cleared flag and exits on its own.
        drop(handle);
    } else {
        handle.shutdown();
    }

    result.and(restored)
}

/// True while the producer may sit in a blocking call (the snapshot request,
/// or the live-feed connect) that joining would wait on.
fn producer_may_block(session: &Session) -> bool {
    matches!(session.snapshot(), SnapshotState::Pending)
        || matches!(session.stream(), StreamState::Connecting)
}

fn event_loop(terminal: &mut Term, view: &mut WatchView, handle: &FeedHandle) -> Result<()> {
    loop {
        while let Some(input) = handle.try_next() {
            view.ingest(input);
        }
        view.tick();

        terminal.draw(|frame| {
            let area = frame.area();
            view.render(frame, area);
        })?;

        if event::poll(TICK)? {
            if let TermEvent::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    view.handle_key(key)?;
                }
            }
        }

        if view.should_quit() {
            debug!("quit requested");
            return Ok(());
        }
    }
}

fn setup_terminal() -> Result<Term> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    if let Err(err) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(err).context("failed to enter alternate screen");
    }
    Terminal::new(CrosstermBackend::new(stdout)).context("failed to create terminal")
}

fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}
