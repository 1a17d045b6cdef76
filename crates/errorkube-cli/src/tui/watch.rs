//! Live event view for `errorkube watch`.
//!
//! Shows the session's visible events newest first, with a detail pane for the
//! selected event, a filter popup (time window, namespace, kind), slash search
//! on the reason, and a status bar carrying the feed state and counters.
//!
//! Every change goes through [`Session::apply`]; the view only keeps a copy of
//! the visible rows and the UI state around them.

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use errorkube_core::{
    Action, Event, EventBody, FilterChange, Session, SessionInput, SnapshotState,
};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};
use std::time::{Duration, Instant};
use tracing::debug;

/// How long a transient status message stays up.
const STATUS_TTL: Duration = Duration::from_secs(3);

/// Re-read the clock this often so recency windows keep sliding.
const CLOCK_INTERVAL: Duration = Duration::from_secs(1);

// ── Input modes ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum InputMode {
    #[default]
    Normal,
    /// User is typing a reason search.
    Search,
    /// Filter popup is open.
    FilterPopup,
}

/// Current focus inside the filter popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum FilterField {
    #[default]
    Window,
    Namespace,
    Kind,
}

impl FilterField {
    const fn next(self) -> Self {
        match self {
            Self::Window => Self::Namespace,
            Self::Namespace => Self::Kind,
            Self::Kind => Self::Window,
        }
    }

    const fn prev(self) -> Self {
        match self {
            Self::Window => Self::Kind,
            Self::Namespace => Self::Window,
            Self::Kind => Self::Namespace,
        }
    }
}

// ── View state ──

pub struct WatchView {
    /// Reducer state: collection, filter and source lifecycle.
    session: Session,
    /// Events passing the filter at `now`, newest first.
    visible: Vec<Event>,
    /// Whether a live feed was requested (false for `--snapshot-file`).
    live: bool,
    /// Clock used for recency windows.
    now: DateTime<Utc>,
    last_clock: Instant,
    table_state: TableState,
    input_mode: InputMode,
    /// Buffer for the search query being typed.
    search_buf: String,
    /// Query value before entering Search mode (for Esc cancel).
    query_before_search: String,
    filter_field: FilterField,
    should_quit: bool,
    flash: Option<(String, Instant)>,
    show_detail: bool,
    split_percent: u16,
    detail_scroll: u16,
    /// Geometry of the detail pane from the last render.
    detail_area: Rect,
}

impl WatchView {
    pub fn new(session: Session, live: bool) -> Self {
        let mut view = Self {
            session,
            visible: Vec::new(),
            live,
            now: Utc::now(),
            last_clock: Instant::now(),
            table_state: TableState::default(),
            input_mode: InputMode::default(),
            search_buf: String::new(),
            query_before_search: String::new(),
            filter_field: FilterField::default(),
            should_quit: false,
            flash: None,
            show_detail: false,
            split_percent: 55,
            detail_scroll: 0,
            detail_area: Rect::default(),
        };
        view.search_buf.clone_from(&view.session.filter().search_query);
        view.refresh_visible();
        view
    }

    /// Fold one action into the session and recompute the visible rows.
    pub fn apply(&mut self, action: Action) {
        let session = std::mem::take(&mut self.session);
        self.session = session.apply(action);
        self.refresh_visible();
    }

    /// Fold one source input, surfacing lifecycle changes in the status bar.
    pub fn ingest(&mut self, input: SessionInput) {
        let message = match input {
            SessionInput::SnapshotFailed(ref reason) => Some(format!("Snapshot failed: {reason}")),
            SessionInput::StreamError(ref reason) if !self.session.stream().is_finished() => {
                Some(format!("Live feed error: {reason}"))
            }
            SessionInput::StreamClosed if !self.session.stream().is_finished() => {
                Some("Live feed closed by server".to_string())
            }
            _ => None,
        };
        self.apply(input.into());
        if let Some(message) = message {
            self.set_status(message);
        }
    }

    /// End the session; later inputs are ignored.
    pub fn teardown(&mut self) {
        self.apply(Action::Teardown);
    }

    pub const fn session(&self) -> &Session {
        &self.session
    }

    fn change_filter(&mut self, change: FilterChange) {
        self.apply(change.into());
    }

    /// Recompute the visible rows, keeping the selected event selected when
    /// it is still visible.
    fn refresh_visible(&mut self) {
        let selected_identity = self
            .selected_event()
            .and_then(Event::identity)
            .map(str::to_string);

        self.visible = self
            .session
            .visible(self.now)
            .into_iter()
            .cloned()
            .collect();

        let len = self.visible.len();
        let kept = selected_identity.and_then(|identity| {
            self.visible
                .iter()
                .position(|event| event.identity() == Some(identity.as_str()))
        });
        match (kept, self.table_state.selected()) {
            (Some(i), _) => self.table_state.select(Some(i)),
            (None, _) if len == 0 => self.table_state.select(None),
            (None, Some(i)) if i >= len => self.table_state.select(Some(len - 1)),
            (None, None) => self.table_state.select(Some(0)),
            (None, Some(_)) => {}
        }
        self.clamp_detail_scroll();
    }

    /// Move the clock used for recency windows.
    pub fn set_clock(&mut self, now: DateTime<Utc>) {
        self.now = now;
        self.last_clock = Instant::now();
        self.refresh_visible();
    }

    pub fn tick(&mut self) {
        if self.last_clock.elapsed() >= CLOCK_INTERVAL {
            self.set_clock(Utc::now());
        }
    }

    pub fn set_status(&mut self, msg: String) {
        debug!(status = %msg, "status message");
        self.flash = Some((msg, Instant::now()));
    }

    /// Returns true if the view has been asked to quit.
    pub const fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Render the view into `area` within the given frame.
    pub fn render(&mut self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        render_into(frame, self, area);
    }

    // ── Navigation ──

    fn select_next(&mut self) {
        let len = self.visible.len();
        if len == 0 {
            return;
        }
        let i = self
            .table_state
            .selected()
            .map_or(0, |i| if i + 1 >= len { len - 1 } else { i + 1 });
        self.select(i);
    }

    fn select_prev(&mut self) {
        if self.visible.is_empty() {
            return;
        }
        let i = self
            .table_state
            .selected()
            .map_or(0, |i| i.saturating_sub(1));
        self.select(i);
    }

    fn select_first(&mut self) {
        if !self.visible.is_empty() {
            self.select(0);
        }
    }

    fn select_last(&mut self) {
        let len = self.visible.len();
        if len > 0 {
            self.select(len - 1);
        }
    }

    fn select(&mut self, index: usize) {
        self.table_state.select(Some(index));
        self.detail_scroll = 0;
    }

    /// Currently selected event (if any).
    pub fn selected_event(&self) -> Option<&Event> {
        self.table_state
            .selected()
            .and_then(|i| self.visible.get(i))
    }

    fn max_detail_scroll(&self) -> u16 {
        if !self.show_detail {
            return 0;
        }
        let Some(event) = self.selected_event() else {
            return 0;
        };
        let viewport_h = self.detail_area.height.saturating_sub(2) as usize;
        if viewport_h == 0 {
            return 0;
        }
        let wrap_w = self.detail_area.width.saturating_sub(2).max(1) as usize;
        let total_lines = detail_lines(event)
            .iter()
            .map(|line| line.width().max(1).div_ceil(wrap_w))
            .sum::<usize>();

        u16::try_from(total_lines.saturating_sub(viewport_h)).unwrap_or(u16::MAX)
    }

    fn clamp_detail_scroll(&mut self) {
        self.detail_scroll = self.detail_scroll.min(self.max_detail_scroll());
    }

    fn scroll_detail_by(&mut self, delta: i32) {
        let max_scroll = i32::from(self.max_detail_scroll());
        let next = i32::from(self.detail_scroll)
            .saturating_add(delta)
            .clamp(0, max_scroll);
        self.detail_scroll = u16::try_from(next).unwrap_or(0);
    }

    // ── Key event handling ──

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match self.input_mode {
            InputMode::Search => self.handle_search_key(key),
            InputMode::FilterPopup => self.handle_filter_popup_key(key),
            InputMode::Normal => self.handle_normal_key(key, ctrl),
        }

        Ok(())
    }

    fn handle_normal_key(&mut self, key: KeyEvent, ctrl: bool) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('c') if ctrl => self.should_quit = true,

            KeyCode::Char('j') | KeyCode::Down => {
                if self.show_detail {
                    self.scroll_detail_by(1);
                } else {
                    self.select_next();
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if self.show_detail {
                    self.scroll_detail_by(-1);
                } else {
                    self.select_prev();
                }
            }
            KeyCode::Char('g') | KeyCode::Home => self.select_first(),
            KeyCode::Char('G') | KeyCode::End => self.select_last(),
            KeyCode::PageDown | KeyCode::Char('d') => {
                for _ in 0..10 {
                    self.select_next();
                }
            }
            KeyCode::PageUp | KeyCode::Char('u') => {
                for _ in 0..10 {
                    self.select_prev();
                }
            }

            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => {
                self.show_detail = true;
                self.detail_scroll = 0;
            }
            KeyCode::Char('h') | KeyCode::Left | KeyCode::Esc if self.show_detail => {
                self.show_detail = false;
                self.detail_scroll = 0;
            }

            KeyCode::Char('/') => {
                self.query_before_search = self.session.filter().search_query.clone();
                self.search_buf.clone_from(&self.query_before_search);
                self.input_mode = InputMode::Search;
            }

            KeyCode::Char('F') => {
                self.filter_field = FilterField::default();
                self.input_mode = InputMode::FilterPopup;
            }

            KeyCode::Char('w') => {
                let window = self.session.filter().window.next();
                self.change_filter(FilterChange::Window(window));
                self.set_status(format!("Window: {}", window.label()));
            }
            KeyCode::Char('W') => {
                let window = self.session.filter().window.prev();
                self.change_filter(FilterChange::Window(window));
                self.set_status(format!("Window: {}", window.label()));
            }

            KeyCode::Char('x') => {
                if !self.session.filter().is_empty() {
                    self.search_buf.clear();
                    self.change_filter(FilterChange::Reset);
                    self.set_status("Filters cleared".to_string());
                }
            }

            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.search_buf.clone_from(&self.query_before_search);
                self.change_filter(FilterChange::Search(self.query_before_search.clone()));
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Enter => {
                self.change_filter(FilterChange::Search(self.search_buf.trim().to_string()));
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Backspace => {
                self.search_buf.pop();
                self.change_filter(FilterChange::Search(self.search_buf.clone()));
            }
            KeyCode::Char(c) => {
                self.search_buf.push(c);
                self.change_filter(FilterChange::Search(self.search_buf.clone()));
            }
            _ => {}
        }
    }

    fn handle_filter_popup_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q' | 'F') | KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Tab | KeyCode::Down | KeyCode::Char('j') => {
                self.filter_field = self.filter_field.next();
            }
            KeyCode::BackTab | KeyCode::Up | KeyCode::Char('k') => {
                self.filter_field = self.filter_field.prev();
            }
            KeyCode::Right | KeyCode::Char('l' | ' ') => self.cycle_filter_field_forward(),
            KeyCode::Left | KeyCode::Char('h') => self.cycle_filter_field_backward(),
            _ => {}
        }
    }

    fn cycle_filter_field_forward(&mut self) {
        let filter = self.session.filter();
        let change = match self.filter_field {
            FilterField::Window => FilterChange::Window(filter.window.next()),
            FilterField::Namespace => FilterChange::Namespace(cycle_option(
                filter.namespace.as_deref(),
                &self.session.namespaces(),
            )),
            FilterField::Kind => FilterChange::Kind(cycle_option(
                filter.kind.as_deref(),
                &self.session.kinds(),
            )),
        };
        self.change_filter(change);
    }

    fn cycle_filter_field_backward(&mut self) {
        let filter = self.session.filter();
        let change = match self.filter_field {
            FilterField::Window => FilterChange::Window(filter.window.prev()),
            FilterField::Namespace => FilterChange::Namespace(cycle_option_rev(
                filter.namespace.as_deref(),
                &self.session.namespaces(),
            )),
            FilterField::Kind => FilterChange::Kind(cycle_option_rev(
                filter.kind.as_deref(),
                &self.session.kinds(),
            )),
        };
        self.change_filter(change);
    }

    /// Short feed state for the status bar.
    fn feed_label(&self) -> &'static str {
        match self.session.snapshot() {
            SnapshotState::Pending => return "loading",
            SnapshotState::Failed(_) if !self.live => return "snapshot failed",
            SnapshotState::Loaded { .. } | SnapshotState::Failed(_) => {}
        }
        if self.live {
            self.session.stream().label()
        } else {
            "offline"
        }
    }
}

// ── Helpers ──

/// Step to the next value in `options`; past the last one the filter clears.
fn cycle_option(current: Option<&str>, options: &[String]) -> Option<String> {
    match current {
        None => options.first().cloned(),
        Some(c) => {
            let pos = options.iter().position(|s| s == c);
            match pos {
                None => None,
                Some(p) => options.get(p + 1).cloned(),
            }
        }
    }
}

fn cycle_option_rev(current: Option<&str>, options: &[String]) -> Option<String> {
    match current {
        None => options.last().cloned(),
        Some(c) => {
            let pos = options.iter().position(|s| s == c);
            match pos {
                None | Some(0) => None,
                Some(p) => options.get(p - 1).cloned(),
            }
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_chars {
        s.to_string()
    } else if max_chars == 0 {
        String::new()
    } else {
        let truncated: String = chars[..max_chars.saturating_sub(1)].iter().collect();
        format!("{truncated}…")
    }
}

fn local_time(ts: Option<DateTime<Utc>>) -> String {
    ts.map_or_else(
        || "-".to_string(),
        |ts| ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

fn object_label(event: &Event) -> String {
    let name = event
        .kube()
        .and_then(|kube| kube.involved_object.name.as_deref());
    match (event.kind(), name) {
        (Some(kind), Some(name)) => format!("{kind}/{name}"),
        (Some(only), None) | (None, Some(only)) => only.to_string(),
        (None, None) => "-".to_string(),
    }
}

fn type_color(event_type: Option<&str>) -> Color {
    match event_type {
        Some("Warning") => Color::Yellow,
        Some("Normal") => Color::Green,
        _ => Color::White,
    }
}

// ── Rendering ──

const TABLE_HEADERS: [&str; 5] = ["TIME", "NAMESPACE", "OBJECT", "REASON", "MESSAGE"];

fn build_row(event: &Event, message_width: usize) -> Row<'static> {
    let dim = Style::default().fg(Color::DarkGray);
    if event.is_degraded() {
        return Row::new([
            Cell::from(Span::styled("-", dim)),
            Cell::from(Span::styled("-", dim)),
            Cell::from(Span::styled(
                event.identity().unwrap_or("-").to_string(),
                dim,
            )),
            Cell::from(Span::styled("-", dim)),
            Cell::from(Span::styled(
                "(undecodable payload)",
                dim.add_modifier(Modifier::ITALIC),
            )),
        ]);
    }

    let message = event.message().unwrap_or("").replace('\n', " ");
    Row::new([
        Cell::from(Span::styled(local_time(event.created_at()), dim)),
        Cell::from(Span::styled(
            truncate(event.namespace().unwrap_or("-"), 18),
            Style::default().fg(Color::Cyan),
        )),
        Cell::from(truncate(&object_label(event), 32)),
        Cell::from(Span::styled(
            truncate(event.reason().unwrap_or("-"), 24),
            Style::default().fg(type_color(event.event_type())),
        )),
        Cell::from(truncate(&message, message_width)),
    ])
}

fn label_span(label: &str) -> Span<'static> {
    Span::styled(format!("{label}: "), Style::default().fg(Color::DarkGray))
}

fn heading_line(text: &str) -> Line<'static> {
    Line::from(vec![Span::styled(
        text.to_string(),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    )])
}

fn detail_lines(event: &Event) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    lines.push(Line::from(vec![
        label_span("UID"),
        Span::styled(
            event.identity().unwrap_or("-").to_string(),
            Style::default().fg(Color::Cyan),
        ),
    ]));

    let Some(kube) = event.kube() else {
        lines.push(Line::from(""));
        lines.push(heading_line("Undecodable payload"));
        lines.push(Line::from(""));
        match event.body {
            EventBody::Text(ref text) => {
                for line in text.lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            EventBody::Empty | EventBody::Structured(_) => {
                lines.push(Line::from(Span::styled(
                    "(no payload)",
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
        return lines;
    };

    let field = |label: &str, value: Option<&str>| {
        Line::from(vec![
            label_span(label),
            Span::raw(value.unwrap_or("-").to_string()),
        ])
    };

    lines.push(Line::from(""));
    lines.push(heading_line("General"));
    lines.push(field("Namespace", event.namespace()));
    lines.push(field("Name", event.name()));
    lines.push(field("Object", Some(object_label(event).as_str())));
    lines.push(field("Created", Some(local_time(event.created_at()).as_str())));

    lines.push(Line::from(""));
    lines.push(heading_line("Source"));
    lines.push(field(
        "Reporting component",
        kube.reporting_component.as_deref(),
    ));
    lines.push(field("Host", kube.source.host.as_deref()));

    lines.push(Line::from(""));
    lines.push(heading_line("Error"));
    lines.push(Line::from(vec![
        label_span("Reason"),
        Span::styled(
            event.reason().unwrap_or("-").to_string(),
            Style::default().fg(type_color(event.event_type())),
        ),
    ]));
    lines.push(field("Type", event.event_type()));
    lines.push(field("First seen", Some(local_time(kube.first_seen()).as_str())));
    lines.push(field("Last seen", Some(local_time(kube.last_seen()).as_str())));
    if let Some(count) = kube.count {
        lines.push(field("Count", Some(count.to_string().as_str())));
    }
    if let Some(message) = event.message() {
        lines.push(Line::from(""));
        for line in message.lines() {
            lines.push(Line::from(line.to_string()));
        }
    }
    lines
}

fn render_detail_panel(frame: &mut ratatui::Frame<'_>, view: &WatchView, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
        .border_style(Style::default().fg(Color::Green))
        .title(" Detail ")
        .title_style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if let Some(event) = view.selected_event() {
        frame.render_widget(
            Paragraph::new(detail_lines(event))
                .scroll((view.detail_scroll, 0))
                .wrap(Wrap { trim: false }),
            inner,
        );
    } else {
        frame.render_widget(
            Paragraph::new(Line::from(vec![Span::styled(
                "No event selected",
                Style::default().fg(Color::DarkGray),
            )])),
            inner,
        );
    }
}

fn render_into(frame: &mut ratatui::Frame<'_>, view: &mut WatchView, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);
    let content_area = chunks[0];
    let status_area = chunks[1];

    let content_chunks = if view.show_detail {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(view.split_percent),
                Constraint::Percentage(100 - view.split_percent),
            ])
            .split(content_area)
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(100), Constraint::Percentage(0)])
            .split(content_area)
    };
    let table_area = content_chunks[0];
    let detail_area = content_chunks[1];
    view.detail_area = detail_area;
    view.clamp_detail_scroll();

    let widths = [
        Constraint::Length(19),
        Constraint::Length(18),
        Constraint::Length(32),
        Constraint::Length(24),
        Constraint::Min(10),
    ];
    let fixed: u16 = 19 + 18 + 32 + 24 + 4 + 2;
    let message_width = usize::from(table_area.width.saturating_sub(fixed).max(10));

    let rows: Vec<Row<'static>> = view
        .visible
        .iter()
        .map(|event| build_row(event, message_width))
        .collect();

    let header = Row::new(TABLE_HEADERS.map(|h| {
        Cell::from(Span::styled(
            h,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ))
    }));

    let block_title = match view.input_mode {
        InputMode::Search => format!(" errorkube: search reason: {}_ ", view.search_buf),
        _ => format!(
            " errorkube: {} of {} events ",
            view.visible.len(),
            view.session.events().len()
        ),
    };

    let list_border_style = if view.show_detail {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Green)
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_set(border::ROUNDED)
                .border_style(list_border_style)
                .title(block_title)
                .title_style(
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
        )
        .row_highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(" ");
    frame.render_stateful_widget(table, table_area, &mut view.table_state);

    if view.show_detail && detail_area.width > 0 {
        render_detail_panel(frame, view, detail_area);
    }

    let status_text = build_status_bar(view, status_area.width);
    frame.render_widget(
        Paragraph::new(status_text).alignment(Alignment::Left),
        status_area,
    );

    if view.input_mode == InputMode::FilterPopup {
        render_filter_popup(frame, view, area);
    }
}

/// Build the status bar line from the feed state, counters and filters.
fn build_status_bar(view: &WatchView, width: u16) -> Line<'static> {
    if let Some((ref msg, at)) = view.flash {
        if at.elapsed() < STATUS_TTL {
            return Line::from(vec![Span::styled(
                msg.clone(),
                Style::default().fg(Color::Cyan),
            )]);
        }
    }

    let key_style = Style::default().fg(Color::Cyan);
    let label_style = Style::default().fg(Color::White);
    let val_style = Style::default().fg(Color::Cyan);
    let dim_style = Style::default().fg(Color::DarkGray);

    let mut spans: Vec<Span<'static>> = Vec::new();

    match view.input_mode {
        InputMode::Search => {
            spans.push(Span::styled("ESC", key_style));
            spans.push(Span::styled(" cancel  ", dim_style));
            spans.push(Span::styled("ENTER", key_style));
            spans.push(Span::styled(" confirm", dim_style));
        }
        InputMode::FilterPopup => {
            spans.push(Span::styled("TAB", key_style));
            spans.push(Span::styled(" move field  ", dim_style));
            spans.push(Span::styled("←/→", key_style));
            spans.push(Span::styled(" change value  ", dim_style));
            spans.push(Span::styled("ESC", key_style));
            spans.push(Span::styled(" close", dim_style));
        }
        InputMode::Normal => {
            let feed = view.feed_label();
            let feed_color = match feed {
                "live" => Color::Green,
                "connecting" | "loading" => Color::Yellow,
                "error" | "snapshot failed" => Color::Red,
                _ => Color::DarkGray,
            };
            spans.push(Span::styled(
                format!("[{feed}] "),
                Style::default().fg(feed_color).add_modifier(Modifier::BOLD),
            ));

            let stats = view.session.stats();
            spans.push(Span::styled(
                format!("{}/{} ", view.visible.len(), view.session.events().len()),
                label_style,
            ));
            if stats.degraded > 0 {
                spans.push(Span::styled(
                    format!("degraded={} ", stats.degraded),
                    Style::default().fg(Color::Red),
                ));
            }
            spans.push(Span::raw(" "));

            let filters = view.session.filter().describe();
            if !filters.is_empty() {
                spans.push(Span::styled("FILTERS: ", label_style));
                spans.push(Span::styled(format!("{}  ", filters.join(" ")), val_style));
            }

            let hints: &[(&str, &str)] = if view.show_detail {
                &[("j/k", "scroll"), ("h/esc", "close"), ("q", "quit")]
            } else {
                &[
                    ("j/k", "nav"),
                    ("enter", "detail"),
                    ("/", "search"),
                    ("F", "filter"),
                    ("w", "window"),
                    ("x", "clear"),
                    ("q", "quit"),
                ]
            };
            for (key, desc) in hints {
                spans.push(Span::styled((*key).to_string(), key_style));
                spans.push(Span::styled(format!(" {desc}  "), dim_style));
            }
        }
    }

    let version = format!("errorkube {}", env!("CARGO_PKG_VERSION"));
    let left_len: usize = spans.iter().map(|span| span.content.chars().count()).sum();
    let right_len = version.chars().count();
    if (width as usize) > left_len + right_len + 1 {
        spans.push(Span::raw(" ".repeat(width as usize - left_len - right_len)));
    } else {
        spans.push(Span::raw("  "));
    }
    spans.push(Span::styled(version, dim_style));

    Line::from(spans)
}

/// Render the filter configuration popup.
fn render_filter_popup(frame: &mut ratatui::Frame<'_>, view: &WatchView, area: Rect) {
    let popup_w: u16 = 56;
    let popup_h: u16 = 8;
    let popup_area = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };

    frame.render_widget(Clear, popup_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Filter ")
        .title_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let focused_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let normal_style = Style::default().fg(Color::White);
    let dim_style = Style::default().fg(Color::DarkGray);
    let val_style = Style::default().fg(Color::Green);

    let filter = view.session.filter();
    let namespaces = view.session.namespaces().len();
    let kinds = view.session.kinds().len();
    let fields = [
        (
            FilterField::Window,
            "Window   ",
            filter.window.label().to_string(),
            String::new(),
        ),
        (
            FilterField::Namespace,
            "Namespace",
            filter.namespace.clone().unwrap_or_else(|| "(any)".to_string()),
            format!("  {namespaces} seen"),
        ),
        (
            FilterField::Kind,
            "Kind     ",
            filter.kind.clone().unwrap_or_else(|| "(any)".to_string()),
            format!("  {kinds} seen"),
        ),
    ];

    let mut lines = Vec::with_capacity(fields.len() + 2);
    for (field, label, value, extra) in fields {
        let is_focused = view.filter_field == field;
        let prefix = if is_focused { "► " } else { "  " };
        lines.push(Line::from(vec![
            Span::styled(prefix, focused_style),
            Span::styled(label, if is_focused { focused_style } else { normal_style }),
            Span::styled(": ", dim_style),
            Span::styled(value, val_style),
            Span::styled(extra, dim_style),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Tab", Style::default().fg(Color::Cyan)),
        Span::styled(" navigate  ", dim_style),
        Span::styled("←/→", Style::default().fg(Color::Cyan)),
        Span::styled(" cycle  ", dim_style),
        Span::styled("Esc", Style::default().fg(Color::Cyan)),
        Span::styled(" close", dim_style),
    ]));
    frame.render_widget(Paragraph::new(lines), inner);
}

// ── Tests ──
