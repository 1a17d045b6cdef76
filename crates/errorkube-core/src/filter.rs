//! Filter predicate engine.
//!
//! A [`FilterState`] holds four independent predicates (namespace, object
//! kind, reason search, recency window). An event is visible when it passes
//! all of them. Filtering is a pure function of the collection, the filter and
//! the clock; the collection itself is never touched.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::event::Event;

// ---------------------------------------------------------------------------
// Recency window
// ---------------------------------------------------------------------------

/// How far back an event may have been created and still be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RecencyWindow {
    #[default]
    #[serde(rename = "all")]
    AllTime,
    #[serde(rename = "1h")]
    LastHour,
    #[serde(rename = "10h")]
    Last10Hours,
    #[serde(rename = "24h")]
    Last24Hours,
    #[serde(rename = "1w", alias = "7d")]
    LastWeek,
    #[serde(rename = "30d")]
    Last30Days,
}

impl RecencyWindow {
    /// Every window, in cycling order.
    pub const ALL: [Self; 6] = [
        Self::AllTime,
        Self::LastHour,
        Self::Last10Hours,
        Self::Last24Hours,
        Self::LastWeek,
        Self::Last30Days,
    ];

    /// Short token used by flags and config (`all`, `1h`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AllTime => "all",
            Self::LastHour => "1h",
            Self::Last10Hours => "10h",
            Self::Last24Hours => "24h",
            Self::LastWeek => "1w",
            Self::Last30Days => "30d",
        }
    }

    /// Human label for the terminal UI.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AllTime => "All time",
            Self::LastHour => "Last hour",
            Self::Last10Hours => "Last 10 hours",
            Self::Last24Hours => "Last 24 hours",
            Self::LastWeek => "Last week",
            Self::Last30Days => "Last 30 days",
        }
    }

    /// Maximum age admitted by this window; `None` for all time.
    #[must_use]
    pub fn max_age(self) -> Option<TimeDelta> {
        match self {
            Self::AllTime => None,
            Self::LastHour => Some(TimeDelta::hours(1)),
            Self::Last10Hours => Some(TimeDelta::hours(10)),
            Self::Last24Hours => Some(TimeDelta::hours(24)),
            Self::LastWeek => Some(TimeDelta::days(7)),
            Self::Last30Days => Some(TimeDelta::days(30)),
        }
    }

    /// True when an event created at `created` falls inside the window at `now`.
    ///
    /// Undated events only pass [`RecencyWindow::AllTime`]. Events from the
    /// future pass every window.
    #[must_use]
    pub fn admits(self, created: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        let Some(max_age) = self.max_age() else {
            return true;
        };
        created.is_some_and(|created| now.signed_duration_since(created) <= max_age)
    }

    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::AllTime => Self::LastHour,
            Self::LastHour => Self::Last10Hours,
            Self::Last10Hours => Self::Last24Hours,
            Self::Last24Hours => Self::LastWeek,
            Self::LastWeek => Self::Last30Days,
            Self::Last30Days => Self::AllTime,
        }
    }

    #[must_use]
    pub const fn prev(self) -> Self {
        match self {
            Self::AllTime => Self::Last30Days,
            Self::LastHour => Self::AllTime,
            Self::Last10Hours => Self::LastHour,
            Self::Last24Hours => Self::Last10Hours,
            Self::LastWeek => Self::Last24Hours,
            Self::Last30Days => Self::LastWeek,
        }
    }
}

impl fmt::Display for RecencyWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a window token is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown time window '{0}' (expected one of: all, 1h, 10h, 24h, 1w, 30d)")]
pub struct ParseWindowError(pub String);

impl FromStr for RecencyWindow {
    type Err = ParseWindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(Self::AllTime),
            "1h" => Ok(Self::LastHour),
            "10h" => Ok(Self::Last10Hours),
            "24h" | "1d" => Ok(Self::Last24Hours),
            "1w" | "7d" => Ok(Self::LastWeek),
            "30d" => Ok(Self::Last30Days),
            _ => Err(ParseWindowError(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter state
// ---------------------------------------------------------------------------

/// Filter criteria applied to the event collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Exact match on `metadata.namespace`.
    pub namespace: Option<String>,
    /// Exact match on `involvedObject.kind`.
    pub kind: Option<String>,
    /// Case-insensitive substring match on `reason`.
    pub search_query: String,
    pub window: RecencyWindow,
}

impl FilterState {
    /// Returns true if no filter criteria are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.namespace.is_none()
            && self.kind.is_none()
            && self.search_query.is_empty()
            && self.window == RecencyWindow::AllTime
    }

    /// Returns true if the event satisfies all active filter criteria.
    #[must_use]
    pub fn matches(&self, event: &Event, now: DateTime<Utc>) -> bool {
        if let Some(ref namespace) = self.namespace {
            if event.namespace() != Some(namespace.as_str()) {
                return false;
            }
        }
        if let Some(ref kind) = self.kind {
            if event.kind() != Some(kind.as_str()) {
                return false;
            }
        }
        if !self.search_query.is_empty() {
            let query = self.search_query.to_lowercase();
            let hit = event
                .reason()
                .is_some_and(|reason| reason.to_lowercase().contains(&query));
            if !hit {
                return false;
            }
        }
        self.window.admits(event.created_at(), now)
    }

    /// Apply this filter to a collection, preserving its order.
    #[must_use]
    pub fn apply<'a>(&self, events: &'a [Event], now: DateTime<Utc>) -> Vec<&'a Event> {
        events
            .iter()
            .filter(|event| self.matches(event, now))
            .collect()
    }

    /// Select a namespace. A different namespace clears the kind selection;
    /// re-selecting the current one changes nothing.
    ///
    /// Returns true when the namespace actually changed.
    pub fn set_namespace(&mut self, namespace: Option<String>) -> bool {
        let namespace = namespace.filter(|ns| !ns.is_empty());
        if namespace == self.namespace {
            return false;
        }
        self.namespace = namespace;
        self.kind = None;
        true
    }

    pub fn set_kind(&mut self, kind: Option<String>) {
        self.kind = kind.filter(|kind| !kind.is_empty());
    }

    /// Drop every constraint.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Short `key=value` descriptions of the active constraints, for status lines.
    #[must_use]
    pub fn describe(&self) -> Vec<String> {
        let mut parts = Vec::new();
        if let Some(ref namespace) = self.namespace {
            parts.push(format!("ns={namespace}"));
        }
        if let Some(ref kind) = self.kind {
            parts.push(format!("kind={kind}"));
        }
        if !self.search_query.is_empty() {
            parts.push(format!("reason~{}", self.search_query));
        }
        if self.window != RecencyWindow::AllTime {
            parts.push(format!("window={}", self.window));
        }
        parts
    }
}

/// Free-function form of [`FilterState::apply`].
#[must_use]
pub fn apply_filters<'a>(
    events: &'a [Event],
    filter: &FilterState,
    now: DateTime<Utc>,
) -> Vec<&'a Event> {
    filter.apply(events, now)
}

// ---------------------------------------------------------------------------
// Distinct-value queries
// ---------------------------------------------------------------------------

/// Distinct namespaces across the whole collection, first-seen order.
#[must_use]
pub fn distinct_namespaces(events: &[Event]) -> Vec<String> {
    distinct(events.iter().filter_map(Event::namespace))
}

/// Distinct object kinds among events in `namespace` (all events when `None`),
/// first-seen order.
#[must_use]
pub fn distinct_kinds(events: &[Event], namespace: Option<&str>) -> Vec<String> {
    distinct(
        events
            .iter()
            .filter(|event| namespace.is_none_or(|ns| event.namespace() == Some(ns)))
            .filter_map(Event::kind),
    )
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if !out.iter().any(|seen| seen == value) {
            out.push(value.to_string());
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
