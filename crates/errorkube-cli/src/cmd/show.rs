//! `errorkube show`: display the full detail field set of a single event.

use crate::cmd::Sources;
use crate::cmd::list::{format_local, format_utc};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use chrono::{DateTime, Utc};
use clap::Args;
use errorkube_core::{Event, EventBody, KubeEvent, decode};
use serde::Serialize;
use std::io::Write;
use tracing::debug;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Event UID (`metadata.uid`, or the record's top-level uid).
    pub uid: String,
}

/// Full event detail as returned in JSON output.
#[derive(Debug, Serialize)]
pub struct ShowEvent {
    pub uid: Option<String>,
    pub namespace: Option<String>,
    pub name: Option<String>,
    pub kind: Option<String>,
    pub object: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub reporting_component: Option<String>,
    pub host: Option<String>,
    pub reason: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub count: Option<i64>,
    pub degraded: bool,
    /// Decoded body as received.
    pub data: EventBody,
}

impl From<Event> for ShowEvent {
    fn from(event: Event) -> Self {
        let kube = event.kube();
        Self {
            uid: event.identity().map(str::to_string),
            namespace: event.namespace().map(str::to_string),
            name: event.name().map(str::to_string),
            kind: event.kind().map(str::to_string),
            object: kube.and_then(|k| k.involved_object.name.clone()),
            created: event.created_at(),
            reporting_component: kube.and_then(|k| k.reporting_component.clone()),
            host: kube.and_then(|k| k.source.host.clone()),
            reason: event.reason().map(str::to_string),
            message: event.message().map(str::to_string),
            event_type: event.event_type().map(str::to_string),
            first_seen: kube.and_then(KubeEvent::first_seen),
            last_seen: kube.and_then(KubeEvent::last_seen),
            count: kube.and_then(|k| k.count),
            degraded: event.is_degraded(),
            data: event.body,
        }
    }
}

/// Execute `errorkube show <uid>`.
///
/// # Errors
///
/// Returns an error if the event does not exist, the source cannot be
/// reached, or output rendering fails.
pub fn run_show(args: &ShowArgs, output: OutputMode, sources: &Sources) -> anyhow::Result<()> {
    let source = sources.snapshot_source()?;
    let raw = source.fetch_one(args.uid.trim())?;
    let event = decode(raw);
    debug!(uid = ?event.identity(), degraded = event.is_degraded(), "event loaded");

    render_mode(
        output,
        &ShowEvent::from(event),
        |item, w| render_show_text(item, w),
        |item, w| render_show_human(item, w),
    )
}

fn dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn count_label(count: Option<i64>) -> String {
    count.map_or_else(|| "-".to_string(), |count| count.to_string())
}

/// Raw body text of a degraded event.
fn degraded_body(item: &ShowEvent) -> &str {
    match item.data {
        EventBody::Text(ref text) => text,
        EventBody::Structured(_) | EventBody::Empty => "(no payload)",
    }
}

/// Render full event details in human-readable format.
fn render_show_human(item: &ShowEvent, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Event {}", dash(item.uid.as_deref())))?;
    if item.degraded {
        writeln!(w, "payload could not be decoded; showing it as received")?;
        writeln!(w)?;
        writeln!(w, "{}", degraded_body(item))?;
        return Ok(());
    }

    writeln!(w)?;
    pretty_section(w, "General")?;
    pretty_kv(w, "namespace", dash(item.namespace.as_deref()))?;
    pretty_kv(w, "name", dash(item.name.as_deref()))?;
    pretty_kv(w, "kind", dash(item.kind.as_deref()))?;
    if let Some(ref object) = item.object {
        pretty_kv(w, "object", object)?;
    }
    pretty_kv(w, "created", format_local(item.created))?;

    writeln!(w)?;
    pretty_section(w, "Source")?;
    pretty_kv(
        w,
        "reporting component",
        dash(item.reporting_component.as_deref()),
    )?;
    pretty_kv(w, "host", dash(item.host.as_deref()))?;

    writeln!(w)?;
    pretty_section(w, "Error")?;
    pretty_kv(w, "reason", dash(item.reason.as_deref()))?;
    pretty_kv(w, "type", dash(item.event_type.as_deref()))?;
    pretty_kv(w, "first seen", format_local(item.first_seen))?;
    pretty_kv(w, "last seen", format_local(item.last_seen))?;
    pretty_kv(w, "count", count_label(item.count))?;
    if let Some(ref message) = item.message {
        writeln!(w)?;
        for line in message.lines() {
            writeln!(w, "{line}")?;
        }
    }
    Ok(())
}

fn render_show_text(item: &ShowEvent, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "uid:                 {}", dash(item.uid.as_deref()))?;
    if item.degraded {
        writeln!(w, "degraded:            true")?;
        writeln!(w, "payload:             {}", degraded_body(item))?;
        return Ok(());
    }
    writeln!(w, "namespace:           {}", dash(item.namespace.as_deref()))?;
    writeln!(w, "name:                {}", dash(item.name.as_deref()))?;
    writeln!(w, "kind:                {}", dash(item.kind.as_deref()))?;
    writeln!(w, "object:              {}", dash(item.object.as_deref()))?;
    writeln!(w, "created:             {}", format_utc(item.created))?;
    writeln!(
        w,
        "reporting_component: {}",
        dash(item.reporting_component.as_deref())
    )?;
    writeln!(w, "host:                {}", dash(item.host.as_deref()))?;
    writeln!(w, "reason:              {}", dash(item.reason.as_deref()))?;
    writeln!(w, "type:                {}", dash(item.event_type.as_deref()))?;
    writeln!(w, "first_seen:          {}", format_utc(item.first_seen))?;
    writeln!(w, "last_seen:           {}", format_utc(item.last_seen))?;
    writeln!(w, "count:               {}", count_label(item.count))?;
    writeln!(
        w,
        "message:             {}",
        item.message
            .as_deref()
            .map_or_else(|| "-".to_string(), |m| m.replace('\n', " "))
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use errorkube_core::RawEvent;
    use serde_json::json;

    #[test]
    fn show_args_parses_uid() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: ShowArgs,
        }
        let w = Wrapper::parse_from(["test", "0f1e-22"]);
        assert_eq!(w.args.uid, "0f1e-22");
    }

    fn make_show_event() -> ShowEvent {
        let raw = RawEvent::inline(
            Some("outer"),
            json!({
                "metadata": {
                    "uid": "9c1d",
                    "name": "web-1.17a",
                    "namespace": "default",
                    "creationTimestamp": "2024-05-01T10:00:00Z"
                },
                "involvedObject": {"kind": "Pod", "name": "web-1"},
                "reason": "BackOff",
                "message": "Back-off restarting failed container",
                "type": "Warning",
                "firstTimestamp": "2024-05-01T09:00:00Z",
                "lastTimestamp": "2024-05-01T10:00:00Z",
                "reportingComponent": "kubelet",
                "source": {"component": "kubelet", "host": "node-a"},
                "count": 7
            }),
        );
        ShowEvent::from(decode(raw))
    }

    #[test]
    fn show_event_collects_detail_fields() {
        let item = make_show_event();
        assert_eq!(item.uid.as_deref(), Some("9c1d"));
        assert_eq!(item.reporting_component.as_deref(), Some("kubelet"));
        assert_eq!(item.host.as_deref(), Some("node-a"));
        assert_eq!(item.count, Some(7));
        assert!(item.first_seen.is_some());
        assert!(!item.degraded);
    }

    #[test]
    fn render_show_human_includes_all_sections() {
        let item = make_show_event();
        let mut buf = Vec::new();
        render_show_human(&item, &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();

        assert!(out.contains("Event 9c1d"), "missing id");
        assert!(out.contains("General"), "missing general section");
        assert!(out.contains("web-1.17a"), "missing name");
        assert!(out.contains("Pod"), "missing kind");
        assert!(out.contains("kubelet"), "missing reporting component");
        assert!(out.contains("node-a"), "missing host");
        assert!(out.contains("BackOff"), "missing reason");
        assert!(out.contains("Warning"), "missing type");
        assert!(out.contains("Back-off restarting"), "missing message");
    }

    #[test]
    fn render_show_text_uses_utc_timestamps() {
        let item = make_show_event();
        let mut buf = Vec::new();
        render_show_text(&item, &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("first_seen:          2024-05-01T09:00:00Z"));
        assert!(out.contains("last_seen:           2024-05-01T10:00:00Z"));
        assert!(out.contains("count:               7"));
    }

    #[test]
    fn degraded_event_shows_payload_text() {
        let item = ShowEvent::from(decode(RawEvent::encoded(Some("u9"), b"plain text body")));
        assert!(item.degraded);
        let mut buf = Vec::new();
        render_show_text(&item, &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("uid:                 u9"));
        assert!(out.contains("plain text body"));
    }

    #[test]
    fn show_event_json_carries_body() {
        let item = make_show_event();
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "Warning");
        assert_eq!(value["data"]["involvedObject"]["kind"], "Pod");
        assert_eq!(value["data"]["metadata"]["uid"], "9c1d");
    }
}
