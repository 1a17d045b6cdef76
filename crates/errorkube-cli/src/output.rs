//! How `list`, `show` and `facets` print, and how failures reach stderr.
//!
//! The mode is picked once per invocation, first match wins:
//!
//! | source                     | example             |
//! |----------------------------|---------------------|
//! | `--format` or `--json`     | `--format text`     |
//! | `FORMAT` env var           | `FORMAT=json`       |
//! | config `[display] output`  | `output = "pretty"` |
//! | stdout is a terminal       | pretty, else text   |
//!
//! Event rows go through [`render_list`]; single documents such as the facet
//! summary go through [`render_mode`].

use clap::ValueEnum;
use errorkube_core::ErrorCode;
use errorkube_core::config::normalize_output_mode;
use errorkube_feed::SourceError;
use serde::Serialize;
use std::fmt;
use std::io::{self, IsTerminal, Write};

/// Width of the dashed line under pretty headings.
const PRETTY_RULE_WIDTH: usize = 72;

pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{}", "-".repeat(PRETTY_RULE_WIDTH))
}

/// Heading line plus rule, e.g. `Pod default/web-1` over dashes.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// One `key: value` detail line with the key padded to a fixed column.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    let label = format!("{key}:");
    writeln!(w, "{label:<20} {}", value.as_ref())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Sections and local timestamps for a person at a terminal.
    Pretty,
    /// Two-space separated columns, one event per line.
    Text,
    /// Stable JSON: an array for lists, one object per line when following.
    Json,
}

impl OutputMode {
    fn from_name(name: &str) -> Option<Self> {
        match normalize_output_mode(name)? {
            "json" => Some(Self::Json),
            "text" => Some(Self::Text),
            _ => Some(Self::Pretty),
        }
    }
}

/// Output-mode resolution without touching the environment or stdout.
///
/// `format_flag`: explicit `--format` value if provided.
/// `json_flag`: `--json` shorthand.
/// `format_env`: the value of `FORMAT` if set.
/// `config_output`: `[display] output` from the config file.
/// `is_tty`: true if stdout is a TTY.
fn resolve_output_mode_inner(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    format_env: Option<&str>,
    config_output: Option<&str>,
    is_tty: bool,
) -> OutputMode {
    if let Some(mode) = format_flag {
        return mode;
    }

    if json_flag {
        return OutputMode::Json;
    }

    // Unknown values fall through to the next layer.
    if let Some(mode) = format_env.and_then(OutputMode::from_name) {
        return mode;
    }
    if let Some(mode) = config_output.and_then(OutputMode::from_name) {
        return mode;
    }

    if is_tty {
        OutputMode::Pretty
    } else {
        OutputMode::Text
    }
}

/// Resolve the output mode from CLI flags, environment, config and TTY defaults.
pub fn resolve_output_mode(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    config_output: Option<&str>,
) -> OutputMode {
    let env_val = std::env::var("FORMAT").ok();
    let is_tty = io::stdout().is_terminal();
    resolve_output_mode_inner(
        format_flag,
        json_flag,
        env_val.as_deref(),
        config_output,
        is_tty,
    )
}

/// A printable result row. Events implement this through `EventRow`.
pub trait Renderable {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()>;

    /// One JSON object; a trailing newline is optional.
    fn render_json(&self, w: &mut dyn Write) -> io::Result<()>;

    /// One text line matching [`Renderable::table_headers`].
    fn render_table(&self, w: &mut dyn Write) -> io::Result<()>;

    fn table_headers() -> &'static [&'static str]
    where
        Self: Sized,
    {
        &[]
    }
}

/// Print one row; in JSON mode the object always occupies exactly one line.
pub fn render_item<R: Renderable>(out: &mut dyn Write, item: &R, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Pretty => item.render_human(out),
        OutputMode::Text => item.render_table(out),
        OutputMode::Json => {
            let mut buf = Vec::new();
            item.render_json(&mut buf)?;
            if buf.last() == Some(&b'\n') {
                buf.pop();
            }
            out.write_all(&buf)?;
            writeln!(out)
        }
    }
}

/// Print a whole document to stdout. JSON is pretty-printed from `value`.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text_fn(value, &mut out)?,
        OutputMode::Pretty => pretty_fn(value, &mut out)?,
    }
    Ok(())
}

/// Print rows as a JSON array, or as text under a header line. An empty
/// text list prints nothing at all.
pub fn render_list<R: Renderable>(out: &mut dyn Write, items: &[R], mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Pretty => {
            for item in items {
                item.render_human(out)?;
            }
        }
        OutputMode::Text => {
            let headers = if items.is_empty() {
                &[] as &[&str]
            } else {
                R::table_headers()
            };
            if !headers.is_empty() {
                writeln!(out, "{}", headers.join("  "))?;
            }
            for item in items {
                item.render_table(out)?;
            }
        }
        OutputMode::Json => {
            write!(out, "[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(out, ",")?;
                }
                writeln!(out)?;
                let mut buf = Vec::new();
                item.render_json(&mut buf)?;
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                }
                out.write_all(&buf)?;
            }
            if items.is_empty() {
                writeln!(out, "]")?;
            } else {
                writeln!(out, "\n]")?;
            }
        }
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// A command failure tagged with a stable [`ErrorCode`].
///
/// Wrap it in `anyhow::Error` to return it from a command; [`classify`] finds
/// it again anywhere in the cause chain.
#[derive(Debug)]
pub struct CodedError {
    pub code: ErrorCode,
    pub message: String,
}

impl CodedError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CodedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CodedError {}

/// Find the operator-facing code for a failure, if it has one.
pub fn classify(err: &anyhow::Error) -> Option<ErrorCode> {
    err.chain().find_map(|cause| {
        cause
            .downcast_ref::<CodedError>()
            .map(|coded| coded.code)
            .or_else(|| cause.downcast_ref::<SourceError>().map(SourceError::code))
    })
}

/// What the user sees when a command fails.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub message: String,
    /// Remediation hint attached to the error code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// `E####`, absent for uncoded failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
        }
    }

    /// Create an error carrying `code` and its remediation hint.
    pub fn with_code(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: code.hint().map(str::to_string),
            error_code: Some(code.code().to_string()),
        }
    }
}

impl From<&anyhow::Error> for CliError {
    fn from(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");
        match classify(err) {
            Some(code) => Self::with_code(code, message),
            None => Self::new(message),
        }
    }
}

/// Write `error` to stderr; JSON mode nests it under an `error` key.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    write_error(&mut out, mode, error)?;
    Ok(())
}

fn write_error(out: &mut dyn Write, mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut *out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            match error.error_code {
                Some(ref code) => writeln!(out, "error[{code}]: {}", error.message)?,
                None => writeln!(out, "error: {}", error.message)?,
            }
            if let Some(ref suggestion) = error.suggestion {
                writeln!(out, "  hint: {suggestion}")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_format_beats_everything() {
        let mode =
            resolve_output_mode_inner(Some(OutputMode::Text), true, Some("pretty"), None, true);
        assert_eq!(mode, OutputMode::Text);
        let mode = resolve_output_mode_inner(None, true, Some("pretty"), Some("text"), true);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn env_var_is_case_insensitive_and_overrides_tty() {
        assert_eq!(
            resolve_output_mode_inner(None, false, Some("pretty"), None, false),
            OutputMode::Pretty
        );
        assert_eq!(
            resolve_output_mode_inner(None, false, Some("TEXT"), None, true),
            OutputMode::Text
        );
    }

    #[test]
    fn config_applies_only_without_env() {
        assert_eq!(
            resolve_output_mode_inner(None, false, Some("text"), Some("json"), true),
            OutputMode::Text
        );
        assert_eq!(
            resolve_output_mode_inner(None, false, None, Some("json"), true),
            OutputMode::Json
        );
        assert_eq!(
            resolve_output_mode_inner(None, false, None, Some("human"), false),
            OutputMode::Pretty
        );
    }

    #[test]
    fn unrecognized_names_are_ignored() {
        assert_eq!(
            resolve_output_mode_inner(None, false, Some("yaml"), Some("xml"), true),
            OutputMode::Pretty
        );
        assert_eq!(
            resolve_output_mode_inner(None, false, Some("yaml"), None, false),
            OutputMode::Text
        );
    }

    #[test]
    fn pretty_section_underlines_heading() {
        let mut buf = Vec::new();
        pretty_section(&mut buf, "Pod default/web-1").unwrap();
        let out = String::from_utf8(buf).unwrap();
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("Pod default/web-1"));
        assert_eq!(lines.next().map(str::len), Some(PRETTY_RULE_WIDTH));
    }

    struct ReasonCount(&'static str, u64);

    impl Renderable for ReasonCount {
        fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
            writeln!(w, "{} x{}", self.0, self.1)
        }

        fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
            let value = serde_json::json!({ "reason": self.0, "count": self.1 });
            serde_json::to_writer(&mut *w, &value)?;
            writeln!(w)
        }

        fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
            writeln!(w, "{}  {}", self.0, self.1)
        }

        fn table_headers() -> &'static [&'static str] {
            &["REASON", "COUNT"]
        }
    }

    const ROWS: [ReasonCount; 2] = [ReasonCount("BackOff", 4), ReasonCount("Unhealthy", 1)];

    fn rendered<R: Renderable>(rows: &[R], mode: OutputMode) -> String {
        let mut buf = Vec::new();
        render_list(&mut buf, rows, mode).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn text_list_starts_with_headers() {
        assert_eq!(
            rendered(&ROWS, OutputMode::Text),
            "REASON  COUNT\nBackOff  4\nUnhealthy  1\n"
        );
        assert_eq!(rendered::<ReasonCount>(&[], OutputMode::Text), "");
    }

    #[test]
    fn json_list_parses_as_array() {
        let value: serde_json::Value =
            serde_json::from_str(&rendered(&ROWS, OutputMode::Json)).unwrap();
        assert_eq!(value[0]["reason"], "BackOff");
        assert_eq!(value[1]["count"], 1);

        let empty: serde_json::Value =
            serde_json::from_str(&rendered::<ReasonCount>(&[], OutputMode::Json)).unwrap();
        assert_eq!(empty, serde_json::json!([]));
    }

    #[test]
    fn json_item_is_a_single_line() {
        let mut buf = Vec::new();
        render_item(&mut buf, &ROWS[1], OutputMode::Json).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert_eq!(out.lines().count(), 1);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["reason"], "Unhealthy");
    }

    // ── Errors ──────────────────────────────────────────────────────────────

    #[test]
    fn classify_finds_coded_error_under_context() {
        let err = anyhow::Error::new(CodedError::new(ErrorCode::EventNotFound, "no such event"))
            .context("show failed");
        assert_eq!(classify(&err), Some(ErrorCode::EventNotFound));
    }

    #[test]
    fn classify_maps_source_errors() {
        let err = anyhow::Error::new(SourceError::NotFound {
            uid: "u1".to_string(),
        });
        assert_eq!(classify(&err), Some(ErrorCode::EventNotFound));
        assert_eq!(classify(&anyhow::anyhow!("plain")), None);
    }

    #[test]
    fn coded_errors_render_code_and_hint() {
        let err = anyhow::Error::new(CodedError::new(
            ErrorCode::SnapshotFileUnreadable,
            "failed to read events.json",
        ));
        let cli = CliError::from(&err);
        let mut buf = Vec::new();
        write_error(&mut buf, OutputMode::Text, &cli).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.starts_with("error[E3004]: failed to read events.json"));
        assert!(out.contains("hint: Check the --snapshot-file path"));
    }

    #[test]
    fn json_errors_are_wrapped() {
        let cli = CliError::with_code(ErrorCode::EventNotFound, "event 'x' not found");
        let mut buf = Vec::new();
        write_error(&mut buf, OutputMode::Json, &cli).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["error"]["error_code"], "E2001");
        assert!(value["error"].get("suggestion").is_none());
    }

    #[test]
    fn plain_errors_have_no_code() {
        let mut buf = Vec::new();
        write_error(&mut buf, OutputMode::Pretty, &CliError::new("boom")).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "error: boom\n");
    }
}
