#![forbid(unsafe_code)]

mod cmd;
mod output;
mod tui;

use clap::{CommandFactory, Parser, Subcommand};
use errorkube_core::config::resolve_server_url;
use errorkube_core::{ErrorCode, load_config};
use output::{CliError, CodedError, OutputMode, render_error, resolve_output_mode};
use std::env;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::{debug, info};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "errorkube",
    author,
    version,
    about = "errorkube: live viewer for Kubernetes warning events",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format: pretty, text or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Event server base URL (overrides ERRORKUBE_URL and the config file).
    #[arg(long, global = true, value_name = "URL")]
    url: Option<String>,

    /// Config file to load instead of the default location.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Read the snapshot from a JSON file instead of the server (no live feed).
    #[arg(long, global = true, value_name = "PATH")]
    snapshot_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Live",
        about = "Watch events in an interactive terminal view",
        long_about = "Load the snapshot, then follow the live feed in a full-screen view with search, filters and a detail pane.",
        after_help = "EXAMPLES:\n    # Watch everything\n    errorkube watch\n\n    # Start scoped to one namespace and the last hour\n    errorkube watch -n kube-system -w 1h\n\n    # Browse a saved snapshot offline\n    errorkube watch --snapshot-file events.json"
    )]
    Watch(cmd::watch::WatchArgs),

    #[command(
        next_help_heading = "Read",
        about = "List events",
        long_about = "Print the snapshot newest first, with optional filters. With --follow, keep printing matching live events.",
        after_help = "EXAMPLES:\n    # List warning events from the last 24 hours\n    errorkube list -w 24h\n\n    # Only BackOff events for pods\n    errorkube list --kind Pod --search backoff\n\n    # Stream new events as JSON lines\n    errorkube list --follow --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one event",
        long_about = "Show the full detail of a single event by UID.",
        after_help = "EXAMPLES:\n    # Show an event\n    errorkube show 3f1c9a2e-7d4b-4a51-9a0e-2b8f6d1e0c77\n\n    # Emit machine-readable output\n    errorkube show 3f1c9a2e-7d4b-4a51-9a0e-2b8f6d1e0c77 --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Read",
        about = "List namespaces and object kinds",
        long_about = "List the distinct namespaces in the snapshot and the object kinds seen, optionally within one namespace.",
        after_help = "EXAMPLES:\n    # All namespaces and kinds\n    errorkube facets\n\n    # Kinds seen in one namespace\n    errorkube facets -n kube-system"
    )]
    Facets(cmd::facets::FacetsArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        long_about = "Generate shell completion scripts for errorkube.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    errorkube completions bash > ~/.local/share/bash-completion/completions/errorkube\n\n    # Generate zsh completions\n    errorkube completions zsh > ~/.zfunc/_errorkube"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

impl Cli {
    /// Where logs should go: a file for the full-screen view, stderr otherwise.
    fn log_file(&self) -> Option<PathBuf> {
        match self.command {
            Commands::Watch(ref args) => args.log_path(),
            _ => None,
        }
    }

    const fn is_watch(&self) -> bool {
        matches!(self.command, Commands::Watch(_))
    }
}

fn init_tracing(verbose: bool, to_file: bool, log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_env("ERRORKUBE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "errorkube=debug,info"
        } else {
            "errorkube=info,warn"
        })
    });

    let format = env::var("ERRORKUBE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let writer = if to_file {
        log_file.and_then(open_log_file).map_or_else(
            || BoxMakeWriter::new(io::sink),
            |file| BoxMakeWriter::new(Mutex::new(file)),
        )
    } else {
        BoxMakeWriter::new(io::stderr)
    };

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(writer))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_ansi(!to_file).with_writer(writer))
                .init();
        }
    }
}

fn open_log_file(path: &Path) -> Option<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())
        .map_err(|err| CodedError::new(ErrorCode::ConfigParseError, format!("{err:#}")))?;
    let output = resolve_output_mode(cli.format, cli.json, config.display.output.as_deref());

    let env_url = env::var("ERRORKUBE_URL").ok();
    let sources = cmd::Sources {
        server_url: resolve_server_url(cli.url.as_deref(), env_url.as_deref(), &config),
        snapshot_file: cli.snapshot_file.clone(),
        server: config.server.clone(),
    };
    debug!(server = %sources.server_url, snapshot_file = ?sources.snapshot_file, "resolved source");
    let window = config.display.window;

    match cli.command {
        Commands::Watch(ref args) => cmd::watch::run_watch(args, &sources, window),
        Commands::List(ref args) => cmd::list::run_list(args, output, &sources, window),
        Commands::Show(ref args) => cmd::show::run_show(args, output, &sources),
        Commands::Facets(ref args) => cmd::facets::run_facets(args, output, &sources),
        Commands::Completions(ref args) => {
            cmd::completions::run_completions(args, Cli::command())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let log_file = cli.log_file();
    init_tracing(cli.verbose, cli.is_watch(), log_file.as_deref());

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    // Errors before the config is read still honor the flags.
    let error_mode = if cli.json {
        OutputMode::Json
    } else {
        cli.format.unwrap_or(OutputMode::Text)
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = render_error(error_mode, &CliError::from(&err));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_parses_before_subcommand() {
        let cli = Cli::parse_from(["errorkube", "--json", "list"]);
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::List(_)));
    }

    #[test]
    fn json_flag_after_subcommand() {
        let cli = Cli::parse_from(["errorkube", "list", "--json"]);
        assert!(cli.json);
    }

    #[test]
    fn format_flag_accepts_modes() {
        let cli = Cli::parse_from(["errorkube", "facets", "--format", "text"]);
        assert_eq!(cli.format, Some(OutputMode::Text));
        assert!(Cli::try_parse_from(["errorkube", "facets", "--format", "yaml"]).is_err());
    }

    #[test]
    fn source_flags_are_global() {
        let cli = Cli::parse_from([
            "errorkube",
            "show",
            "abc",
            "--url",
            "http://events.local:9000",
            "--snapshot-file",
            "snap.json",
            "--config",
            "ek.toml",
        ]);
        assert_eq!(cli.url.as_deref(), Some("http://events.local:9000"));
        assert_eq!(cli.snapshot_file, Some(PathBuf::from("snap.json")));
        assert_eq!(cli.config, Some(PathBuf::from("ek.toml")));
        match cli.command {
            Commands::Show(ref args) => assert_eq!(args.uid, "abc"),
            ref other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn list_window_flag_rejects_unknown_values() {
        assert!(Cli::try_parse_from(["errorkube", "list", "-w", "1h"]).is_ok());
        assert!(Cli::try_parse_from(["errorkube", "list", "-w", "2h"]).is_err());
    }

    #[test]
    fn only_watch_logs_to_file() {
        let watch = Cli::parse_from(["errorkube", "watch", "--log-file", "/tmp/ek.log"]);
        assert!(watch.is_watch());
        assert_eq!(watch.log_file(), Some(PathBuf::from("/tmp/ek.log")));

        let list = Cli::parse_from(["errorkube", "list"]);
        assert!(!list.is_watch());
        assert_eq!(list.log_file(), None);
    }

    #[test]
    fn show_requires_uid() {
        assert!(Cli::try_parse_from(["errorkube", "show"]).is_err());
    }

    #[test]
    fn all_subcommands_listed() {
        let command = Cli::command();
        let names: Vec<&str> = command.get_subcommands().map(clap::Command::get_name).collect();
        for expected in ["watch", "list", "show", "facets", "completions"] {
            assert!(names.contains(&expected), "missing subcommand {expected}");
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
