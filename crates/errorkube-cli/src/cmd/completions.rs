//! `errorkube completions`: shell completion scripts.

use anyhow::Result;
use clap::Args;
use clap_complete::{Shell, generate};
use std::io::Write;

/// Binary name completions are registered under.
const BIN_NAME: &str = "errorkube";

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script generation.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Write the completion script for `args.shell` to stdout.
///
/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn run_completions(args: &CompletionsArgs, mut command: clap::Command) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_completions(args.shell, &mut command, &mut out);
    out.flush()?;
    Ok(())
}

fn write_completions(shell: Shell, command: &mut clap::Command, out: &mut dyn Write) {
    generate(shell, command, BIN_NAME, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> clap::Command {
        clap::Command::new(BIN_NAME)
            .subcommand(clap::Command::new("watch"))
            .subcommand(clap::Command::new("list"))
    }

    #[test]
    fn bash_script_registers_binary_name() {
        let mut buf = Vec::new();
        write_completions(Shell::Bash, &mut command(), &mut buf);
        let script = String::from_utf8(buf).unwrap();
        assert!(script.contains("_errorkube"));
        assert!(script.contains("watch"));
    }

    #[test]
    fn every_shell_produces_output() {
        for shell in [Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell, Shell::Elvish] {
            let mut buf = Vec::new();
            write_completions(shell, &mut command(), &mut buf);
            assert!(!buf.is_empty(), "{shell} produced nothing");
        }
    }
}
