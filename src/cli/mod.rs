//! Command-line interface for git-lint
//!
//! Without a subcommand, lints the current repository (or each repository
//! below it with `-R`). `probe` and `describe` speak the monitoring probe
//! protocol; `completions` prints a shell completion script.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod check;
mod probe;
mod utils;

use crate::config::{load_config, merge_cli_with_config, CliOverrides};
use crate::domain::{Config, Protocol};
use crate::engine::Linter;
use crate::fork::{Disabled, ForkApi, GhCli};
use crate::git::SystemGit;
use crate::render::Printer;
use check::EXIT_FATAL;
use utils::{parse_csv, stdout_is_tty};

/// Check git repositories against identity, remote, staleness and cleanup policies
#[derive(Parser)]
#[command(name = "git-lint")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    check: check::CheckArgs,

    /// Show OK results and all detail lines; log at DEBUG level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: $XDG_CONFIG_HOME/git-lint/config.{json,toml,yaml})
    #[arg(short = 'c', long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Work organizations, overriding the config file (comma-separated)
    #[arg(long, global = true, value_name = "ORGS")]
    work_orgs: Option<String>,

    /// Preferred remote protocol (ssh or https)
    #[arg(long, global = true, value_name = "PROTOCOL")]
    protocol: Option<Protocol>,

    /// Never query GitHub for fork parents; use only cached answers
    #[arg(long, global = true)]
    no_fork_lookup: bool,

    /// Discard cached fork parents and look them up again
    #[arg(long, global = true, conflicts_with = "no_fork_lookup")]
    refresh_forks: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every repository under PATH and print a monitoring probe result
    Probe(probe::ProbeArgs),

    /// Print the monitoring probe self-description
    Describe,

    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let file = load_config(self.config.as_deref())?;
        let overrides =
            CliOverrides { work_orgs: parse_csv(&self.work_orgs), protocol: self.protocol };
        merge_cli_with_config(file, &overrides)
    }

    fn linter(&self) -> Result<Linter> {
        let config = Arc::new(self.load_config()?);
        let fork_api: Arc<dyn ForkApi> =
            if self.no_fork_lookup { Arc::new(Disabled) } else { Arc::new(GhCli) };
        Ok(Linter::new(config, Arc::new(SystemGit), fork_api)
            .with_refresh_forks(self.refresh_forks))
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    match dispatch(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn dispatch(cli: &Cli) -> Result<u8> {
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            let mut command = Cli::command();
            let name = command.get_name().to_string();
            generate(*shell, &mut command, name, &mut std::io::stdout());
            Ok(0)
        }
        Some(Commands::Describe) => probe::run_describe(&cli.load_config()?),
        Some(Commands::Probe(args)) => probe::run(args, cli.linter()),
        None => {
            let linter = cli.linter()?;
            let printer = Printer::new(linter.config().detail_lines)
                .tty(stdout_is_tty())
                .verbose(cli.verbose)
                .quiet(cli.check.quiet);
            check::run(&cli.check, &linter, printer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags_and_subcommands() {
        let cli = Cli::try_parse_from([
            "git-lint", "-C", "/src/tool", "--fix", "-R", "-q", "--work-orgs", "acme,widgets",
            "--protocol", "ssh",
        ])
        .expect("parse");
        assert!(cli.command.is_none());
        assert_eq!(cli.check.dir.as_deref(), Some(std::path::Path::new("/src/tool")));
        assert!(cli.check.fix && cli.check.recursive && cli.check.quiet);
        assert_eq!(cli.protocol, Some(Protocol::Ssh));

        let cli = Cli::try_parse_from(["git-lint", "probe", "/src", "--no-fork-lookup"]).expect("parse");
        assert!(matches!(cli.command, Some(Commands::Probe(_))));
        assert!(cli.no_fork_lookup);

        assert!(Cli::try_parse_from(["git-lint", "--protocol", "git"]).is_err());
        assert!(Cli::try_parse_from(["git-lint", "--refresh-forks", "--no-fork-lookup"]).is_err());
    }
}
