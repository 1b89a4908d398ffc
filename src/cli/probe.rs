//! Monitoring probe subcommands.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::utils::display_name;
use crate::domain::Config;
use crate::engine::{discover_repos, Linter};
use crate::render::{describe, ProbeResult, ProbeSummary};

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Directory whose immediate subdirectories are git repositories
    #[arg(value_name = "PATH")]
    pub path: PathBuf,
}

/// Check every repository under the path and print one probe result.
/// Problems are reported in the result; the exit status is always 0.
pub fn run(args: &ProbeArgs, linter: Result<Linter>) -> Result<u8> {
    let result = match linter {
        Ok(linter) => probe(args, &linter),
        Err(e) => ProbeResult::critical(format!("invalid configuration: {e:#}")),
    };
    println!("{}", serde_json::to_string(&result)?);
    Ok(0)
}

fn probe(args: &ProbeArgs, linter: &Linter) -> ProbeResult {
    let root = match args.path.canonicalize() {
        Ok(root) if root.is_dir() => root,
        Ok(root) => return ProbeResult::critical(format!("not a directory: {}", root.display())),
        Err(e) => {
            return ProbeResult::critical(format!("cannot access {}: {e}", args.path.display()))
        }
    };

    let mut summary = ProbeSummary::new();
    for path in discover_repos(&root) {
        let name = display_name(&path);
        match linter.lint(&path) {
            Ok(report) => summary.add(&name, &report),
            Err(e) => summary.add_error(&name, &e.to_string()),
        }
    }
    summary.finish()
}

/// Print the probe self-description with defaults taken from `config`.
pub fn run_describe(config: &Config) -> Result<u8> {
    println!("{}", serde_json::to_string(&describe(config))?);
    Ok(0)
}
