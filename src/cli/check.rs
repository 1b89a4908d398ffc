//! Lint the current repository, or every repository one level below it.

use anyhow::{bail, Context, Result};
use clap::Args;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::utils::display_name;
use crate::engine::{discover_repos, Linter};
use crate::render::Printer;

/// Exit status for errors that prevent checking at all.
pub const EXIT_FATAL: u8 = 2;

#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    /// Run as if started in DIR
    #[arg(short = 'C', value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Apply automatic fixes
    #[arg(long)]
    pub fix: bool,

    /// Check each git repository in the immediate subdirectories
    #[arg(short = 'R', long)]
    pub recursive: bool,

    /// Suppress detail lines (and clean repositories with --recursive)
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn run(args: &CheckArgs, linter: &Linter, printer: Printer) -> Result<u8> {
    let dir = match &args.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to resolve current directory")?,
    };
    let linter = linter.clone().with_fix(args.fix);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if args.recursive {
        return run_recursive(&dir, &linter, printer, &mut out);
    }

    let report = linter.lint(&dir)?;
    printer.write_report(&mut out, &report)?;
    Ok(report.exit_code())
}

fn run_recursive(
    root: &Path,
    linter: &Linter,
    printer: Printer,
    out: &mut impl Write,
) -> Result<u8> {
    let mut exit_code = 0;
    let mut printed = false;

    for path in discover_repos(root) {
        let report = match linter.lint(&path) {
            Ok(report) => report,
            Err(e) => {
                eprintln!("error: {e}");
                exit_code = EXIT_FATAL;
                continue;
            }
        };
        if printer.is_quiet() && !report.has_problems() {
            continue;
        }

        if printed {
            writeln!(out)?;
        }
        printed = true;
        printer.write_header(out, &display_name(&path))?;
        printer.write_report(out, &report)?;
        exit_code = exit_code.max(report.exit_code());
    }

    if !printed && !printer.is_quiet() && exit_code == 0 {
        bail!("no git repos found in {}", root.display());
    }
    Ok(exit_code)
}
