//! Human-readable result listing.
//!
//! Plain mode is a fixed-width table meant for pipes and logs. TTY mode
//! replaces the status column with a coloured marker and highlights the
//! entity a result is about.

use crate::domain::{CheckResult, Status, DEFAULT_DETAIL_LINES};
use crate::engine::Report;
use console::style;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy)]
pub struct Printer {
    tty: bool,
    verbose: bool,
    quiet: bool,
    detail_lines: usize,
}

impl Default for Printer {
    fn default() -> Self {
        Self { tty: false, verbose: false, quiet: false, detail_lines: DEFAULT_DETAIL_LINES }
    }
}

impl Printer {
    pub fn new(detail_lines: usize) -> Self {
        let detail_lines = if detail_lines == 0 { DEFAULT_DETAIL_LINES } else { detail_lines };
        Self { detail_lines, ..Self::default() }
    }

    pub fn tty(mut self, tty: bool) -> Self {
        self.tty = tty;
        self
    }

    /// Show OK results and every detail line.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Hide detail lines.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    // None means unlimited.
    fn detail_limit(&self) -> Option<usize> {
        if self.verbose {
            None
        } else if self.quiet {
            Some(0)
        } else {
            Some(self.detail_lines)
        }
    }

    /// Section header for one repository in recursive mode.
    pub fn write_header(&self, out: &mut impl Write, name: &str) -> io::Result<()> {
        if self.tty {
            writeln!(out, "{}", style(name).bold())
        } else {
            writeln!(out, "=== {name} ===")
        }
    }

    pub fn write_report(&self, out: &mut impl Write, report: &Report) -> io::Result<()> {
        for result in &report.results {
            if self.verbose || result.status != Status::Ok {
                self.write_result(out, result)?;
            }
        }
        if !report.has_problems() {
            if self.tty {
                writeln!(out, "{}", style("✓ repo ok").green())?;
            } else {
                writeln!(out, "repo ok")?;
            }
        }
        Ok(())
    }

    fn write_result(&self, out: &mut impl Write, r: &CheckResult) -> io::Result<()> {
        if self.tty {
            self.write_result_tty(out, r)?;
        } else {
            let hint = if r.fixable && r.status == Status::Warn { " [--fix]" } else { "" };
            writeln!(out, "{:<4} {:<24} {}{hint}", r.status.as_str(), r.name(), r.message)?;
        }

        let limit = self.detail_limit().unwrap_or(usize::MAX);
        if limit == 0 || r.details.is_empty() {
            return Ok(());
        }
        let indent = if self.tty { "  " } else { "      " };
        for detail in r.details.iter().take(limit) {
            if self.tty {
                writeln!(out, "{indent}{}", style(detail).dim())?;
            } else {
                writeln!(out, "{indent}{detail}")?;
            }
        }
        let remaining = r.details.len().saturating_sub(limit);
        if remaining > 0 {
            let more = format!("...and {remaining} more");
            if self.tty {
                writeln!(out, "{indent}{}", style(more).dim())?;
            } else {
                writeln!(out, "{indent}{more}")?;
            }
        }
        Ok(())
    }

    fn write_result_tty(&self, out: &mut impl Write, r: &CheckResult) -> io::Result<()> {
        let fixable_warn = r.fixable && r.status == Status::Warn;
        let marker = match r.status {
            Status::Ok | Status::Fix => Some(style("✓").green()),
            Status::Warn if fixable_warn => Some(style("~").cyan()),
            Status::Warn if self.verbose => Some(style("!").yellow()),
            Status::Warn => None,
            Status::Fail => Some(style("✗").red()),
        };
        let marker = marker.map(|m| format!("{m} ")).unwrap_or_default();

        let content = match &r.entity {
            Some(entity) => {
                let entity = style(entity).bold();
                let entity = match r.status {
                    _ if fixable_warn => entity.cyan(),
                    Status::Warn => entity.yellow(),
                    Status::Fail => entity.red(),
                    Status::Ok | Status::Fix => entity.green(),
                };
                format!("{entity}: {}", r.message)
            }
            None => r.message.clone(),
        };
        writeln!(out, "{marker}{content}  {}", style(format!("({})", r.topic)).dim())
    }
}
