//! Git subprocess plumbing.
//!
//! Git is treated as a text-producing oracle: every query runs the `git`
//! binary in a working directory and inspects trimmed stdout plus the exit
//! status. Nothing here models the object graph.

use std::path::Path;
use std::process::Command;
use thiserror::Error;

pub mod branch;
pub mod repo;
pub mod status;
pub mod url;

#[cfg(test)]
pub mod fake;

pub use branch::{Branch, Upstream};
pub use repo::{Repo, RepoError};
pub use status::WorkTreeStatus;
pub use url::{RemoteUrl, Transport};

/// Output of one git invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitOutput {
    /// Stdout with trailing newlines stripped.
    pub stdout: String,
    pub stderr: String,
    pub ok: bool,
}

impl GitOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self { stdout: stdout.into(), stderr: String::new(), ok: true }
    }

    pub fn failure(stderr: impl Into<String>) -> Self {
        Self { stdout: String::new(), stderr: stderr.into(), ok: false }
    }

    /// Non-empty stdout lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines().filter(|line| !line.is_empty())
    }
}

/// Runs git subcommands. Never fails for a non-zero exit; callers inspect `ok`.
pub trait GitRunner: Send + Sync {
    fn run(&self, dir: &Path, args: &[&str]) -> GitOutput;
}

/// Runs the system `git` binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemGit;

impl GitRunner for SystemGit {
    fn run(&self, dir: &Path, args: &[&str]) -> GitOutput {
        tracing::debug!(dir = %dir.display(), args = ?args, "git");
        let output = Command::new("git").args(args).current_dir(dir).output();
        match output {
            Ok(out) => GitOutput {
                stdout: String::from_utf8_lossy(&out.stdout).trim_end_matches('\n').to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
                ok: out.status.success(),
            },
            Err(e) => {
                tracing::warn!("failed to run git: {}", e);
                GitOutput::failure(format!("failed to run git: {e}"))
            }
        }
    }
}

/// A git query whose output a rule needed but could not get.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GitError {
    #[error("git {args} failed: {stderr}")]
    Command { args: String, stderr: String },

    #[error("cannot parse {what}: {line:?}")]
    Parse { what: &'static str, line: String },
}

impl GitError {
    pub fn command(args: &[&str], output: &GitOutput) -> Self {
        let stderr =
            if output.stderr.is_empty() { "exit status non-zero".to_string() } else { output.stderr.clone() };
        GitError::Command { args: args.join(" "), stderr }
    }
}
