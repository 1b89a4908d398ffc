//! Run orchestration: check every rule, optionally fix, aggregate.

use crate::domain::{CheckResult, Config, Status, Topic};
use crate::fork::{forget_cached_parent, ForkApi};
use crate::git::{GitRunner, Repo, RepoError};
use crate::rules::{default_rules, Rule};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Overall health of one repository, or of a set of repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Ok,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Ok => "ok",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

/// Flattened, ordered results of one repository run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub results: Vec<CheckResult>,
}

impl Report {
    pub fn severity(&self) -> Severity {
        self.results.iter().fold(Severity::Ok, |worst, r| {
            let s = match r.status {
                Status::Fail => Severity::Critical,
                Status::Warn => Severity::Warning,
                Status::Ok | Status::Fix => Severity::Ok,
            };
            worst.max(s)
        })
    }

    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| r.status == Status::Fail)
    }

    /// Anything other than OK, including applied fixes.
    pub fn has_problems(&self) -> bool {
        self.results.iter().any(|r| r.status != Status::Ok)
    }

    /// 1 when any result is still failing, else 0.
    pub fn exit_code(&self) -> u8 {
        u8::from(self.has_failures())
    }
}

/// Run `rules` against `repo` in order. A rule whose check cannot read the
/// state it needs contributes a single degraded warning instead.
pub fn run_rules(repo: &Repo, rules: &[Box<dyn Rule>], fix: bool) -> Report {
    let mut results = Vec::new();
    for rule in rules {
        let family = rule.family();
        let checked = match rule.check(repo) {
            Ok(checked) => checked,
            Err(e) => {
                tracing::warn!(
                    "{} rules degraded in {}: {}",
                    family.as_str(),
                    repo.root().display(),
                    e
                );
                results.push(CheckResult::warn(
                    Topic::Degraded(family),
                    format!("cannot evaluate {} rules: {e}", family.as_str()),
                ));
                continue;
            }
        };
        let checked = if fix { rule.fix(repo, checked) } else { checked };
        results.extend(checked);
    }
    Report { results }
}

/// Everything needed to lint a repository, shared across repositories.
#[derive(Clone)]
pub struct Linter {
    config: Arc<Config>,
    git: Arc<dyn GitRunner>,
    fork_api: Arc<dyn ForkApi>,
    fix: bool,
    refresh_forks: bool,
}

impl Linter {
    pub fn new(config: Arc<Config>, git: Arc<dyn GitRunner>, fork_api: Arc<dyn ForkApi>) -> Self {
        Self { config, git, fork_api, fix: false, refresh_forks: false }
    }

    pub fn with_fix(mut self, fix: bool) -> Self {
        self.fix = fix;
        self
    }

    /// Discard cached fork parents before checking each repository.
    pub fn with_refresh_forks(mut self, refresh: bool) -> Self {
        self.refresh_forks = refresh;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Open the repository containing `dir` and run the default rule set.
    pub fn lint(&self, dir: &Path) -> Result<Report, RepoError> {
        let repo =
            Repo::open(dir, self.config.clone(), self.git.clone(), self.fork_api.clone())?;
        if self.refresh_forks {
            forget_cached_parent(&repo);
        }
        Ok(run_rules(&repo, &default_rules(), self.fix))
    }
}

/// Immediate subdirectories of `root` that contain `.git`, sorted by name.
pub fn discover_repos(root: &Path) -> Vec<PathBuf> {
    let mut repos: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .filter(|path| path.join(".git").exists())
        .collect();
    repos.sort();
    repos
}
