//! Repository handle: a working directory plus the configuration it is judged against.

use super::branch::{parse_branches, Branch, BRANCH_CONFIG_PATTERN, BRANCH_FORMAT};
use super::status::WorkTreeStatus;
use super::url::work_org_of;
use super::{GitError, GitOutput, GitRunner};
use crate::domain::Config;
use crate::fork::{ForkApi, ForkResolver};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Fatal per-repository errors. These abort the repository, not the run.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("{} is a bare repository", .0.display())]
    Bare(PathBuf),

    #[error("cannot read remotes of {}: {source}", path.display())]
    Remotes { path: PathBuf, source: GitError },
}

pub struct Repo {
    root: PathBuf,
    config: Arc<Config>,
    git: Arc<dyn GitRunner>,
    fork: ForkResolver,
    work: bool,
    now: DateTime<Utc>,
}

impl Repo {
    /// Resolve the work tree containing `dir` and classify it.
    pub fn open(
        dir: &Path,
        config: Arc<Config>,
        git: Arc<dyn GitRunner>,
        fork_api: Arc<dyn ForkApi>,
    ) -> Result<Self, RepoError> {
        let discovered = git2::Repository::discover(dir)
            .map_err(|_| RepoError::NotARepository(dir.to_path_buf()))?;
        let root = discovered
            .workdir()
            .map(|p| p.to_path_buf())
            .ok_or_else(|| RepoError::Bare(dir.to_path_buf()))?;
        Self::from_parts(root, config, git, fork_api)
    }

    /// Build a handle for a known work tree root without discovery.
    pub fn from_parts(
        root: PathBuf,
        config: Arc<Config>,
        git: Arc<dyn GitRunner>,
        fork_api: Arc<dyn ForkApi>,
    ) -> Result<Self, RepoError> {
        let mut repo = Self {
            root,
            config,
            git,
            fork: ForkResolver::new(fork_api),
            work: false,
            now: Utc::now(),
        };
        repo.work = repo.classify()?;
        tracing::debug!(root = %repo.root.display(), work = repo.work, "opened repository");
        Ok(repo)
    }

    /// Pin the clock used for staleness checks.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    // A repository is a work repository if any remote points at a work
    // organization, or if the effective email is the work email.
    fn classify(&self) -> Result<bool, RepoError> {
        let remotes = self
            .remotes()
            .map_err(|source| RepoError::Remotes { path: self.root.clone(), source })?;
        for name in &remotes {
            if let Some(url) = self.remote_url(name) {
                if work_org_of(&url, &self.config.work_orgs).is_some() {
                    return Ok(true);
                }
            }
        }

        let work_email = &self.config.identity.work_email;
        Ok(!work_email.is_empty()
            && self.config_effective("user.email").as_deref() == Some(work_email.as_str()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_work(&self) -> bool {
        self.work
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Run git at the repository root.
    pub fn git(&self, args: &[&str]) -> GitOutput {
        self.git.run(&self.root, args)
    }

    /// Run git rooted at another directory, e.g. a submodule work tree.
    pub fn git_in(&self, dir: &Path, args: &[&str]) -> GitOutput {
        self.git.run(dir, args)
    }

    /// Run git at the root and require success.
    pub fn read(&self, args: &[&str]) -> Result<String, GitError> {
        let out = self.git(args);
        if out.ok {
            Ok(out.stdout)
        } else {
            Err(GitError::command(args, &out))
        }
    }

    /// Repository-local config value; `None` when unset or empty.
    pub fn config_get(&self, key: &str) -> Option<String> {
        non_empty(self.git(&["config", "--local", "--get", key]))
    }

    /// Effective config value from every source git consults.
    pub fn config_effective(&self, key: &str) -> Option<String> {
        non_empty(self.git(&["config", "--get", key]))
    }

    pub fn config_set(&self, key: &str, value: &str) -> bool {
        let ok = self.git(&["config", key, value]).ok;
        if !ok {
            tracing::warn!("failed to set {} in {}", key, self.root.display());
        }
        ok
    }

    /// Remove a repository-local key; `false` when it was not set.
    pub fn config_unset(&self, key: &str) -> bool {
        self.git(&["config", "--unset", key]).ok
    }

    pub fn remotes(&self) -> Result<Vec<String>, GitError> {
        Ok(self.read(&["remote"])?.lines().filter(|l| !l.is_empty()).map(str::to_string).collect())
    }

    /// The URL stored in the local config, bypassing `insteadOf` rewriting.
    pub fn remote_url(&self, name: &str) -> Option<String> {
        self.config_get(&format!("remote.{name}.url"))
    }

    /// `main` or `master`, whichever exists locally.
    pub fn main_branch(&self) -> Option<String> {
        ["main", "master"]
            .into_iter()
            .find(|name| {
                self.git(&["rev-parse", "--verify", "--quiet", &format!("refs/heads/{name}")]).ok
            })
            .map(str::to_string)
    }

    /// Checked-out branch; `None` on a detached HEAD.
    pub fn current_branch(&self) -> Option<String> {
        non_empty(self.git(&["symbolic-ref", "--short", "-q", "HEAD"]))
    }

    /// Every local branch, read in one batch.
    pub fn branches(&self) -> Result<Vec<Branch>, GitError> {
        let refs = self.read(&["for-each-ref", BRANCH_FORMAT, "refs/heads/"])?;
        // Exit status 1 means no branch has tracking config.
        let config = self.git(&["config", "--get-regexp", BRANCH_CONFIG_PATTERN]).stdout;
        Ok(parse_branches(&refs, &config))
    }

    /// Branches whose tip is reachable from main's remote-tracking ref,
    /// falling back to local main when main has no upstream.
    pub fn merged_into(&self, main: &str) -> HashSet<String> {
        let upstream = format!("{main}@{{upstream}}");
        let mut out =
            self.git(&["branch", "--format=%(refname:short)", "--merged", upstream.as_str()]);
        if !out.ok {
            out = self.git(&["branch", "--format=%(refname:short)", "--merged", main]);
        }
        if !out.ok {
            return HashSet::new();
        }
        out.lines().map(str::to_string).collect()
    }

    /// Current value of `reference` on `remote`, or `None` if the remote
    /// cannot be reached or does not have it.
    pub fn ls_remote(&self, remote: &str, reference: &str) -> Option<String> {
        let out = self.git(&["ls-remote", remote, reference]);
        if !out.ok {
            tracing::debug!(remote, reference, "ls-remote failed: {}", out.stderr);
            return None;
        }
        let head = out.lines().find_map(|line| line.split_whitespace().next()).map(str::to_string);
        head
    }

    pub fn work_tree_status(&self, dir: &Path) -> Result<WorkTreeStatus, GitError> {
        let args = ["status", "--porcelain"];
        let out = self.git_in(dir, &args);
        if !out.ok {
            return Err(GitError::command(&args, &out));
        }
        Ok(WorkTreeStatus::parse(&out.stdout))
    }

    /// `owner/repo` of origin's fork parent, looked up at most once per handle.
    pub fn fork_parent(&self) -> Option<String> {
        self.fork.parent(self)
    }

    /// The non-origin remote that points at origin's fork parent.
    pub fn fork_parent_remote(&self) -> Option<String> {
        self.fork.parent_remote(self)
    }
}

fn non_empty(out: GitOutput) -> Option<String> {
    if out.ok && !out.stdout.is_empty() {
        Some(out.stdout)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IdentityConfig;
    use crate::fork::Disabled;
    use crate::git::fake::FakeGit;

    fn config() -> Arc<Config> {
        Arc::new(Config {
            work_orgs: vec!["acme".to_string()],
            identity: IdentityConfig {
                name: "Jo Dev".to_string(),
                work_email: "jo@acme.io".to_string(),
                personal_email: "jo@home.net".to_string(),
            },
            ..Config::default()
        })
    }

    fn open(git: FakeGit) -> Result<Repo, RepoError> {
        Repo::from_parts(PathBuf::from("/repo"), config(), Arc::new(git), Arc::new(Disabled))
    }

    #[test]
    fn work_org_remote_classifies_as_work() {
        let git = FakeGit::new()
            .ok("remote", "origin\nupstream")
            .config("remote.origin.url", "git@github.com:jo/tool.git")
            .config("remote.upstream.url", "git@github.com:acme/tool.git");
        assert!(open(git).expect("repo").is_work());
    }

    #[test]
    fn work_email_classifies_as_work() {
        let git = FakeGit::new().ok("remote", "").ok("config --get user.email", "jo@acme.io");
        assert!(open(git).expect("repo").is_work());

        let git = FakeGit::new().ok("remote", "").ok("config --get user.email", "jo@home.net");
        assert!(!open(git).expect("repo").is_work());
    }

    #[test]
    fn unreadable_remotes_are_fatal() {
        let git = FakeGit::new().fail("remote");
        assert!(matches!(open(git), Err(RepoError::Remotes { .. })));
    }

    #[test]
    fn merged_falls_back_to_local_main() {
        let git = FakeGit::new()
            .ok("remote", "")
            .fail("branch --format=%(refname:short) --merged main@{upstream}")
            .ok("branch --format=%(refname:short) --merged main", "main\nold-feature");
        let repo = open(git).expect("repo");
        let merged = repo.merged_into("main");
        assert!(merged.contains("old-feature"));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn ls_remote_returns_first_object_id() {
        let git = FakeGit::new()
            .ok("remote", "")
            .ok("ls-remote upstream refs/pull/42/head", "fff6666aaaa\trefs/pull/42/head\n")
            .fail("ls-remote offline refs/pull/42/head");
        let repo = open(git).expect("repo");
        assert_eq!(repo.ls_remote("upstream", "refs/pull/42/head").as_deref(), Some("fff6666aaaa"));
        assert_eq!(repo.ls_remote("offline", "refs/pull/42/head"), None);
    }

    #[test]
    fn open_rejects_non_repository() {
        let tmp = tempfile::TempDir::new().expect("tmp");
        let result =
            Repo::open(tmp.path(), config(), Arc::new(FakeGit::new()), Arc::new(Disabled));
        assert!(matches!(result, Err(RepoError::NotARepository(_))));
    }
}
