//! Fork-parent resolution with a durable per-repository cache.
//!
//! The parent of origin is looked up on GitHub once and stored in
//! `remote.origin.gh-parent`. A stored `none` records a confirmed non-fork.
//! Lookup failures are not cached: they degrade to "no fork parent" for the
//! current run only.

use crate::git::{Repo, RemoteUrl};
use std::cell::OnceCell;
use std::process::Command;
use std::sync::Arc;
use thiserror::Error;

pub const PARENT_CACHE_KEY: &str = "remote.origin.gh-parent";
pub const NOT_A_FORK: &str = "none";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("fork lookup for {repo} failed: {reason}")]
pub struct ForkLookupError {
    pub repo: String,
    pub reason: String,
}

/// Hosted API answering "what was this repository forked from".
pub trait ForkApi: Send + Sync {
    /// `Ok(Some("owner/repo"))` for a fork, `Ok(None)` for a confirmed
    /// non-fork, `Err` for any transport, auth or not-found failure.
    fn fork_parent(&self, owner: &str, repo: &str) -> Result<Option<String>, ForkLookupError>;
}

/// Queries GitHub through the `gh` CLI, reusing its authentication.
#[derive(Debug, Default, Clone, Copy)]
pub struct GhCli;

impl ForkApi for GhCli {
    fn fork_parent(&self, owner: &str, repo: &str) -> Result<Option<String>, ForkLookupError> {
        let full_name = format!("{owner}/{repo}");
        let endpoint = format!("repos/{full_name}");
        tracing::debug!(endpoint = %endpoint, "gh api");
        let output = Command::new("gh")
            .args(["api", &endpoint, "--jq", ".parent.full_name // empty"])
            .output()
            .map_err(|e| ForkLookupError { repo: full_name.clone(), reason: e.to_string() })?;

        if !output.status.success() {
            return Err(ForkLookupError {
                repo: full_name,
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let parent = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(if parent.is_empty() { None } else { Some(parent) })
    }
}

/// A fork API that is never reachable.
#[derive(Debug, Default, Clone, Copy)]
pub struct Disabled;

impl ForkApi for Disabled {
    fn fork_parent(&self, owner: &str, repo: &str) -> Result<Option<String>, ForkLookupError> {
        Err(ForkLookupError {
            repo: format!("{owner}/{repo}"),
            reason: "fork lookups disabled".to_string(),
        })
    }
}

/// Resolves and memoizes origin's fork parent for one repository handle.
pub struct ForkResolver {
    api: Arc<dyn ForkApi>,
    memo: OnceCell<Option<String>>,
}

impl ForkResolver {
    pub fn new(api: Arc<dyn ForkApi>) -> Self {
        Self { api, memo: OnceCell::new() }
    }

    pub fn parent(&self, repo: &Repo) -> Option<String> {
        self.memo.get_or_init(|| self.lookup(repo)).clone()
    }

    fn lookup(&self, repo: &Repo) -> Option<String> {
        match repo.config_get(PARENT_CACHE_KEY) {
            Some(cached) if cached == NOT_A_FORK => {
                tracing::debug!("fork cache: not a fork");
                return None;
            }
            Some(cached) => {
                tracing::debug!(parent = %cached, "fork cache hit");
                return Some(cached);
            }
            None => {}
        }

        let origin = RemoteUrl::github(&repo.remote_url("origin")?)?;
        match self.api.fork_parent(&origin.owner, &origin.repo) {
            Ok(Some(parent)) => {
                repo.config_set(PARENT_CACHE_KEY, &parent);
                Some(parent)
            }
            Ok(None) => {
                repo.config_set(PARENT_CACHE_KEY, NOT_A_FORK);
                None
            }
            Err(e) => {
                tracing::debug!("{}", e);
                None
            }
        }
    }

    /// First non-origin remote whose GitHub address matches the fork parent.
    pub fn parent_remote(&self, repo: &Repo) -> Option<String> {
        let parent = self.parent(repo)?;
        let remotes = repo.remotes().ok()?;
        remotes.into_iter().filter(|name| name != "origin").find(|name| {
            repo.remote_url(name)
                .and_then(|url| RemoteUrl::github(&url))
                .is_some_and(|url| url.same_repo(&parent))
        })
    }
}

/// Drop the cached fork parent so the next resolver queries the API again.
/// Returns `false` when nothing was cached.
pub fn forget_cached_parent(repo: &Repo) -> bool {
    let removed = repo.config_unset(PARENT_CACHE_KEY);
    if removed {
        tracing::debug!(root = %repo.root().display(), "fork cache cleared");
    }
    removed
}


#[cfg(test)]
mod tests {
    use super::testing::FakeForkApi;
    use super::*;
    use crate::domain::Config;
    use crate::git::fake::FakeGit;
    use std::path::PathBuf;

    fn fork_git() -> FakeGit {
        FakeGit::new()
            .ok("remote", "origin\nupstream\nother")
            .config("remote.origin.url", "git@github.com:jo/tool.git")
            .config("remote.other.url", "https://github.com/someone/tool.git")
            .config("remote.upstream.url", "https://github.com/acme/tool.git")
    }

    fn repo(git: Arc<FakeGit>, api: Arc<FakeForkApi>) -> Repo {
        Repo::from_parts(PathBuf::from("/repo"), Arc::new(Config::default()), git, api)
            .expect("repo")
    }

    #[test]
    fn caches_parent_after_lookup() {
        let git = Arc::new(fork_git());
        let api = Arc::new(FakeForkApi::parent("acme/tool"));

        let first = repo(git.clone(), api.clone());
        assert_eq!(first.fork_parent().as_deref(), Some("acme/tool"));
        assert_eq!(first.fork_parent_remote().as_deref(), Some("upstream"));
        assert_eq!(git.local(PARENT_CACHE_KEY).as_deref(), Some("acme/tool"));

        // A later run trusts the cache and never calls the API.
        let second = repo(git, api.clone());
        assert_eq!(second.fork_parent().as_deref(), Some("acme/tool"));
        assert_eq!(api.calls(), 1);
    }

    #[test]
    fn sentinel_short_circuits_even_when_api_would_fail() {
        let git = Arc::new(fork_git());
        let api = Arc::new(FakeForkApi::not_a_fork());
        assert_eq!(repo(git.clone(), api.clone()).fork_parent(), None);
        assert_eq!(git.local(PARENT_CACHE_KEY).as_deref(), Some(NOT_A_FORK));

        let failing = Arc::new(FakeForkApi::failing());
        assert_eq!(repo(git, failing.clone()).fork_parent(), None);
        assert_eq!(failing.calls(), 0);
    }

    #[test]
    fn failures_are_not_cached_but_memoized_per_handle() {
        let git = Arc::new(fork_git());
        let api = Arc::new(FakeForkApi::failing());
        let handle = repo(git.clone(), api.clone());
        assert_eq!(handle.fork_parent(), None);
        assert_eq!(handle.fork_parent_remote(), None);
        assert_eq!(api.calls(), 1);
        assert_eq!(git.local(PARENT_CACHE_KEY), None);
    }

    #[test]
    fn unparsable_origin_is_not_a_fork() {
        let git = Arc::new(
            FakeGit::new().ok("remote", "origin").config("remote.origin.url", "/srv/git/tool.git"),
        );
        let api = Arc::new(FakeForkApi::parent("acme/tool"));
        assert_eq!(repo(git, api.clone()).fork_parent(), None);
        assert_eq!(api.calls(), 0);
    }

    #[test]
    fn no_matching_remote_skips() {
        let git = Arc::new(
            FakeGit::new()
                .ok("remote", "origin")
                .config("remote.origin.url", "git@github.com:jo/tool.git")
                .config(PARENT_CACHE_KEY, "acme/tool"),
        );
        let api = Arc::new(FakeForkApi::failing());
        let handle = repo(git, api);
        assert_eq!(handle.fork_parent().as_deref(), Some("acme/tool"));
        assert_eq!(handle.fork_parent_remote(), None);
    }

    #[test]
    fn forgetting_the_cache_forces_a_new_lookup() {
        let git = Arc::new(fork_git().config(PARENT_CACHE_KEY, "old-owner/tool"));
        let api = Arc::new(FakeForkApi::parent("acme/tool"));

        let handle = repo(git.clone(), api.clone());
        assert!(forget_cached_parent(&handle));
        assert_eq!(handle.fork_parent().as_deref(), Some("acme/tool"));
        assert_eq!(api.calls(), 1);

        let uncached = repo(Arc::new(fork_git()), api);
        assert!(!forget_cached_parent(&uncached));
    }
}
