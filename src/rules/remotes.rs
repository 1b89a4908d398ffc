//! Remote topology for work repositories.
//!
//! Expected layout: origin is a personal fork, main tracks the fork-parent
//! remote, main can never be pushed, and `gh` resolves the fork parent as
//! the base repository. Checks that need the fork-parent remote are
//! skipped when it cannot be resolved.

use super::{fix_each, Rule};
use crate::domain::{CheckResult, Family, Topic};
use crate::git::url::work_org_of;
use crate::git::{GitError, Repo};

pub const NO_PUSH: &str = "no_push";
pub const GH_RESOLVED_BASE: &str = "base";

pub struct RemoteRule;

impl Rule for RemoteRule {
    fn family(&self) -> Family {
        Family::Remote
    }

    fn check(&self, repo: &Repo) -> Result<Vec<CheckResult>, GitError> {
        if !repo.is_work() {
            return Ok(Vec::new());
        }
        let remotes = repo.remotes()?;
        if remotes.len() < 2 {
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        let orgs = &repo.config().work_orgs;

        if let Some(origin_url) = repo.remote_url("origin") {
            results.push(match work_org_of(&origin_url, orgs) {
                Some(org) => CheckResult::fail(
                    Topic::RemoteOrigin,
                    format!("origin points to work org {org} (expected personal fork)"),
                ),
                None => CheckResult::ok(Topic::RemoteOrigin, "origin points to personal fork"),
            });
        }

        let upstream = repo.fork_parent_remote();

        if let Some(main) = repo.main_branch() {
            if let Some(upstream) = upstream.as_deref() {
                let tracked = repo.config_get(&format!("branch.{main}.remote")).unwrap_or_default();
                results.push(if tracked == upstream {
                    CheckResult::ok(Topic::RemoteTracking, format!("{main} tracks {upstream}"))
                } else {
                    CheckResult::fail(
                        Topic::RemoteTracking,
                        format!("{main} tracks {tracked:?}, should track {upstream:?}"),
                    )
                    .fixable()
                });
            }

            let push_remote =
                repo.config_get(&format!("branch.{main}.pushRemote")).unwrap_or_default();
            results.push(if push_remote == NO_PUSH {
                CheckResult::ok(Topic::RemotePushGuard, format!("{main} pushRemote is {NO_PUSH}"))
            } else {
                CheckResult::fail(
                    Topic::RemotePushGuard,
                    format!("{main} pushRemote is {push_remote:?}, should be {NO_PUSH}"),
                )
                .fixable()
            });
        }

        if let Some(upstream) = upstream {
            let resolved =
                repo.config_get(&format!("remote.{upstream}.gh-resolved")).unwrap_or_default();
            let result = if resolved == GH_RESOLVED_BASE {
                CheckResult::ok(
                    Topic::RemoteGhResolved,
                    format!("{upstream} gh-resolved is {GH_RESOLVED_BASE}"),
                )
            } else {
                CheckResult::fail(
                    Topic::RemoteGhResolved,
                    format!("{upstream} gh-resolved is {resolved:?}, should be {GH_RESOLVED_BASE}"),
                )
                .fixable()
            };
            results.push(result.with_entity(upstream));
        }

        Ok(results)
    }

    fn fix(&self, repo: &Repo, results: Vec<CheckResult>) -> Vec<CheckResult> {
        let main = repo.main_branch();
        fix_each(results, |r| match r.topic {
            Topic::RemoteTracking => {
                let main = main.as_deref()?;
                let upstream = repo.fork_parent_remote()?;
                let target = format!("--set-upstream-to={upstream}/{main}");
                // Without a fetched upstream/<main>, write the tracking config directly.
                let tracked = repo.git(&["branch", &target, main]).ok
                    || (repo.config_set(&format!("branch.{main}.remote"), &upstream)
                        && repo.config_set(
                            &format!("branch.{main}.merge"),
                            &format!("refs/heads/{main}"),
                        ));
                tracked.then(|| r.fixed(format!("set {main} to track {upstream}/{main}")))
            }
            Topic::RemotePushGuard => {
                let main = main.as_deref()?;
                repo.config_set(&format!("branch.{main}.pushRemote"), NO_PUSH)
                    .then(|| r.fixed(format!("set {main} pushRemote to {NO_PUSH}")))
            }
            Topic::RemoteGhResolved => {
                let remote = r.entity.as_deref()?;
                repo.config_set(&format!("remote.{remote}.gh-resolved"), GH_RESOLVED_BASE)
                    .then(|| r.fixed(format!("set {remote} gh-resolved to {GH_RESOLVED_BASE}")))
            }
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Status;
    use crate::fork::testing::FakeForkApi;
    use crate::fork::PARENT_CACHE_KEY;
    use crate::git::fake::FakeGit;
    use crate::rules::test_support::{config, repo_with};
    use std::sync::Arc;

    fn fork_layout() -> FakeGit {
        FakeGit::new()
            .ok("remote", "origin\nupstream")
            .config("remote.origin.url", "git@github.com:jo/tool.git")
            .config("remote.upstream.url", "git@github.com:acme/tool.git")
            .ok("rev-parse --verify --quiet refs/heads/main", "")
            .config("branch.main.remote", "origin")
    }

    #[test]
    fn reports_and_fixes_fork_topology() {
        let git = Arc::new(
            fork_layout().ok("branch --set-upstream-to=upstream/main main", ""),
        );
        let api = FakeForkApi::parent("acme/tool");
        let repo = repo_with(git.clone(), config(), api);

        let results = RemoteRule.check(&repo).expect("check");
        let names: Vec<String> = results.iter().map(|r| r.name()).collect();
        similar_asserts::assert_eq!(
            names,
            vec![
                "remote/origin",
                "remote/tracking",
                "remote/push-guard",
                "remote/gh-resolved[upstream]",
            ]
        );
        assert_eq!(results[0].status, Status::Ok);
        assert_eq!(results[1].message, "main tracks \"origin\", should track \"upstream\"");
        assert!(results[1..].iter().all(|r| r.status == Status::Fail && r.fixable));

        let fixed = RemoteRule.fix(&repo, results);
        assert!(fixed[1..].iter().all(|r| r.status == Status::Fix), "{fixed:?}");
        assert_eq!(git.local("branch.main.pushRemote").as_deref(), Some(NO_PUSH));
        assert_eq!(git.local("remote.upstream.gh-resolved").as_deref(), Some(GH_RESOLVED_BASE));
        assert_eq!(git.local(PARENT_CACHE_KEY).as_deref(), Some("acme/tool"));
    }

    #[test]
    fn tracking_fix_writes_config_when_upstream_is_not_fetched() {
        // `branch --set-upstream-to` is unscripted and fails, as it does
        // before the first fetch of the upstream remote.
        let git = Arc::new(fork_layout());
        let repo = repo_with(git.clone(), config(), FakeForkApi::parent("acme/tool"));

        let results = RemoteRule.check(&repo).expect("check");
        let fixed = RemoteRule.fix(&repo, results);
        assert_eq!(fixed[1].name(), "remote/tracking");
        assert_eq!(fixed[1].status, Status::Fix);
        assert_eq!(fixed[1].message, "set main to track upstream/main");
        assert_eq!(git.local("branch.main.remote").as_deref(), Some("upstream"));
        assert_eq!(git.local("branch.main.merge").as_deref(), Some("refs/heads/main"));

        let again = RemoteRule.check(&repo).expect("check");
        assert!(again.iter().all(|r| r.status == Status::Ok), "{again:?}");
    }

    #[test]
    fn origin_on_work_org_fails_without_fix() {
        let git = Arc::new(
            FakeGit::new()
                .ok("remote", "origin\nmine")
                .config("remote.origin.url", "https://github.com/acme/tool.git")
                .config("remote.mine.url", "https://github.com/jo/tool.git"),
        );
        let repo = repo_with(git, config(), FakeForkApi::failing());
        let results = RemoteRule.check(&repo).expect("check");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, Status::Fail);
        assert!(!results[0].fixable);
        assert!(results[0].message.contains("work org acme"));
    }

    #[test]
    fn unreachable_fork_api_skips_fork_checks() {
        let git = Arc::new(fork_layout().config("branch.main.pushRemote", NO_PUSH));
        let repo = repo_with(git.clone(), config(), FakeForkApi::failing());
        let results = RemoteRule.check(&repo).expect("check");
        let names: Vec<String> = results.iter().map(|r| r.name()).collect();
        similar_asserts::assert_eq!(names, vec!["remote/origin", "remote/push-guard"]);
        assert!(results.iter().all(|r| r.status == Status::Ok));
        assert_eq!(git.local(PARENT_CACHE_KEY), None);
    }

    #[test]
    fn personal_or_single_remote_repo_does_not_apply() {
        let git = Arc::new(
            FakeGit::new()
                .ok("remote", "origin")
                .config("remote.origin.url", "git@github.com:acme/tool.git"),
        );
        let repo = repo_with(git, config(), FakeForkApi::parent("acme/tool"));
        assert!(repo.is_work());
        assert!(RemoteRule.check(&repo).expect("check").is_empty());
    }
}
