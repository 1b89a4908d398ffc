//! Submodule health.
//!
//! Queries for an initialized submodule run inside the submodule's own work
//! tree. An uninitialized submodule has no `.git`, so git would resolve the
//! parent repository instead; those are reported once and skipped.

use super::Rule;
use crate::domain::{CheckResult, Family, Topic};
use crate::git::{GitError, Repo};
use std::path::Path;

pub struct SubmoduleRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubmoduleState {
    InSync,
    Uninitialized,
    OutOfSync,
    Conflict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Submodule {
    path: String,
    state: SubmoduleState,
}

/// Parse `git submodule status`: `<prefix><sha> <path> [(<describe>)]`.
fn parse_status(output: &str) -> Vec<Submodule> {
    output
        .lines()
        .filter_map(|line| {
            let mut chars = line.chars();
            let state = match chars.next()? {
                '-' => SubmoduleState::Uninitialized,
                '+' => SubmoduleState::OutOfSync,
                'U' => SubmoduleState::Conflict,
                _ => SubmoduleState::InSync,
            };
            let path = chars.as_str().split_whitespace().nth(1)?;
            Some(Submodule { path: path.to_string(), state })
        })
        .collect()
}

impl SubmoduleRule {
    fn inspect(&self, repo: &Repo, sub: &Submodule) -> Vec<CheckResult> {
        let path = sub.path.as_str();
        let mut results = Vec::new();
        match sub.state {
            SubmoduleState::Uninitialized => {
                return vec![CheckResult::warn(Topic::SubmoduleInit, "submodule not initialized")
                    .with_entity(path)
                    .fixable()];
            }
            SubmoduleState::OutOfSync => results.push(
                CheckResult::warn(Topic::SubmoduleSync, "checked-out commit differs from parent")
                    .with_entity(path),
            ),
            SubmoduleState::Conflict => results.push(
                CheckResult::warn(Topic::SubmoduleConflict, "merge conflict on submodule commit")
                    .with_entity(path),
            ),
            SubmoduleState::InSync => {}
        }

        let dir = repo.root().join(path);
        if !dir.join(".git").exists() {
            tracing::debug!(path, "submodule has no .git, skipping work tree checks");
            return results;
        }
        results.extend(work_tree(repo, &dir, path));
        results
    }
}

fn work_tree(repo: &Repo, dir: &Path, path: &str) -> Vec<CheckResult> {
    let mut results = Vec::new();
    match repo.work_tree_status(dir) {
        Ok(status) => {
            if !status.uncommitted.is_empty() {
                results.push(
                    CheckResult::warn(
                        Topic::SubmoduleUncommitted,
                        format!("{} uncommitted changes", status.uncommitted.len()),
                    )
                    .with_entity(path)
                    .with_details(status.uncommitted),
                );
            }
            if !status.untracked.is_empty() {
                results.push(
                    CheckResult::warn(
                        Topic::SubmoduleUntracked,
                        format!("{} untracked files", status.untracked.len()),
                    )
                    .with_entity(path)
                    .with_details(status.untracked),
                );
            }
        }
        Err(e) => {
            tracing::warn!(path, "submodule status failed: {}", e);
            results.push(
                CheckResult::warn(Topic::SubmoduleStatus, format!("cannot read work tree: {e}"))
                    .with_entity(path),
            );
        }
    }

    // Fails without an upstream, which is not a violation.
    let unpushed = repo.git_in(dir, &["log", "@{upstream}..HEAD", "--oneline"]);
    let commits: Vec<String> = unpushed.lines().map(str::to_string).collect();
    if unpushed.ok && !commits.is_empty() {
        results.push(
            CheckResult::warn(Topic::SubmoduleUnpushed, format!("{} unpushed commits", commits.len()))
                .with_entity(path)
                .with_details(commits),
        );
    }
    results
}

impl Rule for SubmoduleRule {
    fn family(&self) -> Family {
        Family::Submodule
    }

    fn check(&self, repo: &Repo) -> Result<Vec<CheckResult>, GitError> {
        if !repo.root().join(".gitmodules").exists() {
            return Ok(Vec::new());
        }
        let args = ["submodule", "status"];
        let out = repo.git(&args);
        if !out.ok {
            return Ok(vec![CheckResult::warn(
                Topic::SubmoduleStatus,
                format!("cannot read submodule status: {}", GitError::command(&args, &out)),
            )]);
        }
        Ok(parse_status(&out.stdout).iter().flat_map(|sub| self.inspect(repo, sub)).collect())
    }

    fn fix(&self, repo: &Repo, results: Vec<CheckResult>) -> Vec<CheckResult> {
        let paths: Vec<String> = results
            .iter()
            .filter(|r| r.topic == Topic::SubmoduleInit && r.wants_fix())
            .filter_map(|r| r.entity.clone())
            .collect();
        if paths.is_empty() {
            return results;
        }

        let mut args = vec!["submodule", "update", "--init", "--recursive", "--"];
        args.extend(paths.iter().map(String::as_str));
        let out = repo.git(&args);
        if !out.ok {
            tracing::warn!("submodule init failed: {}", out.stderr);
            return results;
        }
        tracing::info!("initialized {} submodule(s)", paths.len());

        results
            .into_iter()
            .map(|r| match r.entity.as_deref() {
                Some(path) if r.topic == Topic::SubmoduleInit && r.wants_fix() => {
                    r.fixed(format!("initialized {path}"))
                }
                _ => r,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Status;
    use crate::git::fake::FakeGit;
    use crate::rules::test_support::repo_at;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    const STATUS: &str = "-1111111aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa vendor/a\n\
                          -2222222bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb vendor/b\n\
                          +3333333ccccccccccccccccccccccccccccccccc lib/c (v1.2-3-g3333333)\n \
                          4444444ddddddddddddddddddddddddddddddddd lib/d (v2.0)";

    fn workspace() -> TempDir {
        let tmp = TempDir::new().expect("tmp");
        fs::write(tmp.path().join(".gitmodules"), "").expect("write");
        fs::create_dir_all(tmp.path().join("lib/c/.git")).expect("mkdir");
        fs::create_dir_all(tmp.path().join("lib/d")).expect("mkdir");
        fs::write(tmp.path().join("lib/d/.git"), "gitdir: ../../.git/modules/lib/d").expect("write");
        tmp
    }

    #[test]
    fn parses_prefixes_and_describe_suffix() {
        let subs = parse_status(STATUS);
        assert_eq!(subs.len(), 4);
        assert_eq!(subs[0].state, SubmoduleState::Uninitialized);
        assert_eq!(subs[2], Submodule { path: "lib/c".to_string(), state: SubmoduleState::OutOfSync });
        assert_eq!(subs[3].state, SubmoduleState::InSync);
        assert_eq!(parse_status("U0000000 vendor/x")[0].state, SubmoduleState::Conflict);
    }

    #[test]
    fn checks_each_submodule_in_its_own_work_tree() {
        let tmp = workspace();
        let root = tmp.path();
        let git = Arc::new(
            FakeGit::new()
                .ok("remote", "")
                .ok("submodule status", STATUS)
                .ok_in(&root.join("lib/c"), "status --porcelain", "")
                .ok_in(&root.join("lib/d"), "status --porcelain", " M api.rs\n?? scratch")
                .ok_in(&root.join("lib/d"), "log @{upstream}..HEAD --oneline", "abc1234 wip"),
        );
        let repo = repo_at(root, git.clone());

        let results = SubmoduleRule.check(&repo).expect("check");
        let names: Vec<String> = results.iter().map(|r| r.name()).collect();
        similar_asserts::assert_eq!(
            names,
            vec![
                "submodule/init[vendor/a]",
                "submodule/init[vendor/b]",
                "submodule/sync[lib/c]",
                "submodule/uncommitted[lib/d]",
                "submodule/untracked[lib/d]",
                "submodule/unpushed[lib/d]",
            ]
        );
        assert_eq!(results[4].details, vec!["scratch"]);
        assert!(git.calls_in(&root.join("vendor/a")).is_empty());
    }

    #[test]
    fn fix_initializes_all_paths_in_one_call() {
        let tmp = workspace();
        let git = Arc::new(
            FakeGit::new()
                .ok("remote", "")
                .ok("submodule status", STATUS)
                .ok("submodule update --init --recursive -- vendor/a vendor/b", ""),
        );
        let repo = repo_at(tmp.path(), git.clone());

        let results = SubmoduleRule.check(&repo).expect("check");
        let fixed = SubmoduleRule.fix(&repo, results);
        assert_eq!(fixed[0].status, Status::Fix);
        assert_eq!(fixed[1].message, "initialized vendor/b");
        assert_eq!(fixed[2].status, Status::Warn);
        assert_eq!(git.calls().iter().filter(|c| c.starts_with("submodule update")).count(), 1);
    }

    #[test]
    fn failed_init_leaves_entries_unchanged() {
        let tmp = workspace();
        let git = Arc::new(
            FakeGit::new()
                .ok("remote", "")
                .ok("submodule status", STATUS)
                .fail("submodule update --init --recursive -- vendor/a vendor/b"),
        );
        let repo = repo_at(tmp.path(), git.clone());

        let results = SubmoduleRule.check(&repo).expect("check");
        let fixed = SubmoduleRule.fix(&repo, results.clone());
        similar_asserts::assert_eq!(fixed, results);
        assert!(fixed[..2].iter().all(|r| r.status == Status::Warn && r.fixable));
        assert_eq!(git.count("submodule update --init --recursive -- vendor/a vendor/b"), 1);
    }

    #[test]
    fn unreadable_submodule_work_tree_is_degraded_not_clean() {
        let tmp = workspace();
        let root = tmp.path();
        let git = Arc::new(
            FakeGit::new()
                .ok("remote", "")
                .ok("submodule status", " 4444444ddddddddddddddddddddddddddddddddd lib/d (v2.0)"),
        );
        // `status --porcelain` in lib/d is unscripted and fails.
        let results = SubmoduleRule.check(&repo_at(root, git)).expect("check");
        assert_eq!(results.len(), 1, "{results:?}");
        assert_eq!(results[0].name(), "submodule/status[lib/d]");
        assert_eq!(results[0].status, Status::Warn);
        assert!(results[0].message.starts_with("cannot read work tree: git status --porcelain failed"));
    }

    #[test]
    fn unreadable_status_is_a_local_warning() {
        let tmp = workspace();
        let git = Arc::new(FakeGit::new().ok("remote", "").fail("submodule status"));
        let results = SubmoduleRule.check(&repo_at(tmp.path(), git)).expect("check");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].topic, Topic::SubmoduleStatus);
        assert!(results[0].message.starts_with("cannot read submodule status"));
    }

    #[test]
    fn no_gitmodules_does_not_apply() {
        let tmp = TempDir::new().expect("tmp");
        let git = Arc::new(FakeGit::new().ok("remote", ""));
        assert!(SubmoduleRule.check(&repo_at(tmp.path(), git)).expect("check").is_empty());
    }
}
