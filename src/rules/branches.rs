//! Local branch cleanup.
//!
//! Each branch other than main is classified by the first matching
//! criterion, in order: upstream gone, merged into main, pull request
//! checkout that was merged or has moved on, orphan (no upstream and last
//! commit by someone else). The checked-out branch is reported but never
//! deleted.

use super::{fix_each, Rule};
use crate::domain::{CheckResult, Family, Topic};
use crate::git::{Branch, GitError, Repo, Upstream};
use std::collections::HashSet;

pub struct BranchCleanupRule;

/// Branch created from a pull request head ref.
pub(crate) fn is_pr_checkout(branch: &Branch) -> bool {
    branch.pull_request().is_some()
}

/// Untracked branch whose last commit was made by someone other than `me`.
pub(crate) fn is_orphan(branch: &Branch, me: &str) -> bool {
    branch.upstream == Upstream::None && !me.is_empty() && branch.author != me
}

struct Classifier<'a> {
    repo: &'a Repo,
    main: Option<String>,
    merged: HashSet<String>,
    me: &'a str,
}

impl Classifier<'_> {
    fn classify(&self, branch: &Branch) -> Option<CheckResult> {
        let by = format!("{} by {}", branch.short_id, branch.author);

        if branch.upstream == Upstream::Gone {
            return Some(CheckResult::warn(Topic::BranchGone, format!("upstream deleted ({by})")));
        }
        if let Some(main) = self.main.as_deref() {
            if self.merged.contains(&branch.name) {
                return Some(CheckResult::warn(
                    Topic::BranchMerged,
                    format!("merged into {main} ({by})"),
                ));
            }
        }
        if let Some(number) = branch.pull_request() {
            return self.pull_request(branch, number, &by);
        }
        if is_orphan(branch, self.me) {
            return Some(CheckResult::warn(
                Topic::BranchOrphan,
                format!("no upstream, last commit by {} ({})", branch.author, branch.short_id),
            ));
        }
        None
    }

    fn pull_request(&self, branch: &Branch, number: u64, by: &str) -> Option<CheckResult> {
        // Local main catches merges the remote-tracking check above missed.
        if let Some(main) = self.main.as_deref() {
            let tip = format!("refs/heads/{}", branch.name);
            let main_ref = format!("refs/heads/{main}");
            if self.repo.git(&["merge-base", "--is-ancestor", &tip, &main_ref]).ok {
                return Some(CheckResult::warn(
                    Topic::BranchPr,
                    format!("PR #{number} merged ({by})"),
                ));
            }
        }

        let remote = branch.remote.as_deref().unwrap_or("origin");
        let merge_ref = branch.merge_ref.as_deref()?;
        let head = self.repo.ls_remote(remote, merge_ref)?;
        if head.starts_with(&branch.short_id) {
            return None;
        }
        Some(CheckResult::warn(Topic::BranchPr, format!("PR #{number} updated since checkout ({by})")))
    }
}

impl Rule for BranchCleanupRule {
    fn family(&self) -> Family {
        Family::Branch
    }

    fn check(&self, repo: &Repo) -> Result<Vec<CheckResult>, GitError> {
        let branches = repo.branches()?;
        let main = repo.main_branch();
        let current = repo.current_branch();
        let classifier = Classifier {
            repo,
            merged: main.as_deref().map(|m| repo.merged_into(m)).unwrap_or_default(),
            main,
            me: repo.config().identity.name.as_str(),
        };

        let mut results = Vec::new();
        for branch in &branches {
            if classifier.main.as_deref() == Some(branch.name.as_str()) {
                continue;
            }
            let Some(result) = classifier.classify(branch) else {
                continue;
            };
            let result = result.with_entity(&branch.name);
            if current.as_deref() == Some(branch.name.as_str()) {
                let message = format!("{}; checked out, switch branches to delete", result.message);
                results.push(CheckResult { message, ..result });
            } else {
                results.push(result.fixable());
            }
        }

        if results.is_empty() {
            results.push(CheckResult::ok(Topic::BranchCleanup, "no stale branches"));
        }
        Ok(results)
    }

    fn fix(&self, repo: &Repo, results: Vec<CheckResult>) -> Vec<CheckResult> {
        let current = repo.current_branch();
        fix_each(results, |r| {
            let name = r.entity.as_deref()?;
            if current.as_deref() == Some(name) {
                return None;
            }
            let out = repo.git(&["branch", "-D", name]);
            if !out.ok {
                tracing::debug!(branch = name, "branch -D failed: {}", out.stderr);
                return None;
            }
            Some(r.fixed(format!("deleted {name}")))
        })
    }
}
