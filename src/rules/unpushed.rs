//! Local commits that have not reached any remote.

use super::branches::{is_orphan, is_pr_checkout};
use super::staleness::parse_timestamp;
use super::Rule;
use crate::domain::{CheckResult, Family, Topic};
use crate::git::{Branch, GitError, Repo};
use crate::utils::format_age;

const COMMIT_FORMAT: &str = "--format=%h%x00%cI%x00%s";

pub struct UnpushedRule;

impl UnpushedRule {
    /// Commits on `branch` missing from its upstream, or from every remote
    /// when it has none.
    fn unpushed_log(repo: &Repo, branch: &Branch) -> Result<String, GitError> {
        let tip = format!("refs/heads/{}", branch.name);
        let upstream = format!("{}@{{upstream}}", branch.name);
        let out = repo.git(&["log", COMMIT_FORMAT, &tip, "--not", &upstream]);
        if out.ok {
            return Ok(out.stdout);
        }
        repo.read(&["log", COMMIT_FORMAT, &tip, "--not", "--remotes"])
    }
}

impl Rule for UnpushedRule {
    fn family(&self) -> Family {
        Family::Staleness
    }

    fn check(&self, repo: &Repo) -> Result<Vec<CheckResult>, GitError> {
        let max_age = repo.config().thresholds.unpushed_max_age;
        if !max_age.is_enabled() || repo.remotes()?.is_empty() {
            return Ok(Vec::new());
        }
        let now = repo.now();
        let author = repo.config().identity.name.as_str();

        let mut results = Vec::new();
        for branch in repo.branches()? {
            // Reported by branch cleanup instead.
            if is_pr_checkout(&branch) || is_orphan(&branch, author) {
                continue;
            }

            let log = Self::unpushed_log(repo, &branch)?;
            let mut total = 0;
            let mut old = Vec::new();
            for line in log.lines().filter(|l| !l.is_empty()) {
                let mut fields = line.splitn(3, '\0');
                let (Some(hash), Some(date)) = (fields.next(), fields.next()) else {
                    return Err(GitError::Parse { what: "commit", line: line.to_string() });
                };
                total += 1;
                let age = now - parse_timestamp("commit date", date)?;
                if max_age.exceeded_by(age) {
                    let subject = fields.next().unwrap_or_default();
                    old.push(format!("{hash} {subject} ({} ago)", format_age(age)));
                }
            }

            if !old.is_empty() {
                results.push(
                    CheckResult::warn(
                        Topic::Unpushed,
                        format!("{}/{total} commits older than {max_age}", old.len()),
                    )
                    .with_entity(&branch.name)
                    .with_details(old),
                );
            }
        }

        if results.is_empty() {
            results.push(CheckResult::ok(Topic::Unpushed, "no stale unpushed commits"));
        }
        Ok(results)
    }
}
