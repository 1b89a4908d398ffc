//! Stash and working tree staleness. Warn-only.
//!
//! The age of uncommitted or untracked changes is approximated by the time
//! since the last commit; git records no timestamp for when a tree became
//! dirty.

use super::Rule;
use crate::domain::{CheckResult, Family, MaxAge, Topic};
use crate::git::{GitError, Repo};
use crate::utils::format_age;
use chrono::{DateTime, Utc};

const STASH_FORMAT: &str = "--format=%gd%x00%cI%x00%s";

pub struct StalenessRule;

#[derive(Debug, Clone, PartialEq, Eq)]
struct StashEntry {
    reference: String,
    committed: DateTime<Utc>,
    subject: String,
}

impl StashEntry {
    fn describe(&self, now: DateTime<Utc>) -> String {
        format!("{} {} ({} ago)", self.reference, self.subject, format_age(now - self.committed))
    }
}

pub(crate) fn parse_timestamp(what: &'static str, raw: &str) -> Result<DateTime<Utc>, GitError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| GitError::Parse { what, line: raw.to_string() })
}

fn parse_stash_list(output: &str) -> Result<Vec<StashEntry>, GitError> {
    output
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| {
            let mut fields = line.splitn(3, '\0');
            let (Some(reference), Some(date)) = (fields.next(), fields.next()) else {
                return Err(GitError::Parse { what: "stash entry", line: line.to_string() });
            };
            Ok(StashEntry {
                reference: reference.to_string(),
                committed: parse_timestamp("stash date", date)?,
                subject: fields.next().unwrap_or_default().to_string(),
            })
        })
        .collect()
}

impl StalenessRule {
    fn stash(&self, repo: &Repo) -> Result<Vec<CheckResult>, GitError> {
        let thresholds = &repo.config().thresholds;
        let entries = parse_stash_list(&repo.read(&["stash", "list", STASH_FORMAT])?)?;
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        let now = repo.now();
        let mut results = Vec::new();

        let max_age = thresholds.stash_max_age;
        if max_age.is_enabled() {
            let old: Vec<String> = entries
                .iter()
                .filter(|e| max_age.exceeded_by(now - e.committed))
                .map(|e| e.describe(now))
                .collect();
            results.push(if old.is_empty() {
                CheckResult::ok(Topic::StashAge, "no stale stash entries")
            } else {
                CheckResult::warn(
                    Topic::StashAge,
                    format!("{} stash entries older than {max_age}", old.len()),
                )
                .with_details(old)
            });
        }

        let max_count = thresholds.stash_max_count;
        if max_count > 0 {
            results.push(if entries.len() > max_count {
                CheckResult::warn(
                    Topic::StashCount,
                    format!("{} entries (max {max_count})", entries.len()),
                )
                .with_details(entries.iter().map(|e| e.describe(now)).collect())
            } else {
                CheckResult::ok(Topic::StashCount, format!("{} entries", entries.len()))
            });
        }

        Ok(results)
    }

    fn work_tree(&self, repo: &Repo) -> Result<Vec<CheckResult>, GitError> {
        let max_age = repo.config().thresholds.uncommitted_max_age;
        if !max_age.is_enabled() {
            return Ok(Vec::new());
        }
        let status = repo.work_tree_status(repo.root())?;
        if status.is_clean() {
            return Ok(vec![CheckResult::ok(Topic::Uncommitted, "working tree clean")]);
        }

        // An unborn branch has no commit to measure from.
        let last_commit = repo.git(&["log", "-1", "--format=%cI"]);
        let age = if last_commit.ok && !last_commit.stdout.is_empty() {
            repo.now() - parse_timestamp("commit date", &last_commit.stdout)?
        } else {
            chrono::Duration::zero()
        };

        let mut results = Vec::new();
        if !status.uncommitted.is_empty() {
            results.push(aged(
                Topic::Uncommitted,
                "uncommitted changes",
                status.uncommitted,
                age,
                max_age,
            ));
        }
        if !status.untracked.is_empty() {
            results.push(aged(Topic::Untracked, "untracked files", status.untracked, age, max_age));
        }
        Ok(results)
    }
}

fn aged(
    topic: Topic,
    what: &str,
    entries: Vec<String>,
    age: chrono::Duration,
    max_age: MaxAge,
) -> CheckResult {
    if max_age.exceeded_by(age) {
        CheckResult::warn(
            topic,
            format!("{} {what} for {} (max {max_age})", entries.len(), format_age(age)),
        )
        .with_details(entries)
    } else {
        CheckResult::ok(topic, format!("{} {what}, recent", entries.len()))
    }
}

impl Rule for StalenessRule {
    fn family(&self) -> Family {
        Family::Staleness
    }

    fn check(&self, repo: &Repo) -> Result<Vec<CheckResult>, GitError> {
        let mut results = self.stash(repo)?;
        results.extend(self.work_tree(repo)?);
        Ok(results)
    }
}
