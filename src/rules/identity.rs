//! Commit identity: `user.name` and `user.email`.
//!
//! Work repositories need a local override with the work email. Personal
//! repositories accept either configured email from any config source.

use super::{fix_each, Rule};
use crate::domain::{CheckResult, Family, Topic};
use crate::git::{GitError, Repo};

pub struct IdentityRule;

impl IdentityRule {
    fn lookup(repo: &Repo, key: &str) -> String {
        let value =
            if repo.is_work() { repo.config_get(key) } else { repo.config_effective(key) };
        value.unwrap_or_default()
    }

    fn wanted_email(repo: &Repo) -> &str {
        let identity = &repo.config().identity;
        if repo.is_work() || identity.personal_email.is_empty() {
            &identity.work_email
        } else {
            &identity.personal_email
        }
    }
}

impl Rule for IdentityRule {
    fn family(&self) -> Family {
        Family::Identity
    }

    fn check(&self, repo: &Repo) -> Result<Vec<CheckResult>, GitError> {
        let identity = &repo.config().identity;
        let mut results = Vec::new();

        if !identity.name.is_empty() {
            let name = Self::lookup(repo, "user.name");
            if name == identity.name {
                results.push(CheckResult::ok(Topic::IdentityName, name));
            } else {
                results.push(
                    CheckResult::fail(
                        Topic::IdentityName,
                        format!("got {:?}, want {:?}", name, identity.name),
                    )
                    .fixable(),
                );
            }
        }

        let work = identity.work_email.as_str();
        let personal = identity.personal_email.as_str();
        if work.is_empty() && personal.is_empty() {
            return Ok(results);
        }

        let email = Self::lookup(repo, "user.email");
        let accepted = |candidate: &str| !candidate.is_empty() && candidate == email;
        let result = if repo.is_work() {
            if accepted(work) {
                CheckResult::ok(Topic::IdentityEmail, email)
            } else {
                CheckResult::fail(Topic::IdentityEmail, format!("got {email:?}, want {work:?}"))
                    .fixable()
            }
        } else if accepted(work) || accepted(personal) {
            CheckResult::ok(Topic::IdentityEmail, email)
        } else {
            CheckResult::fail(
                Topic::IdentityEmail,
                format!("got {email:?}, want {work:?} or {personal:?}"),
            )
            .fixable()
        };
        results.push(result);

        Ok(results)
    }

    fn fix(&self, repo: &Repo, results: Vec<CheckResult>) -> Vec<CheckResult> {
        fix_each(results, |r| {
            let (key, value) = match r.topic {
                Topic::IdentityName => ("user.name", repo.config().identity.name.as_str()),
                Topic::IdentityEmail => ("user.email", Self::wanted_email(repo)),
                _ => return None,
            };
            if value.is_empty() || !repo.config_set(key, value) {
                return None;
            }
            Some(r.fixed(format!("set to {value}")))
        })
    }
}
