//! Remote transport (SSH vs HTTPS).

use super::Rule;
use crate::domain::{CheckResult, Family, Topic};
use crate::git::url::transport_of;
use crate::git::{GitError, Repo};

pub struct ProtocolRule;

impl Rule for ProtocolRule {
    fn family(&self) -> Family {
        Family::Remote
    }

    fn check(&self, repo: &Repo) -> Result<Vec<CheckResult>, GitError> {
        let Some(want) = repo.config().protocol else {
            return Ok(Vec::new());
        };
        let remotes = repo.remotes()?;
        if remotes.is_empty() {
            return Ok(Vec::new());
        }

        let mut details = Vec::new();
        for name in &remotes {
            let Some(url) = repo.remote_url(name) else {
                continue;
            };
            if transport_of(&url).map(|t| t.as_str()) != Some(want.as_str()) {
                details.push(format!("{name:<12} {url}"));
            }
        }

        if details.is_empty() {
            return Ok(vec![CheckResult::ok(Topic::RemoteProtocol, format!("all remotes use {want}"))]);
        }
        let noun = if details.len() == 1 { "remote" } else { "remotes" };
        Ok(vec![CheckResult::warn(
            Topic::RemoteProtocol,
            format!("{} {noun} not using {want}", details.len()),
        )
        .with_details(details)])
    }
}
