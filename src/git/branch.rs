//! Local branch listing.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// `for-each-ref` format: name, short id, author, tracking status, NUL-separated.
pub const BRANCH_FORMAT: &str =
    "--format=%(refname:short)%00%(objectname:short)%00%(authorname)%00%(upstream:track)";

/// Config query returning every branch's `remote` and `merge` keys.
pub const BRANCH_CONFIG_PATTERN: &str = r"^branch\..*\.(remote|merge)$";

static PULL_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^refs/pull/(\d+)/head$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    /// No `branch.<name>.merge` configured.
    None,
    Tracking,
    /// Configured, but the remote branch no longer exists.
    Gone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    pub short_id: String,
    pub author: String,
    pub upstream: Upstream,
    /// `branch.<name>.merge`, e.g. `refs/heads/main` or `refs/pull/42/head`.
    pub merge_ref: Option<String>,
    /// `branch.<name>.remote`, a remote name or URL.
    pub remote: Option<String>,
}

impl Branch {
    /// Pull request number when the branch was checked out from `refs/pull/<n>/head`.
    pub fn pull_request(&self) -> Option<u64> {
        let merge = self.merge_ref.as_deref()?;
        PULL_REF_RE.captures(merge)?.get(1)?.as_str().parse().ok()
    }
}

/// Combine `for-each-ref` output with the branch config listing.
pub fn parse_branches(refs: &str, config: &str) -> Vec<Branch> {
    let mut merge: HashMap<&str, &str> = HashMap::new();
    let mut remote: HashMap<&str, &str> = HashMap::new();
    for line in config.lines() {
        let Some((key, value)) = line.split_once(' ') else {
            continue;
        };
        let Some(rest) = key.strip_prefix("branch.") else {
            continue;
        };
        match rest.rsplit_once('.') {
            Some((name, "merge")) => {
                merge.insert(name, value);
            }
            Some((name, "remote")) => {
                remote.insert(name, value);
            }
            _ => {}
        }
    }

    refs.lines()
        .filter_map(|line| {
            let mut fields = line.splitn(4, '\0');
            let name = fields.next().filter(|n| !n.is_empty())?;
            let short_id = fields.next()?;
            let author = fields.next()?;
            let track = fields.next()?;

            let merge_ref = merge.get(name).map(|s| s.to_string());
            let upstream = if track.contains("gone") {
                Upstream::Gone
            } else if merge_ref.is_some() {
                Upstream::Tracking
            } else {
                Upstream::None
            };

            Some(Branch {
                name: name.to_string(),
                short_id: short_id.to_string(),
                author: author.to_string(),
                upstream,
                merge_ref,
                remote: remote.get(name).map(|s| s.to_string()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_tracking_state() {
        let refs = "main\0abc1234\0Jo Dev\0\n\
                    gone-one\0def5678\0Jo Dev\0[gone]\n\
                    local-only\0aaa1111\0Sam Other\0\n\
                    pr-42\0bbb2222\0Sam Other\0";
        let config = "branch.main.remote origin\n\
                      branch.main.merge refs/heads/main\n\
                      branch.gone-one.remote origin\n\
                      branch.gone-one.merge refs/heads/gone-one\n\
                      branch.pr-42.remote https://github.com/acme/tool.git\n\
                      branch.pr-42.merge refs/pull/42/head";
        let branches = parse_branches(refs, config);
        assert_eq!(branches.len(), 4);
        assert_eq!(branches[0].upstream, Upstream::Tracking);
        assert_eq!(branches[1].upstream, Upstream::Gone);
        assert_eq!(branches[2].upstream, Upstream::None);
        assert_eq!(branches[2].author, "Sam Other");
        assert_eq!(branches[3].pull_request(), Some(42));
        assert_eq!(branches[3].remote.as_deref(), Some("https://github.com/acme/tool.git"));
        assert_eq!(branches[0].pull_request(), None);
    }

    #[test]
    fn handles_dotted_branch_names() {
        let refs = "release.v1\0ccc3333\0Jo Dev\0";
        let config = "branch.release.v1.merge refs/heads/release.v1";
        let branches = parse_branches(refs, config);
        assert_eq!(branches[0].merge_ref.as_deref(), Some("refs/heads/release.v1"));
    }

    #[test]
    fn skips_malformed_lines() {
        assert!(parse_branches("garbage-without-separators", "").is_empty());
    }
}
