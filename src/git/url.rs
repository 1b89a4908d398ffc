//! Structural parsing of remote URLs.

use once_cell::sync::Lazy;
use regex::Regex;

pub const GITHUB_HOST: &str = "github.com";

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<scheme>https?|ssh|git)://(?:[^@/]+@)?(?P<host>[^/:]+)(?::\d+)?/(?P<path>.+)$")
        .expect("valid regex")
});

// SCP-like syntax: [user@]host:path
static SCP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[^@/:]+@)?(?P<host>[^/:]+):(?P<path>[^/].*)$").expect("valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Ssh,
    Https,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Ssh => "ssh",
            Transport::Https => "https",
        }
    }
}

/// Transport implied by a remote URL; `None` for local paths and `git://`.
pub fn transport_of(url: &str) -> Option<Transport> {
    if url.starts_with("https://") {
        return Some(Transport::Https);
    }
    if url.starts_with("ssh://") || (!url.contains("://") && url.contains('@')) {
        return Some(Transport::Ssh);
    }
    None
}

/// A hosted repository address extracted from a remote URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUrl {
    pub host: String,
    pub owner: String,
    pub repo: String,
}

impl RemoteUrl {
    /// Parse HTTPS, `ssh://` and SCP-like forms. Returns `None` when the URL
    /// has no `owner/repo` path (local paths, bare hosts).
    pub fn parse(url: &str) -> Option<Self> {
        let url = url.trim();
        let (host, path) = if let Some(caps) = URL_RE.captures(url) {
            (caps.name("host")?.as_str(), caps.name("path")?.as_str())
        } else if url.contains("://") {
            return None;
        } else {
            let caps = SCP_RE.captures(url)?;
            (caps.name("host")?.as_str(), caps.name("path")?.as_str())
        };

        let mut parts = path.trim_end_matches('/').splitn(3, '/');
        let owner = parts.next().filter(|s| !s.is_empty())?;
        let repo = parts.next().map(|r| r.trim_end_matches(".git")).filter(|s| !s.is_empty())?;

        Some(Self {
            host: host.to_ascii_lowercase(),
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    /// Parse and keep only GitHub addresses.
    pub fn github(url: &str) -> Option<Self> {
        Self::parse(url).filter(|u| u.host == GITHUB_HOST)
    }

    /// `owner/repo`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    pub fn same_repo(&self, full_name: &str) -> bool {
        self.full_name().eq_ignore_ascii_case(full_name)
    }
}

/// The first configured organization that owns the GitHub repository at `url`.
pub fn work_org_of<'a>(url: &str, orgs: &'a [String]) -> Option<&'a str> {
    let parsed = RemoteUrl::github(url)?;
    orgs.iter().find(|org| org.eq_ignore_ascii_case(&parsed.owner)).map(String::as_str)
}
