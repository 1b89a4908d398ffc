//! Check results and the status model threaded through checking, fixing and reporting.

use serde::{Serialize, Serializer};
use std::fmt;

/// Outcome of a single check.
///
/// `Fail` means a remediation exists and is recommended; `Warn` means the
/// violation is informational or cannot be fixed automatically (with the
/// exception of branch cleanup, which reports fixable warnings).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Warn,
    Fail,
    Fix,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Warn => "warn",
            Status::Fail => "fail",
            Status::Fix => "fix",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule family, the part of a result identity before the slash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Identity,
    Remote,
    Staleness,
    Branch,
    Submodule,
}

impl Family {
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Identity => "identity",
            Family::Remote => "remote",
            Family::Staleness => "staleness",
            Family::Branch => "branch",
            Family::Submodule => "submodule",
        }
    }
}

/// What a result is about. Together with an optional entity (branch name,
/// remote name, submodule path) it identifies a result uniquely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    IdentityName,
    IdentityEmail,
    RemoteProtocol,
    RemoteOrigin,
    RemoteTracking,
    RemotePushGuard,
    RemoteGhResolved,
    StashAge,
    StashCount,
    Uncommitted,
    Untracked,
    Unpushed,
    BranchGone,
    BranchMerged,
    BranchPr,
    BranchOrphan,
    BranchCleanup,
    SubmoduleStatus,
    SubmoduleInit,
    SubmoduleSync,
    SubmoduleConflict,
    SubmoduleUncommitted,
    SubmoduleUntracked,
    SubmoduleUnpushed,
    /// A rule could not read the state it needed and reports this instead.
    Degraded(Family),
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::IdentityName => "identity/name",
            Topic::IdentityEmail => "identity/email",
            Topic::RemoteProtocol => "remote/protocol",
            Topic::RemoteOrigin => "remote/origin",
            Topic::RemoteTracking => "remote/tracking",
            Topic::RemotePushGuard => "remote/push-guard",
            Topic::RemoteGhResolved => "remote/gh-resolved",
            Topic::StashAge => "staleness/stash-age",
            Topic::StashCount => "staleness/stash-count",
            Topic::Uncommitted => "staleness/uncommitted",
            Topic::Untracked => "staleness/untracked",
            Topic::Unpushed => "staleness/unpushed",
            Topic::BranchGone => "branch/gone",
            Topic::BranchMerged => "branch/merged",
            Topic::BranchPr => "branch/pr",
            Topic::BranchOrphan => "branch/orphan",
            Topic::BranchCleanup => "branch/cleanup",
            Topic::SubmoduleStatus => "submodule/status",
            Topic::SubmoduleInit => "submodule/init",
            Topic::SubmoduleSync => "submodule/sync",
            Topic::SubmoduleConflict => "submodule/conflict",
            Topic::SubmoduleUncommitted => "submodule/uncommitted",
            Topic::SubmoduleUntracked => "submodule/untracked",
            Topic::SubmoduleUnpushed => "submodule/unpushed",
            Topic::Degraded(Family::Identity) => "identity/error",
            Topic::Degraded(Family::Remote) => "remote/error",
            Topic::Degraded(Family::Staleness) => "staleness/error",
            Topic::Degraded(Family::Branch) => "branch/error",
            Topic::Degraded(Family::Submodule) => "submodule/error",
        }
    }

    pub fn family(&self) -> Family {
        match self {
            Topic::IdentityName | Topic::IdentityEmail => Family::Identity,
            Topic::RemoteProtocol
            | Topic::RemoteOrigin
            | Topic::RemoteTracking
            | Topic::RemotePushGuard
            | Topic::RemoteGhResolved => Family::Remote,
            Topic::StashAge
            | Topic::StashCount
            | Topic::Uncommitted
            | Topic::Untracked
            | Topic::Unpushed => Family::Staleness,
            Topic::BranchGone
            | Topic::BranchMerged
            | Topic::BranchPr
            | Topic::BranchOrphan
            | Topic::BranchCleanup => Family::Branch,
            Topic::SubmoduleStatus
            | Topic::SubmoduleInit
            | Topic::SubmoduleSync
            | Topic::SubmoduleConflict
            | Topic::SubmoduleUncommitted
            | Topic::SubmoduleUntracked
            | Topic::SubmoduleUnpushed => Family::Submodule,
            Topic::Degraded(family) => *family,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Topic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The unit of output produced by a rule.
///
/// Results are plain values: fixing never mutates a result in place, it
/// produces a new list where repaired entries are replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub topic: Topic,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    pub status: Status,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
    pub fixable: bool,
}

impl CheckResult {
    pub fn new(topic: Topic, status: Status, message: impl Into<String>) -> Self {
        Self {
            topic,
            entity: None,
            status,
            message: message.into(),
            details: Vec::new(),
            fixable: false,
        }
    }

    pub fn ok(topic: Topic, message: impl Into<String>) -> Self {
        Self::new(topic, Status::Ok, message)
    }

    pub fn warn(topic: Topic, message: impl Into<String>) -> Self {
        Self::new(topic, Status::Warn, message)
    }

    pub fn fail(topic: Topic, message: impl Into<String>) -> Self {
        Self::new(topic, Status::Fail, message)
    }

    /// Attach the entity this result is about.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    /// Mark the result as automatically fixable.
    pub fn fixable(mut self) -> Self {
        self.fixable = true;
        self
    }

    pub fn set_fixable(mut self, fixable: bool) -> Self {
        self.fixable = fixable;
        self
    }

    /// Display identity, e.g. `branch/gone[feature-x]`.
    pub fn name(&self) -> String {
        match &self.entity {
            Some(entity) => format!("{}[{}]", self.topic, entity),
            None => self.topic.to_string(),
        }
    }

    /// Whether a fix pass should attempt to repair this entry.
    pub fn wants_fix(&self) -> bool {
        self.fixable && matches!(self.status, Status::Fail | Status::Warn)
    }

    /// The confirmation that replaces this entry after a successful fix.
    pub fn fixed(&self, message: impl Into<String>) -> CheckResult {
        CheckResult {
            topic: self.topic,
            entity: self.entity.clone(),
            status: Status::Fix,
            message: message.into(),
            details: Vec::new(),
            fixable: false,
        }
    }
}
