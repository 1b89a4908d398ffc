//! The fixed rule set.
//!
//! Every rule exposes a read-only `check` and a `fix` that consumes the
//! output of `check` (or of an earlier `fix`) and returns a new list in
//! which repaired entries are replaced by `fix` confirmations. Entries that
//! cannot be repaired pass through unchanged.

use crate::domain::{CheckResult, Family};
use crate::git::{GitError, Repo};

pub mod branches;
pub mod identity;
pub mod protocol;
pub mod remotes;
pub mod staleness;
pub mod submodules;
pub mod unpushed;

pub use branches::BranchCleanupRule;
pub use identity::IdentityRule;
pub use protocol::ProtocolRule;
pub use remotes::RemoteRule;
pub use staleness::StalenessRule;
pub use submodules::SubmoduleRule;
pub use unpushed::UnpushedRule;

pub trait Rule {
    fn family(&self) -> Family;

    /// Evaluate current state. An empty list means the rule does not apply.
    /// `Err` is reserved for reads that unexpectedly fail.
    fn check(&self, repo: &Repo) -> Result<Vec<CheckResult>, GitError>;

    fn fix(&self, _repo: &Repo, results: Vec<CheckResult>) -> Vec<CheckResult> {
        results
    }
}

/// Rules in reporting order.
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(IdentityRule),
        Box::new(ProtocolRule),
        Box::new(RemoteRule),
        Box::new(StalenessRule),
        Box::new(SubmoduleRule),
        Box::new(BranchCleanupRule),
        Box::new(UnpushedRule),
    ]
}

/// Run `repair` on every entry that wants a fix. `None` keeps the original entry.
pub(crate) fn fix_each(
    results: Vec<CheckResult>,
    mut repair: impl FnMut(&CheckResult) -> Option<CheckResult>,
) -> Vec<CheckResult> {
    results
        .into_iter()
        .map(|r| {
            if !r.wants_fix() {
                return r;
            }
            match repair(&r) {
                Some(fixed) => {
                    tracing::info!("fixed {}: {}", r.name(), fixed.message);
                    fixed
                }
                None => {
                    tracing::warn!("could not fix {}", r.name());
                    r
                }
            }
        })
        .collect()
}
