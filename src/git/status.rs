//! Working tree state from `git status --porcelain`.

/// Dirty and untracked entries of a working tree.
///
/// Porcelain v1 lines carry a two-character status code; `??` marks an
/// untracked path, anything else is a staged or unstaged modification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkTreeStatus {
    /// Full porcelain lines for modified/staged entries.
    pub uncommitted: Vec<String>,
    /// Paths of untracked entries.
    pub untracked: Vec<String>,
}

impl WorkTreeStatus {
    pub fn parse(porcelain: &str) -> Self {
        let mut status = WorkTreeStatus::default();
        for line in porcelain.lines().filter(|l| !l.trim().is_empty()) {
            if let Some(path) = line.strip_prefix("?? ") {
                status.untracked.push(path.to_string());
            } else if line.starts_with("!! ") {
                continue;
            } else {
                status.uncommitted.push(line.to_string());
            }
        }
        status
    }

    pub fn is_clean(&self) -> bool {
        self.uncommitted.is_empty() && self.untracked.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::WorkTreeStatus;

    #[test]
    fn splits_untracked_from_modified() {
        let status = WorkTreeStatus::parse(" M src/lib.rs\nA  new.rs\n?? scratch.txt\n?? tmp/\n");
        assert_eq!(status.uncommitted, vec![" M src/lib.rs", "A  new.rs"]);
        assert_eq!(status.untracked, vec!["scratch.txt", "tmp/"]);
        assert!(!status.is_clean());
    }

    #[test]
    fn empty_output_is_clean() {
        assert!(WorkTreeStatus::parse("").is_clean());
    }
}
