//! Shared CLI utilities.

use crate::utils::split_csv;
use std::io::IsTerminal;
use std::path::Path;

/// Parse a comma-separated flag value. Returns `None` when the flag was not given.
pub fn parse_csv(value: &Option<String>) -> Option<Vec<String>> {
    value.as_deref().map(split_csv)
}

pub fn stdout_is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Final path component for headers and probe sections.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
