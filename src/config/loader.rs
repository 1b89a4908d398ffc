//! Config file discovery and parsing

use crate::domain::Config;
use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_DIR: &str = "git-lint";
const FILE_STEM: &str = "config";
const EXTENSIONS: [&str; 4] = ["json", "toml", "yaml", "yml"];

/// Table name under which the configuration may be nested.
const NESTED_SECTION: &str = "git-lint";

/// Load the configuration file. `config_path` wins over discovery; a missing
/// file is an error either way.
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => {
            let dirs = config_dirs();
            match discover_config(&dirs) {
                Some(path) => path,
                None => bail!(
                    "no config file found (looked for {FILE_STEM}.{{{}}} in {})",
                    EXTENSIONS.join(","),
                    dirs.iter().map(|d| d.display().to_string()).collect::<Vec<_>>().join(", ")
                ),
            }
        }
    };
    tracing::debug!(path = %config_file.display(), "loading config");

    let content = fs::read_to_string(&config_file)
        .with_context(|| format!("Failed reading config file: {}", config_file.display()))?;

    let ext = config_file.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "json" => parse_json_config(&content, &config_file),
        "toml" => parse_toml_config(&content, &config_file),
        "yaml" | "yml" => parse_yaml_config(&content, &config_file),
        other => bail!("Unsupported config extension '.{}' for file {}", other, config_file.display()),
    }
}

fn parse_json_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: serde_json::Value = serde_json::from_str(content)
        .with_context(|| format!("Invalid JSON syntax: {}", config_file.display()))?;
    let config_val = raw.get(NESTED_SECTION).cloned().unwrap_or(raw);
    serde_json::from_value(config_val)
        .with_context(|| format!("Invalid JSON config: {}", config_file.display()))
}

/// Parse TOML config, supporting a nested `[git-lint]` table.
fn parse_toml_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: toml::Value = toml::from_str(content)
        .with_context(|| format!("Invalid TOML syntax: {}", config_file.display()))?;
    let config_val = raw.get(NESTED_SECTION).cloned().unwrap_or(raw);
    config_val.try_into().with_context(|| format!("Invalid TOML config: {}", config_file.display()))
}

fn parse_yaml_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: serde_yaml::Value = serde_yaml::from_str(content)
        .with_context(|| format!("Invalid YAML syntax: {}", config_file.display()))?;
    // An empty document means "all defaults".
    if raw.is_null() {
        return Ok(Config::default());
    }
    let config_val = raw.get(NESTED_SECTION).cloned().unwrap_or(raw);
    serde_yaml::from_value(config_val)
        .with_context(|| format!("Invalid YAML config: {}", config_file.display()))
}

/// `$XDG_CONFIG_HOME/git-lint`, then `$HOME/.config/git-lint`.
pub fn config_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(xdg) = env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        dirs.push(PathBuf::from(xdg).join(APP_DIR));
    }
    if let Some(home) = env::var_os("HOME").filter(|v| !v.is_empty()) {
        let dir = PathBuf::from(home).join(".config").join(APP_DIR);
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
    dirs
}

/// First `config.<ext>` that exists, scanning directories in order.
pub fn discover_config(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| EXTENSIONS.iter().map(move |ext| dir.join(format!("{FILE_STEM}.{ext}"))))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MaxAge, Protocol};
    use tempfile::TempDir;

    #[test]
    fn test_load_json_config() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("config.json");
        fs::write(
            &path,
            r#"{"workOrgs": ["acme"], "protocol": "ssh", "identity": {"name": "Jo Dev"},
                "thresholds": {"stashMaxAge": "7d"}, "detailLines": 3}"#,
        )
        .expect("write");

        let cfg = load_config(Some(&path)).expect("config");
        assert_eq!(cfg.work_orgs, vec!["acme"]);
        assert_eq!(cfg.protocol, Some(Protocol::Ssh));
        assert_eq!(cfg.identity.name, "Jo Dev");
        assert_eq!(cfg.thresholds.stash_max_age, MaxAge::from_days(7));
        assert_eq!(cfg.detail_lines, 3);
    }

    #[test]
    fn test_nested_toml_section() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[git-lint]\nwork_orgs = \"acme, widgets\"\n[git-lint.thresholds]\nunpushed_max_age = \"1d12h\"\n")
            .expect("write");

        let cfg = load_config(Some(&path)).expect("config");
        assert_eq!(cfg.work_orgs, vec!["acme", "widgets"]);
        assert_eq!(cfg.thresholds.unpushed_max_age, MaxAge(std::time::Duration::from_secs(129_600)));
    }

    #[test]
    fn test_yaml_config_and_empty_document() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("config.yml");
        fs::write(&path, "identity:\n  work_email: jo@acme.io\n").expect("write");
        assert_eq!(load_config(Some(&path)).expect("config").identity.work_email, "jo@acme.io");

        fs::write(&path, "").expect("write");
        assert_eq!(load_config(Some(&path)).expect("config"), Config::default());
    }

    #[test]
    fn test_missing_explicit_config_is_err() {
        let tmp = TempDir::new().expect("tmp");
        let err = load_config(Some(&tmp.path().join("nope.json"))).expect_err("missing");
        assert!(err.to_string().contains("Failed reading config file"));
    }

    #[test]
    fn test_invalid_values_are_err() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("config.toml");
        fs::write(&path, "protocol = \"git\"\n").expect("write");
        assert!(load_config(Some(&path)).is_err());

        let path = tmp.path().join("config.ini");
        fs::write(&path, "").expect("write");
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_discovery_order() {
        let first = TempDir::new().expect("tmp");
        let second = TempDir::new().expect("tmp");
        fs::write(second.path().join("config.json"), "{}").expect("write");
        fs::write(second.path().join("config.toml"), "").expect("write");
        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];

        assert_eq!(discover_config(&dirs), Some(second.path().join("config.json")));

        fs::write(first.path().join("config.yaml"), "").expect("write");
        assert_eq!(discover_config(&dirs), Some(first.path().join("config.yaml")));
        assert_eq!(discover_config(&[]), None);
    }
}
