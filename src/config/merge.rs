//! Layer environment variables and CLI flags over the parsed config file.

use crate::domain::{Config, Protocol};
use anyhow::{Context, Result};
use figment::providers::{Env, Serialized};
use figment::{Figment, Provider};
use serde::Serialize;

/// Environment variable prefix; `__` separates nested keys, e.g.
/// `GIT_LINT_THRESHOLDS__STASH_MAX_AGE=3d`.
pub const ENV_PREFIX: &str = "GIT_LINT_";

/// Values given on the command line. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_orgs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
}

/// Precedence: CLI > environment > file.
pub fn merge_cli_with_config(file: Config, cli: &CliOverrides) -> Result<Config> {
    merge_layers(file, Env::prefixed(ENV_PREFIX).split("__"), cli)
}

fn merge_layers(file: Config, env: impl Provider, cli: &CliOverrides) -> Result<Config> {
    Figment::from(Serialized::defaults(file))
        .merge(env)
        .merge(Serialized::defaults(cli))
        .extract()
        .context("Invalid configuration after applying environment and CLI overrides")
}
