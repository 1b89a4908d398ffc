//! Monitoring probe protocol: a self-description and one JSON result per run.

use crate::domain::{CheckResult, Config, Status};
use crate::engine::{Report, Severity};
use crate::utils::format_exact;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub const PROBE_NAME: &str = "git-lint";
pub const DEFAULT_INTERVAL: &str = "1h";

#[derive(Debug, Clone, Serialize)]
pub struct ProbeDescription {
    pub name: String,
    pub description: String,
    pub version: String,
    pub arguments: ProbeArguments,
    pub output: ProbeOutput,
    pub default_name: String,
    pub default_interval: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProbeArguments {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub required: BTreeMap<String, ArgSpec>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub optional: BTreeMap<String, ArgSpec>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArgSpec {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ArgSpec {
    fn new(kind: &'static str, description: &'static str) -> Self {
        Self { kind, description, default: None }
    }

    /// Attach a default unless the configured value is empty or zero.
    fn default_from(mut self, value: impl Into<Value>) -> Self {
        let value = value.into();
        let unset = match &value {
            Value::String(s) => s.is_empty(),
            Value::Number(n) => n.as_u64() == Some(0),
            Value::Null => true,
            _ => false,
        };
        if !unset {
            self.default = Some(value);
        }
        self
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProbeOutput {
    pub metrics: BTreeMap<String, MetricSpec>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricSpec {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub status: Severity,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub summary: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ProbeMetrics>,
}

impl ProbeResult {
    pub fn critical(message: impl Into<String>) -> Self {
        Self { status: Severity::Critical, summary: String::new(), message: message.into(), metrics: None }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProbeMetrics {
    pub repos_checked: usize,
    pub repos_ok: usize,
    pub repos_warned: usize,
    pub repos_failed: usize,
}

pub fn describe(config: &Config) -> ProbeDescription {
    let thresholds = &config.thresholds;
    let identity = &config.identity;
    let age = |max_age: crate::domain::MaxAge| {
        if max_age.is_enabled() { format_exact(max_age.0) } else { String::new() }
    };

    let optional = [
        (
            "Work Orgs",
            ArgSpec::new("string", "Comma-separated GitHub work organizations")
                .default_from(config.work_orgs.join(",")),
        ),
        (
            "Protocol",
            ArgSpec::new("string", "Preferred git protocol (ssh or https)")
                .default_from(config.protocol.map(|p| p.as_str()).unwrap_or_default()),
        ),
        (
            "Identity Name",
            ArgSpec::new("string", "Expected git user name").default_from(identity.name.clone()),
        ),
        (
            "Work Email",
            ArgSpec::new("string", "Expected work email address")
                .default_from(identity.work_email.clone()),
        ),
        (
            "Personal Email",
            ArgSpec::new("string", "Expected personal email address")
                .default_from(identity.personal_email.clone()),
        ),
        (
            "Stash Max Age",
            ArgSpec::new("string", "Max stash entry age (e.g. 7d, 12h)")
                .default_from(age(thresholds.stash_max_age)),
        ),
        (
            "Stash Max Count",
            ArgSpec::new("integer", "Max number of stash entries")
                .default_from(thresholds.stash_max_count as u64),
        ),
        (
            "Uncommitted Max Age",
            ArgSpec::new("string", "Max age for uncommitted changes (e.g. 1d)")
                .default_from(age(thresholds.uncommitted_max_age)),
        ),
        (
            "Unpushed Max Age",
            ArgSpec::new("string", "Max age for unpushed commits (e.g. 7d)")
                .default_from(age(thresholds.unpushed_max_age)),
        ),
    ];

    let metrics = [
        ("repos_checked", "Repositories scanned"),
        ("repos_ok", "Repositories with no issues"),
        ("repos_warned", "Repositories with warnings"),
        ("repos_failed", "Repositories with failures"),
    ];

    ProbeDescription {
        name: PROBE_NAME.to_string(),
        description: "Comprehensive git repository health checker".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        arguments: ProbeArguments {
            required: BTreeMap::from([(
                "Path".to_string(),
                ArgSpec::new("string", "Root directory containing git repositories"),
            )]),
            optional: optional.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        },
        output: ProbeOutput {
            metrics: metrics
                .into_iter()
                .map(|(k, description)| (k.to_string(), MetricSpec { kind: "integer", description }))
                .collect(),
        },
        default_name: "Git Lint: {{Path}}".to_string(),
        default_interval: DEFAULT_INTERVAL.to_string(),
    }
}

/// Accumulates per-repository outcomes into one probe result.
#[derive(Debug, Default)]
pub struct ProbeSummary {
    metrics: ProbeMetrics,
    worst: Option<Severity>,
    message: String,
}

impl ProbeSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, report: &Report) {
        self.record(name, report.severity(), &report.results);
    }

    /// A repository that could not be opened counts as failed.
    pub fn add_error(&mut self, name: &str, error: &str) {
        self.metrics.repos_checked += 1;
        self.metrics.repos_failed += 1;
        self.worst = Some(Severity::Critical);
        self.message.push_str(&format!("**{name}**\n- error: {error}\n\n"));
    }

    fn record(&mut self, name: &str, severity: Severity, results: &[CheckResult]) {
        self.metrics.repos_checked += 1;
        match severity {
            Severity::Critical => self.metrics.repos_failed += 1,
            Severity::Warning => self.metrics.repos_warned += 1,
            Severity::Ok => self.metrics.repos_ok += 1,
        }
        self.worst = self.worst.max(Some(severity));
        if severity != Severity::Ok {
            self.message.push_str(&repo_section(name, results));
        }
    }

    pub fn finish(self) -> ProbeResult {
        let m = self.metrics;
        if m.repos_checked == 0 {
            return ProbeResult {
                status: Severity::Ok,
                summary: String::new(),
                message: "no git repositories found".to_string(),
                metrics: None,
            };
        }
        let attention = m.repos_warned + m.repos_failed;
        let summary = if attention > 0 {
            format!("{attention} of {} repos need attention", m.repos_checked)
        } else {
            format!("{} repos clean", m.repos_checked)
        };
        let message = if self.message.is_empty() { summary.clone() } else { self.message };
        ProbeResult {
            status: self.worst.unwrap_or(Severity::Ok),
            summary,
            message,
            metrics: Some(m),
        }
    }
}

/// Markdown section listing a repository's open issues.
pub fn repo_section(name: &str, results: &[CheckResult]) -> String {
    let lines: Vec<String> = results
        .iter()
        .filter(|r| !matches!(r.status, Status::Ok | Status::Fix))
        .map(|r| {
            let fix = if r.fixable { " [fixable]" } else { "" };
            format!("- {}: {}{fix}\n", r.name(), r.message)
        })
        .collect();
    if lines.is_empty() {
        return String::new();
    }
    format!("**{name}**\n{}\n", lines.concat())
}
