//! Policy configuration.

use crate::utils::{format_exact, parse_duration, split_csv};
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_DETAIL_LINES: usize = 10;

/// Effective configuration for a lint run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hosting organizations whose repositories count as work repositories.
    #[serde(alias = "workOrgs", deserialize_with = "string_list")]
    pub work_orgs: Vec<String>,

    /// Preferred transport for every remote.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,

    pub identity: IdentityConfig,

    pub thresholds: Thresholds,

    /// Detail lines shown per result before truncation.
    #[serde(alias = "detailLines")]
    pub detail_lines: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_orgs: Vec::new(),
            protocol: None,
            identity: IdentityConfig::default(),
            thresholds: Thresholds::default(),
            detail_lines: DEFAULT_DETAIL_LINES,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub name: String,
    #[serde(alias = "workEmail")]
    pub work_email: String,
    #[serde(alias = "personalEmail")]
    pub personal_email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    #[serde(alias = "stashMaxAge")]
    pub stash_max_age: MaxAge,
    #[serde(alias = "stashMaxCount")]
    pub stash_max_count: usize,
    #[serde(alias = "uncommittedMaxAge")]
    pub uncommitted_max_age: MaxAge,
    #[serde(alias = "unpushedMaxAge")]
    pub unpushed_max_age: MaxAge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Ssh,
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Ssh => "ssh",
            Protocol::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ssh" => Ok(Protocol::Ssh),
            "https" => Ok(Protocol::Https),
            other => Err(format!("unknown protocol {other:?} (expected ssh or https)")),
        }
    }
}

/// An age threshold. Zero disables the corresponding check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct MaxAge(pub Duration);

impl MaxAge {
    pub fn from_days(days: u64) -> Self {
        MaxAge(Duration::from_secs(days * 24 * 60 * 60))
    }

    pub fn is_enabled(&self) -> bool {
        !self.0.is_zero()
    }

    pub fn as_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.0).unwrap_or(chrono::Duration::MAX)
    }

    /// Strictly-greater-than comparison: an age equal to the threshold passes.
    pub fn exceeded_by(&self, age: chrono::Duration) -> bool {
        age > self.as_chrono()
    }
}

impl fmt::Display for MaxAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::utils::format_age(self.as_chrono()))
    }
}

impl Serialize for MaxAge {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_exact(self.0))
    }
}

impl<'de> Deserialize<'de> for MaxAge {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MaxAgeVisitor;

        impl Visitor<'_> for MaxAgeVisitor {
            type Value = MaxAge;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a duration like \"7d\" or a number of seconds")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<MaxAge, E> {
                parse_duration(v).map(MaxAge).map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<MaxAge, E> {
                Ok(MaxAge(Duration::from_secs(v)))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<MaxAge, E> {
                u64::try_from(v)
                    .map(|secs| MaxAge(Duration::from_secs(secs)))
                    .map_err(|_| E::custom("duration must not be negative"))
            }
        }

        deserializer.deserialize_any(MaxAgeVisitor)
    }
}

/// Accept either a list of strings or a single comma-separated string.
fn string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    struct ListVisitor;

    impl<'de> Visitor<'de> for ListVisitor {
        type Value = Vec<String>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a list of strings or a comma-separated string")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Vec<String>, E> {
            Ok(split_csv(v))
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Vec<String>, A::Error> {
            let mut out = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                let item = item.trim();
                if !item.is_empty() {
                    out.push(item.to_string());
                }
            }
            Ok(out)
        }
    }

    deserializer.deserialize_any(ListVisitor)
}
