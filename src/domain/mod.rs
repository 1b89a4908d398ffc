//! Core data types shared across rules, the engine and rendering.

pub mod config;
pub mod result;

pub use config::{Config, IdentityConfig, MaxAge, Protocol, Thresholds, DEFAULT_DETAIL_LINES};
pub use result::{CheckResult, Family, Status, Topic};
