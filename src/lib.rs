//! Policy lint and remediation for git working trees.
//!
//! A [`rules::Rule`] inspects a [`git::Repo`] and returns
//! [`domain::CheckResult`]s; [`engine::run_rules`] runs the fixed rule set,
//! optionally applies fixes, and aggregates the outcome.

pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod fork;
pub mod git;
pub mod render;
pub mod rules;
pub mod utils;
