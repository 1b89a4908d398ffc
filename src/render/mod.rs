//! Output rendering (terminal listing, monitoring probe JSON)

pub mod probe;
pub mod terminal;

pub use probe::{describe, ProbeResult, ProbeSummary};
pub use terminal::Printer;
