//! CLI command implementations

pub mod completions;
pub mod serve;
