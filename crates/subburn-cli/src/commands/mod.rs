//! Subcommand implementations.

pub mod burn;
pub mod check;
pub mod cues;
pub mod probe;
pub mod schema;
