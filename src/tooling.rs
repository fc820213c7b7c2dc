//! Tooling & Integration Layer
//!
//! The `svncache` command line: argument parsing, command execution against a
//! working-copy connection, and output formatting.

pub mod cli;
pub mod format;

pub use cli::{Cli, CliContext, Commands};
