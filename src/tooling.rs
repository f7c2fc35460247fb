//! Tooling
//!
//! Command-line host for the tree store and its text rendering.

pub mod cli;
pub mod format;

pub use cli::{Cli, CliContext, Commands, OutputFormat};
