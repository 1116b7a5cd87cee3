//! CLI layer for intent-router.
//!
//! Provides the command-line interface using clap, with commands for
//! routing and classifying messages and managing prompt templates.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
#[cfg(feature = "mcp")]
pub use parser::{McpCommands, Transport};
pub use parser::{Cli, Commands};
