//! Command-line interface for the converge tool.
//!
//! This module provides the command definitions and the output
//! formatting shared by every command.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::OutputFormatter;
