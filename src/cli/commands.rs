//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Converge - declarative cloud resource reconciliation.
#[derive(Parser, Debug)]
#[command(name = "converge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the declaration file.
    #[arg(short, long, global = true, env = "CONVERGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate the declaration file.
    Validate {
        /// Show all warnings, not just errors.
        #[arg(short, long)]
        warnings: bool,
    },

    /// Show what apply would change, without side effects.
    Plan {
        /// Show every differing field.
        #[arg(short, long)]
        detailed: bool,
    },

    /// Converge the provider to the declaration.
    Apply {
        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,

        /// Stop at the first failing resource.
        #[arg(long)]
        fail_fast: bool,
    },

    /// Render the declaration as Terraform instead of applying it.
    Terraform {
        /// Output directory (defaults to `terraform.output_dir`).
        #[arg(long)]
        out: Option<PathBuf>,

        /// Write Terraform JSON syntax instead of HCL.
        #[arg(long)]
        json: bool,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_terraform() {
        let cli = Cli::try_parse_from(["converge", "terraform", "--out", "tf", "--json"])
            .expect("parse failed");

        match cli.command {
            Commands::Terraform { out, json } => {
                assert_eq!(out, Some(PathBuf::from("tf")));
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
