// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Converge
//!
//! A declarative reconciliation engine for cloud network resources.
//!
//! ## Overview
//!
//! Converge compares declared resources with what a provider reports and
//! converges the two. The same declaration can be:
//!
//! - Applied live against a provider API
//! - Previewed as a dry-run plan without side effects
//! - Rendered as Terraform configuration
//!
//! ## Architecture
//!
//! Every resource kind is a [`tasks::Task`]. A run goes through the same
//! steps for each resource:
//!
//! 1. **Find**: Query the provider for the actual state
//! 2. **Diff**: Compute the change set against the desired state
//! 3. **Check**: Reject changes the provider cannot make
//! 4. **Render**: Apply, plan, or emit Terraform through a [`target::Target`]
//!
//! Identifiers discovered or created along the way are written back into the
//! shared descriptors of the [`graph::DeclarationGraph`], so dependents see
//! them without a second lookup.
//!
//! ## Modules
//!
//! - [`config`]: Declaration parsing and validation
//! - [`provider`]: Provider trait, HTTP client and in-memory cloud
//! - [`tasks`]: VPC and internet gateway resources
//! - [`target`]: Live, dry-run and Terraform targets
//! - [`terraform`]: Terraform literals and file writer
//! - [`planner`]: Field diffs and plans
//! - [`graph`]: Declaration graph
//! - [`reconciler`]: Reconciliation engine
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! project:
//!   name: demo
//!
//! vpcs:
//!   - name: main
//!     cidr_block: 10.0.0.0/16
//!
//! internet_gateways:
//!   - name: main-gw
//!     vpc: main
//!     tags:
//!       env: dev
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod planner;
pub mod provider;
pub mod reconciler;
pub mod target;
pub mod tasks;
pub mod terraform;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, ConfigValidator, ConvergeConfig};
pub use error::{ConvergeError, Result};
pub use graph::DeclarationGraph;
pub use planner::{ChangeAction, ReconcilePlan};
pub use provider::{CloudProvider, HttpCloud, InMemoryCloud};
pub use reconciler::{ReconciliationResult, Reconciler};
pub use target::{LiveTarget, Target, TerraformTarget};
pub use tasks::{InternetGateway, ReconcileContext, Task, Vpc};
pub use terraform::TerraformWriter;
