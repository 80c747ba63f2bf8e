//! Terraform output.
//!
//! This module holds the deferred-reference type used by tasks when they
//! point at each other, and the writer that collects emitted resource
//! blocks and renders them as HCL or Terraform JSON.

mod literal;
mod writer;

pub use literal::{Literal, TerraformValue};
pub use writer::{ResourceBlock, TerraformFormat, TerraformWriter, sanitize_name};
