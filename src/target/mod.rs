//! Render targets.
//!
//! A reconciliation renders into exactly one of a fixed set of targets:
//! the live provider API, a Terraform writer, or a dry run that only
//! reports what would change.

mod live;
mod terraform;

pub use live::LiveTarget;
pub use terraform::TerraformTarget;

/// Where accepted changes are rendered.
#[derive(Debug)]
pub enum Target {
    /// Call the provider API.
    Live(LiveTarget),
    /// Emit Terraform resource blocks.
    Terraform(TerraformTarget),
    /// Report changes without side effects.
    DryRun,
}

impl Target {
    /// Gets the target name, for logs and reports.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Live(_) => "live",
            Self::Terraform(_) => "terraform",
            Self::DryRun => "dry-run",
        }
    }
}
