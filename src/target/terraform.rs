//! Terraform target.

use std::sync::Arc;

use crate::error::Result;
use crate::provider::CloudProvider;
use crate::terraform::{ResourceBlock, TerraformWriter};

/// Emits Terraform resource blocks instead of calling the provider.
///
/// The provider is still reachable so that shared resources can be
/// discovered and linked by literal identifier.
pub struct TerraformTarget {
    /// Provider collaborator, used for read-only discovery.
    cloud: Arc<dyn CloudProvider>,
    /// Collected output.
    writer: TerraformWriter,
}

impl TerraformTarget {
    /// Creates a Terraform target with an empty writer.
    #[must_use]
    pub fn new(cloud: Arc<dyn CloudProvider>) -> Self {
        Self {
            cloud,
            writer: TerraformWriter::new(),
        }
    }

    /// Gets the provider.
    #[must_use]
    pub fn cloud(&self) -> &dyn CloudProvider {
        self.cloud.as_ref()
    }

    /// Emits a resource block.
    ///
    /// # Errors
    ///
    /// Returns an error if the block duplicates an existing one.
    pub fn render_resource(&mut self, block: ResourceBlock) -> Result<()> {
        self.writer.emit(block)
    }

    /// Gets the collected output.
    #[must_use]
    pub const fn writer(&self) -> &TerraformWriter {
        &self.writer
    }

    /// Consumes the target and returns the collected output.
    #[must_use]
    pub fn into_writer(self) -> TerraformWriter {
        self.writer
    }
}

impl std::fmt::Debug for TerraformTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerraformTarget")
            .field("backend", &self.cloud.backend_type())
            .field("resources", &self.writer.len())
            .finish()
    }
}
