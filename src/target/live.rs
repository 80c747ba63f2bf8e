//! Live API target.

use std::sync::Arc;
use tracing::debug;

use crate::error::{ReconcileError, Result};
use crate::provider::{CloudProvider, CreateRequest, ResourceKind, Tags};

/// Applies changes directly against the provider API.
#[derive(Clone)]
pub struct LiveTarget {
    /// Provider collaborator.
    cloud: Arc<dyn CloudProvider>,
}

impl LiveTarget {
    /// Creates a live target.
    #[must_use]
    pub fn new(cloud: Arc<dyn CloudProvider>) -> Self {
        Self { cloud }
    }

    /// Gets the provider.
    #[must_use]
    pub fn cloud(&self) -> &dyn CloudProvider {
        self.cloud.as_ref()
    }

    /// Creates a remote object, wrapping failures with `operation`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails.
    pub async fn create(&self, request: &CreateRequest, operation: &str) -> Result<String> {
        self.cloud
            .create(request)
            .await
            .map_err(|e| ReconcileError::provider_call(operation, e).into())
    }

    /// Attaches a child to a parent, wrapping failures with `operation`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails.
    pub async fn attach(
        &self,
        kind: ResourceKind,
        parent_id: &str,
        child_id: &str,
        operation: &str,
    ) -> Result<()> {
        self.cloud
            .attach(kind, parent_id, child_id)
            .await
            .map_err(|e| ReconcileError::provider_call(operation, e).into())
    }

    /// Applies tags to an object.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails.
    pub async fn add_tags(&self, id: &str, tags: &Tags) -> Result<()> {
        debug!("Applying {} tags to {id}", tags.len());
        self.cloud
            .tag(id, tags)
            .await
            .map_err(|e| ReconcileError::provider_call(format!("tagging {id}"), e).into())
    }
}

impl std::fmt::Debug for LiveTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveTarget")
            .field("backend", &self.cloud.backend_type())
            .finish()
    }
}
