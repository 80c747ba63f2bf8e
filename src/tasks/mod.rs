//! Reconcilable resource tasks.
//!
//! A task is a typed descriptor of one infrastructure object. The same type
//! carries both the desired state (built from the declaration graph) and
//! the actual state (built by [`Task::find`] from the provider).
//!
//! Every task follows the same sequence, driven by
//! [`run_task`](crate::reconciler::run_task):
//!
//! 1. [`Task::find`] observes the remote object.
//! 2. [`Task::diff`] computes a sparse change set.
//! 3. [`Task::check_changes`] rejects unsupported changes.
//! 4. [`Task::render_live`] or [`Task::render_terraform`] applies them.

mod id;
mod internet_gateway;
mod lifecycle;
mod tags;
mod vpc;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{ReconcileError, Result};
use crate::planner::FieldChange;
use crate::provider::{CloudProvider, DescribeRequest, Filter, RemoteObject, ResourceKind};
use crate::target::{LiveTarget, TerraformTarget};
use crate::terraform::Literal;

pub use id::IdCell;
pub use internet_gateway::{InternetGateway, InternetGatewayChanges};
pub use lifecycle::Lifecycle;
pub use tags::{NAME_TAG, PROJECT_TAG, find_name_tag, format_tags, intersect_tags};
pub use vpc::{CIDR_BLOCK_PROPERTY, Vpc, VpcChanges};

/// Handle passed to every observation.
#[derive(Clone)]
pub struct ReconcileContext {
    /// Provider collaborator.
    cloud: Arc<dyn CloudProvider>,
    /// Owning project, used in lookup filters.
    project: String,
}

/// A reconcilable resource.
#[async_trait]
pub trait Task: Send + Sync + Sized {
    /// Sparse change set for this resource type.
    type Changes: Default + Send + Sync;

    /// Resource type name used in logs and errors.
    const RESOURCE_TYPE: &'static str;

    /// Gets the resource name.
    fn name(&self) -> Option<&str>;

    /// Gets the resolved identifier.
    fn id(&self) -> Option<&str>;

    /// Gets the lifecycle policy.
    fn lifecycle(&self) -> Lifecycle;

    /// Returns true if the resource is externally owned.
    fn is_shared(&self) -> bool;

    /// Returns a name for logs: `Type/name`, falling back to the id.
    fn display_name(&self) -> String {
        let label = self.name().or_else(|| self.id()).unwrap_or("<unnamed>");
        format!("{}/{label}", Self::RESOURCE_TYPE)
    }

    /// Observes the remote object matching this desired descriptor.
    ///
    /// Back-fills the desired identifier when the object is found.
    async fn find(&self, ctx: &ReconcileContext) -> Result<Option<Self>>;

    /// Computes the changes needed to go from `actual` to `self`.
    ///
    /// Returns `None` when nothing differs. When `actual` is `None` the
    /// change set carries every desired field.
    fn diff(&self, actual: Option<&Self>) -> Option<Self::Changes>;

    /// Flattens a change set for display.
    fn describe_changes(&self, actual: Option<&Self>, changes: &Self::Changes) -> Vec<FieldChange>;

    /// Rejects change sets the provider cannot apply.
    fn check_changes(&self, actual: Option<&Self>, changes: &Self::Changes) -> Result<()>;

    /// Applies changes against the provider API.
    async fn render_live(
        &self,
        target: &LiveTarget,
        actual: Option<&Self>,
        changes: &Self::Changes,
    ) -> Result<()>;

    /// Emits the resource as a Terraform block.
    async fn render_terraform(
        &self,
        target: &mut TerraformTarget,
        actual: Option<&Self>,
        changes: &Self::Changes,
    ) -> Result<()>;
}

/// A resource other resources can point at.
pub trait Linkable {
    /// Terraform resource type.
    const TERRAFORM_TYPE: &'static str;

    /// Produces the reference other Terraform blocks use for this resource.
    ///
    /// Shared resources resolve to their literal identifier; managed ones
    /// always resolve to a deferred `(type, name, "id")` property.
    fn terraform_link(&self) -> Result<Literal>;
}

impl ReconcileContext {
    /// Creates a context.
    #[must_use]
    pub fn new(cloud: Arc<dyn CloudProvider>, project: impl Into<String>) -> Self {
        Self {
            cloud,
            project: project.into(),
        }
    }

    /// Gets the provider.
    #[must_use]
    pub fn cloud(&self) -> &dyn CloudProvider {
        self.cloud.as_ref()
    }

    /// Gets the project name.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Builds the filters that find a managed resource by name.
    #[must_use]
    pub fn name_filters(&self, name: &str) -> Vec<Filter> {
        vec![
            Filter::tag(NAME_TAG, name),
            Filter::tag(PROJECT_TAG, self.project.as_str()),
        ]
    }
}

impl std::fmt::Debug for ReconcileContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconcileContext")
            .field("backend", &self.cloud.backend_type())
            .field("project", &self.project)
            .finish()
    }
}

/// Describes remote objects, expecting at most one match.
///
/// # Errors
///
/// Returns an error if the call fails or more than one object matches.
pub async fn find_single(
    cloud: &dyn CloudProvider,
    kind: ResourceKind,
    request: &DescribeRequest,
    resource_type: &str,
) -> Result<Option<RemoteObject>> {
    let mut objects = cloud
        .describe(kind, request)
        .await
        .map_err(|e| ReconcileError::provider_call(format!("listing {resource_type}s"), e))?;

    match objects.len() {
        0 => Ok(None),
        1 => Ok(objects.pop()),
        count => Err(ReconcileError::AmbiguousResult {
            resource_type: resource_type.to_string(),
            count,
        }
        .into()),
    }
}
