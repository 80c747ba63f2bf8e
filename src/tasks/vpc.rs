//! VPC task.
//!
//! The VPC is the parent most other network resources attach to. Shared
//! VPCs are referenced by a declared identifier and never touched.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{ReconcileError, Result, TerraformError};
use crate::planner::FieldChange;
use crate::provider::{CreateRequest, DescribeRequest, ResourceKind, Tags};
use crate::target::{LiveTarget, TerraformTarget};
use crate::terraform::{Literal, ResourceBlock, TerraformValue};

use super::id::IdCell;
use super::lifecycle::Lifecycle;
use super::tags::{find_name_tag, format_tags, intersect_tags};
use super::{Linkable, ReconcileContext, Task, find_single};

/// Remote property holding the CIDR block.
pub const CIDR_BLOCK_PROPERTY: &str = "cidr_block";

/// A virtual network.
#[derive(Debug, Default)]
pub struct Vpc {
    /// Resource name.
    pub name: Option<String>,
    /// Lifecycle policy.
    pub lifecycle: Lifecycle,
    /// Provider identifier.
    pub id: IdCell,
    /// Primary CIDR block.
    pub cidr_block: Option<String>,
    /// Whether the VPC is externally owned.
    pub shared: bool,
    /// Tags applied to the VPC.
    pub tags: Tags,
}

/// Fields of a [`Vpc`] that differ from the observed state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VpcChanges {
    /// New name.
    pub name: Option<String>,
    /// New CIDR block.
    pub cidr_block: Option<String>,
    /// New tags.
    pub tags: Option<Tags>,
}

impl Vpc {
    /// Creates a managed VPC descriptor.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Creates a descriptor that only carries an identifier.
    #[must_use]
    pub fn from_id(id: &str) -> Self {
        Self {
            id: IdCell::with_id(id),
            ..Self::default()
        }
    }

    /// Sets the CIDR block.
    #[must_use]
    pub fn with_cidr_block(mut self, cidr_block: &str) -> Self {
        self.cidr_block = Some(cidr_block.to_string());
        self
    }

    /// Sets the tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    /// Marks the VPC as shared, with its known identifier.
    #[must_use]
    pub fn shared_with_id(mut self, id: &str) -> Self {
        self.shared = true;
        self.id = IdCell::with_id(id);
        self
    }

    /// Sets the lifecycle policy.
    #[must_use]
    pub const fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    fn require_id(&self) -> Result<&str> {
        self.id.get().ok_or_else(|| {
            ReconcileError::configuration(Self::RESOURCE_TYPE, "VPC ID is not resolved").into()
        })
    }
}

impl VpcChanges {
    /// Returns true if no field changed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.cidr_block.is_none() && self.tags.is_none()
    }
}

#[async_trait]
impl Task for Vpc {
    type Changes = VpcChanges;

    const RESOURCE_TYPE: &'static str = "VPC";

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn id(&self) -> Option<&str> {
        self.id.get()
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    fn is_shared(&self) -> bool {
        self.shared
    }

    async fn find(&self, ctx: &ReconcileContext) -> Result<Option<Self>> {
        let request = if let Some(id) = self.id.get() {
            DescribeRequest::by_ids(vec![id.to_string()])
        } else if self.shared {
            return Err(ReconcileError::configuration(
                Self::RESOURCE_TYPE,
                "VPC ID is required when VPC is shared",
            )
            .into());
        } else {
            let name = self.name.as_deref().ok_or_else(|| {
                ReconcileError::configuration(Self::RESOURCE_TYPE, "name or ID is required")
            })?;
            DescribeRequest::with_filters(ctx.name_filters(name))
        };

        let Some(object) =
            find_single(ctx.cloud(), ResourceKind::Vpc, &request, Self::RESOURCE_TYPE).await?
        else {
            return Ok(None);
        };

        let mut actual = Self {
            name: find_name_tag(&object.tags),
            lifecycle: self.lifecycle,
            id: IdCell::with_id(object.id.clone()),
            cidr_block: object.property(CIDR_BLOCK_PROPERTY).map(String::from),
            shared: self.shared,
            tags: intersect_tags(&object.tags, &self.tags),
        };

        debug!("found matching VPC {:?}", object.id);

        if self.shared {
            actual.name.clone_from(&self.name);
            actual.tags.clone_from(&self.tags);
        }

        self.id.set(object.id)?;

        Ok(Some(actual))
    }

    fn diff(&self, actual: Option<&Self>) -> Option<VpcChanges> {
        let Some(actual) = actual else {
            return Some(VpcChanges {
                name: self.name.clone(),
                cidr_block: self.cidr_block.clone(),
                tags: Some(self.tags.clone()),
            });
        };

        let mut changes = VpcChanges::default();

        if self.name.is_some() && self.name != actual.name {
            changes.name.clone_from(&self.name);
        }
        if self.cidr_block.is_some() && self.cidr_block != actual.cidr_block {
            changes.cidr_block.clone_from(&self.cidr_block);
        }
        if self.tags != actual.tags {
            changes.tags = Some(self.tags.clone());
        }

        (!changes.is_empty()).then_some(changes)
    }

    fn describe_changes(&self, actual: Option<&Self>, changes: &VpcChanges) -> Vec<FieldChange> {
        let mut fields = Vec::new();

        if let Some(name) = &changes.name {
            fields.push(FieldChange::new(
                "Name",
                actual.and_then(|a| a.name.clone()),
                Some(name.clone()),
            ));
        }
        if let Some(cidr) = &changes.cidr_block {
            fields.push(FieldChange::new(
                "CidrBlock",
                actual.and_then(|a| a.cidr_block.clone()),
                Some(cidr.clone()),
            ));
        }
        if let Some(tags) = &changes.tags {
            fields.push(FieldChange::new(
                "Tags",
                actual.map(|a| format_tags(&a.tags)),
                Some(format_tags(tags)),
            ));
        }

        fields
    }

    fn check_changes(&self, actual: Option<&Self>, changes: &VpcChanges) -> Result<()> {
        // A declared identifier that matches nothing must not be replaced.
        if actual.is_none()
            && !self.shared
            && let Some(id) = self.id.get()
        {
            return Err(ReconcileError::configuration(
                Self::RESOURCE_TYPE,
                format!("declared ID {id} does not exist"),
            )
            .into());
        }

        match actual {
            Some(_) if changes.cidr_block.is_some() => Err(ReconcileError::ImmutableField {
                resource_type: Self::RESOURCE_TYPE.to_string(),
                field: String::from("CidrBlock"),
            }
            .into()),
            None if !self.shared && self.cidr_block.is_none() => Err(
                ReconcileError::configuration(Self::RESOURCE_TYPE, "CIDR block must be specified")
                    .into(),
            ),
            _ => Ok(()),
        }
    }

    async fn render_live(
        &self,
        target: &LiveTarget,
        actual: Option<&Self>,
        _changes: &VpcChanges,
    ) -> Result<()> {
        if self.shared {
            if actual.is_none() {
                return Err(ReconcileError::MissingSharedResource {
                    resource_type: Self::RESOURCE_TYPE.to_string(),
                    name: self.display_name(),
                }
                .into());
            }
            return Ok(());
        }

        if actual.is_none() {
            let cidr_block = self.cidr_block.as_deref().unwrap_or_default();
            info!("Creating VPC with CIDR: {cidr_block}");

            let request = CreateRequest::new(ResourceKind::Vpc)
                .with_tags(self.tags.clone())
                .with_property(CIDR_BLOCK_PROPERTY, cidr_block);
            let id = target.create(&request, "creating VPC").await?;
            self.id.set(id)?;
        }

        target.add_tags(self.require_id()?, &self.tags).await
    }

    async fn render_terraform(
        &self,
        target: &mut TerraformTarget,
        _actual: Option<&Self>,
        _changes: &VpcChanges,
    ) -> Result<()> {
        if self.shared {
            debug!("Not emitting shared VPC {:?}", self.id.get());
            return Ok(());
        }

        let name = self.name.as_deref().ok_or_else(|| TerraformError::MissingName {
            resource_type: Self::TERRAFORM_TYPE.to_string(),
        })?;

        let mut block = ResourceBlock::new(Self::TERRAFORM_TYPE, name);
        if let Some(cidr_block) = &self.cidr_block {
            block = block.field("cidr_block", TerraformValue::String(cidr_block.clone()));
        }
        block = block.field("tags", TerraformValue::Map(self.tags.clone()));

        target.render_resource(block)
    }
}

impl Linkable for Vpc {
    const TERRAFORM_TYPE: &'static str = "aws_vpc";

    fn terraform_link(&self) -> Result<Literal> {
        if self.shared {
            let id = self.id.get().ok_or_else(|| ReconcileError::UnresolvedReference {
                resource_type: Self::RESOURCE_TYPE.to_string(),
                name: self.display_name(),
            })?;
            debug!("reusing existing VPC with id {id:?}");
            return Ok(Literal::from_string_value(id));
        }

        let name = self.name.as_deref().ok_or_else(|| TerraformError::MissingName {
            resource_type: Self::TERRAFORM_TYPE.to_string(),
        })?;
        Ok(Literal::property(Self::TERRAFORM_TYPE, name, "id"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvergeError;
    use crate::provider::{InMemoryCloud, RecordedCall, RemoteObject};
    use crate::tasks::{NAME_TAG, PROJECT_TAG};
    use std::sync::Arc;

    fn managed_tags(name: &str) -> Tags {
        let mut tags = Tags::new();
        tags.insert(NAME_TAG.to_string(), name.to_string());
        tags.insert(PROJECT_TAG.to_string(), String::from("demo"));
        tags
    }

    fn context(cloud: &Arc<InMemoryCloud>) -> ReconcileContext {
        ReconcileContext::new(cloud.clone(), "demo")
    }

    #[tokio::test]
    async fn test_find_by_name_backfills_id() {
        let cloud = Arc::new(InMemoryCloud::with_objects(vec![
            RemoteObject::new(ResourceKind::Vpc, "vpc-1")
                .with_tag(NAME_TAG, "main")
                .with_tag(PROJECT_TAG, "demo")
                .with_property(CIDR_BLOCK_PROPERTY, "10.0.0.0/16"),
        ]));
        let desired = Vpc::new("main")
            .with_cidr_block("10.0.0.0/16")
            .with_tags(managed_tags("main"));

        let actual = desired
            .find(&context(&cloud))
            .await
            .expect("find failed")
            .expect("VPC should be found");

        assert_eq!(actual.id.get(), Some("vpc-1"));
        assert_eq!(desired.id.get(), Some("vpc-1"));
        assert!(desired.diff(Some(&actual)).is_none());
    }

    #[tokio::test]
    async fn test_shared_vpc_without_id_is_configuration_error() {
        let cloud = Arc::new(InMemoryCloud::new());
        let desired = Vpc {
            shared: true,
            ..Vpc::new("external")
        };

        let result = desired.find(&context(&cloud)).await;
        assert!(matches!(
            result,
            Err(ConvergeError::Reconcile(ReconcileError::Configuration { .. }))
        ));
    }

    #[tokio::test]
    async fn test_declared_id_not_found_rejected_before_create() {
        let cloud = Arc::new(InMemoryCloud::new());
        let desired = Vpc {
            id: IdCell::with_id("vpc-stale"),
            ..Vpc::new("main").with_cidr_block("10.0.0.0/16")
        };

        let actual = desired.find(&context(&cloud)).await.expect("find failed");
        assert!(actual.is_none());

        let changes = desired.diff(None).expect("create carries all fields");
        let result = desired.check_changes(None, &changes);
        assert!(matches!(
            result,
            Err(ConvergeError::Reconcile(ReconcileError::Configuration { ref message, .. }))
                if message.contains("vpc-stale")
        ));
    }

    #[test]
    fn test_cidr_change_on_existing_vpc_rejected() {
        let desired = Vpc::new("main").with_cidr_block("10.1.0.0/16");
        let actual = Vpc::new("main").with_cidr_block("10.0.0.0/16");

        let changes = desired.diff(Some(&actual)).expect("cidr should differ");
        let result = desired.check_changes(Some(&actual), &changes);

        assert!(matches!(
            result,
            Err(ConvergeError::Reconcile(ReconcileError::ImmutableField { ref field, .. })) if field == "CidrBlock"
        ));
    }

    #[tokio::test]
    async fn test_render_live_creates_and_tags() {
        let cloud = Arc::new(InMemoryCloud::new());
        let target = LiveTarget::new(cloud.clone());
        let desired = Vpc::new("main")
            .with_cidr_block("10.0.0.0/16")
            .with_tags(managed_tags("main"));

        let changes = desired.diff(None).expect("create carries all fields");
        desired
            .render_live(&target, None, &changes)
            .await
            .expect("render failed");

        let id = desired.id.get().expect("id should be back-filled").to_string();
        assert_eq!(
            cloud.mutations(),
            vec![
                RecordedCall::Create {
                    kind: ResourceKind::Vpc,
                    id: id.clone()
                },
                RecordedCall::Tag { id: id.clone() },
            ]
        );
        assert_eq!(
            cloud.object(&id).and_then(|o| o.property(CIDR_BLOCK_PROPERTY).map(String::from)),
            Some(String::from("10.0.0.0/16"))
        );
    }

    #[test]
    fn test_link_managed_is_deferred_even_with_id() {
        let vpc = Vpc::new("main");
        vpc.id.set("vpc-1").expect("set failed");

        let link = vpc.terraform_link().expect("link failed");
        assert_eq!(link, Literal::property("aws_vpc", "main", "id"));
    }

    #[test]
    fn test_link_shared_is_literal() {
        let vpc = Vpc::new("external").shared_with_id("vpc-123");
        assert_eq!(
            vpc.terraform_link().expect("link failed"),
            Literal::from_string_value("vpc-123")
        );
    }
}
