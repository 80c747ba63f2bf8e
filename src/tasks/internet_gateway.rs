//! Internet gateway task.
//!
//! A gateway is attached to exactly one VPC. The attachment is fixed once
//! made, so moving a gateway between VPCs is rejected rather than applied.
//! A gateway found without any attachment is still attached in place, so a
//! run interrupted between create and attach converges on the next one.
//! When the provider reports several attachments the last one is used.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{ReconcileError, Result, TerraformError};
use crate::planner::FieldChange;
use crate::provider::{
    ATTACHMENT_VPC_FILTER, CloudProvider, CreateRequest, DescribeRequest, Filter, ResourceKind,
    Tags,
};
use crate::target::{LiveTarget, TerraformTarget};
use crate::terraform::{Literal, ResourceBlock, TerraformValue};

use super::id::IdCell;
use super::lifecycle::Lifecycle;
use super::tags::{find_name_tag, format_tags, intersect_tags};
use super::vpc::Vpc;
use super::{Linkable, ReconcileContext, Task, find_single};

/// An internet gateway attached to a VPC.
#[derive(Debug, Default)]
pub struct InternetGateway {
    /// Resource name.
    pub name: Option<String>,
    /// Lifecycle policy.
    pub lifecycle: Lifecycle,
    /// Provider identifier.
    pub id: IdCell,
    /// VPC the gateway is attached to.
    pub vpc: Option<Arc<Vpc>>,
    /// Whether the gateway is externally owned.
    pub shared: bool,
    /// Tags applied to the gateway.
    pub tags: Tags,
}

/// Fields of an [`InternetGateway`] that differ from the observed state.
#[derive(Debug, Clone, Default)]
pub struct InternetGatewayChanges {
    /// New name.
    pub name: Option<String>,
    /// New VPC attachment.
    pub vpc: Option<Arc<Vpc>>,
    /// New tags.
    pub tags: Option<Tags>,
}

impl InternetGatewayChanges {
    /// Returns true if no field changed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.vpc.is_none() && self.tags.is_none()
    }
}

/// Compares two optional VPC references by resolved identifier.
fn compare_id(left: Option<&Arc<Vpc>>, right: Option<&Arc<Vpc>>) -> bool {
    match (left, right) {
        (None, None) => true,
        (Some(l), Some(r)) => l.id.get().is_some() && l.id.get() == r.id.get(),
        _ => false,
    }
}

fn vpc_id(vpc: Option<&Arc<Vpc>>) -> Option<String> {
    vpc.and_then(|v| v.id.get().map(String::from))
}

impl InternetGateway {
    /// Creates a managed gateway attached to `vpc`.
    #[must_use]
    pub fn new(name: &str, vpc: Arc<Vpc>) -> Self {
        Self {
            name: Some(name.to_string()),
            vpc: Some(vpc),
            ..Self::default()
        }
    }

    /// Sets the tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    /// Sets the lifecycle policy.
    #[must_use]
    pub const fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// Marks the gateway as shared.
    #[must_use]
    pub const fn shared(mut self) -> Self {
        self.shared = true;
        self
    }

    /// Builds the structural query used to discover a shared gateway.
    fn shared_request(&self) -> Result<DescribeRequest> {
        let vpc_id = vpc_id(self.vpc.as_ref()).ok_or_else(|| {
            ReconcileError::configuration(
                Self::RESOURCE_TYPE,
                "VPC ID is required when InternetGateway is shared",
            )
        })?;
        Ok(DescribeRequest::with_filters(vec![Filter::new(
            ATTACHMENT_VPC_FILTER,
            vpc_id,
        )]))
    }

    async fn discover_shared(&self, cloud: &dyn CloudProvider) -> Result<()> {
        let request = self.shared_request()?;
        match find_single(cloud, ResourceKind::InternetGateway, &request, Self::RESOURCE_TYPE)
            .await?
        {
            Some(object) => self.id.set(object.id),
            None => {
                warn!("Unable to find shared InternetGateway");
                Ok(())
            }
        }
    }
}

#[async_trait]
impl Task for InternetGateway {
    type Changes = InternetGatewayChanges;

    const RESOURCE_TYPE: &'static str = "InternetGateway";

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
        let request = if self.shared {
            self.shared_request()?
        } else if let Some(id) = self.id.get() {
            DescribeRequest::by_ids(vec![id.to_string()])
        } else {
            let name = self.name.as_deref().ok_or_else(|| {
                ReconcileError::configuration(Self::RESOURCE_TYPE, "name or ID is required")
            })?;
            DescribeRequest::with_filters(ctx.name_filters(name))
        };

        let Some(object) = find_single(
            ctx.cloud(),
            ResourceKind::InternetGateway,
            &request,
            Self::RESOURCE_TYPE,
        )
        .await?
        else {
            return Ok(None);
        };

        let mut actual = Self {
            name: find_name_tag(&object.tags),
            lifecycle: self.lifecycle,
            id: IdCell::with_id(object.id.clone()),
            vpc: object
                .attachments
                .last()
                .map(|vpc_id| Arc::new(Vpc::from_id(vpc_id))),
            shared: self.shared,
            tags: intersect_tags(&object.tags, &self.tags),
        };

        debug!("found matching InternetGateway {:?}", object.id);

        if self.shared {
            actual.name.clone_from(&self.name);
            actual.tags.clone_from(&self.tags);
        }

        self.id.set(object.id)?;

        Ok(Some(actual))
    }

    fn diff(&self, actual: Option<&Self>) -> Option<InternetGatewayChanges> {
        let Some(actual) = actual else {
            return Some(InternetGatewayChanges {
                name: self.name.clone(),
                vpc: self.vpc.clone(),
                tags: Some(self.tags.clone()),
            });
        };

        let mut changes = InternetGatewayChanges::default();

        if self.name.is_some() && self.name != actual.name {
            changes.name.clone_from(&self.name);
        }
        if self.vpc.is_some() && !compare_id(self.vpc.as_ref(), actual.vpc.as_ref()) {
            changes.vpc.clone_from(&self.vpc);
        }
        if self.tags != actual.tags {
            changes.tags = Some(self.tags.clone());
        }

        (!changes.is_empty()).then_some(changes)
    }

    fn describe_changes(
        &self,
        actual: Option<&Self>,
        changes: &InternetGatewayChanges,
    ) -> Vec<FieldChange> {
        let mut fields = Vec::new();

        if let Some(name) = &changes.name {
            fields.push(FieldChange::new(
                "Name",
                actual.and_then(|a| a.name.clone()),
                Some(name.clone()),
            ));
        }
        if let Some(vpc) = &changes.vpc {
            let new_value = vpc
                .id
                .get()
                .map(String::from)
                .or_else(|| vpc.name.clone().map(|n| format!("<VPC/{n}>")));
            fields.push(FieldChange::new(
                "VPC",
                actual.and_then(|a| vpc_id(a.vpc.as_ref())),
                new_value,
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

    fn check_changes(&self, actual: Option<&Self>, changes: &InternetGatewayChanges) -> Result<()> {
        if let Some(actual) = actual
            && actual.vpc.is_some()
            && changes.vpc.is_some()
        {
            return Err(ReconcileError::ImmutableField {
                resource_type: Self::RESOURCE_TYPE.to_string(),
                field: String::from("VPC"),
            }
            .into());
        }

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

        if actual.is_none() && !self.shared && self.vpc.is_none() {
            return Err(
                ReconcileError::configuration(Self::RESOURCE_TYPE, "VPC must be specified").into(),
            );
        }

        Ok(())
    }

    async fn render_live(
        &self,
        target: &LiveTarget,
        actual: Option<&Self>,
        changes: &InternetGatewayChanges,
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

        let created = actual.is_none();
        if created {
            info!("Creating InternetGateway");

            let request = CreateRequest::new(ResourceKind::InternetGateway)
                .with_tags(self.tags.clone());
            let id = target.create(&request, "creating InternetGateway").await?;
            self.id.set(id)?;
        }

        let id = self.id.get().ok_or_else(|| {
            ReconcileError::configuration(Self::RESOURCE_TYPE, "InternetGateway ID is not resolved")
        })?;

        if created || changes.vpc.is_some() {
            let vpc_id = vpc_id(self.vpc.as_ref()).ok_or_else(|| {
                ReconcileError::UnresolvedReference {
                    resource_type: Vpc::RESOURCE_TYPE.to_string(),
                    name: self
                        .vpc
                        .as_ref()
                        .map_or_else(|| String::from("<none>"), |v| v.display_name()),
                }
            })?;
            info!("Creating InternetGatewayAttachment");

            target
                .attach(
                    ResourceKind::InternetGateway,
                    &vpc_id,
                    id,
                    "attaching InternetGateway to VPC",
                )
                .await?;
        }

        target.add_tags(id, &self.tags).await
    }

    async fn render_terraform(
        &self,
        target: &mut TerraformTarget,
        _actual: Option<&Self>,
        _changes: &InternetGatewayChanges,
    ) -> Result<()> {
        if self.shared {
            if !self.id.is_set()
                && let Err(e) = self.discover_shared(target.cloud()).await
            {
                warn!("Unable to find shared InternetGateway: {e}");
            }
            return Ok(());
        }

        let name = self.name.as_deref().ok_or_else(|| TerraformError::MissingName {
            resource_type: Self::TERRAFORM_TYPE.to_string(),
        })?;

        let mut block = ResourceBlock::new(Self::TERRAFORM_TYPE, name);
        if let Some(vpc) = &self.vpc {
            block = block.field("vpc_id", vpc.terraform_link()?);
        }
        block = block.field("tags", TerraformValue::Map(self.tags.clone()));

        target.render_resource(block)
    }
}

impl Linkable for InternetGateway {
    const TERRAFORM_TYPE: &'static str = "aws_internet_gateway";

    fn terraform_link(&self) -> Result<Literal> {
        if self.shared {
            let id = self.id.get().ok_or_else(|| ReconcileError::UnresolvedReference {
                resource_type: Self::RESOURCE_TYPE.to_string(),
                name: self.display_name(),
            })?;
            debug!("reusing existing InternetGateway with id {id:?}");
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
    use crate::error::{ConvergeError, ProviderError};
    use crate::provider::{InMemoryCloud, ProviderResult, RecordedCall, RemoteObject};
    use crate::tasks::{NAME_TAG, PROJECT_TAG};
    use crate::terraform::TerraformFormat;
    use mockall::mock;

    mock! {
        Cloud {}

        #[async_trait]
        impl CloudProvider for Cloud {
            async fn describe(
                &self,
                kind: ResourceKind,
                request: &DescribeRequest,
            ) -> ProviderResult<Vec<RemoteObject>>;
            async fn create(&self, request: &CreateRequest) -> ProviderResult<String>;
            async fn attach(
                &self,
                kind: ResourceKind,
                parent_id: &str,
                child_id: &str,
            ) -> ProviderResult<()>;
            async fn tag(&self, id: &str, tags: &Tags) -> ProviderResult<()>;
            fn backend_type(&self) -> &'static str;
        }
    }

    fn managed_tags(name: &str) -> Tags {
        let mut tags = Tags::new();
        tags.insert(NAME_TAG.to_string(), name.to_string());
        tags.insert(PROJECT_TAG.to_string(), String::from("demo"));
        tags
    }

    fn managed_vpc(id: Option<&str>) -> Arc<Vpc> {
        let vpc = Vpc::new("main").with_cidr_block("10.0.0.0/16");
        if let Some(id) = id {
            vpc.id.set(id).expect("set failed");
        }
        Arc::new(vpc)
    }

    fn gateway_object(id: &str, vpc_id: Option<&str>) -> RemoteObject {
        let object = RemoteObject::new(ResourceKind::InternetGateway, id)
            .with_tag(NAME_TAG, "gw")
            .with_tag(PROJECT_TAG, "demo")
            .with_tag("foreign", "9");
        match vpc_id {
            Some(vpc_id) => object.with_attachment(vpc_id),
            None => object,
        }
    }

    fn context(cloud: &Arc<InMemoryCloud>) -> ReconcileContext {
        ReconcileContext::new(cloud.clone(), "demo")
    }

    fn desired_gateway(vpc: Arc<Vpc>) -> InternetGateway {
        InternetGateway::new("gw", vpc).with_tags(managed_tags("gw"))
    }

    #[tokio::test]
    async fn test_create_attach_tag_sequence() {
        let cloud = Arc::new(InMemoryCloud::with_objects(vec![RemoteObject::new(
            ResourceKind::Vpc,
            "vpc-1",
        )]));
        let target = LiveTarget::new(cloud.clone());
        let desired = desired_gateway(managed_vpc(Some("vpc-1")));

        let actual = desired.find(&context(&cloud)).await.expect("find failed");
        assert!(actual.is_none());

        let changes = desired.diff(None).expect("create carries all fields");
        desired.check_changes(None, &changes).expect("check failed");
        desired
            .render_live(&target, None, &changes)
            .await
            .expect("render failed");

        let id = desired.id.get().expect("id should be back-filled").to_string();
        assert_eq!(
            cloud.mutations(),
            vec![
                RecordedCall::Create {
                    kind: ResourceKind::InternetGateway,
                    id: id.clone()
                },
                RecordedCall::Attach {
                    kind: ResourceKind::InternetGateway,
                    parent_id: String::from("vpc-1"),
                    child_id: id.clone()
                },
                RecordedCall::Tag { id },
            ]
        );
    }

    #[tokio::test]
    async fn test_converged_gateway_has_no_changes() {
        let cloud = Arc::new(InMemoryCloud::with_objects(vec![gateway_object(
            "igw-1",
            Some("vpc-1"),
        )]));
        let desired = desired_gateway(managed_vpc(Some("vpc-1")));

        let actual = desired
            .find(&context(&cloud))
            .await
            .expect("find failed")
            .expect("gateway should be found");

        assert_eq!(desired.id.get(), Some("igw-1"));
        assert!(!actual.tags.contains_key("foreign"));
        assert!(desired.diff(Some(&actual)).is_none());
    }

    #[tokio::test]
    async fn test_ambiguous_lookup() {
        let cloud = Arc::new(InMemoryCloud::with_objects(vec![
            gateway_object("igw-1", Some("vpc-1")),
            gateway_object("igw-2", Some("vpc-1")),
        ]));
        let desired = desired_gateway(managed_vpc(Some("vpc-1")));

        let result = desired.find(&context(&cloud)).await;
        assert!(matches!(
            result,
            Err(ConvergeError::Reconcile(ReconcileError::AmbiguousResult { count: 2, .. }))
        ));
    }

    #[tokio::test]
    async fn test_shared_gateway_found_by_attachment() {
        let cloud = Arc::new(InMemoryCloud::with_objects(vec![
            gateway_object("igw-1", Some("vpc-other")),
            RemoteObject::new(ResourceKind::InternetGateway, "igw-ext").with_attachment("vpc-ext"),
        ]));
        let vpc = Arc::new(Vpc::new("external").shared_with_id("vpc-ext"));
        let desired = InternetGateway {
            name: Some(String::from("ext-gw")),
            vpc: Some(vpc),
            shared: true,
            tags: managed_tags("ext-gw"),
            ..InternetGateway::default()
        };

        let actual = desired
            .find(&context(&cloud))
            .await
            .expect("find failed")
            .expect("shared gateway should be found");

        assert_eq!(actual.id.get(), Some("igw-ext"));
        assert_eq!(actual.tags, desired.tags);
        assert!(desired.diff(Some(&actual)).is_none());

        let target = LiveTarget::new(cloud.clone());
        desired
            .render_live(&target, Some(&actual), &InternetGatewayChanges::default())
            .await
            .expect("render failed");
        assert!(cloud.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_shared_gateway_requires_vpc_id() {
        let cloud = Arc::new(InMemoryCloud::new());
        let desired = InternetGateway {
            vpc: Some(Arc::new(Vpc::new("unresolved"))),
            ..InternetGateway::default()
        }
        .shared();

        let result = desired.find(&context(&cloud)).await;
        assert!(matches!(
            result,
            Err(ConvergeError::Reconcile(ReconcileError::Configuration { .. }))
        ));
    }

    #[tokio::test]
    async fn test_missing_shared_gateway_fails_live_render() {
        let cloud = Arc::new(InMemoryCloud::new());
        let target = LiveTarget::new(cloud.clone());
        let desired = InternetGateway {
            vpc: Some(Arc::new(Vpc::new("external").shared_with_id("vpc-ext"))),
            ..InternetGateway::default()
        }
        .shared();

        let result = desired
            .render_live(&target, None, &InternetGatewayChanges::default())
            .await;
        assert!(matches!(
            result,
            Err(ConvergeError::Reconcile(ReconcileError::MissingSharedResource { .. }))
        ));
        assert!(cloud.mutations().is_empty());
    }

    #[test]
    fn test_vpc_change_rejected_for_attached_gateway() {
        let desired = desired_gateway(managed_vpc(Some("vpc-2")));
        let actual = InternetGateway {
            name: Some(String::from("gw")),
            id: IdCell::with_id("igw-1"),
            vpc: Some(Arc::new(Vpc::from_id("vpc-1"))),
            tags: managed_tags("gw"),
            ..InternetGateway::default()
        };

        let changes = desired.diff(Some(&actual)).expect("vpc should differ");
        assert!(changes.vpc.is_some());

        let result = desired.check_changes(Some(&actual), &changes);
        assert!(matches!(
            result,
            Err(ConvergeError::Reconcile(ReconcileError::ImmutableField { ref field, .. })) if field == "VPC"
        ));
    }

    #[tokio::test]
    async fn test_last_attachment_is_observed() {
        let cloud = Arc::new(InMemoryCloud::with_objects(vec![
            gateway_object("igw-1", Some("vpc-1")).with_attachment("vpc-2"),
        ]));
        let desired = desired_gateway(managed_vpc(Some("vpc-2")));

        let actual = desired
            .find(&context(&cloud))
            .await
            .expect("find failed")
            .expect("gateway should be found");

        assert_eq!(vpc_id(actual.vpc.as_ref()).as_deref(), Some("vpc-2"));
        assert!(desired.diff(Some(&actual)).is_none());
    }

    #[tokio::test]
    async fn test_declared_id_not_found_is_not_recreated() {
        let cloud = Arc::new(InMemoryCloud::with_objects(vec![RemoteObject::new(
            ResourceKind::Vpc,
            "vpc-1",
        )]));
        let desired = InternetGateway {
            id: IdCell::with_id("igw-stale"),
            ..desired_gateway(managed_vpc(Some("vpc-1")))
        };

        let actual = desired.find(&context(&cloud)).await.expect("find failed");
        assert!(actual.is_none());

        let changes = desired.diff(None).expect("create carries all fields");
        let result = desired.check_changes(None, &changes);
        assert!(matches!(
            result,
            Err(ConvergeError::Reconcile(ReconcileError::Configuration { ref message, .. }))
                if message.contains("igw-stale")
        ));
        assert!(cloud.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_detached_gateway_is_attached() {
        let cloud = Arc::new(InMemoryCloud::with_objects(vec![
            RemoteObject::new(ResourceKind::Vpc, "vpc-1"),
            gateway_object("igw-1", None),
        ]));
        let target = LiveTarget::new(cloud.clone());
        let desired = desired_gateway(managed_vpc(Some("vpc-1")));

        let actual = desired
            .find(&context(&cloud))
            .await
            .expect("find failed")
            .expect("gateway should be found");
        let changes = desired.diff(Some(&actual)).expect("attachment missing");
        desired
            .check_changes(Some(&actual), &changes)
            .expect("detached gateway may be attached");
        desired
            .render_live(&target, Some(&actual), &changes)
            .await
            .expect("render failed");

        assert_eq!(
            cloud.mutations(),
            vec![
                RecordedCall::Attach {
                    kind: ResourceKind::InternetGateway,
                    parent_id: String::from("vpc-1"),
                    child_id: String::from("igw-1")
                },
                RecordedCall::Tag {
                    id: String::from("igw-1")
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_provider_failure_is_wrapped() {
        let mut mock = MockCloud::new();
        mock.expect_create().returning(|_| {
            Err(ProviderError::ApiRequestFailed {
                status: 500,
                message: String::from("boom"),
            })
        });
        mock.expect_attach().never();
        mock.expect_tag().never();

        let target = LiveTarget::new(Arc::new(mock));
        let desired = desired_gateway(managed_vpc(Some("vpc-1")));
        let changes = desired.diff(None).expect("create carries all fields");

        let result = desired.render_live(&target, None, &changes).await;
        match result {
            Err(ConvergeError::Reconcile(ReconcileError::ProviderCall { operation, .. })) => {
                assert_eq!(operation, "creating InternetGateway");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(!desired.id.is_set());
    }

    #[tokio::test]
    async fn test_terraform_links_vpc_symbolically_even_when_id_known() {
        let cloud = Arc::new(InMemoryCloud::new());
        let mut target = TerraformTarget::new(cloud.clone());
        let desired = desired_gateway(managed_vpc(Some("vpc-1")));
        desired.id.set("igw-1").expect("set failed");

        let changes = desired.diff(None).unwrap_or_default();
        desired
            .render_terraform(&mut target, None, &changes)
            .await
            .expect("render failed");

        let block = target
            .writer()
            .get("aws_internet_gateway", "gw")
            .expect("block should be emitted");
        assert_eq!(
            block.get("vpc_id"),
            Some(&TerraformValue::Literal(Literal::property("aws_vpc", "main", "id")))
        );

        let hcl = target
            .writer()
            .render(TerraformFormat::Hcl)
            .expect("render failed");
        assert!(hcl.contains("vpc_id = aws_vpc.main.id"));
        assert!(cloud.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_terraform_shared_gateway_discovery_failure_is_warning() {
        let mut mock = MockCloud::new();
        mock.expect_describe()
            .returning(|_, _| Err(ProviderError::network("unreachable")));

        let mut target = TerraformTarget::new(Arc::new(mock));
        let desired = InternetGateway {
            vpc: Some(Arc::new(Vpc::new("external").shared_with_id("vpc-ext"))),
            ..InternetGateway::default()
        }
        .shared();

        desired
            .render_terraform(&mut target, None, &InternetGatewayChanges::default())
            .await
            .expect("discovery failure should not fail the render");

        assert!(!desired.id.is_set());
        assert!(target.writer().is_empty());
    }

    #[tokio::test]
    async fn test_terraform_shared_gateway_discovery_backfills_id() {
        let cloud = Arc::new(InMemoryCloud::with_objects(vec![
            RemoteObject::new(ResourceKind::InternetGateway, "igw-ext").with_attachment("vpc-ext"),
        ]));
        let mut target = TerraformTarget::new(cloud.clone());
        let desired = InternetGateway {
            vpc: Some(Arc::new(Vpc::new("external").shared_with_id("vpc-ext"))),
            ..InternetGateway::default()
        }
        .shared();

        desired
            .render_terraform(&mut target, None, &InternetGatewayChanges::default())
            .await
            .expect("render failed");

        assert_eq!(desired.id.get(), Some("igw-ext"));
        assert_eq!(
            desired.terraform_link().expect("link failed"),
            Literal::from_string_value("igw-ext")
        );
        assert!(target.writer().is_empty());
    }
}
