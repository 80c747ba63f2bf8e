//! Declaration graph.
//!
//! The graph owns every desired descriptor for one run. References between
//! descriptors are shared `Arc` handles, so an identifier back-filled on a
//! VPC is visible to every gateway that points at it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

use crate::config::{ConvergeConfig, InternetGatewayConfig, VpcConfig};
use crate::error::{ConfigError, ReconcileError, Result};
use crate::provider::Tags;
use crate::tasks::{IdCell, InternetGateway, NAME_TAG, PROJECT_TAG, Task, Vpc};

/// Every desired descriptor of a project.
#[derive(Debug)]
pub struct DeclarationGraph {
    project: String,
    vpcs: Vec<Arc<Vpc>>,
    gateways: Vec<Arc<InternetGateway>>,
}

impl DeclarationGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new(project: &str) -> Self {
        Self {
            project: project.to_string(),
            vpcs: Vec::new(),
            gateways: Vec::new(),
        }
    }

    /// Builds the graph from a declaration.
    ///
    /// Managed descriptors get the `Name` and project tags.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate names or references to undeclared VPCs.
    pub fn from_config(config: &ConvergeConfig) -> Result<Self> {
        let project = config.project.name.as_str();
        let mut graph = Self::new(project);
        let mut by_name: HashMap<&str, Arc<Vpc>> = HashMap::new();

        for vpc_config in &config.vpcs {
            if by_name.contains_key(vpc_config.name.as_str()) {
                return Err(ConfigError::DuplicateName {
                    resource_type: Vpc::RESOURCE_TYPE.to_string(),
                    name: vpc_config.name.clone(),
                }
                .into());
            }

            let vpc = Arc::new(build_vpc(vpc_config, project));
            by_name.insert(vpc_config.name.as_str(), Arc::clone(&vpc));
            graph.vpcs.push(vpc);
        }

        let mut gateway_names = HashSet::new();
        for gateway_config in &config.internet_gateways {
            if !gateway_names.insert(gateway_config.name.as_str()) {
                return Err(ConfigError::DuplicateName {
                    resource_type: InternetGateway::RESOURCE_TYPE.to_string(),
                    name: gateway_config.name.clone(),
                }
                .into());
            }

            let vpc = by_name.get(gateway_config.vpc.as_str()).ok_or_else(|| {
                ConfigError::UnknownReference {
                    resource: format!("{}/{}", InternetGateway::RESOURCE_TYPE, gateway_config.name),
                    resource_type: Vpc::RESOURCE_TYPE.to_string(),
                    target: gateway_config.vpc.clone(),
                }
            })?;

            graph.gateways.push(Arc::new(build_gateway(
                gateway_config,
                Arc::clone(vpc),
                project,
            )));
        }

        debug!(
            "Built declaration graph with {} VPCs and {} internet gateways",
            graph.vpcs.len(),
            graph.gateways.len()
        );
        Ok(graph)
    }

    /// Adds an internet gateway.
    pub fn add_gateway(&mut self, gateway: Arc<InternetGateway>) {
        self.gateways.push(gateway);
    }

    /// Gets the project name.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Gets the VPCs in declaration order.
    #[must_use]
    pub fn vpcs(&self) -> &[Arc<Vpc>] {
        &self.vpcs
    }

    /// Gets the internet gateways in declaration order.
    #[must_use]
    pub fn gateways(&self) -> &[Arc<InternetGateway>] {
        &self.gateways
    }

    /// Returns the number of descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vpcs.len() + self.gateways.len()
    }

    /// Returns true if nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks that every shared reference can be resolved.
    ///
    /// Runs before any reconciliation so that a broken declaration fails
    /// without side effects.
    ///
    /// # Errors
    ///
    /// Returns the first integrity problem found.
    pub fn validate(&self) -> Result<()> {
        for vpc in &self.vpcs {
            if vpc.shared && !vpc.id.is_set() {
                return Err(ReconcileError::UnresolvedReference {
                    resource_type: Vpc::RESOURCE_TYPE.to_string(),
                    name: vpc.display_name(),
                }
                .into());
            }
        }

        for gateway in &self.gateways {
            let Some(vpc) = &gateway.vpc else {
                return Err(ReconcileError::configuration(
                    InternetGateway::RESOURCE_TYPE,
                    format!("{} must reference a VPC", gateway.display_name()),
                )
                .into());
            };

            if !self.vpcs.iter().any(|v| Arc::ptr_eq(v, vpc)) {
                return Err(ReconcileError::UnresolvedReference {
                    resource_type: Vpc::RESOURCE_TYPE.to_string(),
                    name: vpc.display_name(),
                }
                .into());
            }
        }

        Ok(())
    }
}

fn managed_tags(user_tags: &Tags, name: &str, project: &str, shared: bool) -> Tags {
    let mut tags = user_tags.clone();
    if !shared {
        tags.insert(NAME_TAG.to_string(), name.to_string());
        tags.insert(PROJECT_TAG.to_string(), project.to_string());
    }
    tags
}

fn build_vpc(config: &VpcConfig, project: &str) -> Vpc {
    Vpc {
        name: Some(config.name.clone()),
        lifecycle: config.lifecycle,
        id: config.id.as_deref().map_or_else(IdCell::new, IdCell::with_id),
        cidr_block: config.cidr_block.clone(),
        shared: config.shared,
        tags: managed_tags(&config.tags, &config.name, project, config.shared),
    }
}

fn build_gateway(config: &InternetGatewayConfig, vpc: Arc<Vpc>, project: &str) -> InternetGateway {
    InternetGateway {
        name: Some(config.name.clone()),
        lifecycle: config.lifecycle,
        id: config.id.as_deref().map_or_else(IdCell::new, IdCell::with_id),
        vpc: Some(vpc),
        shared: config.shared,
        tags: managed_tags(&config.tags, &config.name, project, config.shared),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigParser;
    use crate::error::ConvergeError;

    fn graph(yaml: &str) -> Result<DeclarationGraph> {
        let config = ConfigParser::new()
            .parse_yaml(yaml, None)
            .expect("parse failed");
        DeclarationGraph::from_config(&config)
    }

    #[test]
    fn test_gateway_shares_vpc_handle() {
        let graph = graph(
            r"
project:
  name: demo
vpcs:
  - name: main
    cidr_block: 10.0.0.0/16
internet_gateways:
  - name: gw
    vpc: main
    tags:
      env: dev
",
        )
        .expect("graph failed");

        let vpc = &graph.vpcs()[0];
        let gateway = &graph.gateways()[0];
        assert!(Arc::ptr_eq(vpc, gateway.vpc.as_ref().expect("vpc reference")));

        vpc.id.set("vpc-1").expect("set failed");
        assert_eq!(gateway.vpc.as_ref().and_then(|v| v.id.get()), Some("vpc-1"));

        assert_eq!(gateway.tags.get(NAME_TAG).map(String::as_str), Some("gw"));
        assert_eq!(gateway.tags.get(PROJECT_TAG).map(String::as_str), Some("demo"));
        assert_eq!(gateway.tags.get("env").map(String::as_str), Some("dev"));
        graph.validate().expect("graph should be valid");
    }

    #[test]
    fn test_shared_resources_get_no_managed_tags() {
        let graph = graph(
            r"
project:
  name: demo
vpcs:
  - name: external
    shared: true
    id: vpc-123
",
        )
        .expect("graph failed");

        let vpc = &graph.vpcs()[0];
        assert!(vpc.tags.is_empty());
        assert_eq!(vpc.id.get(), Some("vpc-123"));
    }

    #[test]
    fn test_unknown_reference() {
        let result = graph(
            r"
project:
  name: demo
internet_gateways:
  - name: gw
    vpc: missing
",
        );

        assert!(matches!(
            result,
            Err(ConvergeError::Config(ConfigError::UnknownReference { ref target, .. })) if target == "missing"
        ));
    }

    #[test]
    fn test_duplicate_name() {
        let result = graph(
            r"
project:
  name: demo
vpcs:
  - name: main
    cidr_block: 10.0.0.0/16
  - name: main
    cidr_block: 10.1.0.0/16
",
        );

        assert!(matches!(
            result,
            Err(ConvergeError::Config(ConfigError::DuplicateName { .. }))
        ));
    }

    #[test]
    fn test_validate_rejects_shared_vpc_without_id() {
        let result = graph(
            r"
project:
  name: demo
vpcs:
  - name: external
    shared: true
",
        )
        .expect("graph failed")
        .validate();

        assert!(matches!(
            result,
            Err(ConvergeError::Reconcile(ReconcileError::UnresolvedReference { .. }))
        ));
    }

    #[test]
    fn test_validate_rejects_gateway_without_vpc() {
        let mut graph = DeclarationGraph::new("demo");
        graph.add_gateway(Arc::new(InternetGateway {
            name: Some(String::from("gw")),
            ..InternetGateway::default()
        }));

        assert!(matches!(
            graph.validate(),
            Err(ConvergeError::Reconcile(ReconcileError::Configuration { .. }))
        ));
    }

    #[test]
    fn test_validate_rejects_reference_outside_graph() {
        let mut graph = DeclarationGraph::new("demo");
        graph.add_gateway(Arc::new(InternetGateway::new(
            "gw",
            Arc::new(Vpc::new("orphan")),
        )));

        assert!(matches!(
            graph.validate(),
            Err(ConvergeError::Reconcile(ReconcileError::UnresolvedReference { .. }))
        ));
    }
}
