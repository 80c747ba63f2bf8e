//! Declaration file types.
//!
//! This module defines the structs that map to the `converge.yaml` file.
//! They describe desired state only; identifiers discovered at run time
//! live on the task descriptors built from them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::tasks::Lifecycle;
use crate::terraform::TerraformFormat;

/// The root structure of a declaration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConvergeConfig {
    /// Project-level configuration.
    pub project: ProjectConfig,
    /// Provider backend configuration.
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Terraform output settings.
    #[serde(default)]
    pub terraform: TerraformConfig,
    /// Declared VPCs.
    #[serde(default)]
    pub vpcs: Vec<VpcConfig>,
    /// Declared internet gateways.
    #[serde(default)]
    pub internet_gateways: Vec<InternetGatewayConfig>,
}

/// Project-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Unique name for the project, written to every managed resource.
    pub name: String,
}

/// Provider backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Backend type.
    #[serde(default)]
    pub backend: ProviderBackend,
    /// Fixture file for the memory backend.
    #[serde(default = "default_fixture")]
    pub fixture: String,
    /// API endpoint for the HTTP backend.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Provider backend types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderBackend {
    /// Simulated cloud persisted to a JSON fixture.
    #[default]
    Memory,
    /// JSON-over-HTTP provider gateway.
    Http,
}

/// Terraform output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TerraformConfig {
    /// Directory the rendered file is written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Output format.
    #[serde(default)]
    pub format: TerraformFormat,
}

/// A declared VPC.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VpcConfig {
    /// Name, unique among VPCs.
    pub name: String,
    /// Known identifier. Required when shared.
    #[serde(default)]
    pub id: Option<String>,
    /// Primary CIDR block.
    #[serde(default)]
    pub cidr_block: Option<String>,
    /// Whether the VPC is externally owned.
    #[serde(default)]
    pub shared: bool,
    /// Lifecycle policy.
    #[serde(default)]
    pub lifecycle: Lifecycle,
    /// User tags, merged with the managed tags.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// A declared internet gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InternetGatewayConfig {
    /// Name, unique among gateways.
    pub name: String,
    /// Name of the VPC the gateway attaches to.
    pub vpc: String,
    /// Known identifier.
    #[serde(default)]
    pub id: Option<String>,
    /// Whether the gateway is externally owned.
    #[serde(default)]
    pub shared: bool,
    /// Lifecycle policy.
    #[serde(default)]
    pub lifecycle: Lifecycle,
    /// User tags, merged with the managed tags.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

fn default_fixture() -> String {
    String::from(".converge/cloud.json")
}

const fn default_timeout_secs() -> u64 {
    30
}

fn default_output_dir() -> String {
    String::from("terraform")
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            backend: ProviderBackend::default(),
            fixture: default_fixture(),
            endpoint: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for TerraformConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            format: TerraformFormat::default(),
        }
    }
}

impl ConvergeConfig {
    /// Finds a declared VPC by name.
    #[must_use]
    pub fn vpc(&self, name: &str) -> Option<&VpcConfig> {
        self.vpcs.iter().find(|v| v.name == name)
    }

    /// Returns the number of declared resources.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.vpcs.len() + self.internet_gateways.len()
    }
}
