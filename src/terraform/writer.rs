//! Terraform resource collection and rendering.
//!
//! Tasks emit resource blocks in whatever order the reconciler visits them;
//! the writer keys them by type and name and renders a deterministic file.
//! Deferred references are only turned into text here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::error::{Result, TerraformError};

use super::literal::{Literal, TerraformValue};

/// Header written at the top of generated HCL.
const HCL_HEADER: &str = "# Generated by converge. Do not edit by hand.\n";

/// Minimum Terraform version the output targets.
const REQUIRED_VERSION: &str = ">= 0.15.0";

/// AWS provider source.
const AWS_PROVIDER_SOURCE: &str = "hashicorp/aws";

/// Output syntax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerraformFormat {
    /// HCL (`main.tf`).
    #[default]
    Hcl,
    /// Terraform JSON syntax (`main.tf.json`).
    Json,
}

/// A single emitted resource block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBlock {
    /// Terraform resource type.
    pub resource_type: String,
    /// Resource name, before sanitizing.
    pub name: String,
    /// Fields in emission order.
    pub fields: Vec<(String, TerraformValue)>,
}

/// Collects resource blocks and renders them.
#[derive(Debug, Default)]
pub struct TerraformWriter {
    blocks: BTreeMap<(String, String), ResourceBlock>,
}

impl ResourceBlock {
    /// Creates an empty block.
    #[must_use]
    pub fn new(resource_type: &str, name: &str) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            fields: Vec::new(),
        }
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, key: &str, value: impl Into<TerraformValue>) -> Self {
        self.fields.push((key.to_string(), value.into()));
        self
    }

    /// Gets a field by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&TerraformValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl TerraformFormat {
    /// Returns the file name used for this format.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Hcl => "main.tf",
            Self::Json => "main.tf.json",
        }
    }
}

impl TerraformWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resource block.
    ///
    /// # Errors
    ///
    /// Returns an error if a block with the same type and name was already emitted.
    pub fn emit(&mut self, block: ResourceBlock) -> Result<()> {
        let key = (block.resource_type.clone(), sanitize_name(&block.name));

        if self.blocks.contains_key(&key) {
            return Err(TerraformError::DuplicateResource {
                resource_type: block.resource_type,
                name: block.name,
            }
            .into());
        }

        debug!("Emitting {}.{}", key.0, key.1);
        self.blocks.insert(key, block);
        Ok(())
    }

    /// Gets an emitted block.
    #[must_use]
    pub fn get(&self, resource_type: &str, name: &str) -> Option<&ResourceBlock> {
        self.blocks
            .get(&(resource_type.to_string(), sanitize_name(name)))
    }

    /// Returns the number of emitted blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns true if nothing was emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Renders all blocks in the requested format.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render(&self, format: TerraformFormat) -> Result<String> {
        match format {
            TerraformFormat::Hcl => Ok(self.render_hcl()),
            TerraformFormat::Json => self.render_json(),
        }
    }

    /// Renders all blocks as HCL.
    #[must_use]
    pub fn render_hcl(&self) -> String {
        let mut output = String::from(HCL_HEADER);

        let _ = write!(
            output,
            "\nterraform {{\n  required_version = {}\n  required_providers {{\n    aws = {{\n      \"source\" = {}\n    }}\n  }}\n}}\n",
            hcl_string(REQUIRED_VERSION),
            hcl_string(AWS_PROVIDER_SOURCE)
        );

        for block in self.blocks.values() {
            let _ = write!(
                output,
                "\nresource {} {} {{\n",
                hcl_string(&block.resource_type),
                hcl_string(&sanitize_name(&block.name))
            );

            for (key, value) in &block.fields {
                match value {
                    TerraformValue::Map(map) => {
                        let _ = writeln!(output, "  {key} = {{");
                        for (k, v) in map {
                            let _ = writeln!(output, "    {} = {}", hcl_string(k), hcl_string(v));
                        }
                        output.push_str("  }\n");
                    }
                    other => {
                        let _ = writeln!(output, "  {key} = {}", hcl_scalar(other));
                    }
                }
            }

            output.push_str("}\n");
        }

        output
    }

    /// Renders all blocks as Terraform JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_json(&self) -> Result<String> {
        let mut resources: Map<String, Value> = Map::new();

        for ((resource_type, name), block) in &self.blocks {
            let fields: Map<String, Value> = block
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), json_value(v)))
                .collect();

            let by_name = resources
                .entry(resource_type.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(by_name) = by_name {
                by_name.insert(name.clone(), Value::Object(fields));
            }
        }

        let document = json!({
            "terraform": {
                "required_version": REQUIRED_VERSION,
                "required_providers": {
                    "aws": { "source": AWS_PROVIDER_SOURCE }
                }
            },
            "resource": resources,
        });

        serde_json::to_string_pretty(&document).map_err(|e| {
            TerraformError::Serialization {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Writes the rendered output into a directory and returns the file path.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails or the file cannot be written.
    pub async fn write_to_dir(&self, dir: impl AsRef<Path>, format: TerraformFormat) -> Result<PathBuf> {
        let dir = dir.as_ref();
        let content = self.render(format)?;

        fs::create_dir_all(dir).await?;
        let path = dir.join(format.file_name());
        fs::write(&path, content).await?;

        info!("Wrote {} Terraform resources to {}", self.len(), path.display());
        Ok(path)
    }
}

/// Makes a name usable as a Terraform resource label.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '-' })
        .collect();

    if sanitized.is_empty() || sanitized.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
        sanitized.insert(0, '_');
    }
    sanitized
}

/// Renders the textual form of a deferred reference.
fn property_path(resource_type: &str, name: &str, attribute: &str) -> String {
    format!("{resource_type}.{}.{attribute}", sanitize_name(name))
}

fn hcl_string(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace("${", "$${");
    format!("\"{escaped}\"")
}

fn hcl_scalar(value: &TerraformValue) -> String {
    match value {
        TerraformValue::Literal(Literal::Value(v)) | TerraformValue::String(v) => hcl_string(v),
        TerraformValue::Literal(Literal::Property {
            resource_type,
            name,
            attribute,
        }) => property_path(resource_type, name, attribute),
        TerraformValue::Map(_) => String::from("{}"),
    }
}

fn json_value(value: &TerraformValue) -> Value {
    match value {
        TerraformValue::Literal(Literal::Value(v)) | TerraformValue::String(v) => {
            Value::String(v.clone())
        }
        TerraformValue::Literal(Literal::Property {
            resource_type,
            name,
            attribute,
        }) => Value::String(format!(
            "${{{}}}",
            property_path(resource_type, name, attribute)
        )),
        TerraformValue::Map(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        ),
    }
}
