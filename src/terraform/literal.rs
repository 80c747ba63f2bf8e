//! Terraform values and deferred references.

use std::collections::BTreeMap;

/// A value that is either known now or resolved by Terraform at apply time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// A concrete, already-resolved value.
    Value(String),
    /// A reference to another resource's attribute.
    Property {
        /// Terraform resource type (`aws_vpc`).
        resource_type: String,
        /// Resource name.
        name: String,
        /// Attribute to read (`id`).
        attribute: String,
    },
}

/// A field value in an emitted resource block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerraformValue {
    /// A literal or deferred reference.
    Literal(Literal),
    /// A plain string.
    String(String),
    /// A string map, such as tags.
    Map(BTreeMap<String, String>),
}

impl Literal {
    /// Creates a literal wrapping a resolved value.
    #[must_use]
    pub fn from_string_value(value: impl Into<String>) -> Self {
        Self::Value(value.into())
    }

    /// Creates a deferred property reference.
    #[must_use]
    pub fn property(resource_type: &str, name: &str, attribute: &str) -> Self {
        Self::Property {
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            attribute: attribute.to_string(),
        }
    }
}

impl From<Literal> for TerraformValue {
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}
