//! Provider request and response types.
//!
//! These types describe the provider collaborator's surface in
//! provider-neutral terms: a describe request is a list of identifiers
//! and filters, a remote object is an identifier with tags, attachments
//! and a bag of string properties.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tag map applied to remote objects.
pub type Tags = BTreeMap<String, String>;

/// Kind of remote object.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// A virtual network.
    Vpc,
    /// An internet gateway attached to a virtual network.
    InternetGateway,
}

/// A single describe filter: the object matches if any value matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Filter {
    /// Filter name (`tag:<key>`, `attachment.vpc-id`, or a property name).
    pub name: String,
    /// Accepted values.
    pub values: Vec<String>,
}

/// Request to describe remote objects.
///
/// When `ids` is non-empty only those objects are considered; every filter
/// must then match.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DescribeRequest {
    /// Identifiers to restrict the query to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<String>,
    /// Filters, combined with AND.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
}

/// A raw remote object as returned by the provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteObject {
    /// Provider-assigned identifier.
    pub id: String,
    /// Object kind.
    pub kind: ResourceKind,
    /// Tags on the object.
    #[serde(default)]
    pub tags: Tags,
    /// Identifiers of parent objects this object is attached to.
    #[serde(default)]
    pub attachments: Vec<String>,
    /// Kind-specific properties (for example `cidr_block`).
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// Request to create a remote object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateRequest {
    /// Object kind.
    pub kind: ResourceKind,
    /// Tags applied atomically at creation.
    #[serde(default)]
    pub tags: Tags,
    /// Kind-specific properties.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// Filter name matching an object's attachments.
pub const ATTACHMENT_VPC_FILTER: &str = "attachment.vpc-id";

impl ResourceKind {
    /// Returns the wire name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vpc => "vpc",
            Self::InternetGateway => "internet_gateway",
        }
    }

    /// Returns the identifier prefix used for new objects of this kind.
    #[must_use]
    pub const fn id_prefix(self) -> &'static str {
        match self {
            Self::Vpc => "vpc",
            Self::InternetGateway => "igw",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Filter {
    /// Creates a filter with a single accepted value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
        }
    }

    /// Creates a `tag:<key>` filter.
    #[must_use]
    pub fn tag(key: &str, value: impl Into<String>) -> Self {
        Self::new(format!("tag:{key}"), value)
    }

    /// Checks whether a remote object satisfies this filter.
    #[must_use]
    pub fn matches(&self, object: &RemoteObject) -> bool {
        if let Some(key) = self.name.strip_prefix("tag:") {
            return object
                .tags
                .get(key)
                .is_some_and(|v| self.values.contains(v));
        }

        if self.name == ATTACHMENT_VPC_FILTER {
            return object
                .attachments
                .iter()
                .any(|a| self.values.contains(a));
        }

        object
            .properties
            .get(&self.name)
            .is_some_and(|v| self.values.contains(v))
    }
}

impl DescribeRequest {
    /// Creates a request restricted to the given identifiers.
    #[must_use]
    pub fn by_ids(ids: Vec<String>) -> Self {
        Self {
            ids,
            filters: Vec::new(),
        }
    }

    /// Creates a request matching the given filters.
    #[must_use]
    pub const fn with_filters(filters: Vec<Filter>) -> Self {
        Self {
            ids: Vec::new(),
            filters,
        }
    }

    /// Checks whether a remote object satisfies this request.
    #[must_use]
    pub fn matches(&self, object: &RemoteObject) -> bool {
        (self.ids.is_empty() || self.ids.contains(&object.id))
            && self.filters.iter().all(|f| f.matches(object))
    }
}

impl RemoteObject {
    /// Creates a remote object with no tags, attachments, or properties.
    #[must_use]
    pub fn new(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            tags: Tags::new(),
            attachments: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    /// Adds an attachment to a parent object.
    #[must_use]
    pub fn with_attachment(mut self, parent_id: &str) -> Self {
        self.attachments.push(parent_id.to_string());
        self
    }

    /// Sets a property.
    #[must_use]
    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }

    /// Gets a tag value.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Gets a property value.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

impl CreateRequest {
    /// Creates a request for a new object of the given kind.
    #[must_use]
    pub const fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            tags: Tags::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Sets the creation-time tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    /// Sets a property.
    #[must_use]
    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }
}
