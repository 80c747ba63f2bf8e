//! Cloud provider collaborator.
//!
//! The engine only needs four capabilities from a provider: describe,
//! create, attach, and tag. Retries and rate limiting belong to the
//! implementations, never to the reconciliation core.

mod client;
mod memory;
mod types;

use async_trait::async_trait;

use crate::error::ProviderError;

pub use client::HttpCloud;
pub use memory::{CloudFixture, InMemoryCloud, RecordedCall};
pub use types::{
    ATTACHMENT_VPC_FILTER, CreateRequest, DescribeRequest, Filter, RemoteObject, ResourceKind,
    Tags,
};

/// Result type for provider calls.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Interface to a remote cloud provider.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Lists remote objects of a kind that match the request.
    async fn describe(
        &self,
        kind: ResourceKind,
        request: &DescribeRequest,
    ) -> ProviderResult<Vec<RemoteObject>>;

    /// Creates a remote object and returns its identifier.
    async fn create(&self, request: &CreateRequest) -> ProviderResult<String>;

    /// Attaches a child object to a parent object.
    async fn attach(&self, kind: ResourceKind, parent_id: &str, child_id: &str)
    -> ProviderResult<()>;

    /// Adds or overwrites tags on a remote object. Tags not listed are kept.
    async fn tag(&self, id: &str, tags: &Tags) -> ProviderResult<()>;

    /// Gets the backend name, for logs.
    fn backend_type(&self) -> &'static str;
}
