//! Error types for the converge reconciliation engine.
//!
//! This module provides the error hierarchy for every stage of a run:
//! loading declarations, talking to the provider, reconciling a single
//! resource, and writing Terraform output.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the converge engine.
#[derive(Debug, Error)]
pub enum ConvergeError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Provider errors that were not attached to a reconciliation step.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Reconciliation errors.
    #[error("Reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// Terraform rendering errors.
    #[error("Terraform error: {0}")]
    Terraform(#[from] TerraformError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The declaration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The declaration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// Environment variable is missing.
    #[error("Missing environment variable: {name}")]
    MissingEnvVar {
        /// Name of the missing variable.
        name: String,
    },

    /// Duplicate resource definition.
    #[error("Duplicate {resource_type} name: {name}")]
    DuplicateName {
        /// Type of resource (vpc, internet gateway).
        resource_type: String,
        /// The duplicated name.
        name: String,
    },

    /// A declaration references a resource that is not declared.
    #[error("{resource} references unknown {resource_type} '{target}'")]
    UnknownReference {
        /// The declaring resource.
        resource: String,
        /// Type of the referenced resource.
        resource_type: String,
        /// Name of the missing target.
        target: String,
    },
}

/// Errors returned by a cloud provider collaborator.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// API request failed.
    #[error("API request failed: {status} - {message}")]
    ApiRequestFailed {
        /// HTTP-like status code.
        status: u16,
        /// Error message from the provider.
        message: String,
    },

    /// Rate limited.
    #[error("Provider rate limited, retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Network error.
    #[error("Network error communicating with provider: {message}")]
    NetworkError {
        /// Description of the network error.
        message: String,
    },

    /// Invalid response from the provider.
    #[error("Invalid response from provider: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },

    /// Remote object not found.
    #[error("Remote object not found: {id}")]
    NotFound {
        /// Identifier that was not found.
        id: String,
    },
}

/// Errors raised while reconciling a single resource.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The desired state is self-contradictory.
    #[error("Invalid {resource_type} declaration: {message}")]
    Configuration {
        /// Type of resource.
        resource_type: String,
        /// Description of the contradiction.
        message: String,
    },

    /// A remote query matched more than one object.
    #[error("Found {count} {resource_type} objects matching the query, expected at most one")]
    AmbiguousResult {
        /// Type of resource.
        resource_type: String,
        /// Number of matches.
        count: usize,
    },

    /// A shared resource does not exist remotely.
    #[error("Shared {resource_type} '{name}' was not found")]
    MissingSharedResource {
        /// Type of resource.
        resource_type: String,
        /// Name of the resource.
        name: String,
    },

    /// The change set modifies a field the provider cannot change in place.
    #[error("{resource_type}: cannot change field {field}")]
    ImmutableField {
        /// Type of resource.
        resource_type: String,
        /// Field that cannot be changed.
        field: String,
    },

    /// A provider call failed.
    #[error("error {operation}: {source}")]
    ProviderCall {
        /// Description of the attempted operation.
        operation: String,
        /// Underlying provider error.
        #[source]
        source: ProviderError,
    },

    /// A reference to a shared resource has no resolved identifier.
    #[error("{resource_type} '{name}' is shared but its ID is not resolved")]
    UnresolvedReference {
        /// Type of resource.
        resource_type: String,
        /// Name of the resource.
        name: String,
    },

    /// An identifier was assigned twice with different values.
    #[error("ID already assigned: {current} (attempted {attempted})")]
    IdAlreadyAssigned {
        /// The identifier already stored.
        current: String,
        /// The rejected identifier.
        attempted: String,
    },

    /// The resource lifecycle forbids the required action.
    #[error("Lifecycle violation for {resource}: {message}")]
    LifecycleViolation {
        /// Resource display name.
        resource: String,
        /// What the lifecycle rejected.
        message: String,
    },

    /// A resource was skipped because one of its dependencies failed.
    #[error("Skipped {resource}: dependency {dependency} failed")]
    DependencyFailed {
        /// Resource display name.
        resource: String,
        /// Failed dependency display name.
        dependency: String,
    },
}

/// Terraform rendering errors.
#[derive(Debug, Error)]
pub enum TerraformError {
    /// Two blocks were emitted under the same key.
    #[error("Duplicate Terraform resource {resource_type}.{name}")]
    DuplicateResource {
        /// Terraform resource type.
        resource_type: String,
        /// Resource name.
        name: String,
    },

    /// A managed resource has no name to key its block by.
    #[error("Terraform resource of type {resource_type} has no name")]
    MissingName {
        /// Terraform resource type.
        resource_type: String,
    },

    /// Serialization error.
    #[error("Terraform serialization error: {message}")]
    Serialization {
        /// Description of the serialization error.
        message: String,
    },
}

/// Result type alias for converge operations.
pub type Result<T> = std::result::Result<T, ConvergeError>;

impl ConvergeError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a validation error without a specific field.
    #[must_use]
    pub fn validation_general(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: None,
        }
    }
}

impl ProviderError {
    /// Creates an API request error.
    #[must_use]
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiRequestFailed {
            status,
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }

    /// Returns true if the provider client may retry this error.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::NetworkError { .. } => true,
            Self::ApiRequestFailed { status, .. } => *status >= 500,
            Self::InvalidResponse { .. } | Self::NotFound { .. } => false,
        }
    }
}

impl ReconcileError {
    /// Wraps a provider failure with the operation that was attempted.
    #[must_use]
    pub fn provider_call(operation: impl Into<String>, source: ProviderError) -> Self {
        Self::ProviderCall {
            operation: operation.into(),
            source,
        }
    }

    /// Creates a configuration error for a resource type.
    #[must_use]
    pub fn configuration(resource_type: &str, message: impl Into<String>) -> Self {
        Self::Configuration {
            resource_type: resource_type.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_call_message_names_operation() {
        let err = ReconcileError::provider_call(
            "creating InternetGateway",
            ProviderError::api_error(400, "quota exceeded"),
        );
        assert_eq!(
            err.to_string(),
            "error creating InternetGateway: API request failed: 400 - quota exceeded"
        );
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::RateLimited { retry_after_secs: 1 }.is_retryable());
        assert!(ProviderError::network("reset").is_retryable());
        assert!(ProviderError::api_error(503, "unavailable").is_retryable());
        assert!(!ProviderError::api_error(400, "bad request").is_retryable());
        assert!(!ProviderError::NotFound { id: String::from("igw-1") }.is_retryable());
    }
}
