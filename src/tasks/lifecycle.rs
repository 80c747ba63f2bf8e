//! Resource lifecycle policy.

use serde::{Deserialize, Serialize};

/// How aggressively the engine may mutate a resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Lifecycle {
    /// Create and update the resource to match the declaration.
    #[default]
    Sync,
    /// Do not look at the resource at all.
    Ignore,
    /// The resource must exist and match; any difference is an error.
    ExistsAndValidates,
    /// The resource should exist and match; differences are only logged.
    ExistsAndWarnIfChanges,
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Sync => "Sync",
            Self::Ignore => "Ignore",
            Self::ExistsAndValidates => "ExistsAndValidates",
            Self::ExistsAndWarnIfChanges => "ExistsAndWarnIfChanges",
        };
        write!(f, "{s}")
    }
}
