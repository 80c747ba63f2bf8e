//! Single-assignment identifier cell.

use std::sync::OnceLock;

use crate::error::{ReconcileError, Result};

/// Provider-assigned identifier, set at most once.
///
/// Descriptors are shared through `Arc` handles in the declaration graph,
/// so back-filling the identifier goes through `&self`. A second
/// assignment of the same value is accepted; a different value is an
/// error.
#[derive(Debug, Clone, Default)]
pub struct IdCell(OnceLock<String>);

impl IdCell {
    /// Creates an unresolved cell.
    #[must_use]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Creates a cell that is already resolved.
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(id.into());
        Self(cell)
    }

    /// Gets the identifier, if resolved.
    #[must_use]
    pub fn get(&self) -> Option<&str> {
        self.0.get().map(String::as_str)
    }

    /// Returns true if the identifier is resolved.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.get().is_some()
    }

    /// Resolves the identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if a different identifier is already stored.
    pub fn set(&self, id: impl Into<String>) -> Result<()> {
        if let Err(attempted) = self.0.set(id.into()) {
            let current = self.get().unwrap_or_default();
            if current != attempted {
                return Err(ReconcileError::IdAlreadyAssigned {
                    current: current.to_string(),
                    attempted,
                }
                .into());
            }
        }
        Ok(())
    }
}
