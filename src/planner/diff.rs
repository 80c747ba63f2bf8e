//! Field-level change descriptions.
//!
//! Tasks compute their own typed change sets; this module holds the
//! display form they are flattened into for plans and reports.

use serde::Serialize;

/// What a reconciliation does to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    /// Resource needs to be created.
    Create,
    /// Resource exists and needs to be updated.
    Update,
    /// Resource is unchanged.
    NoChange,
}

/// Detail about a single differing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    /// Field that differs.
    pub field: String,
    /// Observed value.
    pub old_value: Option<String>,
    /// Desired value.
    pub new_value: Option<String>,
}

impl FieldChange {
    /// Creates a field change.
    #[must_use]
    pub fn new(field: &str, old_value: Option<String>, new_value: Option<String>) -> Self {
        Self {
            field: field.to_string(),
            old_value,
            new_value,
        }
    }
}

impl ChangeAction {
    /// Derives the action from whether the object exists and whether it changed.
    #[must_use]
    pub const fn classify(exists: bool, changed: bool) -> Self {
        match (exists, changed) {
            (false, _) => Self::Create,
            (true, true) => Self::Update,
            (true, false) => Self::NoChange,
        }
    }
}

impl std::fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::NoChange => "no change",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for FieldChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} -> {}",
            self.field,
            self.old_value.as_deref().unwrap_or("<none>"),
            self.new_value.as_deref().unwrap_or("<none>")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(ChangeAction::classify(false, true), ChangeAction::Create);
        assert_eq!(ChangeAction::classify(false, false), ChangeAction::Create);
        assert_eq!(ChangeAction::classify(true, true), ChangeAction::Update);
        assert_eq!(ChangeAction::classify(true, false), ChangeAction::NoChange);
    }

    #[test]
    fn test_field_change_display() {
        let change = FieldChange::new("VPC", None, Some(String::from("vpc-1")));
        assert_eq!(change.to_string(), "VPC: <none> -> vpc-1");
    }
}
