//! Reconciliation plan types.
//!
//! A plan is the dry-run view of a reconciliation: one entry per declared
//! resource, with the action the engine would take and the fields that
//! differ.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::diff::{ChangeAction, FieldChange};

/// A complete reconciliation plan.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcilePlan {
    /// When the plan was created.
    pub created_at: DateTime<Utc>,
    /// Project the plan belongs to.
    pub project: String,
    /// Planned changes in execution order.
    pub changes: Vec<PlannedChange>,
}

/// The planned outcome for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedChange {
    /// Resource type (`VPC`, `InternetGateway`).
    pub resource_type: String,
    /// Resource name, or its identifier when unnamed.
    pub name: String,
    /// Action to take.
    pub action: ChangeAction,
    /// Differing fields.
    pub fields: Vec<FieldChange>,
}

impl ReconcilePlan {
    /// Creates a plan from planned changes.
    #[must_use]
    pub fn new(project: &str, changes: Vec<PlannedChange>) -> Self {
        Self {
            created_at: Utc::now(),
            project: project.to_string(),
            changes,
        }
    }

    /// Returns true if the plan changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes
            .iter()
            .all(|c| c.action == ChangeAction::NoChange)
    }

    /// Returns the number of resources that would be created.
    #[must_use]
    pub fn create_count(&self) -> usize {
        self.count(ChangeAction::Create)
    }

    /// Returns the number of resources that would be updated.
    #[must_use]
    pub fn update_count(&self) -> usize {
        self.count(ChangeAction::Update)
    }

    /// Returns the number of resources already converged.
    #[must_use]
    pub fn unchanged_count(&self) -> usize {
        self.count(ChangeAction::NoChange)
    }

    fn count(&self, action: ChangeAction) -> usize {
        self.changes.iter().filter(|c| c.action == action).count()
    }
}

impl PlannedChange {
    /// Returns a human-readable description of the change.
    #[must_use]
    pub fn description(&self) -> String {
        match self.action {
            ChangeAction::Create => format!("Create {} '{}'", self.resource_type, self.name),
            ChangeAction::Update => format!("Update {} '{}'", self.resource_type, self.name),
            ChangeAction::NoChange => {
                format!("No change for {} '{}'", self.resource_type, self.name)
            }
        }
    }
}

impl std::fmt::Display for PlannedChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())?;
        for field in &self.fields {
            write!(f, "\n      {field}")?;
        }
        Ok(())
    }
}

impl std::fmt::Display for ReconcilePlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "No changes required");
        }

        writeln!(
            f,
            "Reconcile Plan for {} ({} to create, {} to update):",
            self.project,
            self.create_count(),
            self.update_count()
        )?;
        for (i, change) in self
            .changes
            .iter()
            .filter(|c| c.action != ChangeAction::NoChange)
            .enumerate()
        {
            writeln!(f, "  {i}. {change}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(name: &str, action: ChangeAction) -> PlannedChange {
        PlannedChange {
            resource_type: String::from("InternetGateway"),
            name: name.to_string(),
            action,
            fields: vec![FieldChange::new("VPC", None, Some(String::from("vpc-1")))],
        }
    }

    #[test]
    fn test_counts() {
        let plan = ReconcilePlan::new(
            "demo",
            vec![
                change("a", ChangeAction::Create),
                change("b", ChangeAction::Update),
                change("c", ChangeAction::NoChange),
            ],
        );

        assert!(!plan.is_empty());
        assert_eq!(plan.create_count(), 1);
        assert_eq!(plan.update_count(), 1);
        assert_eq!(plan.unchanged_count(), 1);
    }

    #[test]
    fn test_converged_plan_is_empty() {
        let plan = ReconcilePlan::new("demo", vec![change("a", ChangeAction::NoChange)]);

        assert!(plan.is_empty());
        assert_eq!(plan.to_string(), "No changes required");
    }

    #[test]
    fn test_display_lists_fields() {
        let plan = ReconcilePlan::new("demo", vec![change("gw", ChangeAction::Create)]);
        let text = plan.to_string();

        assert!(text.contains("Create InternetGateway 'gw'"));
        assert!(text.contains("VPC: <none> -> vpc-1"));
    }
}
