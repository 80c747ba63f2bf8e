//! Planning types for reconciliation runs.
//!
//! Tasks flatten their typed change sets into [`FieldChange`] rows; a
//! [`ReconcilePlan`] gathers those rows for display before anything is
//! applied.

mod diff;
mod plan;

pub use diff::{ChangeAction, FieldChange};
pub use plan::{PlannedChange, ReconcilePlan};
