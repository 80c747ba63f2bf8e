//! Reconciler for converging declared resources.
//!
//! [`run_task`] drives a single descriptor through observe, diff, validate,
//! lifecycle gate and render. [`Reconciler`] walks a whole
//! [`DeclarationGraph`] in dependency order on top of it.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{ConvergeError, ReconcileError, Result};
use crate::graph::DeclarationGraph;
use crate::planner::{ChangeAction, FieldChange, PlannedChange, ReconcilePlan};
use crate::target::Target;
use crate::tasks::{Lifecycle, ReconcileContext, Task, Vpc};

/// Outcome of running one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Changes were applied against the provider.
    Applied,
    /// The resource already matched; nothing was called.
    Unchanged,
    /// Changes were computed but not applied.
    Planned,
    /// A Terraform block was emitted.
    Emitted,
    /// The resource was not looked at.
    Ignored,
    /// Differences were logged instead of applied.
    Warned,
}

/// Report for one task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    /// What the engine decided.
    #[serde(flatten)]
    pub change: PlannedChange,
    /// What the engine did.
    pub status: TaskStatus,
    /// Resolved identifier after the run.
    pub id: Option<String>,
}

/// Result of a reconciliation run.
#[derive(Debug, Serialize)]
pub struct ReconciliationResult {
    /// Whether every resource converged.
    pub success: bool,
    /// Target the run rendered into.
    pub target: &'static str,
    /// Reports for every resource that ran.
    pub reports: Vec<TaskReport>,
    /// Resources skipped because a dependency failed.
    pub skipped: Vec<String>,
    /// Errors encountered.
    pub errors: Vec<String>,
}

/// Reconciles every descriptor of a declaration graph.
#[derive(Debug)]
pub struct Reconciler<'a> {
    /// Declaration graph.
    graph: &'a DeclarationGraph,
    /// Provider and project handle.
    ctx: ReconcileContext,
    /// Stop at the first failure.
    fail_fast: bool,
}

/// Runs one task against a target.
///
/// # Errors
///
/// Returns an error if observation fails, the change set is rejected, the
/// lifecycle policy is violated, or rendering fails.
pub async fn run_task<T: Task>(
    task: &T,
    ctx: &ReconcileContext,
    target: &mut Target,
) -> Result<TaskReport> {
    let display_name = task.display_name();

    if task.lifecycle() == Lifecycle::Ignore {
        info!("Skipping {display_name}: lifecycle is Ignore");
        return Ok(report(task, ChangeAction::NoChange, Vec::new(), TaskStatus::Ignored));
    }

    debug!("Reconciling {display_name}");

    // Terraform output never depends on a shared object being found, so a
    // failed lookup only degrades to a warning there.
    let actual = match (task.find(ctx).await, &*target) {
        (Ok(actual), _) => actual,
        (Err(err), Target::Terraform(_)) if task.is_shared() => {
            warn!("Unable to find shared {display_name}: {err}");
            None
        }
        (Err(err), _) => return Err(err),
    };
    let changes = task.diff(actual.as_ref());
    let action = ChangeAction::classify(actual.is_some(), changes.is_some());
    let fields = changes
        .as_ref()
        .map(|c| task.describe_changes(actual.as_ref(), c))
        .unwrap_or_default();

    if let Some(changes) = &changes {
        task.check_changes(actual.as_ref(), changes)?;
    }

    match (task.lifecycle(), action) {
        (Lifecycle::ExistsAndValidates, ChangeAction::Create) => {
            return Err(ReconcileError::LifecycleViolation {
                resource: display_name,
                message: String::from("resource does not exist"),
            }
            .into());
        }
        (Lifecycle::ExistsAndValidates, ChangeAction::Update) => {
            return Err(ReconcileError::LifecycleViolation {
                resource: display_name,
                message: format!("resource differs: {}", join_fields(&fields)),
            }
            .into());
        }
        (Lifecycle::ExistsAndWarnIfChanges, ChangeAction::Create) => {
            warn!("{display_name} does not exist");
            return Ok(report(task, action, fields, TaskStatus::Warned));
        }
        (Lifecycle::ExistsAndWarnIfChanges, ChangeAction::Update) => {
            warn!("{display_name} differs: {}", join_fields(&fields));
            return Ok(report(task, action, fields, TaskStatus::Warned));
        }
        _ => {}
    }

    let status = match target {
        Target::Live(live) => {
            if action == ChangeAction::NoChange {
                debug!("{display_name} is up to date");
                TaskStatus::Unchanged
            } else {
                info!("Applying {action} to {display_name}");
                task.render_live(live, actual.as_ref(), &changes.unwrap_or_default())
                    .await?;
                TaskStatus::Applied
            }
        }
        Target::Terraform(terraform) => {
            task.render_terraform(terraform, actual.as_ref(), &changes.unwrap_or_default())
                .await?;
            TaskStatus::Emitted
        }
        Target::DryRun => TaskStatus::Planned,
    };

    Ok(report(task, action, fields, status))
}

fn report<T: Task>(
    task: &T,
    action: ChangeAction,
    fields: Vec<FieldChange>,
    status: TaskStatus,
) -> TaskReport {
    TaskReport {
        change: PlannedChange {
            resource_type: T::RESOURCE_TYPE.to_string(),
            name: task
                .name()
                .or_else(|| task.id())
                .unwrap_or_default()
                .to_string(),
            action,
            fields,
        },
        status,
        id: task.id().map(String::from),
    }
}

fn join_fields(fields: &[FieldChange]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl<'a> Reconciler<'a> {
    /// Creates a new reconciler.
    #[must_use]
    pub const fn new(graph: &'a DeclarationGraph, ctx: ReconcileContext) -> Self {
        Self {
            graph,
            ctx,
            fail_fast: false,
        }
    }

    /// Stops at the first failure instead of continuing with independent resources.
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Reconciles every descriptor: VPCs first, then internet gateways.
    ///
    /// A failing resource does not stop independent ones; gateways whose
    /// VPC failed are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph is invalid, or on the first failure
    /// when fail-fast is enabled.
    pub async fn reconcile(&self, target: &mut Target) -> Result<ReconciliationResult> {
        info!(
            "Starting reconciliation of {} resources for {} ({})",
            self.graph.len(),
            self.graph.project(),
            target.name()
        );

        self.graph.validate()?;

        let mut result = ReconciliationResult {
            success: true,
            target: target.name(),
            reports: Vec::new(),
            skipped: Vec::new(),
            errors: Vec::new(),
        };
        let mut failed_vpcs: Vec<Arc<Vpc>> = Vec::new();

        for vpc in self.graph.vpcs() {
            match run_task(vpc.as_ref(), &self.ctx, target).await {
                Ok(report) => result.reports.push(report),
                Err(err) => {
                    self.record_failure(&mut result, vpc.display_name(), err)?;
                    failed_vpcs.push(Arc::clone(vpc));
                }
            }
        }

        for gateway in self.graph.gateways() {
            let failed_dependency = gateway
                .vpc
                .as_ref()
                .filter(|vpc| failed_vpcs.iter().any(|f| Arc::ptr_eq(f, vpc)));

            if let Some(vpc) = failed_dependency {
                let err = ReconcileError::DependencyFailed {
                    resource: gateway.display_name(),
                    dependency: vpc.display_name(),
                };
                warn!("{err}");
                result.skipped.push(gateway.display_name());
                result.errors.push(err.to_string());
                result.success = false;
                continue;
            }

            match run_task(gateway.as_ref(), &self.ctx, target).await {
                Ok(report) => result.reports.push(report),
                Err(err) => self.record_failure(&mut result, gateway.display_name(), err)?,
            }
        }

        if result.success {
            info!("Reconciliation finished: {}", result.summary());
        } else {
            error!(
                "Reconciliation finished with {} errors: {}",
                result.errors.len(),
                result.summary()
            );
        }

        Ok(result)
    }

    fn record_failure(
        &self,
        result: &mut ReconciliationResult,
        resource: String,
        err: ConvergeError,
    ) -> Result<()> {
        error!("Failed to reconcile {resource}: {err}");
        if self.fail_fast {
            return Err(err);
        }
        result.errors.push(format!("{resource}: {err}"));
        result.success = false;
        Ok(())
    }
}

impl ReconciliationResult {
    /// Returns the number of reports with the given action.
    #[must_use]
    pub fn count(&self, action: ChangeAction) -> usize {
        self.reports
            .iter()
            .filter(|r| r.change.action == action && r.status != TaskStatus::Ignored)
            .count()
    }

    /// Returns the number of reports with the given status.
    #[must_use]
    pub fn count_status(&self, status: TaskStatus) -> usize {
        self.reports.iter().filter(|r| r.status == status).count()
    }

    /// Builds the plan view of this run.
    #[must_use]
    pub fn plan(&self, project: &str) -> ReconcilePlan {
        ReconcilePlan::new(
            project,
            self.reports
                .iter()
                .filter(|r| r.status != TaskStatus::Ignored)
                .map(|r| r.change.clone())
                .collect(),
        )
    }

    /// Gets the report for a resource.
    #[must_use]
    pub fn report(&self, resource_type: &str, name: &str) -> Option<&TaskReport> {
        self.reports
            .iter()
            .find(|r| r.change.resource_type == resource_type && r.change.name == name)
    }

    /// One-line summary of the counts.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} to create, {} to update, {} unchanged, {} failed, {} skipped",
            self.count(ChangeAction::Create),
            self.count(ChangeAction::Update),
            self.count(ChangeAction::NoChange),
            self.errors.len() - self.skipped.len(),
            self.skipped.len()
        )
    }
}

impl std::fmt::Display for ReconciliationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = if self.success { "successful" } else { "failed" };
        writeln!(f, "Reconciliation {status} ({}):", self.target)?;
        writeln!(f, "  Created: {}", self.count(ChangeAction::Create))?;
        writeln!(f, "  Updated: {}", self.count(ChangeAction::Update))?;
        writeln!(f, "  Unchanged: {}", self.count(ChangeAction::NoChange))?;

        if !self.skipped.is_empty() {
            writeln!(f, "  Skipped:")?;
            for resource in &self.skipped {
                writeln!(f, "    - {resource}")?;
            }
        }

        if !self.errors.is_empty() {
            writeln!(f, "  Errors:")?;
            for error in &self.errors {
                writeln!(f, "    - {error}")?;
            }
        }

        Ok(())
    }
}
