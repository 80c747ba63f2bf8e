//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use std::fmt::Write;
use std::path::Path;
use tabled::{Table, Tabled};

use crate::planner::{ChangeAction, ReconcilePlan};
use crate::reconciler::{ReconciliationResult, TaskStatus};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Plan row for table display.
#[derive(Tabled)]
struct PlanChangeRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Type")]
    resource_type: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Fields")]
    fields: String,
}

/// Apply row for table display.
#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Type")]
    resource_type: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "ID")]
    id: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a plan for display.
    #[must_use]
    pub fn format_plan(&self, plan: &ReconcilePlan, detailed: bool) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(plan).unwrap_or_default(),
            OutputFormat::Text => Self::format_plan_text(plan, detailed),
        }
    }

    /// Formats a plan as text.
    fn format_plan_text(plan: &ReconcilePlan, detailed: bool) -> String {
        if plan.is_empty() {
            return format!(
                "{} No changes required - infrastructure is up to date.\n",
                "✓".green()
            );
        }

        let mut output = String::new();

        let _ = write!(output, "\nReconcile Plan: {}\n", plan.project);
        let _ = write!(
            output,
            "   Created at: {}\n\n",
            plan.created_at.format("%Y-%m-%d %H:%M:%S")
        );

        let changes: Vec<_> = plan
            .changes
            .iter()
            .filter(|c| c.action != ChangeAction::NoChange)
            .collect();

        let rows: Vec<PlanChangeRow> = changes
            .iter()
            .enumerate()
            .map(|(i, c)| PlanChangeRow {
                index: i + 1,
                action: Self::format_action(c.action),
                resource_type: c.resource_type.clone(),
                name: c.name.clone(),
                fields: Self::truncate(
                    &c.fields
                        .iter()
                        .map(|f| f.field.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                    40,
                ),
            })
            .collect();

        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        if detailed {
            output.push_str("\nDetailed changes:\n");
            for change in &changes {
                let _ = writeln!(output, "   {} {}/{}", change.action, change.resource_type, change.name);
                for field in &change.fields {
                    let _ = writeln!(output, "      {field}");
                }
            }
        }

        let _ = write!(
            output,
            "\nPlan: {} to create, {} to update, {} unchanged\n",
            plan.create_count().to_string().green(),
            plan.update_count().to_string().yellow(),
            plan.unchanged_count()
        );

        output
    }

    /// Formats a reconciliation result.
    #[must_use]
    pub fn format_reconciliation(&self, result: &ReconciliationResult) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(result).unwrap_or_default(),
            OutputFormat::Text => {
                let status = if result.success {
                    format!("{} Reconciliation successful", "✓".green())
                } else {
                    format!("{} Reconciliation failed", "✗".red())
                };

                let mut output = format!("{status}\n\n");

                if !result.reports.is_empty() {
                    let rows: Vec<ReportRow> = result
                        .reports
                        .iter()
                        .map(|r| ReportRow {
                            resource_type: r.change.resource_type.clone(),
                            name: r.change.name.clone(),
                            action: Self::format_action(r.change.action),
                            status: Self::format_status(r.status),
                            id: r.id.clone().unwrap_or_else(|| String::from("-")),
                        })
                        .collect();
                    output.push_str(&Table::new(rows).to_string());
                    output.push('\n');
                }

                let _ = writeln!(output, "\n   {}", result.summary());

                if !result.errors.is_empty() {
                    let _ = write!(output, "\n{} Errors:\n", "⚠".yellow());
                    for error in &result.errors {
                        let _ = writeln!(output, "   - {error}");
                    }
                }

                output
            }
        }
    }

    /// Formats the outcome of writing Terraform output.
    #[must_use]
    pub fn format_terraform(&self, path: &Path, resources: usize) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                "path": path.display().to_string(),
                "resources": resources,
            }))
            .unwrap_or_default(),
            OutputFormat::Text => format!(
                "{} Wrote {resources} resources to {}\n",
                "✓".green(),
                path.display()
            ),
        }
    }

    /// Formats a change action with color.
    fn format_action(action: ChangeAction) -> String {
        match action {
            ChangeAction::Create => "+create".green().to_string(),
            ChangeAction::Update => "~update".yellow().to_string(),
            ChangeAction::NoChange => "no change".dimmed().to_string(),
        }
    }

    /// Formats a task status with color.
    fn format_status(status: TaskStatus) -> String {
        match status {
            TaskStatus::Applied => "applied".green().to_string(),
            TaskStatus::Unchanged => "unchanged".dimmed().to_string(),
            TaskStatus::Planned => "planned".cyan().to_string(),
            TaskStatus::Emitted => "emitted".cyan().to_string(),
            TaskStatus::Ignored => "ignored".dimmed().to_string(),
            TaskStatus::Warned => "warned".yellow().to_string(),
        }
    }

    /// Truncates a string to a maximum number of characters.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{kept}...")
        }
    }

    /// Formats a success message.
    #[must_use]
    pub fn success(&self, message: &str) -> String {
        self.message("success", &"✓".green().to_string(), message)
    }

    /// Formats an error message.
    #[must_use]
    pub fn error(&self, message: &str) -> String {
        self.message("error", &"✗".red().to_string(), message)
    }

    /// Formats a warning message.
    #[must_use]
    pub fn warning(&self, message: &str) -> String {
        self.message("warning", &"⚠".yellow().to_string(), message)
    }

    fn message(&self, status: &str, symbol: &str, message: &str) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({ "status": status, "message": message });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => format!("{symbol} {message}"),
        }
    }
}
