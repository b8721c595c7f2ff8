//! Output formatting for human and JSON modes
//!
//! This module provides structured output that can be rendered either as
//! human-readable text or machine-parseable JSON.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use serde::Serialize;

use crate::core::models::{Identifier, Status};
use crate::core::services::{
    Catalogue, ExecutionPlan, RecordedResult, ResolveError, ResultStore, StatusFilter,
    counts_summary,
};
use crate::suites::Suite;

/// Output mode for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output (machine-readable)
    Json,
}

/// A task that did not run, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotRun {
    /// Task identifier, or the selection string for unknown tasks
    pub task: String,
    /// Human readable reason
    pub reason: String,
}

const EXCLUDED: &str = "Excluded from this run";

fn not_run(plan: &ExecutionPlan) -> Vec<NotRun> {
    let unresolved = plan.errors().iter().map(|error| NotRun {
        task: match error {
            ResolveError::UnknownTask(name) => name.clone(),
            other => other.task().map(ToString::to_string).unwrap_or_default(),
        },
        reason: error.to_string(),
    });
    let excluded = plan.excluded().iter().map(|id| NotRun {
        task: id.to_string(),
        reason: EXCLUDED.to_string(),
    });
    unresolved.chain(excluded).collect()
}

fn colored_status(status: Status) -> ColoredString {
    let label = status.as_str();
    match status {
        Status::Success => label.green(),
        Status::Info => label.blue(),
        Status::Warning => label.yellow(),
        Status::Failure | Status::Error => label.red().bold(),
        Status::None => label.dimmed(),
    }
}

/// Outcome of a run
#[derive(Debug, Serialize)]
pub struct RunReport {
    /// Tool version
    pub version: &'static str,
    /// When execution started
    pub started_at: DateTime<Utc>,
    /// When execution finished
    pub finished_at: DateTime<Utc>,
    /// Status counts of the shown results, e.g. `3 Success, 1 Warning`
    pub summary: String,
    /// Results passing the filter, in execution order
    pub results: Vec<RecordedResult>,
    /// Results hidden by the filter
    pub hidden: usize,
    /// Tasks that were selected or required but did not run
    pub not_run: Vec<NotRun>,
}

impl RunReport {
    /// Build the report for a finished run
    #[must_use]
    pub fn new(
        plan: &ExecutionPlan,
        store: &ResultStore,
        filter: &StatusFilter,
        started_at: DateTime<Utc>,
    ) -> Self {
        let (results, hidden): (Vec<_>, Vec<_>) =
            store.iter().cloned().partition(|r| filter.matches(r.result.status));

        Self {
            version: crate::VERSION,
            started_at,
            finished_at: Utc::now(),
            summary: counts_summary(results.iter().map(|r| r.result.status)),
            results,
            hidden: hidden.len(),
            not_run: not_run(plan)
                .into_iter()
                .chain(store.skipped().iter().map(|id| NotRun {
                    task: id.to_string(),
                    reason: EXCLUDED.to_string(),
                }))
                .collect(),
        }
    }

    /// Whether any shown result needs attention
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| r.result.status.is_failure())
    }

    /// Render the report based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => print!("{}", self.to_human()),
            OutputMode::Json => self.render_json(),
        }
    }

    /// Human readable rendering
    #[must_use]
    pub fn to_human(&self) -> String {
        let mut out = String::new();

        if self.results.is_empty() {
            out.push_str("No results to show.\n");
        }
        for entry in &self.results {
            let marker = if entry.was_override { " (override)" } else { "" };
            let _ = writeln!(
                out,
                "{} {}{marker}",
                colored_status(entry.result.status),
                entry.identifier.to_string().bold()
            );
            for line in entry.result.summary.lines() {
                let _ = writeln!(out, "    {line}");
            }
            if let Some(url) = &entry.result.url {
                let _ = writeln!(out, "    See {url}");
            }
        }

        if !self.not_run.is_empty() {
            out.push_str("\nNot run:\n");
            for item in &self.not_run {
                let _ = writeln!(out, "  {} - {}", item.task, item.reason);
            }
        }

        let summary = if self.summary.is_empty() { "none" } else { self.summary.as_str() };
        let _ = write!(out, "\nSummary: {summary}");
        if self.hidden > 0 {
            let _ = write!(out, " ({} hidden by filter)", self.hidden);
        }
        out.push('\n');
        out
    }

    fn render_json(&self) {
        println!("{}", serde_json::to_string_pretty(self).unwrap_or_default());
    }
}

/// Result of a dry run
#[derive(Debug, Serialize)]
pub struct PlanReport {
    /// Tasks in execution order
    pub order: Vec<Identifier>,
    /// Tasks that will not run
    pub not_run: Vec<NotRun>,
}

impl PlanReport {
    /// Build from a plan
    #[must_use]
    pub fn new(plan: &ExecutionPlan) -> Self {
        Self {
            order: plan.order().to_vec(),
            not_run: not_run(plan),
        }
    }

    /// Render the plan based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => print!("{}", self.to_human()),
            OutputMode::Json => {
                println!("{}", serde_json::to_string_pretty(self).unwrap_or_default());
            },
        }
    }

    /// Human readable rendering
    #[must_use]
    pub fn to_human(&self) -> String {
        let mut out = String::new();
        if self.order.is_empty() {
            out.push_str("Nothing to run.\n");
        } else {
            out.push_str("Execution order:\n");
            for (i, id) in self.order.iter().enumerate() {
                let _ = writeln!(out, "  {:>3}. {id}", i + 1);
            }
        }
        if !self.not_run.is_empty() {
            out.push_str("\nNot run:\n");
            for item in &self.not_run {
                let _ = writeln!(out, "  {} - {}", item.task, item.reason);
            }
        }
        out
    }
}

/// A registered task, for listings
#[derive(Debug, Clone, Serialize)]
pub struct TaskInfo {
    /// Task identifier
    pub identifier: Identifier,
    /// What the task checks
    pub explain: String,
    /// Declared dependencies
    pub dependencies: Vec<Identifier>,
    /// Whether `all` and wildcards select it
    pub runs_by_default: bool,
}

/// Every registered task
#[derive(Debug, Serialize)]
pub struct TaskListing {
    /// Tasks in identifier order
    pub tasks: Vec<TaskInfo>,
}

impl TaskListing {
    /// Build from a catalogue
    #[must_use]
    pub fn new(catalogue: &Catalogue) -> Self {
        let tasks = catalogue
            .iter()
            .map(|r| TaskInfo {
                identifier: r.identifier().clone(),
                explain: r.task().explain().to_string(),
                dependencies: r.dependencies().to_vec(),
                runs_by_default: r.runs_by_default(),
            })
            .collect();
        Self { tasks }
    }

    /// Render the listing based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => print!("{}", self.to_human()),
            OutputMode::Json => {
                println!("{}", serde_json::to_string_pretty(self).unwrap_or_default());
            },
        }
    }

    /// Category / Subcategory / Name tree
    #[must_use]
    pub fn to_human(&self) -> String {
        let mut tree: BTreeMap<&str, BTreeMap<&str, Vec<&TaskInfo>>> = BTreeMap::new();
        for task in &self.tasks {
            tree.entry(task.identifier.category())
                .or_default()
                .entry(task.identifier.subcategory())
                .or_default()
                .push(task);
        }

        let mut out = String::new();
        for (category, subcategories) in tree {
            let _ = writeln!(out, "{}", category.bold());
            for (subcategory, tasks) in subcategories {
                let _ = writeln!(out, "  {subcategory}");
                for task in tasks {
                    let opt_in = if task.runs_by_default { "" } else { " [opt-in]" };
                    let _ = writeln!(
                        out,
                        "    {}{opt_in} - {}",
                        task.identifier.name(),
                        task.explain
                    );
                }
            }
        }
        out
    }
}

/// Known suites
#[derive(Debug, Serialize)]
pub struct SuiteListing {
    /// Suites in definition order
    pub suites: Vec<Suite>,
}

impl SuiteListing {
    /// Render the listing based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => print!("{}", self.to_human()),
            OutputMode::Json => {
                println!("{}", serde_json::to_string_pretty(self).unwrap_or_default());
            },
        }
    }

    /// Human readable rendering
    #[must_use]
    pub fn to_human(&self) -> String {
        let mut out = String::new();
        for suite in &self.suites {
            let _ = writeln!(out, "{} - {}", suite.identifier.bold(), suite.display_name);
            if !suite.description.is_empty() {
                let _ = writeln!(out, "    {}", suite.description);
            }
            let _ = writeln!(out, "    tasks: {}", suite.tasks.join(", "));
        }
        out
    }
}
