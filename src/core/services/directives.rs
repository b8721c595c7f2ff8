//! Per-run task directives
//!
//! Fully parsed instructions consulted by the executor before each task:
//! run it, force a canned result instead, or skip it. Per-task option
//! overrides live here too.

use std::collections::BTreeMap;

use crate::core::models::{Identifier, Options, Status, TaskResult};

/// A forced result, replacing execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForcedResult {
    /// Status to report
    pub status: Option<Status>,
    /// Payload to hand downstream, as a string
    pub payload: Option<String>,
    /// Summary to report instead of the generated one
    pub summary: Option<String>,
}

impl ForcedResult {
    /// Build the stored result
    ///
    /// The summary records what was overridden unless one was given.
    #[must_use]
    pub fn to_result(&self) -> TaskResult {
        let mut summary = String::new();
        if let Some(status) = self.status {
            summary.push_str(&format!("Status set by override to {status}\n"));
        }
        if self.payload.is_some() {
            summary.push_str("Payload set by override\n");
        }

        let mut result = TaskResult::new(
            self.status.unwrap_or_default(),
            self.summary.clone().unwrap_or(summary),
        );
        if let Some(payload) = &self.payload {
            result = result.with_payload(payload.clone());
        }
        result
    }
}

/// What to do with a task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Directive {
    /// Execute normally
    #[default]
    Run,
    /// Record a forced result without executing
    Override(ForcedResult),
    /// Do not run or record anything
    Skip,
}

/// Directives for one run, keyed by task
#[derive(Debug, Clone, Default)]
pub struct Directives {
    directives: BTreeMap<Identifier, Directive>,
    task_options: BTreeMap<Identifier, Options>,
}

impl Directives {
    /// No directives: every task runs
    #[must_use]
    pub const fn new() -> Self {
        Self {
            directives: BTreeMap::new(),
            task_options: BTreeMap::new(),
        }
    }

    /// Force a result for a task
    pub fn force(&mut self, identifier: Identifier, forced: ForcedResult) {
        self.directives.insert(identifier, Directive::Override(forced));
    }

    /// Skip a task
    pub fn skip(&mut self, identifier: Identifier) {
        self.directives.insert(identifier, Directive::Skip);
    }

    /// Options for one task, merged over the run's options
    pub fn set_task_options(&mut self, identifier: Identifier, options: Options) {
        let entry = self.task_options.entry(identifier).or_default();
        *entry = entry.merged(&options);
    }

    /// The directive for a task
    #[must_use]
    pub fn lookup(&self, identifier: &Identifier) -> &Directive {
        static RUN: Directive = Directive::Run;
        self.directives
            .iter()
            .find(|(id, _)| id.eq_ignore_case(&identifier.to_string()))
            .map_or(&RUN, |(_, directive)| directive)
    }

    /// Options a task runs with
    #[must_use]
    pub fn options_for(&self, identifier: &Identifier, global: &Options) -> Options {
        self.task_options
            .iter()
            .find(|(id, _)| id.eq_ignore_case(&identifier.to_string()))
            .map_or_else(|| global.clone(), |(_, task)| global.merged(task))
    }

    /// Tasks to leave out of the plan
    pub fn exclusions(&self) -> impl Iterator<Item = &Identifier> {
        self.directives
            .iter()
            .filter(|(_, d)| matches!(d, Directive::Skip))
            .map(|(id, _)| id)
    }

    /// Number of tasks with a non-default directive
    #[must_use]
    pub fn len(&self) -> usize {
        self.directives.len()
    }

    /// Whether every task runs normally
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}
