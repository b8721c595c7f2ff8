//! Task port
//!
//! Defines the capability every diagnostic check implements, and the view of
//! upstream results a task receives when it runs.

use std::collections::BTreeMap;

use super::super::models::{Identifier, Options, Status, TaskResult};

/// A single self-contained diagnostic check
///
/// Implementations should be pure with respect to their inputs: everything a
/// task needs arrives through `options` and the results of the dependencies
/// it declared. A task may block on I/O; the executor runs tasks one at a
/// time and does not time them out.
pub trait Task: Send + Sync {
    /// The `Category/Subcategory/Name` key of this task
    fn identifier(&self) -> Identifier;

    /// Human readable description of what the task checks
    fn explain(&self) -> &str;

    /// Identifiers of the tasks whose results this task consumes
    ///
    /// Parsed once at registration; a malformed entry rejects the task.
    fn dependencies(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Run the check
    fn execute(&self, options: &Options, upstream: &Upstream<'_>) -> TaskResult;
}

/// Results of a task's declared dependencies
///
/// Only dependencies that actually ran are present. A dependency that was
/// excluded, skipped or never resolved is simply absent, and [`Self::status`]
/// reports it as [`Status::None`].
#[derive(Debug, Clone, Default)]
pub struct Upstream<'a> {
    results: BTreeMap<Identifier, &'a TaskResult>,
}

impl<'a> Upstream<'a> {
    /// An empty view
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dependency's result
    pub fn insert(&mut self, identifier: Identifier, result: &'a TaskResult) {
        self.results.insert(identifier, result);
    }

    /// Result of the dependency named by `identifier` (string form)
    #[must_use]
    pub fn get(&self, identifier: &str) -> Option<&'a TaskResult> {
        self.results
            .iter()
            .find(|(id, _)| id.eq_ignore_case(identifier))
            .map(|(_, result)| *result)
    }

    /// Status of a dependency, `None` when it did not run
    #[must_use]
    pub fn status(&self, identifier: &str) -> Status {
        self.get(identifier).map_or(Status::None, |r| r.status)
    }

    /// Whether the dependency ran and finished with `Success`
    #[must_use]
    pub fn succeeded(&self, identifier: &str) -> bool {
        self.status(identifier) == Status::Success
    }

    /// Iterate over present dependencies in identifier order
    pub fn iter(&self) -> impl Iterator<Item = (&Identifier, &'a TaskResult)> {
        self.results.iter().map(|(id, result)| (id, *result))
    }

    /// Number of dependencies that ran
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether no dependency ran
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
