//! Append-only result store
//!
//! Holds one result per executed task in execution order, plus the tasks a
//! directive skipped. Entries are never replaced; a second write for the same
//! identifier is rejected.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::core::models::{Identifier, TaskResult};

/// Errors raised by the result store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The task already has a result in this run
    #[error("a result for {0} was already recorded")]
    AlreadyRecorded(Identifier),
}

/// One stored result
#[derive(Debug, Clone, Serialize)]
pub struct RecordedResult {
    /// The task that produced it
    pub identifier: Identifier,
    /// What it produced
    #[serde(flatten)]
    pub result: TaskResult,
    /// Whether the result was forced by configuration instead of executed
    pub was_override: bool,
}

/// Results of a run, in execution order
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    entries: Vec<RecordedResult>,
    index: HashMap<Identifier, usize>,
    skipped: Vec<Identifier>,
}

impl ResultStore {
    /// An empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result
    pub fn record(
        &mut self,
        identifier: Identifier,
        result: TaskResult,
        was_override: bool,
    ) -> Result<(), StoreError> {
        if self.is_settled(&identifier) {
            return Err(StoreError::AlreadyRecorded(identifier));
        }
        self.index.insert(identifier.clone(), self.entries.len());
        self.entries.push(RecordedResult {
            identifier,
            result,
            was_override,
        });
        Ok(())
    }

    /// Note that a task was skipped instead of run
    pub fn record_skip(&mut self, identifier: Identifier) -> Result<(), StoreError> {
        if self.is_settled(&identifier) {
            return Err(StoreError::AlreadyRecorded(identifier));
        }
        self.skipped.push(identifier);
        Ok(())
    }

    fn is_settled(&self, identifier: &Identifier) -> bool {
        self.index.contains_key(identifier) || self.skipped.contains(identifier)
    }

    /// Tasks skipped by a directive, in plan order
    #[must_use]
    pub fn skipped(&self) -> &[Identifier] {
        &self.skipped
    }

    /// Result for a task
    #[must_use]
    pub fn get(&self, identifier: &Identifier) -> Option<&TaskResult> {
        self.entry(identifier).map(|e| &e.result)
    }

    /// Full stored entry for a task
    #[must_use]
    pub fn entry(&self, identifier: &Identifier) -> Option<&RecordedResult> {
        self.index.get(identifier).map(|&i| &self.entries[i])
    }

    /// Whether a task has a result
    #[must_use]
    pub fn contains(&self, identifier: &Identifier) -> bool {
        self.index.contains_key(identifier)
    }

    /// Entries in execution order
    pub fn iter(&self) -> impl Iterator<Item = &RecordedResult> {
        self.entries.iter()
    }

    /// Identifiers in execution order
    pub fn identifiers(&self) -> impl Iterator<Item = &Identifier> {
        self.entries.iter().map(|e| &e.identifier)
    }

    /// Number of results
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
