//! Shared test fixtures and helpers
//!
//! A configurable mock task plus shortcuts for building catalogues and
//! reading plans back as strings.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use nrdiag::core::models::{Identifier, Options, TaskResult};
use nrdiag::core::ports::{Task, Upstream};
use nrdiag::core::services::{Catalogue, ExecutionPlan, ResultStore};

type Behaviour = Arc<dyn Fn(&Options, &Upstream<'_>) -> TaskResult + Send + Sync>;

/// A task whose identity, dependencies and behaviour are set by the test
#[derive(Clone)]
pub struct MockTask {
    id: Identifier,
    deps: Vec<String>,
    behaviour: Behaviour,
    calls: Arc<AtomicUsize>,
}

impl MockTask {
    /// A task that succeeds with summary "ran <id>"
    pub fn new(id: &str) -> Self {
        Self::from_identifier(id.parse().expect("valid test identifier"))
    }

    /// Like [`MockTask::new`], without validating the identifier
    pub fn from_identifier(id: Identifier) -> Self {
        let summary = format!("ran {id}");
        Self {
            id,
            deps: Vec::new(),
            behaviour: Arc::new(move |_, _| TaskResult::success(summary.clone())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Declare dependencies, unparsed
    pub fn depends_on(mut self, deps: &[&str]) -> Self {
        self.deps = deps.iter().map(ToString::to_string).collect();
        self
    }

    /// Always return this result
    pub fn returning(mut self, result: TaskResult) -> Self {
        self.behaviour = Arc::new(move |_, _| result.clone());
        self
    }

    /// Compute the result from options and upstream
    pub fn with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Options, &Upstream<'_>) -> TaskResult + Send + Sync + 'static,
    {
        self.behaviour = Arc::new(f);
        self
    }

    /// Panic with `message` when executed
    pub fn panicking(self, message: &'static str) -> Self {
        self.with(move |_, _| panic!("{message}"))
    }

    /// Handle counting how many times the task executed
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl Task for MockTask {
    fn identifier(&self) -> Identifier {
        self.id.clone()
    }

    fn explain(&self) -> &str {
        "Mock task"
    }

    fn dependencies(&self) -> Vec<&str> {
        self.deps.iter().map(String::as_str).collect()
    }

    fn execute(&self, options: &Options, upstream: &Upstream<'_>) -> TaskResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.behaviour)(options, upstream)
    }
}

/// Register every task as a default task
pub fn catalogue_of(tasks: impl IntoIterator<Item = MockTask>) -> Catalogue {
    let mut catalogue = Catalogue::new();
    for task in tasks {
        catalogue.register(task).expect("mock task registers");
    }
    catalogue
}

/// Parse an identifier, panicking on bad input
pub fn id(s: &str) -> Identifier {
    s.parse().expect("valid test identifier")
}

/// The plan order as strings
pub fn order(plan: &ExecutionPlan) -> Vec<String> {
    plan.order().iter().map(ToString::to_string).collect()
}

/// The store keys as strings, in record order
pub fn recorded(store: &ResultStore) -> Vec<String> {
    store.identifiers().map(ToString::to_string).collect()
}

/// How many times a call counter has been bumped
pub fn count(calls: &AtomicUsize) -> usize {
    calls.load(Ordering::SeqCst)
}
