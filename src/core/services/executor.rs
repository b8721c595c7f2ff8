//! Plan execution
//!
//! Runs the tasks of an [`ExecutionPlan`] one at a time, in order. Each task
//! sees only the results of its own declared dependencies. A panicking task
//! is recorded as an `Error` result and the run carries on.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use log::{debug, error, info};

use super::catalogue::Catalogue;
use super::directives::{Directive, Directives};
use super::resolver::ExecutionPlan;
use super::store::ResultStore;
use crate::core::models::{Identifier, Options, TaskResult};
use crate::core::ports::{Task, Upstream};

static NO_DIRECTIVES: Directives = Directives::new();

/// Runs execution plans against a catalogue
#[derive(Debug, Clone, Copy)]
pub struct Executor<'a> {
    catalogue: &'a Catalogue,
    directives: &'a Directives,
}

impl<'a> Executor<'a> {
    /// Executor with no directives: every planned task runs
    #[must_use]
    pub const fn new(catalogue: &'a Catalogue) -> Self {
        Self {
            catalogue,
            directives: &NO_DIRECTIVES,
        }
    }

    /// Consult `directives` before each task
    #[must_use]
    pub const fn with_directives(mut self, directives: &'a Directives) -> Self {
        self.directives = directives;
        self
    }

    /// Run every task in the plan
    ///
    /// The returned store holds one entry per task that ran or was
    /// overridden, in plan order, and lists the tasks a directive skipped.
    #[must_use]
    pub fn run(&self, plan: &ExecutionPlan, options: &Options) -> ResultStore {
        info!("Running {} task(s)", plan.len());
        let mut store = ResultStore::new();

        for identifier in plan.order() {
            let Some(registration) = self.catalogue.get(identifier) else {
                error!("{identifier} is in the plan but not in the catalogue");
                continue;
            };

            let (result, was_override) = match self.directives.lookup(identifier) {
                Directive::Skip => {
                    debug!("Skipping {identifier}");
                    if let Err(e) = store.record_skip(identifier.clone()) {
                        error!("{e}");
                    }
                    continue;
                },
                Directive::Override(forced) => {
                    debug!("Overriding {identifier}");
                    (forced.to_result(), true)
                },
                Directive::Run => {
                    let mut upstream = Upstream::new();
                    for dependency in registration.dependencies() {
                        let registered = self.catalogue.canonical(dependency).unwrap_or(dependency);
                        if let Some(result) = store.get(registered) {
                            upstream.insert(dependency.clone(), result);
                        }
                    }
                    let options = self.directives.options_for(identifier, options);

                    debug!("Executing {identifier}");
                    (execute_guarded(registration.task(), identifier, &options, &upstream), false)
                },
            };

            debug!("{identifier}: {}", result.status);
            if let Err(e) = store.record(identifier.clone(), result, was_override) {
                error!("{e}");
            }
        }

        info!("Finished {} task(s)", store.len());
        store
    }
}

/// Execute one task, turning a panic into an `Error` result
fn execute_guarded(
    task: &dyn Task,
    identifier: &Identifier,
    options: &Options,
    upstream: &Upstream<'_>,
) -> TaskResult {
    panic::catch_unwind(AssertUnwindSafe(|| task.execute(options, upstream))).unwrap_or_else(
        |cause| {
            let message = panic_message(cause.as_ref());
            error!("Task {identifier} panicked: {message}");
            TaskResult::error(format!("Task {identifier} failed unexpectedly: {message}"))
        },
    )
}

fn panic_message(cause: &(dyn Any + Send)) -> String {
    cause
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| cause.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
