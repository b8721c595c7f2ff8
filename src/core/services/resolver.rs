//! Dependency resolution
//!
//! Expands a [`Selection`] into its dependency closure and orders it so every
//! task comes after the tasks it depends on. Ready tasks are emitted in
//! identifier order, so the same catalogue and selection always produce the
//! same plan.
//!
//! Errors are collected per task. A task with a missing dependency, a task
//! caught in a cycle, and everything depending on either is left out of the
//! plan and reported; the rest of the graph still resolves.
//!
//! ```text
//! selection --expand--> roots --DFS closure--> resolved set --Kahn--> order
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, warn};
use thiserror::Error;

use super::catalogue::Catalogue;
use super::selection::Selection;
use crate::core::models::Identifier;

/// Why a task cannot be part of the plan
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// A selected identifier is not registered
    #[error("unknown task: {0}")]
    UnknownTask(String),

    /// A task depends on something that is not registered
    #[error("{task} depends on {missing}, which is not registered")]
    MissingDependency {
        /// The declaring task
        task: Identifier,
        /// The unregistered dependency
        missing: Identifier,
    },

    /// A task is part of a dependency cycle
    #[error("{task} is part of a dependency cycle: {}", join_path(.cycle))]
    CyclicDependency {
        /// A cycle member
        task: Identifier,
        /// The cycle, starting and ending at the same task
        cycle: Vec<Identifier>,
    },

    /// A task depends on something that cannot be resolved
    #[error("{task} cannot run because its dependency {dependency} cannot be resolved")]
    BlockedByDependency {
        /// The blocked task
        task: Identifier,
        /// Its unresolvable direct dependency
        dependency: Identifier,
    },
}

impl ResolveError {
    /// The registered task this error is about, if any
    #[must_use]
    pub const fn task(&self) -> Option<&Identifier> {
        match self {
            Self::UnknownTask(_) => None,
            Self::MissingDependency { task, .. }
            | Self::CyclicDependency { task, .. }
            | Self::BlockedByDependency { task, .. } => Some(task),
        }
    }
}

fn join_path(path: &[Identifier]) -> String {
    path.iter().map(ToString::to_string).collect::<Vec<_>>().join(" -> ")
}

/// Ordered tasks to run, plus everything that will not run and why
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    order: Vec<Identifier>,
    excluded: Vec<Identifier>,
    errors: Vec<ResolveError>,
}

impl ExecutionPlan {
    /// Tasks in execution order
    #[must_use]
    pub fn order(&self) -> &[Identifier] {
        &self.order
    }

    /// Selected or required tasks the user chose to skip
    #[must_use]
    pub fn excluded(&self) -> &[Identifier] {
        &self.excluded
    }

    /// Every resolution error, unknown selections first
    #[must_use]
    pub fn errors(&self) -> &[ResolveError] {
        &self.errors
    }

    /// The error that kept a task out of the plan
    #[must_use]
    pub fn error_for(&self, identifier: &Identifier) -> Option<&ResolveError> {
        self.errors.iter().find(|e| e.task() == Some(identifier))
    }

    /// Whether the plan contains a task
    #[must_use]
    pub fn contains(&self, identifier: &Identifier) -> bool {
        self.order.contains(identifier)
    }

    /// Whether resolution produced no errors
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of tasks to run
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether there is nothing to run
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Resolved,
    Failed,
}

struct Frame {
    node: Identifier,
    next: usize,
}

/// Builds execution plans over a catalogue
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    catalogue: &'a Catalogue,
}

impl<'a> Resolver<'a> {
    /// Resolver over `catalogue`
    #[must_use]
    pub const fn new(catalogue: &'a Catalogue) -> Self {
        Self { catalogue }
    }

    /// Compute the plan for a selection
    #[must_use]
    pub fn resolve(&self, selection: &Selection) -> ExecutionPlan {
        let expansion = selection.expand(self.catalogue);
        debug!(
            "Resolving {} selected task(s), {} excluded",
            expansion.selected.len(),
            expansion.excluded.len()
        );

        let mut walk = Walk {
            catalogue: self.catalogue,
            exclusions: &expansion.excluded,
            marks: HashMap::new(),
            failures: BTreeMap::new(),
            excluded: BTreeSet::new(),
        };

        for root in &expansion.selected {
            walk.visit(root);
        }

        let resolved: BTreeSet<Identifier> = walk
            .marks
            .iter()
            .filter(|(_, mark)| **mark == Mark::Resolved)
            .map(|(id, _)| id.clone())
            .collect();

        let (order, leftover) = self.order(&resolved);
        for id in &leftover {
            warn!("{id} was left unordered after resolution");
            walk.failures.entry(id.clone()).or_insert_with(|| ResolveError::CyclicDependency {
                task: id.clone(),
                cycle: leftover.clone(),
            });
        }

        let mut errors: Vec<ResolveError> =
            expansion.unknown.into_iter().map(ResolveError::UnknownTask).collect();
        errors.extend(walk.failures.into_values());

        for error in &errors {
            debug!("Unresolvable: {error}");
        }
        debug!("Plan: {}", join_path(&order));

        ExecutionPlan {
            order,
            excluded: walk.excluded.into_iter().collect(),
            errors,
        }
    }

    /// Kahn's algorithm over the resolved set, ties broken by identifier
    fn order(&self, nodes: &BTreeSet<Identifier>) -> (Vec<Identifier>, Vec<Identifier>) {
        let mut in_degree: BTreeMap<&Identifier, usize> = nodes.iter().map(|n| (n, 0)).collect();
        let mut dependents: BTreeMap<&Identifier, Vec<&Identifier>> = BTreeMap::new();

        for node in nodes {
            let Some(registration) = self.catalogue.get(node) else {
                continue;
            };
            let deps: BTreeSet<&Identifier> = registration
                .dependencies()
                .iter()
                .filter_map(|d| self.catalogue.canonical(d))
                .filter(|d| nodes.contains(*d))
                .collect();
            for dep in deps {
                dependents.entry(dep).or_default().push(node);
                if let Some(degree) = in_degree.get_mut(node) {
                    *degree += 1;
                }
            }
        }

        let mut ready: BTreeSet<&Identifier> =
            in_degree.iter().filter(|(_, d)| **d == 0).map(|(n, _)| *n).collect();
        let mut order = Vec::with_capacity(nodes.len());

        while let Some(node) = ready.pop_first() {
            order.push(node.clone());
            for dependent in dependents.get(node).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(*dependent);
                    }
                }
            }
        }

        let leftover = in_degree
            .into_iter()
            .filter(|(_, d)| *d > 0)
            .map(|(n, _)| n.clone())
            .collect();
        (order, leftover)
    }
}

/// State of one dependency closure walk
struct Walk<'a> {
    catalogue: &'a Catalogue,
    exclusions: &'a BTreeSet<Identifier>,
    marks: HashMap<Identifier, Mark>,
    failures: BTreeMap<Identifier, ResolveError>,
    excluded: BTreeSet<Identifier>,
}

impl Walk<'_> {
    /// Depth-first closure from `root` with an explicit stack
    fn visit(&mut self, root: &Identifier) {
        if self.marks.contains_key(root) {
            return;
        }
        if self.exclusions.contains(root) {
            self.excluded.insert(root.clone());
            return;
        }

        let catalogue = self.catalogue;
        self.marks.insert(root.clone(), Mark::Visiting);
        let mut stack = vec![Frame {
            node: root.clone(),
            next: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            let deps = catalogue
                .get(&frame.node)
                .map(|r| r.dependencies())
                .unwrap_or_default();

            let Some(declared) = deps.get(frame.next) else {
                let node = frame.node.clone();
                stack.pop();
                self.marks.insert(node, Mark::Resolved);
                continue;
            };
            frame.next += 1;
            let node = frame.node.clone();

            let Some(dep) = catalogue.canonical(declared).cloned() else {
                let error = ResolveError::MissingDependency {
                    task: node,
                    missing: declared.clone(),
                };
                self.unwind(&mut stack, error);
                return;
            };

            if self.exclusions.contains(&dep) {
                self.excluded.insert(dep);
                continue;
            }

            match self.marks.get(&dep).copied() {
                Some(Mark::Resolved) => {},
                Some(Mark::Failed) => {
                    let error = ResolveError::BlockedByDependency {
                        task: node,
                        dependency: dep,
                    };
                    self.unwind(&mut stack, error);
                    return;
                },
                Some(Mark::Visiting) => {
                    let start = stack.iter().position(|f| f.node == dep).unwrap_or(0);
                    let mut cycle: Vec<Identifier> =
                        stack[start..].iter().map(|f| f.node.clone()).collect();
                    cycle.push(dep);
                    let error = ResolveError::CyclicDependency {
                        task: node,
                        cycle,
                    };
                    self.unwind(&mut stack, error);
                    return;
                },
                None => {
                    self.marks.insert(dep.clone(), Mark::Visiting);
                    stack.push(Frame { node: dep, next: 0 });
                },
            }
        }
    }

    /// Fail every frame on the stack
    ///
    /// The top frame gets `error`. Frames that belong to the cycle named by
    /// `error` get the same cycle; the others are blocked by the frame above.
    fn unwind(&mut self, stack: &mut Vec<Frame>, error: ResolveError) {
        let cycle = match &error {
            ResolveError::CyclicDependency { cycle, .. } => cycle.clone(),
            _ => Vec::new(),
        };
        let Some(top) = stack.pop() else {
            return;
        };
        let mut above = top.node.clone();
        self.fail(top.node, error);

        while let Some(frame) = stack.pop() {
            let failure = if cycle.contains(&frame.node) {
                ResolveError::CyclicDependency {
                    task: frame.node.clone(),
                    cycle: cycle.clone(),
                }
            } else {
                ResolveError::BlockedByDependency {
                    task: frame.node.clone(),
                    dependency: above,
                }
            };
            above = frame.node.clone();
            self.fail(frame.node, failure);
        }
    }

    fn fail(&mut self, task: Identifier, error: ResolveError) {
        self.marks.insert(task.clone(), Mark::Failed);
        self.failures.entry(task).or_insert(error);
    }
}
