//! Task engine services
//!
//! Orchestration over the domain models. Nothing here performs I/O of its
//! own; tasks do, when the executor calls them.
//!
//! - [`catalogue`] - Registered tasks, keyed by identifier
//! - [`selection`] - Expand user selections into identifiers
//! - [`resolver`] - Dependency closure and execution order
//! - [`directives`] - Per-run override, skip and option instructions
//! - [`executor`] - Run a plan and collect results
//! - [`store`] - Append-only results of a run
//! - [`filter`] - Report-time status filtering

pub mod catalogue;
pub mod directives;
pub mod executor;
pub mod filter;
pub mod resolver;
pub mod selection;
pub mod store;

pub use catalogue::{Catalogue, CatalogueError, Registration, RunPolicy};
pub use directives::{Directive, Directives, ForcedResult};
pub use executor::Executor;
pub use filter::{StatusFilter, counts_summary};
pub use resolver::{ExecutionPlan, ResolveError, Resolver};
pub use selection::{Expansion, Selection, SelectionError, Selector};
pub use store::{RecordedResult, ResultStore, StoreError};
