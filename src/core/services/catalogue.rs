//! Task catalogue
//!
//! The full set of registered tasks for a run, keyed by [`Identifier`].
//! The composition root builds one catalogue at startup and hands it to the
//! resolver and executor; nothing here is global.

use std::collections::BTreeMap;
use std::fmt;

use log::debug;
use thiserror::Error;

use crate::core::models::{Identifier, IdentifierError};
use crate::core::ports::Task;

/// Errors raised while registering tasks
#[derive(Debug, Error)]
pub enum CatalogueError {
    /// The task's own identifier is malformed
    #[error(transparent)]
    Malformed(#[from] IdentifierError),

    /// One of the task's declared dependencies is malformed
    #[error("task {task} declares a malformed dependency: {source}")]
    MalformedDependency {
        /// The declaring task
        task: Identifier,
        /// The parse failure
        source: IdentifierError,
    },

    /// Another task already uses this identifier
    #[error("duplicate task identifier: {0}")]
    Duplicate(Identifier),
}

/// Whether broad selections pick a task up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPolicy {
    /// Selected by `all` and by matching wildcards
    #[default]
    Default,
    /// Only selected when named explicitly
    OptIn,
}

/// A task together with its parsed registration data
pub struct Registration {
    task: Box<dyn Task>,
    identifier: Identifier,
    dependencies: Vec<Identifier>,
    policy: RunPolicy,
}

impl Registration {
    /// The task implementation
    #[must_use]
    pub fn task(&self) -> &dyn Task {
        self.task.as_ref()
    }

    /// The task's identifier
    #[must_use]
    pub const fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Parsed dependency identifiers, in declaration order
    #[must_use]
    pub fn dependencies(&self) -> &[Identifier] {
        &self.dependencies
    }

    /// Whether `all` and wildcard selections include this task
    #[must_use]
    pub fn runs_by_default(&self) -> bool {
        self.policy == RunPolicy::Default
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("identifier", &self.identifier)
            .field("dependencies", &self.dependencies)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Every task known to a run
#[derive(Debug, Default)]
pub struct Catalogue {
    entries: BTreeMap<Identifier, Registration>,
}

impl Catalogue {
    /// An empty catalogue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task that runs by default
    pub fn register(&mut self, task: impl Task + 'static) -> Result<(), CatalogueError> {
        self.register_with(Box::new(task), RunPolicy::Default)
    }

    /// Register a task that only runs when named explicitly
    pub fn register_opt_in(&mut self, task: impl Task + 'static) -> Result<(), CatalogueError> {
        self.register_with(Box::new(task), RunPolicy::OptIn)
    }

    /// Register a boxed task with an explicit policy
    ///
    /// Identifiers are validated here, so a malformed identifier or
    /// dependency fails at startup rather than during a run.
    pub fn register_with(
        &mut self,
        task: Box<dyn Task>,
        policy: RunPolicy,
    ) -> Result<(), CatalogueError> {
        let identifier = task.identifier();
        identifier.validate()?;

        let dependencies = task
            .dependencies()
            .into_iter()
            .map(str::parse::<Identifier>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| CatalogueError::MalformedDependency {
                task: identifier.clone(),
                source,
            })?;

        if self.find(&identifier.to_string()).is_some() {
            return Err(CatalogueError::Duplicate(identifier));
        }

        debug!("  - {identifier}");
        self.entries.insert(
            identifier.clone(),
            Registration {
                task,
                identifier,
                dependencies,
                policy,
            },
        );
        Ok(())
    }

    /// Look up a task by identifier
    #[must_use]
    pub fn get(&self, identifier: &Identifier) -> Option<&Registration> {
        self.entries.get(identifier)
    }

    /// Look up a task by its string form, ignoring case
    #[must_use]
    pub fn find(&self, identifier: &str) -> Option<&Registration> {
        if let Ok(id) = identifier.parse::<Identifier>()
            && let Some(entry) = self.entries.get(&id)
        {
            return Some(entry);
        }
        self.entries.values().find(|r| r.identifier.eq_ignore_case(identifier.trim()))
    }

    /// Whether a task with this identifier is registered
    #[must_use]
    pub fn contains(&self, identifier: &Identifier) -> bool {
        self.entries.contains_key(identifier)
    }

    /// The registered spelling of `identifier`, ignoring case
    ///
    /// Dependencies are declared as strings and may differ in case from the
    /// registration they name.
    #[must_use]
    pub fn canonical(&self, identifier: &Identifier) -> Option<&Identifier> {
        if let Some((key, _)) = self.entries.get_key_value(identifier) {
            return Some(key);
        }
        let wanted = identifier.to_string();
        self.entries.keys().find(|key| key.eq_ignore_case(&wanted))
    }

    /// All registrations in identifier order
    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.entries.values()
    }

    /// Number of registered tasks
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
