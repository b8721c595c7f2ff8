//! Shared setup for commands that resolve tasks

use std::path::Path;

use anyhow::{Context, bail};
use log::debug;

use nrdiag::config::RunProfile;
use nrdiag::core::models::{Identifier, Options};
use nrdiag::core::services::{Catalogue, Directives, ExecutionPlan, Resolver, Selection};
use nrdiag::suites::SuiteManager;
use nrdiag::tasks;

use crate::cli::SelectArgs;

/// Everything a run needs, built from the profile and the flags
#[derive(Debug)]
pub struct RunContext {
    pub catalogue: Catalogue,
    pub profile: RunProfile,
    pub directives: Directives,
    pub selection: Selection,
    pub options: Options,
}

impl RunContext {
    /// Load the profile, build the catalogue and merge flags over the profile
    pub fn prepare(config: Option<&Path>, select: &SelectArgs) -> anyhow::Result<Self> {
        let profile = RunProfile::load(config)?;
        let catalogue = tasks::builtin_catalogue().context("failed to register built-in tasks")?;
        debug!("Registered {} task(s)", catalogue.len());

        let suites = SuiteManager::with_extra(profile.suites.clone());
        let (matched, unmatched) = suites.find_all(&select.suites);
        if !unmatched.is_empty() {
            bail!(
                "Unknown suite(s): {}. Run 'nrdiag suites' to see the available suites",
                unmatched.join(", ")
            );
        }

        let mut terms = select.tasks.clone();
        terms.extend(SuiteManager::tasks_for(&matched));

        let mut directives = profile.directives()?;
        for task in &select.exclude {
            let identifier: Identifier =
                task.parse().with_context(|| format!("invalid --exclude value '{task}'"))?;
            directives.skip(identifier);
        }

        let exclusions: Vec<_> = directives.exclusions().cloned().collect();
        let selection = Selection::parse(&terms)?.excluding(exclusions);

        let mut options = profile.options.clone();
        for (key, value) in &select.options {
            options.set(key.as_str(), value.as_str());
        }

        Ok(Self {
            catalogue,
            profile,
            directives,
            selection,
            options,
        })
    }

    /// Resolve the selection
    pub fn plan(&self) -> ExecutionPlan {
        Resolver::new(&self.catalogue).resolve(&self.selection)
    }
}
