//! Task suites
//!
//! A suite is a named bundle of selection patterns, so users can ask for
//! `--suites config` instead of spelling out identifiers. Suites from the
//! run profile are added to the built-in ones and replace a built-in suite
//! with the same identifier.

use serde::{Deserialize, Serialize};

/// A named set of task selection patterns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suite {
    /// Short name used on the command line (e.g. `config`)
    pub identifier: String,
    /// Name shown in listings
    pub display_name: String,
    /// What the suite covers
    #[serde(default)]
    pub description: String,
    /// Selection patterns, as accepted by `--tasks`
    pub tasks: Vec<String>,
}

impl Suite {
    /// Build a suite
    #[must_use]
    pub fn new(identifier: &str, display_name: &str, description: &str, tasks: &[&str]) -> Self {
        Self {
            identifier: identifier.to_string(),
            display_name: display_name.to_string(),
            description: description.to_string(),
            tasks: tasks.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Suites known to a run
#[derive(Debug, Clone)]
pub struct SuiteManager {
    suites: Vec<Suite>,
}

impl Default for SuiteManager {
    fn default() -> Self {
        Self::new(builtin_suites())
    }
}

impl SuiteManager {
    /// Manager over exactly these suites
    #[must_use]
    pub const fn new(suites: Vec<Suite>) -> Self {
        Self { suites }
    }

    /// Built-in suites plus `extra`, where `extra` wins on identifier clashes
    #[must_use]
    pub fn with_extra(extra: Vec<Suite>) -> Self {
        let mut manager = Self::default();
        for suite in extra {
            manager.suites.retain(|s| !s.identifier.eq_ignore_ascii_case(&suite.identifier));
            manager.suites.push(suite);
        }
        manager
    }

    /// All suites
    #[must_use]
    pub fn suites(&self) -> &[Suite] {
        &self.suites
    }

    /// Find a suite by identifier, ignoring case and surrounding whitespace
    #[must_use]
    pub fn find(&self, identifier: &str) -> Option<&Suite> {
        let identifier = identifier.trim();
        self.suites.iter().find(|s| s.identifier.eq_ignore_ascii_case(identifier))
    }

    /// Find several suites; returns the matches and the names that matched nothing
    #[must_use]
    pub fn find_all<S: AsRef<str>>(&self, identifiers: &[S]) -> (Vec<&Suite>, Vec<String>) {
        let mut matched = Vec::new();
        let mut unmatched = Vec::new();

        for identifier in identifiers {
            match self.find(identifier.as_ref()) {
                Some(suite) => matched.push(suite),
                None => unmatched.push(identifier.as_ref().to_string()),
            }
        }

        (matched, unmatched)
    }

    /// Selection patterns of the given suites, in order
    #[must_use]
    pub fn tasks_for(suites: &[&Suite]) -> Vec<String> {
        suites.iter().flat_map(|s| s.tasks.iter().cloned()).collect()
    }
}

fn builtin_suites() -> Vec<Suite> {
    vec![
        Suite::new("base", "Base checks", "Host environment and agent configuration", &[
            "Base/*",
        ]),
        Suite::new("config", "Agent configuration", "Locate and validate agent config files", &[
            "Base/Config/*",
        ]),
        Suite::new("env", "Host environment", "Operating system and environment variables", &[
            "Base/Env/*",
        ]),
    ]
}
