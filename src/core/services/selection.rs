//! Task selection
//!
//! Turns user supplied selection strings into concrete identifiers.
//!
//! - `all` or `*` selects every default task
//! - `Category/*` and `Category/Subcategory/*` select default tasks under a prefix
//! - `Category/Subcategory/Name` selects that task, opt-in or not
//!
//! Matching ignores case. `*` may appear anywhere and matches across `/`.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use log::{debug, warn};
use regex::Regex;
use thiserror::Error;

use super::catalogue::{Catalogue, Registration};
use crate::core::models::Identifier;

/// Errors raised while parsing a selector
#[derive(Debug, Error)]
pub enum SelectionError {
    /// Nothing was given
    #[error("empty task selector")]
    Empty,

    /// The wildcard pattern could not be compiled
    #[error("invalid task pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The pattern as written
        pattern: String,
        /// Underlying regex error
        source: regex::Error,
    },
}

/// One selection term
#[derive(Debug, Clone)]
pub enum Selector {
    /// Every default task
    All,
    /// A single task by identifier
    Exact(String),
    /// Default tasks whose identifier matches a wildcard pattern
    Pattern {
        /// The pattern as written
        source: String,
        /// Compiled, anchored, case-insensitive form
        regex: Regex,
    },
}

impl Selector {
    /// Parse a wildcard pattern
    pub fn pattern(source: &str) -> Result<Self, SelectionError> {
        let body = source.split('*').map(regex::escape).collect::<Vec<_>>().join(".*");
        let regex = Regex::new(&format!("(?i)^{body}$")).map_err(|e| {
            SelectionError::InvalidPattern {
                pattern: source.to_string(),
                source: e,
            }
        })?;
        Ok(Self::Pattern {
            source: source.to_string(),
            regex,
        })
    }

    /// Whether this term selects the given registration
    #[must_use]
    pub fn matches(&self, registration: &Registration) -> bool {
        match self {
            Self::All => registration.runs_by_default(),
            Self::Exact(id) => registration.identifier().eq_ignore_case(id),
            Self::Pattern { regex, .. } => {
                registration.runs_by_default()
                    && regex.is_match(&registration.identifier().to_string())
            },
        }
    }
}

impl FromStr for Selector {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SelectionError::Empty);
        }
        if s == "*" || s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        if s.contains('*') {
            return Self::pattern(s);
        }
        Ok(Self::Exact(s.to_string()))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Exact(id) => f.write_str(id),
            Self::Pattern { source, .. } => f.write_str(source),
        }
    }
}

/// What the user asked to run, and what they asked to leave out
#[derive(Debug, Clone, Default)]
pub struct Selection {
    selectors: Vec<Selector>,
    exclusions: Vec<Identifier>,
}

impl Selection {
    /// Select every default task
    #[must_use]
    pub fn all() -> Self {
        Self::new(vec![Selector::All])
    }

    /// Select by the given terms; an empty list means `all`
    #[must_use]
    pub fn new(selectors: Vec<Selector>) -> Self {
        let selectors = if selectors.is_empty() { vec![Selector::All] } else { selectors };
        Self {
            selectors,
            exclusions: Vec::new(),
        }
    }

    /// Parse each string as a selector
    pub fn parse<S: AsRef<str>>(terms: &[S]) -> Result<Self, SelectionError> {
        let selectors =
            terms.iter().map(|t| t.as_ref().parse()).collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(selectors))
    }

    /// Skip these tasks entirely
    #[must_use]
    pub fn excluding(mut self, exclusions: impl IntoIterator<Item = Identifier>) -> Self {
        self.exclusions.extend(exclusions);
        self
    }

    /// The selection terms
    #[must_use]
    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    /// The identifiers to skip, as given
    #[must_use]
    pub fn exclusions(&self) -> &[Identifier] {
        &self.exclusions
    }

    /// Expand the terms against a catalogue
    ///
    /// Unknown explicit identifiers are returned so the caller can report
    /// them. A wildcard matching nothing only logs a warning.
    #[must_use]
    pub fn expand(&self, catalogue: &Catalogue) -> Expansion {
        let mut expansion = Expansion::default();

        for selector in &self.selectors {
            let before = expansion.selected.len();
            let mut matched = false;
            for registration in catalogue.iter().filter(|r| selector.matches(r)) {
                matched = true;
                expansion.selected.insert(registration.identifier().clone());
            }

            debug!(
                "Selector '{selector}' added {} task(s)",
                expansion.selected.len() - before
            );

            if !matched {
                match selector {
                    Selector::Exact(id) => expansion.unknown.push(id.clone()),
                    Selector::Pattern { source, .. } => {
                        warn!("Task pattern '{source}' did not match any default task");
                    },
                    Selector::All => warn!("No default tasks are registered"),
                }
            }
        }

        for excluded in &self.exclusions {
            match catalogue.find(&excluded.to_string()) {
                Some(registration) => {
                    expansion.excluded.insert(registration.identifier().clone());
                },
                None => warn!("Excluded task {excluded} is not registered"),
            }
        }

        expansion
    }
}

/// A selection expanded into concrete identifiers
#[derive(Debug, Clone, Default)]
pub struct Expansion {
    /// Tasks the user asked for
    pub selected: BTreeSet<Identifier>,
    /// Registered tasks to skip
    pub excluded: BTreeSet<Identifier>,
    /// Explicit identifiers absent from the catalogue, as written
    pub unknown: Vec<String>,
}
