//! Report-time status filter
//!
//! Narrows which results are shown without changing what ran.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use crate::core::models::Status;

/// Which statuses to surface in a report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StatusFilter {
    /// Show everything
    #[default]
    All,
    /// Show only these statuses
    Only(BTreeSet<Status>),
}

impl StatusFilter {
    /// Build from a list of terms, each `all` or a status name
    pub fn parse<S: AsRef<str>>(terms: &[S]) -> Result<Self, String> {
        let mut statuses = BTreeSet::new();
        for term in terms {
            for part in term.as_ref().split(',').map(str::trim).filter(|p| !p.is_empty()) {
                if part.eq_ignore_ascii_case("all") {
                    return Ok(Self::All);
                }
                statuses.insert(part.parse::<Status>()?);
            }
        }

        if statuses.is_empty() { Ok(Self::All) } else { Ok(Self::Only(statuses)) }
    }

    /// Whether a result with this status is shown
    #[must_use]
    pub fn matches(&self, status: Status) -> bool {
        match self {
            Self::All => true,
            Self::Only(statuses) => statuses.contains(&status),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(&[s])
    }
}

/// Count statuses and summarise them as `3 Success, 1 Warning`
///
/// Statuses appear in severity order; absent statuses are omitted.
#[must_use]
pub fn counts_summary(statuses: impl IntoIterator<Item = Status>) -> String {
    let mut counts: BTreeMap<Status, usize> = BTreeMap::new();
    for status in statuses {
        *counts.entry(status).or_default() += 1;
    }
    counts
        .iter()
        .map(|(status, count)| format!("{count} {status}"))
        .collect::<Vec<_>>()
        .join(", ")
}
