//! Task result status
//!
//! Statuses are ordered by severity so reports can aggregate them.

use serde::{Deserialize, Serialize};

/// Outcome category of a task execution
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Status {
    /// The check does not apply to this host, or did not run
    #[default]
    None,
    /// Information was collected without passing judgement
    Info,
    /// The host conforms to expectations
    Success,
    /// The host does not conform, but may not be broken
    Warning,
    /// The host does not conform and is believed to be broken
    Failure,
    /// The check itself could not determine an outcome
    Error,
}

impl Status {
    /// Every status, in severity order
    pub const ALL: [Self; 6] =
        [Self::None, Self::Info, Self::Success, Self::Warning, Self::Failure, Self::Error];

    /// True for anything that should draw attention (warning and worse)
    #[must_use]
    pub const fn is_failure(self) -> bool {
        !matches!(self, Self::None | Self::Success | Self::Info)
    }

    /// Display name as used in reports and configuration
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Info => "Info",
            Self::Success => "Success",
            Self::Warning => "Warning",
            Self::Failure => "Failure",
            Self::Error => "Error",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "info" => Ok(Self::Info),
            "success" => Ok(Self::Success),
            "warning" | "warn" => Ok(Self::Warning),
            "failure" | "fail" => Ok(Self::Failure),
            "error" => Ok(Self::Error),
            _ => Err(format!(
                "Invalid status: {s}. Use: none, info, success, warning, failure, error"
            )),
        }
    }
}
