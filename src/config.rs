//! Run profile configuration
//!
//! An optional TOML file describing how a run should behave: options handed
//! to every task, tasks to skip, forced results, per-task options, extra
//! suites and the report filter.
//!
//! Lookup order: `--config <path>`, then `./nrdiag.toml`, then
//! `~/.config/nrdiag/config.toml` (XDG standard). Missing files fall back to
//! defaults.
//!
//! ```toml
//! exclude = ["Base/Env/CollectEnvVars"]
//! filter = ["warning", "failure"]
//!
//! [options]
//! searchPath = "/etc/newrelic"
//!
//! [[override]]
//! task = "Base/Config/Collect"
//! status = "success"
//! payload = "/etc/newrelic/newrelic.yml"
//!
//! [task_options."Base/Config/ValidateLicenseKey"]
//! strict = "true"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::models::{Identifier, IdentifierError, Options, Status};
use crate::core::services::{Directives, ForcedResult, StatusFilter};
use crate::suites::Suite;

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "nrdiag.toml";

/// Errors raised while loading a run profile
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// The file is not valid TOML for a run profile
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: toml::de::Error,
    },

    /// A task identifier in the profile is malformed
    #[error(transparent)]
    InvalidIdentifier(#[from] IdentifierError),

    /// A status name in the profile is not recognised
    #[error("{0}")]
    InvalidStatus(String),
}

/// A forced result for one task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideEntry {
    /// Task identifier
    pub task: String,
    /// Status to report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Summary to report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Payload to hand downstream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

/// Run profile, as read from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunProfile {
    /// Options passed to every task
    #[serde(default)]
    pub options: Options,
    /// Tasks to skip
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Statuses to show in the report (`all` when empty)
    #[serde(default)]
    pub filter: Vec<String>,
    /// Forced results
    #[serde(default, rename = "override")]
    pub overrides: Vec<OverrideEntry>,
    /// Options for individual tasks, keyed by identifier
    #[serde(default)]
    pub task_options: BTreeMap<String, Options>,
    /// Extra suites
    #[serde(default, rename = "suite")]
    pub suites: Vec<Suite>,
}

impl RunProfile {
    /// Candidate files, most specific first
    #[must_use]
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("nrdiag").join("config.toml"));
        }
        paths
    }

    /// Load from `explicit`, or from the first default path that exists
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }

        match Self::default_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => Self::from_path(&path),
            None => {
                debug!("No run profile found, using defaults");
                Ok(Self::default())
            },
        }
    }

    /// Load from a specific file
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading run profile from {}", path.display());
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Build the executor's directives
    ///
    /// Overrides are applied before exclusions, so a task both overridden
    /// and excluded is skipped.
    pub fn directives(&self) -> Result<Directives, ConfigError> {
        let mut directives = Directives::new();

        for entry in &self.overrides {
            let identifier: Identifier = entry.task.parse()?;
            let status = entry
                .status
                .as_deref()
                .map(str::parse::<Status>)
                .transpose()
                .map_err(ConfigError::InvalidStatus)?;
            directives.force(identifier, ForcedResult {
                status,
                payload: entry.payload.clone(),
                summary: entry.summary.clone(),
            });
        }

        for task in &self.exclude {
            directives.skip(task.parse()?);
        }

        for (task, options) in &self.task_options {
            directives.set_task_options(task.parse()?, options.clone());
        }

        Ok(directives)
    }

    /// The report filter
    pub fn status_filter(&self) -> Result<StatusFilter, ConfigError> {
        StatusFilter::parse(&self.filter).map_err(ConfigError::InvalidStatus)
    }
}
