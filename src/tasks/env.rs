//! Host environment tasks

use std::collections::BTreeMap;
use std::env;
use std::thread;

use log::debug;
use regex::RegexSet;
use serde::Serialize;

use crate::core::models::{Identifier, Options, TaskResult};
use crate::core::ports::{Task, Upstream};

/// Environment variables worth collecting, matched case-insensitively
const ENV_VAR_FILTER: &[&str] = &[
    "NEWRELIC",
    "NEW_RELIC",
    "^NRIA",
    "^PATH$",
    "^HOME$",
    "^RUBY_ENV$",
    "^RAILS_ENV$",
    "^APP_ENV$",
    "^RACK_ENV$",
    "^JBOSS_HOME$",
    "^CORECLR_ENABLE_PROFILING$",
    "^CORECLR_PROFILER$",
    "^CORECLR_PROFILER_PATH$",
    "^ProgramFiles$",
    "^ProgramData$",
];

/// Operating system details of the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostInfo {
    /// Operating system (e.g. `linux`)
    pub os: String,
    /// CPU architecture (e.g. `x86_64`)
    pub arch: String,
    /// OS family (e.g. `unix`)
    pub family: String,
    /// Logical CPUs available to the process
    pub cpus: usize,
}

impl HostInfo {
    /// Details of the current host
    #[must_use]
    pub fn current() -> Self {
        Self {
            os: env::consts::OS.to_string(),
            arch: env::consts::ARCH.to_string(),
            family: env::consts::FAMILY.to_string(),
            cpus: thread::available_parallelism().map_or(1, usize::from),
        }
    }
}

/// `Base/Env/HostInfo`
#[derive(Debug, Clone, Copy, Default)]
pub struct HostInfoTask;

impl Task for HostInfoTask {
    fn identifier(&self) -> Identifier {
        Identifier::new("Base", "Env", "HostInfo")
    }

    fn explain(&self) -> &str {
        "Collect host system info"
    }

    fn execute(&self, _options: &Options, _upstream: &Upstream<'_>) -> TaskResult {
        let info = HostInfo::current();
        debug!("Host: {} {} ({})", info.os, info.arch, info.family);
        TaskResult::info(format!("Collected host information: {} {}", info.os, info.arch))
            .with_payload(info)
    }
}

/// `Base/Env/CollectEnvVars`
///
/// Payload: `BTreeMap<String, String>` of the matching variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectEnvVarsTask;

impl Task for CollectEnvVarsTask {
    fn identifier(&self) -> Identifier {
        Identifier::new("Base", "Env", "CollectEnvVars")
    }

    fn explain(&self) -> &str {
        "Collect New Relic related environment variables"
    }

    fn execute(&self, _options: &Options, _upstream: &Upstream<'_>) -> TaskResult {
        // Variables that are not valid unicode are ignored
        let vars = env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)));
        match filter_env_vars(vars) {
            Ok(vars) if vars.is_empty() => {
                TaskResult::none("No relevant environment variables are set in the current shell")
                    .with_payload(vars)
            },
            Ok(vars) => {
                TaskResult::info(format!("Gathered {} environment variable(s)", vars.len()))
                    .with_payload(vars)
            },
            Err(e) => TaskResult::error(format!("Unable to filter environment variables: {e}")),
        }
    }
}

/// Keep only the variables matched by the default filter
pub fn filter_env_vars(
    vars: impl IntoIterator<Item = (String, String)>,
) -> Result<BTreeMap<String, String>, regex::Error> {
    let filter = RegexSet::new(ENV_VAR_FILTER.iter().map(|p| format!("(?i){p}")))?;
    Ok(vars.into_iter().filter(|(key, _)| filter.is_match(key)).collect())
}
