//! Agent configuration tasks

use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use glob::{MatchOptions, Pattern};
use log::{debug, warn};
use regex::Regex;
use serde::{Serialize, Serializer};
use walkdir::WalkDir;

use crate::core::models::{FileCopyEnvelope, Identifier, Options, TaskResult};
use crate::core::ports::{Task, Upstream};

const COLLECT_ENV_VARS: &str = "Base/Env/CollectEnvVars";
const CONFIG_COLLECT: &str = "Base/Config/Collect";

/// Agent config file names
const CONFIG_FILE_PATTERNS: &[&str] = &[
    "newrelic.yml",
    "newrelic.yaml",
    "newrelic.xml",
    "newrelic.js",
    "newrelic.cfg",
    "newrelic.ini",
    "newrelic.config",
    "newrelic.properties",
    "newrelic-infra.yml",
];

/// Environment variables that may point at a config file or directory
const CONFIG_ENV_VARS: &[&str] =
    &["NEW_RELIC_HOME", "NEW_RELIC_CONFIG_FILE", "NEW_RELIC_CONFIG_PATH", "NRIA_CONFIG_FILE"];

/// Environment variables that may hold a license key
const LICENSE_KEY_ENV_VARS: &[&str] = &["NRIA_LICENSE_KEY", "NEW_RELIC_LICENSE_KEY"];

/// Directories never searched
const IGNORED_DIRS: &[&str] = &["node_modules", ".git", "target"];

const MAX_SEARCH_DEPTH: usize = 6;

const LICENSE_KEY_LENGTH: usize = 40;

/// A license key setting: YAML/INI/JS keys, Java properties and XML attributes
static LICENSE_KEY_SETTING: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r#"((?:^|\W)["']?(?:license_key|licenseKey|newrelic\.license)["']?\s*[:=]\s*["']?)([^"'\s#;,<>]+)"#,
    )
    .ok()
});

/// A config file found on the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigFile {
    /// File name
    pub file_name: String,
    /// Containing directory
    pub directory: PathBuf,
}

impl ConfigFile {
    fn from_path(path: &Path) -> Self {
        Self {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            directory: path.parent().map(Path::to_path_buf).unwrap_or_default(),
        }
    }

    /// Full path of the file
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

/// `Base/Config/Collect`
///
/// Searches `configFile`, else `searchPath` (default: working directory),
/// plus any location named by agent environment variables.
/// Payload: `Vec<ConfigFile>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectTask;

impl Task for CollectTask {
    fn identifier(&self) -> Identifier {
        Identifier::new("Base", "Config", "Collect")
    }

    fn explain(&self) -> &str {
        "Collect New Relic configuration files"
    }

    fn dependencies(&self) -> Vec<&str> {
        vec![COLLECT_ENV_VARS]
    }

    fn execute(&self, options: &Options, upstream: &Upstream<'_>) -> TaskResult {
        let patterns: Vec<Pattern> =
            CONFIG_FILE_PATTERNS.iter().filter_map(|p| Pattern::new(p).ok()).collect();

        if let Some(config_file) = options.get("configFile") {
            let path = PathBuf::from(config_file);
            if !path.is_file() {
                return TaskResult::warning(format!(
                    "The path provided to the config file is not valid: {config_file}"
                ));
            }
            return self.found(vec![path], &[]);
        }

        let root = options
            .get("searchPath")
            .map(PathBuf::from)
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        let mut found: BTreeSet<PathBuf> =
            find_config_files(&root, &patterns).into_iter().collect();
        let mut invalid = Vec::new();

        let env_vars = upstream
            .get(COLLECT_ENV_VARS)
            .and_then(|r| r.payload_as::<BTreeMap<String, String>>());
        if env_vars.is_none() {
            debug!("No environment variables from {COLLECT_ENV_VARS}");
        }

        for key in CONFIG_ENV_VARS {
            let Some(location) = env_vars.and_then(|vars| vars.get(*key)) else {
                continue;
            };
            let location = PathBuf::from(location);
            if location.is_dir() {
                found.extend(find_config_files(&location, &patterns));
            } else if location.is_file() {
                found.insert(location);
            } else {
                invalid.push(format!("{key}={}", location.display()));
            }
        }

        if found.is_empty() {
            if invalid.is_empty() {
                return TaskResult::none(format!(
                    "No New Relic configuration files found under {}",
                    root.display()
                ));
            }
            return TaskResult::warning(format!(
                "Configuration locations set in the environment do not exist: {}",
                invalid.join(", ")
            ));
        }

        self.found(found.into_iter().collect(), &invalid)
    }
}

impl CollectTask {
    fn found(&self, paths: Vec<PathBuf>, invalid: &[String]) -> TaskResult {
        let identifier = self.identifier();
        let mut summary = format!("There were {} config file(s) found", paths.len());
        if !invalid.is_empty() {
            summary.push_str(&format!(
                "\nConfiguration locations set in the environment do not exist: {}",
                invalid.join(", ")
            ));
        }

        let files = paths
            .iter()
            .map(|p| FileCopyEnvelope::streamed(p, identifier.clone(), redact_license_key))
            .collect();
        let configs: Vec<ConfigFile> = paths.iter().map(|p| ConfigFile::from_path(p)).collect();

        TaskResult::success(summary).with_payload(configs).with_files(files)
    }
}

/// Recursively find config files under `root`
fn find_config_files(root: &Path, patterns: &[Pattern]) -> Vec<PathBuf> {
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };

    WalkDir::new(root)
        .max_depth(MAX_SEARCH_DEPTH)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !e.file_type().is_dir()
                || !IGNORED_DIRS.iter().any(|d| e.file_name() == *d)
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable entry: {e}");
                None
            },
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_string_lossy();
            patterns.iter().any(|p| p.matches_with(&name, options))
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Mask the license key on a config line, keeping its last four characters
#[must_use]
pub fn redact_license_key(line: &str) -> String {
    let Some(regex) = LICENSE_KEY_SETTING.as_ref() else {
        return line.to_string();
    };
    regex
        .replace_all(line, |caps: &regex::Captures<'_>| format!("{}{}", &caps[1], mask(&caps[2])))
        .into_owned()
}

fn mask(key: &str) -> String {
    let visible = key.len().saturating_sub(4);
    match key.get(visible..) {
        Some(tail) if visible > 0 => format!("{}{tail}", "*".repeat(visible)),
        _ => "*".repeat(key.len()),
    }
}

/// License keys found on the host, each with the places it was found
///
/// Serialized as a list of `{key, sources}` entries with the keys masked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LicenseKeys(pub BTreeMap<String, Vec<String>>);

#[derive(Serialize)]
struct MaskedKey<'a> {
    key: String,
    sources: &'a [String],
}

impl Serialize for LicenseKeys {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Masked keys can collide, so entries stay separate
        serializer.collect_seq(self.0.iter().map(|(key, sources)| MaskedKey {
            key: mask(key),
            sources,
        }))
    }
}

impl fmt::Display for LicenseKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, sources) in &self.0 {
            writeln!(f, "{}: {}", mask(key), sources.join(", "))?;
        }
        Ok(())
    }
}

/// `Base/Config/ValidateLicenseKey`
///
/// Payload: [`LicenseKeys`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateLicenseKeyTask;

impl Task for ValidateLicenseKeyTask {
    fn identifier(&self) -> Identifier {
        Identifier::new("Base", "Config", "ValidateLicenseKey")
    }

    fn explain(&self) -> &str {
        "Check that configured New Relic license keys are well formed"
    }

    fn dependencies(&self) -> Vec<&str> {
        vec![CONFIG_COLLECT, COLLECT_ENV_VARS]
    }

    fn execute(&self, _options: &Options, upstream: &Upstream<'_>) -> TaskResult {
        let mut keys: BTreeMap<String, Vec<String>> = BTreeMap::new();

        if let Some(configs) =
            upstream.get(CONFIG_COLLECT).and_then(|r| r.payload_as::<Vec<ConfigFile>>())
        {
            for config in configs {
                let path = config.path();
                match fs::read_to_string(&path) {
                    Ok(content) => {
                        for key in extract_license_keys(&content) {
                            keys.entry(key).or_default().push(path.display().to_string());
                        }
                    },
                    Err(e) => warn!("Could not read {}: {e}", path.display()),
                }
            }
        }

        if let Some(vars) = upstream
            .get(COLLECT_ENV_VARS)
            .and_then(|r| r.payload_as::<BTreeMap<String, String>>())
        {
            for name in LICENSE_KEY_ENV_VARS {
                if let Some(value) = vars.get(*name).map(|v| v.trim()).filter(|v| !v.is_empty()) {
                    keys.entry(value.to_string()).or_default().push(format!("${name}"));
                }
            }
        }

        if keys.is_empty() {
            return TaskResult::none("No New Relic license key was found");
        }

        let malformed: Vec<&String> = keys.keys().filter(|k| !is_well_formed(k)).collect();
        let sources: Vec<String> =
            malformed.iter().filter_map(|k| keys.get(*k)).flatten().cloned().collect();
        let malformed = malformed.len();
        let keys = LicenseKeys(keys);

        if malformed == 0 {
            TaskResult::success(format!("Found {} well formed license key(s)", keys.0.len()))
                .with_payload(keys)
        } else {
            TaskResult::failure(format!(
                "{} license key(s) are not {LICENSE_KEY_LENGTH} alphanumeric characters. Check: {}",
                malformed,
                sources.join(", ")
            ))
            .with_payload(keys)
        }
    }
}

/// License key values set in a config file
#[must_use]
pub fn extract_license_keys(content: &str) -> Vec<String> {
    let Some(regex) = LICENSE_KEY_SETTING.as_ref() else {
        return Vec::new();
    };
    content
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .flat_map(|line| regex.captures_iter(line))
        .map(|caps| caps[2].to_string())
        .collect()
}

fn is_well_formed(key: &str) -> bool {
    key.len() == LICENSE_KEY_LENGTH && key.chars().all(|c| c.is_ascii_alphanumeric())
}
