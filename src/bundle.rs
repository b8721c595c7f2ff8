//! Output bundle
//!
//! Writes the JSON report and every file the tasks asked to collect into a
//! directory. Files land under `files/<Category>/<Subcategory>/`; a name
//! collected twice is stored as `name(1).ext`, `name(2).ext` and so on.
//! Streamed envelopes are pulled line by line through their transform.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;
use thiserror::Error;

use crate::core::models::FileCopyEnvelope;
use crate::core::services::ResultStore;
use crate::output::RunReport;

/// Name of the report inside the bundle
pub const REPORT_FILE: &str = "nrdiag-output.json";

/// Directory collected files are stored under
pub const FILES_DIR: &str = "files";

/// Errors that prevent the bundle from being written
#[derive(Debug, Error)]
pub enum BundleError {
    /// A directory or the report could not be written
    #[error("failed to write {}: {source}", path.display())]
    Io {
        /// Path that failed
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// The report could not be serialized
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A collected file as stored in the bundle
#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    /// Original location on the host
    pub source: PathBuf,
    /// Location inside the bundle, relative to its root
    pub stored_as: String,
    /// Whether the content went through a line transform
    pub streamed: bool,
}

/// What was written
#[derive(Debug, Serialize)]
pub struct BundleSummary {
    /// Bundle root
    pub directory: PathBuf,
    /// Path of the JSON report
    pub report: PathBuf,
    /// Files copied into the bundle
    pub files: Vec<StoredFile>,
    /// Files that could not be copied, with the error
    pub failed: Vec<(PathBuf, String)>,
}

/// Write `report` and the files referenced by `store` into `dir`
///
/// A file that cannot be read is logged and listed in
/// [`BundleSummary::failed`]; it does not stop the bundle.
pub fn write_bundle(
    dir: &Path,
    report: &RunReport,
    store: &ResultStore,
) -> Result<BundleSummary, BundleError> {
    create_dir(dir)?;

    let report_path = dir.join(REPORT_FILE);
    let json = serde_json::to_string_pretty(report)?;
    fs::write(&report_path, json).map_err(|source| BundleError::Io {
        path: report_path.clone(),
        source,
    })?;
    debug!("Wrote {}", report_path.display());

    let mut summary = BundleSummary {
        directory: dir.to_path_buf(),
        report: report_path,
        files: Vec::new(),
        failed: Vec::new(),
    };

    let mut taken = HashSet::new();
    for entry in store.iter() {
        for envelope in &entry.result.files_to_copy {
            let mut envelope = envelope.clone();
            while taken.contains(&envelope.store_name()) {
                envelope.mark_duplicate();
            }
            let stored_as = envelope.store_name();
            taken.insert(stored_as.clone());

            let target = dir.join(FILES_DIR).join(&stored_as);
            match copy_envelope(&envelope, &target) {
                Ok(()) => summary.files.push(StoredFile {
                    source: envelope.path().to_path_buf(),
                    stored_as: format!("{FILES_DIR}/{stored_as}"),
                    streamed: envelope.is_streamed(),
                }),
                Err(e) => {
                    warn!("Could not collect {}: {e}", envelope.path().display());
                    summary.failed.push((envelope.path().to_path_buf(), e.to_string()));
                },
            }
        }
    }

    Ok(summary)
}

fn create_dir(dir: &Path) -> Result<(), BundleError> {
    fs::create_dir_all(dir).map_err(|source| BundleError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

fn copy_envelope(envelope: &FileCopyEnvelope, target: &Path) -> io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }

    if !envelope.is_streamed() {
        fs::copy(envelope.path(), target)?;
        return Ok(());
    }

    let mut out = BufWriter::new(File::create(target)?);
    for line in envelope.open_stream()? {
        writeln!(out, "{}", line?)?;
    }
    out.flush()
}
