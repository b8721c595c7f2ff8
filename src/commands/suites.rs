//! Suites command - show task suites

use std::path::Path;

use nrdiag::config::RunProfile;
use nrdiag::output::{OutputMode, SuiteListing};
use nrdiag::suites::SuiteManager;

/// Print built-in suites and any defined in the run profile
pub fn suites(config: Option<&Path>, mode: OutputMode) -> anyhow::Result<()> {
    let profile = RunProfile::load(config)?;
    let manager = SuiteManager::with_extra(profile.suites);
    SuiteListing {
        suites: manager.suites().to_vec(),
    }
    .render(mode);
    Ok(())
}
