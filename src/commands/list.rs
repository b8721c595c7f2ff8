//! List command - show registered tasks

use anyhow::Context;

use nrdiag::output::{OutputMode, TaskListing};
use nrdiag::tasks;

/// Print every registered task as a Category / Subcategory / Name tree
pub fn list(mode: OutputMode) -> anyhow::Result<()> {
    let catalogue = tasks::builtin_catalogue().context("failed to register built-in tasks")?;
    TaskListing::new(&catalogue).render(mode);
    Ok(())
}
