//! Plan command - dry run of dependency resolution

use std::path::Path;

use nrdiag::output::{OutputMode, PlanReport};

use super::context::RunContext;
use crate::cli::SelectArgs;

/// Show what a run would execute, in order
pub fn plan(config: Option<&Path>, select: &SelectArgs, mode: OutputMode) -> anyhow::Result<()> {
    let ctx = RunContext::prepare(config, select)?;
    PlanReport::new(&ctx.plan()).render(mode);
    Ok(())
}
