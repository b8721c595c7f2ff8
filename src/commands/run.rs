//! Run command - resolve, execute and report

use std::path::Path;

use chrono::Utc;
use log::{info, warn};

use nrdiag::bundle;
use nrdiag::core::services::{Executor, StatusFilter};
use nrdiag::output::{OutputMode, RunReport};

use super::context::RunContext;
use crate::cli::RunArgs;

/// Run the selected tasks and print the report
///
/// Unresolvable tasks are reported and the rest still run.
pub fn run(config: Option<&Path>, args: &RunArgs, mode: OutputMode) -> anyhow::Result<()> {
    let ctx = RunContext::prepare(config, &args.select)?;

    let filter = if args.filter.is_empty() {
        ctx.profile.status_filter()?
    } else {
        StatusFilter::parse(&args.filter).map_err(anyhow::Error::msg)?
    };

    let plan = ctx.plan();
    for error in plan.errors() {
        warn!("{error}");
    }

    let started_at = Utc::now();
    let store = Executor::new(&ctx.catalogue)
        .with_directives(&ctx.directives)
        .run(&plan, &ctx.options);

    let report = RunReport::new(&plan, &store, &filter, started_at);
    report.render(mode);

    if let Some(dir) = &args.output {
        let summary = bundle::write_bundle(dir, &report, &store)?;
        info!(
            "Wrote {} and {} collected file(s) to {}",
            bundle::REPORT_FILE,
            summary.files.len(),
            summary.directory.display()
        );
    }

    Ok(())
}
