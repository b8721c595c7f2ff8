//! Tests for the Output module
//!
//! Output provides structured result types that can be rendered as either
//! human-readable text or machine-parseable JSON.

use chrono::Utc;
use nrdiag::core::models::{Options, Status, TaskResult};
use nrdiag::core::services::{
    Directives, Executor, ForcedResult, Resolver, Selection, StatusFilter,
};
use nrdiag::output::{OutputMode, PlanReport, RunReport, TaskListing};

use crate::common::{MockTask, catalogue_of, id};

fn plain() {
    colored::control::set_override(false);
}

fn sample_run(filter: &StatusFilter) -> RunReport {
    let catalogue = catalogue_of([
        MockTask::new("T/T/Ok"),
        MockTask::new("T/T/Warn").returning(
            TaskResult::warning("disk almost full\nclean /var/log")
                .with_url("https://example.test"),
        ),
        MockTask::new("T/T/Forced"),
        MockTask::new("T/T/Broken").depends_on(&["Gone/Gone/Gone"]),
    ]);
    let mut directives = Directives::new();
    directives.force(id("T/T/Forced"), ForcedResult {
        status: Some(Status::Info),
        ..ForcedResult::default()
    });

    let selection = Selection::parse(&["all", "Not/A/Task"]).unwrap();
    let plan = Resolver::new(&catalogue).resolve(&selection);
    let started_at = Utc::now();
    let store = Executor::new(&catalogue).with_directives(&directives).run(&plan, &Options::new());
    RunReport::new(&plan, &store, filter, started_at)
}

// =============================================================================
// OutputMode Tests
// =============================================================================

#[test]
fn output_mode_default() {
    assert_eq!(OutputMode::default(), OutputMode::Human);
}

// =============================================================================
// RunReport Tests
// =============================================================================

#[test]
fn run_report_counts_and_not_run() {
    let report = sample_run(&StatusFilter::All);

    assert_eq!(report.results.len(), 3);
    assert_eq!(report.summary, "1 Info, 1 Success, 1 Warning");
    assert_eq!(report.hidden, 0);
    assert!(report.has_failures());
    assert!(report.finished_at >= report.started_at);

    let not_run: Vec<&str> = report.not_run.iter().map(|n| n.task.as_str()).collect();
    assert_eq!(not_run, vec!["Not/A/Task", "T/T/Broken"]);
}

#[test]
fn run_report_filter_hides_results() {
    let filter = StatusFilter::parse(&["warning"]).unwrap();
    let report = sample_run(&filter);

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].identifier, id("T/T/Warn"));
    assert_eq!(report.hidden, 2);
    assert_eq!(report.summary, "1 Warning");
}

#[test]
fn run_report_lists_tasks_skipped_at_execution() {
    let catalogue = catalogue_of([
        MockTask::new("T/T/A"),
        MockTask::new("T/T/B").depends_on(&["T/T/A"]),
    ]);
    let plan = Resolver::new(&catalogue).resolve(&Selection::all());
    let mut directives = Directives::new();
    directives.skip(id("T/T/A"));

    let started_at = Utc::now();
    let store = Executor::new(&catalogue).with_directives(&directives).run(&plan, &Options::new());
    let report = RunReport::new(&plan, &store, &StatusFilter::All, started_at);

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.not_run.len(), 1);
    assert_eq!(report.not_run[0].task, "T/T/A");
    assert_eq!(report.not_run[0].reason, "Excluded from this run");
}

#[test]
fn run_report_human_text() {
    plain();
    let text = sample_run(&StatusFilter::All).to_human();

    assert!(text.contains("Warning T/T/Warn"));
    assert!(text.contains("    disk almost full\n    clean /var/log"));
    assert!(text.contains("See https://example.test"));
    assert!(text.contains("Info T/T/Forced (override)"));
    assert!(text.contains("Not run:"));
    assert!(text.contains("Summary: 1 Info, 1 Success, 1 Warning"));
}

#[test]
fn run_report_human_text_mentions_hidden() {
    plain();
    let filter = StatusFilter::parse(&["error"]).unwrap();
    let text = sample_run(&filter).to_human();

    assert!(text.contains("No results to show."));
    assert!(text.contains("Summary: none (3 hidden by filter)"));
}

#[test]
fn run_report_json_shape() {
    let report = sample_run(&StatusFilter::All);
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["results"][0]["identifier"], "T/T/Forced");
    assert_eq!(json["results"][0]["was_override"], true);
    assert_eq!(json["results"][2]["url"], "https://example.test");
    assert_eq!(json["not_run"][1]["task"], "T/T/Broken");
    assert!(json["started_at"].is_string());
}

// =============================================================================
// PlanReport Tests
// =============================================================================

#[test]
fn plan_report_lists_order() {
    plain();
    let catalogue = catalogue_of([
        MockTask::new("T/T/A"),
        MockTask::new("T/T/B").depends_on(&["T/T/A"]),
    ]);
    let plan = Resolver::new(&catalogue).resolve(&Selection::all().excluding([id("T/T/A")]));
    let report = PlanReport::new(&plan);

    assert_eq!(report.order, vec![id("T/T/B")]);
    let text = report.to_human();
    assert!(text.contains("Execution order:"));
    assert!(text.contains("1. T/T/B"));
    assert!(text.contains("T/T/A - Excluded from this run"));
}

#[test]
fn empty_plan_says_nothing_to_run() {
    let catalogue = catalogue_of([MockTask::new("T/T/A")]);
    let plan = Resolver::new(&catalogue).resolve(&Selection::parse(&["Ruby/*"]).unwrap());
    assert!(PlanReport::new(&plan).to_human().starts_with("Nothing to run."));
}

// =============================================================================
// TaskListing Tests
// =============================================================================

#[test]
fn task_listing_groups_by_category() {
    plain();
    let mut catalogue = catalogue_of([
        MockTask::new("Base/Env/HostInfo"),
        MockTask::new("Base/Config/Collect").depends_on(&["Base/Env/HostInfo"]),
    ]);
    catalogue.register_opt_in(MockTask::new("Base/Env/Slow")).unwrap();

    let listing = TaskListing::new(&catalogue);
    assert_eq!(listing.tasks.len(), 3);
    assert_eq!(listing.tasks[0].dependencies, vec![id("Base/Env/HostInfo")]);

    let text = listing.to_human();
    assert!(text.starts_with("Base\n  Config\n    Collect - Mock task\n  Env\n"));
    assert!(text.contains("    Slow [opt-in] - Mock task"));
}
