//! Tests for plan execution
//!
//! The executor runs each planned task once, hands it its dependencies'
//! results and records what it returns, or what configuration forces.

use std::sync::{Arc, Mutex};

use nrdiag::core::models::{Options, Status, TaskResult};
use nrdiag::core::ports::Upstream;
use nrdiag::core::services::{
    Directives, Executor, ForcedResult, Resolver, ResultStore, Selection, StoreError,
};

use crate::common::{MockTask, catalogue_of, count, id, recorded};

// =============================================================================
// Running
// =============================================================================

#[test]
fn store_follows_plan_order() {
    let catalogue = catalogue_of([
        MockTask::new("T/T/A"),
        MockTask::new("T/T/B").depends_on(&["T/T/A"]),
        MockTask::new("T/T/C").depends_on(&["T/T/B"]),
    ]);
    let plan = Resolver::new(&catalogue).resolve(&Selection::parse(&["T/T/C"]).unwrap());

    let store = Executor::new(&catalogue).run(&plan, &Options::new());

    assert_eq!(recorded(&store), vec!["T/T/A", "T/T/B", "T/T/C"]);
    assert_eq!(store.get(&id("T/T/B")).unwrap().summary, "ran T/T/B");
    assert!(store.iter().all(|entry| !entry.was_override));
}

#[test]
fn each_task_runs_once() {
    let shared = MockTask::new("T/T/Shared");
    let calls = shared.calls();
    let catalogue = catalogue_of([
        shared,
        MockTask::new("T/T/One").depends_on(&["T/T/Shared"]),
        MockTask::new("T/T/Two").depends_on(&["T/T/Shared"]),
    ]);
    let plan = Resolver::new(&catalogue).resolve(&Selection::all());

    let store = Executor::new(&catalogue).run(&plan, &Options::new());

    assert_eq!(store.len(), 3);
    assert_eq!(count(&calls), 1);
}

#[test]
fn upstream_holds_declared_dependencies_only() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);

    let catalogue = catalogue_of([
        MockTask::new("T/T/A").returning(TaskResult::info("a").with_payload(7_u32)),
        MockTask::new("T/T/Other"),
        MockTask::new("T/T/B").depends_on(&["T/T/A"]).with(move |_, upstream| {
            let mut seen = recorder.lock().unwrap();
            seen.extend(upstream.iter().map(|(id, _)| id.to_string()));
            let value = upstream.get("t/t/a").and_then(|r| r.payload_as::<u32>()).copied();
            TaskResult::success(format!("got {value:?}"))
        }),
    ]);
    let plan = Resolver::new(&catalogue).resolve(&Selection::all());

    let store = Executor::new(&catalogue).run(&plan, &Options::new());

    assert_eq!(*seen.lock().unwrap(), vec!["T/T/A".to_string()]);
    assert_eq!(store.get(&id("T/T/B")).unwrap().summary, "got Some(7)");
}

#[test]
fn upstream_found_when_dependency_case_differs() {
    let catalogue = catalogue_of([
        MockTask::new("T/T/Source").returning(TaskResult::info("a").with_payload(3_u32)),
        MockTask::new("T/T/Sink").depends_on(&["t/t/SOURCE"]).with(|_, upstream| {
            let value = upstream.get("T/T/Source").and_then(|r| r.payload_as::<u32>()).copied();
            TaskResult::success(format!("got {value:?}"))
        }),
    ]);
    let plan = Resolver::new(&catalogue).resolve(&Selection::all());

    let store = Executor::new(&catalogue).run(&plan, &Options::new());

    assert_eq!(store.get(&id("T/T/Sink")).unwrap().summary, "got Some(3)");
}

#[test]
fn options_reach_every_task() {
    let catalogue = catalogue_of([
        MockTask::new("T/T/A").with(|options, _| {
            TaskResult::info(options.get("searchPath").unwrap_or("unset"))
        }),
        MockTask::new("T/T/B").with(|options, _| {
            TaskResult::info(options.get("searchPath").unwrap_or("unset"))
        }),
    ]);
    let plan = Resolver::new(&catalogue).resolve(&Selection::all());
    let options: Options = [("searchPath", "/etc/newrelic")].into_iter().collect();

    let store = Executor::new(&catalogue).run(&plan, &options);

    assert!(store.iter().all(|entry| entry.result.summary == "/etc/newrelic"));
}

#[test]
fn task_options_override_global_options_for_that_task() {
    fn echo(options: &Options, _: &Upstream<'_>) -> TaskResult {
        TaskResult::info(options.get("mode").unwrap_or("unset"))
    }
    let catalogue =
        catalogue_of([MockTask::new("T/T/A").with(echo), MockTask::new("T/T/B").with(echo)]);
    let plan = Resolver::new(&catalogue).resolve(&Selection::all());

    let mut directives = Directives::new();
    directives.set_task_options(id("T/T/B"), [("mode", "strict")].into_iter().collect());
    let options: Options = [("mode", "loose")].into_iter().collect();

    let store = Executor::new(&catalogue).with_directives(&directives).run(&plan, &options);

    assert_eq!(store.get(&id("T/T/A")).unwrap().summary, "loose");
    assert_eq!(store.get(&id("T/T/B")).unwrap().summary, "strict");
}

// =============================================================================
// Failure isolation
// =============================================================================

#[test]
fn panic_becomes_error_and_run_continues() {
    let catalogue = catalogue_of([
        MockTask::new("T/T/A").panicking("disk on fire"),
        MockTask::new("T/T/B"),
        MockTask::new("T/T/C").depends_on(&["T/T/A"]).with(|_, upstream| {
            TaskResult::info(format!("upstream was {}", upstream.status("T/T/A")))
        }),
    ]);
    let plan = Resolver::new(&catalogue).resolve(&Selection::all());

    let store = Executor::new(&catalogue).run(&plan, &Options::new());

    let a = store.get(&id("T/T/A")).unwrap();
    assert_eq!(a.status, Status::Error);
    assert!(a.summary.contains("disk on fire"));
    assert!(a.summary.contains("T/T/A"));
    assert_eq!(store.get(&id("T/T/B")).unwrap().status, Status::Success);
    assert_eq!(store.get(&id("T/T/C")).unwrap().summary, "upstream was Error");
}

#[test]
fn failing_dependency_still_runs_dependents() {
    let catalogue = catalogue_of([
        MockTask::new("T/T/A").returning(TaskResult::failure("nope")),
        MockTask::new("T/T/B").depends_on(&["T/T/A"]).with(|_, upstream| {
            if upstream.succeeded("T/T/A") {
                TaskResult::success("continuing")
            } else {
                TaskResult::none("dependency did not succeed")
            }
        }),
    ]);
    let plan = Resolver::new(&catalogue).resolve(&Selection::all());

    let store = Executor::new(&catalogue).run(&plan, &Options::new());

    assert_eq!(store.get(&id("T/T/B")).unwrap().status, Status::None);
}

#[test]
fn unresolvable_tasks_never_execute() {
    let broken = MockTask::new("T/T/X").depends_on(&["Gone/Gone/Gone"]);
    let calls = broken.calls();
    let catalogue = catalogue_of([MockTask::new("T/T/A"), broken]);
    let plan = Resolver::new(&catalogue).resolve(&Selection::all());

    let store = Executor::new(&catalogue).run(&plan, &Options::new());

    assert_eq!(recorded(&store), vec!["T/T/A"]);
    assert_eq!(count(&calls), 0);
}

// =============================================================================
// Directives
// =============================================================================

#[test]
fn override_records_forced_result_without_executing() {
    let forced = MockTask::new("T/T/A");
    let calls = forced.calls();
    let catalogue = catalogue_of([
        forced,
        MockTask::new("T/T/B").depends_on(&["T/T/A"]).with(|_, upstream| {
            let payload = upstream.get("T/T/A").and_then(|r| r.payload_as::<String>()).cloned();
            TaskResult::info(payload.unwrap_or_default())
        }),
    ]);
    let plan = Resolver::new(&catalogue).resolve(&Selection::all());

    let mut directives = Directives::new();
    directives.force(id("t/t/a"), ForcedResult {
        status: Some(Status::Success),
        payload: Some("/etc/newrelic.yml".to_string()),
        summary: None,
    });

    let store = Executor::new(&catalogue).with_directives(&directives).run(&plan, &Options::new());

    assert_eq!(count(&calls), 0);
    let entry = store.entry(&id("T/T/A")).unwrap();
    assert!(entry.was_override);
    assert_eq!(entry.result.status, Status::Success);
    assert!(entry.result.summary.contains("Status set by override to Success"));
    assert!(entry.result.summary.contains("Payload set by override"));
    assert_eq!(store.get(&id("T/T/B")).unwrap().summary, "/etc/newrelic.yml");
}

#[test]
fn override_summary_replaces_generated_text() {
    let forced = ForcedResult {
        status: Some(Status::Warning),
        payload: None,
        summary: Some("pinned for this host".to_string()),
    };
    let result = forced.to_result();

    assert_eq!(result.status, Status::Warning);
    assert_eq!(result.summary, "pinned for this host");
    assert!(result.payload.is_none());
}

#[test]
fn skipped_task_is_noted_but_has_no_result() {
    let skipped = MockTask::new("T/T/A");
    let calls = skipped.calls();
    let catalogue = catalogue_of([
        skipped,
        MockTask::new("T/T/B").depends_on(&["T/T/A"]).with(|_, upstream| {
            TaskResult::info(format!("{} upstream", upstream.len()))
        }),
    ]);
    let plan = Resolver::new(&catalogue).resolve(&Selection::all());

    let mut directives = Directives::new();
    directives.skip(id("T/T/A"));

    let store = Executor::new(&catalogue).with_directives(&directives).run(&plan, &Options::new());

    assert_eq!(count(&calls), 0);
    assert!(!store.contains(&id("T/T/A")));
    assert_eq!(store.skipped(), &[id("T/T/A")]);
    assert_eq!(store.get(&id("T/T/B")).unwrap().summary, "0 upstream");
}

// =============================================================================
// Result store
// =============================================================================

#[test]
fn store_rejects_second_record() {
    let mut store = ResultStore::new();
    store.record(id("T/T/A"), TaskResult::success("first"), false).unwrap();

    let err = store.record(id("T/T/A"), TaskResult::failure("second"), true).unwrap_err();

    assert!(matches!(err, StoreError::AlreadyRecorded(_)));
    assert_eq!(store.len(), 1);
    assert_eq!(store.get(&id("T/T/A")).unwrap().summary, "first");
}

#[test]
fn store_rejects_skip_after_record() {
    let mut store = ResultStore::new();
    store.record(id("T/T/A"), TaskResult::success("ran"), false).unwrap();

    assert!(matches!(store.record_skip(id("T/T/A")), Err(StoreError::AlreadyRecorded(_))));
    store.record_skip(id("T/T/B")).unwrap();
    assert!(store.record(id("T/T/B"), TaskResult::info("late"), false).is_err());
    assert!(store.skipped().iter().eq([&id("T/T/B")]));
}

#[test]
fn store_serializes_flat_entries() {
    let mut store = ResultStore::new();
    store.record(id("Base/Env/HostInfo"), TaskResult::info("linux"), false).unwrap();

    let json = serde_json::to_value(store.iter().collect::<Vec<_>>()).unwrap();

    assert_eq!(
        json,
        serde_json::json!([{
            "identifier": "Base/Env/HostInfo",
            "status": "Info",
            "summary": "linux",
            "was_override": false
        }])
    );
}
