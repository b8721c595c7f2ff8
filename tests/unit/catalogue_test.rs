//! Tests for task registration
//!
//! Identifiers are validated when a task is registered, so bad names fail
//! at startup rather than halfway through a run.

use nrdiag::core::models::Identifier;
use nrdiag::core::services::{Catalogue, CatalogueError, RunPolicy};

use crate::common::{MockTask, catalogue_of, id};

// =============================================================================
// Registration
// =============================================================================

#[test]
fn register_parses_dependencies() {
    let catalogue = catalogue_of([
        MockTask::new("Base/Env/A"),
        MockTask::new("Base/Env/B").depends_on(&["Base/Env/A"]),
    ]);

    assert_eq!(catalogue.len(), 2);
    let b = catalogue.get(&id("Base/Env/B")).unwrap();
    assert_eq!(b.dependencies(), &[id("Base/Env/A")]);
    assert_eq!(b.task().explain(), "Mock task");
    assert!(b.runs_by_default());
}

#[test]
fn register_rejects_duplicate_ignoring_case() {
    let mut catalogue = Catalogue::new();
    catalogue.register(MockTask::new("Base/Env/A")).unwrap();

    let err = catalogue.register(MockTask::new("base/env/a")).unwrap_err();
    assert!(matches!(err, CatalogueError::Duplicate(_)));
    assert_eq!(catalogue.len(), 1);
}

#[test]
fn register_rejects_malformed_identifier() {
    let mut catalogue = Catalogue::new();
    let task = MockTask::from_identifier(Identifier::new("Base", "", "A"));

    let err = catalogue.register(task).unwrap_err();
    assert!(matches!(err, CatalogueError::Malformed(_)));
    assert!(catalogue.is_empty());
}

#[test]
fn register_rejects_malformed_dependency() {
    let mut catalogue = Catalogue::new();
    let task = MockTask::new("Base/Env/A").depends_on(&["Base/Env"]);

    let err = catalogue.register(task).unwrap_err();
    assert!(matches!(err, CatalogueError::MalformedDependency { .. }));
    assert!(err.to_string().contains("Base/Env/A"));
}

#[test]
fn unregistered_dependency_is_accepted_at_registration() {
    // Reported later by the resolver
    let catalogue = catalogue_of([MockTask::new("Base/Env/A").depends_on(&["Nope/Nope/Nope"])]);
    assert_eq!(catalogue.len(), 1);
}

#[test]
fn opt_in_policy_is_recorded() {
    let mut catalogue = Catalogue::new();
    catalogue.register_opt_in(MockTask::new("Base/Env/Slow")).unwrap();
    catalogue
        .register_with(Box::new(MockTask::new("Base/Env/Fast")), RunPolicy::Default)
        .unwrap();

    assert!(!catalogue.get(&id("Base/Env/Slow")).unwrap().runs_by_default());
    assert!(catalogue.get(&id("Base/Env/Fast")).unwrap().runs_by_default());
}

// =============================================================================
// Lookup
// =============================================================================

#[test]
fn find_ignores_case_and_whitespace() {
    let catalogue = catalogue_of([MockTask::new("Base/Config/Collect")]);

    let found = catalogue.find(" base/CONFIG/collect ").unwrap();
    assert_eq!(found.identifier(), &id("Base/Config/Collect"));
    assert!(catalogue.find("Base/Config/Other").is_none());
    assert!(catalogue.find("garbage").is_none());
}

#[test]
fn iter_is_in_identifier_order() {
    let catalogue = catalogue_of([
        MockTask::new("Zeta/A/A"),
        MockTask::new("Alpha/B/B"),
        MockTask::new("Alpha/A/Z"),
    ]);

    let ids: Vec<String> = catalogue.iter().map(|r| r.identifier().to_string()).collect();
    assert_eq!(ids, vec!["Alpha/A/Z", "Alpha/B/B", "Zeta/A/A"]);
}
