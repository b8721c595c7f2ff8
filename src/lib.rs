//! nrdiag - Diagnostics runner for New Relic agents
//!
//! This library provides the task engine: a catalogue of diagnostic checks,
//! dependency resolution into a deterministic execution plan, sequential
//! execution with per-task panic isolation, and reporting over the results.

// Deny all clippy warnings in this crate
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_import_braces,
    unused_qualifications
)]
// Allow some pedantic lints that are too noisy or not applicable
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cargo_common_metadata
)]

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod bundle;
pub mod config;
pub mod core;
pub mod output;
pub mod suites;
pub mod tasks;
