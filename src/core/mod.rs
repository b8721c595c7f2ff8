//! Core domain logic for nrdiag
//!
//! This module holds the task model and the resolution/execution engine.
//! Individual checks plug in through the [`ports::Task`] trait.
//!
//! ## Architecture
//!
//! - `models/` - Domain types (Identifier, Status, `TaskResult`, Options)
//! - `ports/` - The `Task` capability every check implements
//! - `services/` - Catalogue, selection, resolver, executor, result store

pub mod models;
pub mod ports;
pub mod services;
