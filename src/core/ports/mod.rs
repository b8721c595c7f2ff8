//! Port traits (interfaces) for external collaborators
//!
//! The engine only ever talks to checks through these traits. Concrete checks
//! live in the `tasks` module, or in tests as small mocks.

mod task;

pub use task::{Task, Upstream};
