//! Command implementations

mod context;
mod list;
mod plan;
mod run;
mod suites;

pub use list::list;
pub use plan::plan;
pub use run::run;
pub use suites::suites;
