//! Domain models for nrdiag
//!
//! Pure data structures with no I/O dependencies, apart from the lazy file
//! streams a task hands to the bundle.
//!
//! - [`Identifier`] - the `Category/Subcategory/Name` key of a task
//! - [`Status`] - severity-ordered outcome of a task
//! - [`TaskResult`] - what a task returns, with an opaque [`Payload`]
//! - [`FileCopyEnvelope`] - a file a task wants in the output bundle
//! - [`Options`] - free-form options passed to every task

mod file_copy;
mod identifier;
mod options;
mod result;
mod status;

pub use file_copy::{FileCopyEnvelope, LineStream, LineTransform};
pub use identifier::{Identifier, IdentifierError};
pub use options::Options;
pub use result::{Payload, PayloadValue, TaskResult};
pub use status::Status;
