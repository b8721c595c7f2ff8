//! Built-in host checks
//!
//! A small catalogue of self-contained checks. Payload shapes are documented
//! on each producer; consumers downcast them and treat a missing or
//! unexpected payload as "did not run".
//!
//! ```text
//! Base/Env/HostInfo
//! Base/Env/CollectEnvVars
//!   └── Base/Config/Collect
//!         └── Base/Config/ValidateLicenseKey (also reads CollectEnvVars)
//! ```

pub mod config;
pub mod env;

pub use config::{CollectTask, ConfigFile, LicenseKeys, ValidateLicenseKeyTask};
pub use env::{CollectEnvVarsTask, HostInfo, HostInfoTask};

use crate::core::services::{Catalogue, CatalogueError};

/// Register every built-in task
pub fn register_builtin(catalogue: &mut Catalogue) -> Result<(), CatalogueError> {
    catalogue.register(HostInfoTask)?;
    catalogue.register(CollectEnvVarsTask)?;
    catalogue.register(CollectTask)?;
    catalogue.register(ValidateLicenseKeyTask)?;
    Ok(())
}

/// A catalogue holding the built-in tasks
pub fn builtin_catalogue() -> Result<Catalogue, CatalogueError> {
    let mut catalogue = Catalogue::new();
    register_builtin(&mut catalogue)?;
    Ok(catalogue)
}
