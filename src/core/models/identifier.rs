//! Task identifiers
//!
//! Every task is named by a `Category/Subcategory/Name` triple. The slash
//! delimited string form is the canonical key used in logs, reports and
//! configuration files.
//!
//! # Examples
//!
//! ```
//! use nrdiag::core::models::Identifier;
//!
//! let id: Identifier = "Base/Env/HostInfo".parse().unwrap();
//! assert_eq!(id.category(), "Base");
//! assert_eq!(id.to_string(), "Base/Env/HostInfo");
//!
//! assert!("Base/Env".parse::<Identifier>().is_err());
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Errors raised when building an identifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// The string did not have exactly three non-empty segments
    #[error("malformed identifier '{0}': expected Category/Subcategory/Name")]
    Malformed(String),
}

/// The `Category/Subcategory/Name` key of a task
///
/// Equality, hashing and ordering all follow the string form, so they agree
/// even for identifiers built with [`Identifier::new`] that never passed
/// [`Identifier::validate`].
#[derive(Debug, Clone)]
pub struct Identifier {
    category: String,
    subcategory: String,
    name: String,
}

impl Identifier {
    /// Build an identifier from its three segments
    ///
    /// Segments are not checked here; [`Identifier::validate`] applies the
    /// same rules as parsing and is run when a task is registered.
    #[must_use]
    pub fn new(
        category: impl Into<String>,
        subcategory: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            subcategory: subcategory.into(),
            name: name.into(),
        }
    }

    /// Check every segment is non-empty and free of `/`
    pub fn validate(&self) -> Result<(), IdentifierError> {
        let valid = [&self.category, &self.subcategory, &self.name]
            .iter()
            .all(|segment| !segment.trim().is_empty() && !segment.contains('/'));

        if valid { Ok(()) } else { Err(IdentifierError::Malformed(self.to_string())) }
    }

    /// The category segment (e.g. `Base`)
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// The subcategory segment (e.g. `Env`)
    #[must_use]
    pub fn subcategory(&self) -> &str {
        &self.subcategory
    }

    /// The name segment (e.g. `HostInfo`)
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compare against a string form, ignoring ASCII case
    #[must_use]
    pub fn eq_ignore_case(&self, other: &str) -> bool {
        let mut parts = other.split('/');
        let matches = parts.next().is_some_and(|c| c.eq_ignore_ascii_case(&self.category))
            && parts.next().is_some_and(|s| s.eq_ignore_ascii_case(&self.subcategory))
            && parts.next().is_some_and(|n| n.eq_ignore_ascii_case(&self.name));
        matches && parts.next().is_none()
    }

    /// Bytes of the canonical string form, without allocating it
    fn key_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.category
            .bytes()
            .chain(std::iter::once(b'/'))
            .chain(self.subcategory.bytes())
            .chain(std::iter::once(b'/'))
            .chain(self.name.bytes())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.category, self.subcategory, self.name)
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parts: Vec<&str> = s.split('/').collect();
        match parts.as_slice() {
            [category, subcategory, name] => {
                let id = Self::new(*category, *subcategory, *name);
                id.validate().map_err(|_| IdentifierError::Malformed(s.to_string()))?;
                Ok(id)
            },
            _ => Err(IdentifierError::Malformed(s.to_string())),
        }
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.key_bytes().eq(other.key_bytes())
    }
}

impl Eq for Identifier {}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.key_bytes() {
            state.write_u8(byte);
        }
        state.write_u8(0xff);
    }
}

// Ordered by the string form so that plans sort the same way they print.
impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key_bytes().cmp(other.key_bytes())
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
