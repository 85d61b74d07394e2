//! Package records as delivered by a package-metadata source.

use serde::{Deserialize, Serialize};

/// One package entry of a repository index.
///
/// Every raw entry may carry a version/operator qualifier
/// (e.g. `libc>=1.2`), kept verbatim here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Package name
    pub name: String,

    /// Capabilities this package provides
    #[serde(default)]
    pub provides: Vec<String>,

    /// Capabilities this package depends on
    #[serde(default)]
    pub depends: Vec<String>,

    /// Capabilities that trigger a conditional install of this package
    #[serde(default, alias = "installIf")]
    pub install_if: Vec<String>,
}

impl PackageRecord {
    /// Create a record with no relationships.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add provided capabilities.
    pub fn provides<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.provides.extend(entries.into_iter().map(Into::into));
        self
    }

    /// Add dependencies.
    pub fn depends<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends.extend(entries.into_iter().map(Into::into));
        self
    }

    /// Add install-if conditions.
    pub fn install_if<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.install_if.extend(entries.into_iter().map(Into::into));
        self
    }

    /// Number of quads this record produces.
    pub fn relation_count(&self) -> usize {
        self.provides.len() + self.depends.len() + self.install_if.len()
    }
}
