//! Quad and predicate types
//!
//! A quad is one labeled edge of the package graph:
//! `subject -predicate-> object`, with `label` holding the raw string the
//! edge was derived from (e.g. `libc>=1.2`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One directed, labeled edge of the package graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quad {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    /// Raw source string the edge was derived from. Not used by queries.
    pub label: String,
}

impl Quad {
    /// Create a new quad.
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            label: label.into(),
        }
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -{}-> {} ({})",
            self.subject, self.predicate, self.object, self.label
        )
    }
}

/// Relationship kinds written by the graph builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Predicate {
    /// Package provides a capability
    Provide,
    /// Package depends on a capability
    Depend,
    /// Capability triggers a conditional install of the package
    InstallIf,
}

impl Predicate {
    /// All predicates, in the order the builder writes them.
    pub const ALL: [Predicate; 3] = [Predicate::Provide, Predicate::Depend, Predicate::InstallIf];

    /// Wire name stored in the quad's predicate column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Predicate::Provide => "provide",
            Predicate::Depend => "depend",
            Predicate::InstallIf => "install-if",
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Predicate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "provide" => Ok(Predicate::Provide),
            "depend" => Ok(Predicate::Depend),
            "install-if" => Ok(Predicate::InstallIf),
            other => Err(other.to_string()),
        }
    }
}
