//! Package-metadata sources
//!
//! The graph is built from records supplied by a [`PackageSource`]. Fetching
//! and parsing repository indexes happens elsewhere; the sources here only
//! hand over already-parsed records.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::record::PackageRecord;

/// Errors that can occur while loading package records
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read package index '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse package index '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("package source unavailable: {0}")]
    Unavailable(String),
}

/// Supplier of package records for the bootstrap build.
pub trait PackageSource: Send + Sync {
    /// Human-readable description for logs.
    fn describe(&self) -> String;

    /// Load every record of the selected repository.
    fn load(&self) -> Result<Vec<PackageRecord>, SourceError>;
}

/// Records held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<PackageRecord>,
}

impl StaticSource {
    pub fn new(records: Vec<PackageRecord>) -> Self {
        Self { records }
    }
}

impl PackageSource for StaticSource {
    fn describe(&self) -> String {
        format!("static ({} records)", self.records.len())
    }

    fn load(&self) -> Result<Vec<PackageRecord>, SourceError> {
        Ok(self.records.clone())
    }
}

/// On-disk layout accepted by [`JsonIndexSource`].
#[derive(Deserialize)]
#[serde(untagged)]
enum IndexDocument {
    List(Vec<PackageRecord>),
    Wrapped { packages: Vec<PackageRecord> },
}

/// Records read from a JSON document: either an array of records or an
/// object with a `packages` array.
#[derive(Debug, Clone)]
pub struct JsonIndexSource {
    path: PathBuf,
}

impl JsonIndexSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PackageSource for JsonIndexSource {
    fn describe(&self) -> String {
        format!("json index {}", self.path.display())
    }

    fn load(&self) -> Result<Vec<PackageRecord>, SourceError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| SourceError::Read {
            path: self.path.clone(),
            source,
        })?;
        let document: IndexDocument =
            serde_json::from_str(&content).map_err(|source| SourceError::Parse {
                path: self.path.clone(),
                source,
            })?;

        let records = match document {
            IndexDocument::List(records) => records,
            IndexDocument::Wrapped { packages } => packages,
        };
        debug!(path = %self.path.display(), records = records.len(), "loaded package index");
        Ok(records)
    }
}
