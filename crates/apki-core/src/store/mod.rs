//! Quad Store
//!
//! Persistent, indexed storage of (subject, predicate, object, label) quads.
//!
//! # Backends
//!
//! - [`SqliteQuadStore`]: single-file SQLite database (default)
//! - [`MemoryQuadStore`]: in-process maps, used by tests and one-shot runs
//!
//! Backends are selected by [`StoreConfig`] passed to [`open_store`]; callers
//! only ever see `Arc<dyn QuadStore>`.

mod memory;
pub mod schema;
mod sqlite;

pub use memory::MemoryQuadStore;
pub use schema::STORE_SCHEMA_VERSION;
pub use sqlite::SqliteQuadStore;

use crate::quad::Quad;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Boxed cause carried by store errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store location could not be created or opened
    #[error("failed to initialize store at '{}': {source}", location.display())]
    Init {
        location: PathBuf,
        #[source]
        source: BoxError,
    },

    /// A write failed
    #[error("store write failed during {operation}: {source}")]
    Write {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    /// A read failed
    #[error("store read failed during {operation}: {source}")]
    Read {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    /// The database at the location was written by an incompatible version
    #[error("schema version mismatch at '{}': expected {expected}, found {found}", location.display())]
    SchemaVersionMismatch {
        location: PathBuf,
        expected: String,
        found: String,
    },
}

impl StoreError {
    /// Create an Init error.
    pub fn init(location: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        Self::Init {
            location: location.into(),
            source: source.into(),
        }
    }

    /// Create a Write error.
    pub fn write(operation: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Write {
            operation,
            source: source.into(),
        }
    }

    /// Create a Read error.
    pub fn read(operation: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Read {
            operation,
            source: source.into(),
        }
    }
}

/// Aggregate counts over the current contents of a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Distinct strings appearing as a subject or object
    pub node_count: u64,
    /// Total quads written, duplicates included
    pub quad_count: u64,
}

/// Physical persistence backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Single-file SQLite database
    #[default]
    Sqlite,
    /// In-memory maps (nothing persisted)
    Memory,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Where and how to open a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: BackendKind,
    /// Database file; ignored by the memory backend
    pub path: PathBuf,
}

impl StoreConfig {
    /// SQLite store at `path`.
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendKind::Sqlite,
            path: path.into(),
        }
    }

    /// Fresh in-memory store.
    pub fn memory() -> Self {
        Self {
            backend: BackendKind::Memory,
            path: PathBuf::new(),
        }
    }
}

/// Indexed, append-only quad storage.
///
/// Implementations must be safe to share between threads: readers call
/// `traverse_*` and `stats` concurrently once the graph is built.
pub trait QuadStore: Send + Sync {
    /// Backend kind of this store.
    fn backend(&self) -> BackendKind;

    /// Filesystem location, if the backend persists.
    fn location(&self) -> Option<&Path>;

    /// Append one quad. Never overwrites or deduplicates.
    fn add_quad(&self, quad: &Quad) -> Result<(), StoreError>;

    /// Append a batch of quads.
    fn add_quads(&self, quads: &[Quad]) -> Result<(), StoreError> {
        for quad in quads {
            self.add_quad(quad)?;
        }
        Ok(())
    }

    /// Counts over the current contents.
    fn stats(&self) -> Result<StoreStats, StoreError>;

    /// Objects of all quads whose subject is in `nodes` with the given predicate.
    fn traverse_out(
        &self,
        nodes: &HashSet<String>,
        predicate: &str,
    ) -> Result<HashSet<String>, StoreError>;

    /// Subjects of all quads whose object is in `nodes` with the given predicate.
    fn traverse_in(
        &self,
        nodes: &HashSet<String>,
        predicate: &str,
    ) -> Result<HashSet<String>, StoreError>;

    /// All quads with the given subject, in insertion order.
    fn quads_with_subject(&self, subject: &str) -> Result<Vec<Quad>, StoreError>;

    /// Read a metadata value.
    fn metadata(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a metadata value, replacing any previous one.
    fn set_metadata(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Drop all quads and bootstrap metadata.
    ///
    /// Only called before a graph becomes ready, to discard an incomplete build.
    fn reset(&self) -> Result<(), StoreError>;
}

/// Open (or create) the store described by `config`.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn QuadStore>, StoreError> {
    match config.backend {
        BackendKind::Sqlite => Ok(Arc::new(SqliteQuadStore::open(&config.path)?)),
        BackendKind::Memory => Ok(Arc::new(MemoryQuadStore::new())),
    }
}
