//! Top-level error type for graph operations.

use thiserror::Error;

use crate::query::QueryError;
use crate::source::SourceError;
use crate::store::StoreError;

/// Coarse classification used by boundary layers to pick a response code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Store location could not be created or opened
    StorageInit,
    /// A write failed during the bootstrap build
    StorageWrite,
    /// A read failed while querying
    StorageRead,
    /// Malformed or over-limit query
    Query,
    /// Package records could not be loaded
    Source,
}

impl ErrorKind {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::StorageInit => "storage_init",
            ErrorKind::StorageWrite => "storage_write",
            ErrorKind::StorageRead => "storage_read",
            ErrorKind::Query => "query",
            ErrorKind::Source => "source",
        }
    }
}

/// Errors returned by [`PackageGraph`](crate::graph::PackageGraph) and
/// [`GraphService`](crate::service::GraphService).
#[derive(Debug, Error)]
pub enum GraphError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Source(#[from] SourceError),

    /// The persisted build marker could not be decoded
    #[error("corrupt build marker: {0}")]
    Marker(#[from] serde_json::Error),
}

impl GraphError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GraphError::Store(e) | GraphError::Query(QueryError::Store(e)) => match e {
                StoreError::Init { .. } | StoreError::SchemaVersionMismatch { .. } => {
                    ErrorKind::StorageInit
                }
                StoreError::Write { .. } => ErrorKind::StorageWrite,
                StoreError::Read { .. } => ErrorKind::StorageRead,
            },
            GraphError::Query(_) => ErrorKind::Query,
            GraphError::Source(_) => ErrorKind::Source,
            GraphError::Marker(_) => ErrorKind::StorageRead,
        }
    }
}
