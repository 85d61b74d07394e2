//! apki Core - Package relationship graph over a quad store
//!
//! This crate provides the core functionality for package graphs:
//! - Quad storage with SQLite and in-memory backends
//! - Graph building from package records (provide / depend / install-if)
//! - Multi-step path queries with limits and cancellation
//! - A bootstrap lifecycle that builds the graph exactly once per store

pub mod builder;
pub mod error;
pub mod graph;
pub mod quad;
pub mod query;
pub mod record;
pub mod service;
pub mod source;
pub mod stats;
pub mod store;

// Re-exports for convenience
pub use quad::{Predicate, Quad};
pub use record::PackageRecord;

// Builder re-exports
pub use builder::{
    bare_name, fingerprint, record_quads, BuildProgress, BuildReport, GraphBuilder, NoProgress,
};

// Store re-exports
pub use store::{
    open_store, BackendKind, MemoryQuadStore, QuadStore, SqliteQuadStore, StoreConfig,
    StoreError, StoreStats, STORE_SCHEMA_VERSION,
};

// Query re-exports
pub use query::{
    CancelToken, Direction, PathQuery, QueryEngine, QueryError, QueryLimits, QueryResult, Step,
};

// Graph re-exports
pub use graph::{
    BootstrapOutcome, BuildMarker, GraphState, PackageGraph, RebuildPolicy, RebuildReason,
};
pub use service::{Dependents, GraphService};
pub use source::{JsonIndexSource, PackageSource, SourceError, StaticSource};
pub use stats::{GraphStats, StatsCollector};

pub use error::{ErrorKind, GraphError};
