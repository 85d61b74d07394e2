//! Query API
//!
//! [`GraphService`] is the entry point callers use. Every operation first makes
//! sure the graph is built (see [`PackageGraph::ensure_ready`]) and then only
//! reads the store.

use std::sync::Arc;

use serde::Serialize;

use crate::builder::BuildProgress;
use crate::error::GraphError;
use crate::graph::{BootstrapOutcome, PackageGraph};
use crate::quad::Quad;
use crate::query::{CancelToken, PathQuery, QueryEngine, QueryLimits, QueryResult};
use crate::source::PackageSource;
use crate::stats::{GraphStats, StatsCollector};

/// Packages satisfying the dependencies of a package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dependents {
    /// Sorted, deduplicated package names
    pub dependencies: Vec<String>,
}

/// Query operations over a lazily bootstrapped package graph.
pub struct GraphService {
    graph: Arc<PackageGraph>,
    source: Arc<dyn PackageSource>,
    engine: QueryEngine,
    stats: StatsCollector,
}

impl GraphService {
    pub fn new(
        graph: Arc<PackageGraph>,
        source: Arc<dyn PackageSource>,
        limits: QueryLimits,
    ) -> Self {
        let store = graph.store().clone();
        Self {
            engine: QueryEngine::with_limits(store.clone(), limits),
            stats: StatsCollector::new(store),
            graph,
            source,
        }
    }

    pub fn graph(&self) -> &Arc<PackageGraph> {
        &self.graph
    }

    pub fn limits(&self) -> &QueryLimits {
        self.engine.limits()
    }

    /// Run the bootstrap explicitly, reporting build progress.
    pub fn bootstrap(
        &self,
        progress: Option<&dyn BuildProgress>,
    ) -> Result<BootstrapOutcome, GraphError> {
        self.graph.ensure_ready(self.source.as_ref(), progress)
    }

    fn ready(&self) -> Result<(), GraphError> {
        self.graph.ensure_ready(self.source.as_ref(), None)?;
        Ok(())
    }

    /// Packages that provide a direct dependency of `package`.
    ///
    /// An unknown package yields an empty list.
    pub fn get_dependents(&self, package: &str) -> Result<Dependents, GraphError> {
        self.get_transitive_dependents(package, 1)
    }

    /// Providers reached by repeating the dependency hop `hops` times.
    ///
    /// The hop count is checked against the step limit before bootstrapping.
    pub fn get_transitive_dependents(
        &self,
        package: &str,
        hops: usize,
    ) -> Result<Dependents, GraphError> {
        let query = PathQuery::bounded_transitive_dependents(package, hops, self.limits())?;
        let result = self.query(&query)?;
        Ok(Dependents {
            dependencies: result.sorted(),
        })
    }

    /// Current node and quad counts.
    pub fn get_stats(&self) -> Result<GraphStats, GraphError> {
        self.ready()?;
        Ok(self.stats.collect()?)
    }

    pub fn query(&self, query: &PathQuery) -> Result<QueryResult, GraphError> {
        self.query_with_cancel(query, &CancelToken::new())
    }

    pub fn query_with_cancel(
        &self,
        query: &PathQuery,
        cancel: &CancelToken,
    ) -> Result<QueryResult, GraphError> {
        self.ready()?;
        Ok(self.engine.execute_with_cancel(query, cancel)?)
    }

    /// Outgoing quads of `package`, labels included.
    pub fn describe(&self, package: &str) -> Result<Vec<Quad>, GraphError> {
        self.ready()?;
        Ok(self.graph.store().quads_with_subject(package)?)
    }
}
