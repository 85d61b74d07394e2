//! Stats Collector
//!
//! Read-only view of graph size, used for bootstrap decisions and reporting.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::store::{QuadStore, StoreError};

/// Graph size as reported to callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub nodes: u64,
    pub quads: u64,
}

/// Thin accessor over [`QuadStore::stats`].
#[derive(Clone)]
pub struct StatsCollector {
    store: Arc<dyn QuadStore>,
}

impl StatsCollector {
    pub fn new(store: Arc<dyn QuadStore>) -> Self {
        Self { store }
    }

    /// Current counts, read from the store on every call.
    pub fn collect(&self) -> Result<GraphStats, StoreError> {
        let stats = self.store.stats()?;
        Ok(GraphStats {
            nodes: stats.node_count,
            quads: stats.quad_count,
        })
    }

    /// True when the store holds no nodes.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.collect()?.nodes == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quad::Quad;
    use crate::store::MemoryQuadStore;

    #[test]
    fn test_collect_tracks_writes() {
        let store: Arc<dyn QuadStore> = Arc::new(MemoryQuadStore::new());
        let collector = StatsCollector::new(store.clone());
        assert!(collector.is_empty().unwrap());

        store.add_quad(&Quad::new("a", "depend", "b", "b>1")).unwrap();
        assert_eq!(collector.collect().unwrap(), GraphStats { nodes: 2, quads: 1 });
        assert!(!collector.is_empty().unwrap());
    }
}
