//! Package Graph
//!
//! Owns a store handle and its bootstrap lifecycle:
//!
//! ```text
//! Uninitialized ──ensure_ready──> Building ──ok──> Ready
//!                                     └──err──> Uninitialized
//! ```
//!
//! Whether a store already holds a finished build is decided by an explicit
//! [`BuildMarker`] written after the last quad, never by the store merely
//! being non-empty. A store with quads but no marker is the remains of an
//! interrupted build and is reset before building again.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::builder::{fingerprint, BuildProgress, BuildReport, GraphBuilder, NoProgress};
use crate::error::GraphError;
use crate::record::PackageRecord;
use crate::source::PackageSource;
use crate::stats::{GraphStats, StatsCollector};
use crate::store::QuadStore;

/// Metadata key of the build marker
pub const BUILD_MARKER_KEY: &str = "build_marker";

/// Lifecycle state of a [`PackageGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphState {
    Uninitialized,
    Building,
    Ready,
}

/// What to do with a store that already holds a completed build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RebuildPolicy {
    /// Treat a completed build as a permanent snapshot; the source is not consulted.
    #[default]
    Snapshot,
    /// Reload the source and rebuild when its fingerprint differs from the marker.
    Fingerprint,
}

/// Persisted record of a fully successful build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildMarker {
    pub record_count: u64,
    pub quad_count: u64,
    /// Hex SHA-256 of the input records
    pub fingerprint: String,
    /// Seconds since the Unix epoch
    pub completed_at: u64,
}

/// Result of [`PackageGraph::ensure_ready`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// This handle was already ready; nothing was checked.
    AlreadyReady,
    /// A completed build was found in the store and reused.
    Reused(BuildMarker),
    /// The store held no completed build and was built now.
    Built(BuildReport),
    /// A previous build was discarded and the store rebuilt.
    Rebuilt {
        reason: RebuildReason,
        report: BuildReport,
    },
}

/// Why an existing store was rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildReason {
    /// Quads present without a marker (interrupted build)
    Incomplete,
    /// Marker fingerprint differs from the current source
    Stale,
    /// Marker records an empty build
    Empty,
}

/// Decision taken from the store contents before building.
enum Plan {
    Reuse(BuildMarker),
    Build,
    Rebuild(RebuildReason),
}

/// A quad store plus its bootstrap lifecycle.
pub struct PackageGraph {
    store: Arc<dyn QuadStore>,
    policy: RebuildPolicy,
    state: RwLock<GraphState>,
    /// Serializes bootstrap attempts
    bootstrap: Mutex<()>,
}

impl PackageGraph {
    pub fn new(store: Arc<dyn QuadStore>, policy: RebuildPolicy) -> Self {
        Self {
            store,
            policy,
            state: RwLock::new(GraphState::Uninitialized),
            bootstrap: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn QuadStore> {
        &self.store
    }

    pub fn policy(&self) -> RebuildPolicy {
        self.policy
    }

    pub fn state(&self) -> GraphState {
        *self.state.read()
    }

    pub fn stats(&self) -> Result<GraphStats, GraphError> {
        Ok(StatsCollector::new(self.store.clone()).collect()?)
    }

    /// The persisted build marker, if a build has completed.
    pub fn marker(&self) -> Result<Option<BuildMarker>, GraphError> {
        match self.store.metadata(BUILD_MARKER_KEY)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Make sure the store holds a completed build, building it if needed.
    ///
    /// Concurrent callers are serialized; exactly one of them ingests and the
    /// others observe `AlreadyReady`.
    pub fn ensure_ready(
        &self,
        source: &dyn PackageSource,
        progress: Option<&dyn BuildProgress>,
    ) -> Result<BootstrapOutcome, GraphError> {
        if self.state() == GraphState::Ready {
            return Ok(BootstrapOutcome::AlreadyReady);
        }

        let _guard = self.bootstrap.lock();
        if self.state() == GraphState::Ready {
            return Ok(BootstrapOutcome::AlreadyReady);
        }

        match self.bootstrap_locked(source, progress.unwrap_or(&NoProgress)) {
            Ok(outcome) => {
                *self.state.write() = GraphState::Ready;
                Ok(outcome)
            }
            Err(err) => {
                *self.state.write() = GraphState::Uninitialized;
                Err(err)
            }
        }
    }

    fn bootstrap_locked(
        &self,
        source: &dyn PackageSource,
        progress: &dyn BuildProgress,
    ) -> Result<BootstrapOutcome, GraphError> {
        // Fingerprint policy needs the records to decide; load them once.
        let mut records: Option<Vec<PackageRecord>> = None;

        let plan = match self.marker()? {
            Some(marker) if marker.quad_count == 0 => Plan::Rebuild(RebuildReason::Empty),
            Some(marker) => match self.policy {
                RebuildPolicy::Snapshot => Plan::Reuse(marker),
                RebuildPolicy::Fingerprint => {
                    let loaded = source.load()?;
                    let current = fingerprint(&loaded);
                    records = Some(loaded);
                    if current == marker.fingerprint {
                        Plan::Reuse(marker)
                    } else {
                        Plan::Rebuild(RebuildReason::Stale)
                    }
                }
            },
            None => {
                if self.store.stats()?.quad_count > 0 {
                    Plan::Rebuild(RebuildReason::Incomplete)
                } else {
                    Plan::Build
                }
            }
        };

        match plan {
            Plan::Reuse(marker) => {
                info!(
                    quads = marker.quad_count,
                    records = marker.record_count,
                    completed_at = marker.completed_at,
                    "graph already built"
                );
                Ok(BootstrapOutcome::Reused(marker))
            }
            Plan::Build => {
                let report = self.build(source, records, progress)?;
                Ok(BootstrapOutcome::Built(report))
            }
            Plan::Rebuild(reason) => {
                match reason {
                    RebuildReason::Incomplete => {
                        warn!("store holds quads without a build marker, discarding interrupted build")
                    }
                    RebuildReason::Stale => {
                        info!("package source changed since last build, rebuilding")
                    }
                    RebuildReason::Empty => info!("previous build was empty, rebuilding"),
                }
                self.store.reset()?;
                let report = self.build(source, records, progress)?;
                Ok(BootstrapOutcome::Rebuilt { reason, report })
            }
        }
    }

    fn build(
        &self,
        source: &dyn PackageSource,
        records: Option<Vec<PackageRecord>>,
        progress: &dyn BuildProgress,
    ) -> Result<BuildReport, GraphError> {
        *self.state.write() = GraphState::Building;

        let records = match records {
            Some(records) => records,
            None => source.load()?,
        };
        info!(
            state = "start",
            source = %source.describe(),
            records = records.len(),
            "index graph"
        );

        let report = GraphBuilder::new()
            .with_progress(progress)
            .build(self.store.as_ref(), &records)?;

        let marker = BuildMarker {
            record_count: report.records as u64,
            quad_count: report.quads as u64,
            fingerprint: fingerprint(&records),
            completed_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
        };
        self.store
            .set_metadata(BUILD_MARKER_KEY, &serde_json::to_string(&marker)?)?;

        info!(
            state = "end",
            records = report.records,
            quads = report.quads,
            "index graph"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SourceError, StaticSource};
    use crate::store::MemoryQuadStore;
    use crate::Quad;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        inner: StaticSource,
        loads: AtomicUsize,
    }

    impl CountingSource {
        fn new(records: Vec<PackageRecord>) -> Self {
            Self {
                inner: StaticSource::new(records),
                loads: AtomicUsize::new(0),
            }
        }
    }

    impl PackageSource for CountingSource {
        fn describe(&self) -> String {
            "counting".to_string()
        }

        fn load(&self) -> Result<Vec<PackageRecord>, SourceError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load()
        }
    }

    fn records() -> Vec<PackageRecord> {
        vec![
            PackageRecord::new("A").depends(["libc>=1.0"]),
            PackageRecord::new("B").provides(["libc"]),
        ]
    }

    fn memory_graph(policy: RebuildPolicy) -> PackageGraph {
        PackageGraph::new(Arc::new(MemoryQuadStore::new()), policy)
    }

    #[test]
    fn test_fresh_store_builds_once() {
        let graph = memory_graph(RebuildPolicy::Snapshot);
        let source = CountingSource::new(records());
        assert_eq!(graph.state(), GraphState::Uninitialized);

        let outcome = graph.ensure_ready(&source, None).unwrap();
        assert_eq!(
            outcome,
            BootstrapOutcome::Built(BuildReport {
                records: 2,
                quads: 2
            })
        );
        assert_eq!(graph.state(), GraphState::Ready);

        let outcome = graph.ensure_ready(&source, None).unwrap();
        assert_eq!(outcome, BootstrapOutcome::AlreadyReady);
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);

        let marker = graph.marker().unwrap().unwrap();
        assert_eq!(marker.quad_count, 2);
        assert_eq!(marker.fingerprint, fingerprint(&records()));
    }

    #[test]
    fn test_completed_store_is_reused_without_loading() {
        let store: Arc<dyn QuadStore> = Arc::new(MemoryQuadStore::new());
        PackageGraph::new(store.clone(), RebuildPolicy::Snapshot)
            .ensure_ready(&StaticSource::new(records()), None)
            .unwrap();

        let source = CountingSource::new(vec![]);
        let graph = PackageGraph::new(store, RebuildPolicy::Snapshot);
        let outcome = graph.ensure_ready(&source, None).unwrap();

        assert!(matches!(outcome, BootstrapOutcome::Reused(_)));
        assert_eq!(source.loads.load(Ordering::SeqCst), 0);
        assert_eq!(graph.stats().unwrap().quads, 2);
    }

    #[test]
    fn test_incomplete_build_is_reset() {
        let store: Arc<dyn QuadStore> = Arc::new(MemoryQuadStore::new());
        // Leftovers of an interrupted build: quads but no marker
        store.add_quad(&Quad::new("A", "depend", "libc", "libc>=1.0")).unwrap();
        store.add_quad(&Quad::new("stale", "depend", "x", "x")).unwrap();

        let graph = PackageGraph::new(store, RebuildPolicy::Snapshot);
        let outcome = graph.ensure_ready(&StaticSource::new(records()), None).unwrap();

        assert!(matches!(
            outcome,
            BootstrapOutcome::Rebuilt {
                reason: RebuildReason::Incomplete,
                ..
            }
        ));
        assert_eq!(graph.stats().unwrap().quads, 2);
        assert!(graph.store().quads_with_subject("stale").unwrap().is_empty());
    }

    #[test]
    fn test_fingerprint_policy_rebuilds_on_change() {
        let store: Arc<dyn QuadStore> = Arc::new(MemoryQuadStore::new());
        PackageGraph::new(store.clone(), RebuildPolicy::Fingerprint)
            .ensure_ready(&StaticSource::new(records()), None)
            .unwrap();

        // Same input: reused
        let graph = PackageGraph::new(store.clone(), RebuildPolicy::Fingerprint);
        let outcome = graph.ensure_ready(&StaticSource::new(records()), None).unwrap();
        assert!(matches!(outcome, BootstrapOutcome::Reused(_)));

        // Changed input: rebuilt, no duplicates
        let mut changed = records();
        changed.push(PackageRecord::new("C").depends(["libc"]));
        let graph = PackageGraph::new(store, RebuildPolicy::Fingerprint);
        let outcome = graph.ensure_ready(&StaticSource::new(changed), None).unwrap();
        assert!(matches!(
            outcome,
            BootstrapOutcome::Rebuilt {
                reason: RebuildReason::Stale,
                ..
            }
        ));
        assert_eq!(graph.stats().unwrap().quads, 3);
    }

    #[test]
    fn test_snapshot_policy_ignores_changed_source() {
        let store: Arc<dyn QuadStore> = Arc::new(MemoryQuadStore::new());
        PackageGraph::new(store.clone(), RebuildPolicy::Snapshot)
            .ensure_ready(&StaticSource::new(records()), None)
            .unwrap();

        let graph = PackageGraph::new(store, RebuildPolicy::Snapshot);
        let outcome = graph
            .ensure_ready(&StaticSource::new(vec![PackageRecord::new("Z").depends(["q"])]), None)
            .unwrap();
        assert!(matches!(outcome, BootstrapOutcome::Reused(_)));
        assert_eq!(graph.stats().unwrap().quads, 2);
    }

    #[test]
    fn test_empty_build_may_rebuild() {
        let store: Arc<dyn QuadStore> = Arc::new(MemoryQuadStore::new());
        let graph = PackageGraph::new(store.clone(), RebuildPolicy::Snapshot);
        let outcome = graph.ensure_ready(&StaticSource::new(vec![]), None).unwrap();
        assert_eq!(outcome, BootstrapOutcome::Built(BuildReport::default()));
        assert_eq!(graph.stats().unwrap(), GraphStats { nodes: 0, quads: 0 });

        let graph = PackageGraph::new(store, RebuildPolicy::Snapshot);
        let outcome = graph.ensure_ready(&StaticSource::new(records()), None).unwrap();
        assert!(matches!(
            outcome,
            BootstrapOutcome::Rebuilt {
                reason: RebuildReason::Empty,
                ..
            }
        ));
        assert_eq!(graph.stats().unwrap().quads, 2);
    }

    #[test]
    fn test_source_failure_leaves_uninitialized() {
        struct Failing;
        impl PackageSource for Failing {
            fn describe(&self) -> String {
                "failing".to_string()
            }
            fn load(&self) -> Result<Vec<PackageRecord>, SourceError> {
                Err(SourceError::Unavailable("mirror down".to_string()))
            }
        }

        let graph = memory_graph(RebuildPolicy::Snapshot);
        let err = graph.ensure_ready(&Failing, None).unwrap_err();
        assert!(matches!(err, GraphError::Source(_)));
        assert_eq!(graph.state(), GraphState::Uninitialized);
        assert!(graph.marker().unwrap().is_none());

        // A later attempt with a working source succeeds
        graph
            .ensure_ready(&StaticSource::new(records()), None)
            .unwrap();
        assert_eq!(graph.state(), GraphState::Ready);
    }

    #[test]
    fn test_concurrent_bootstrap_ingests_once() {
        let graph = Arc::new(memory_graph(RebuildPolicy::Snapshot));
        let source = Arc::new(CountingSource::new(records()));

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let graph = graph.clone();
                let source = source.clone();
                scope.spawn(move || {
                    graph.ensure_ready(source.as_ref(), None).unwrap();
                });
            }
        });

        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
        assert_eq!(graph.stats().unwrap().quads, 2);
    }
}
