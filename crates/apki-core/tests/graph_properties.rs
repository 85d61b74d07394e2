//! End-to-end graph tests for apki-core.
//!
//! Builds package graphs on a persistent SQLite store and checks the
//! properties callers rely on: quad accounting, dependency lookups, reopen
//! behavior and the exactly-once bootstrap.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use apki_core::{
    open_store, BackendKind, BootstrapOutcome, ErrorKind, GraphService, GraphState,
    JsonIndexSource, PackageGraph, PackageRecord, PackageSource, Quad, QuadStore, QueryLimits,
    RebuildPolicy, RebuildReason, SourceError, StaticSource, StoreConfig, StoreError, StoreStats,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn service_at(path: &Path, source: Arc<dyn PackageSource>) -> GraphService {
    let store = open_store(&StoreConfig::sqlite(path)).expect("Failed to open store");
    let graph = PackageGraph::new(store, RebuildPolicy::Snapshot);
    GraphService::new(Arc::new(graph), source, QueryLimits::default())
}

fn alpine_like() -> Vec<PackageRecord> {
    vec![
        PackageRecord::new("musl").provides(["so:libc.musl-x86_64.so.1=1"]),
        PackageRecord::new("zlib")
            .provides(["so:libz.so.1=1.2.11"])
            .depends(["so:libc.musl-x86_64.so.1"]),
        PackageRecord::new("openssl")
            .provides(["so:libssl.so.1.1=1.1.1", "so:libcrypto.so.1.1=1.1.1"])
            .depends(["so:libc.musl-x86_64.so.1"]),
        PackageRecord::new("curl").depends([
            "ca-certificates",
            "so:libc.musl-x86_64.so.1",
            "so:libssl.so.1.1",
            "so:libz.so.1",
        ]),
        PackageRecord::new("ca-certificates").provides(["ca-certificates=20191127"]),
        PackageRecord::new("curl-doc").install_if(["docs", "curl=7.69.1"]),
    ]
}

struct CountingSource {
    records: Vec<PackageRecord>,
    loads: AtomicUsize,
}

impl PackageSource for CountingSource {
    fn describe(&self) -> String {
        "counting".to_string()
    }

    fn load(&self) -> Result<Vec<PackageRecord>, SourceError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.clone())
    }
}

/// Store that fails the `fail_on`-th `add_quads` call once, then behaves.
struct FailingStore {
    inner: Arc<dyn QuadStore>,
    batches: AtomicUsize,
    fail_on: usize,
}

impl FailingStore {
    fn new(inner: Arc<dyn QuadStore>, fail_on: usize) -> Self {
        Self {
            inner,
            batches: AtomicUsize::new(0),
            fail_on,
        }
    }
}

impl QuadStore for FailingStore {
    fn backend(&self) -> BackendKind {
        self.inner.backend()
    }

    fn location(&self) -> Option<&Path> {
        self.inner.location()
    }

    fn add_quad(&self, quad: &Quad) -> Result<(), StoreError> {
        self.inner.add_quad(quad)
    }

    fn add_quads(&self, quads: &[Quad]) -> Result<(), StoreError> {
        let batch = self.batches.fetch_add(1, Ordering::SeqCst) + 1;
        if batch == self.fail_on {
            return Err(StoreError::write("add_quads", "disk full"));
        }
        self.inner.add_quads(quads)
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        self.inner.stats()
    }

    fn traverse_out(
        &self,
        nodes: &HashSet<String>,
        predicate: &str,
    ) -> Result<HashSet<String>, StoreError> {
        self.inner.traverse_out(nodes, predicate)
    }

    fn traverse_in(
        &self,
        nodes: &HashSet<String>,
        predicate: &str,
    ) -> Result<HashSet<String>, StoreError> {
        self.inner.traverse_in(nodes, predicate)
    }

    fn quads_with_subject(&self, subject: &str) -> Result<Vec<Quad>, StoreError> {
        self.inner.quads_with_subject(subject)
    }

    fn metadata(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.metadata(key)
    }

    fn set_metadata(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.set_metadata(key, value)
    }

    fn reset(&self) -> Result<(), StoreError> {
        self.inner.reset()
    }
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_quad_count_matches_relations() {
    let temp = TempDir::new().unwrap();
    let records = alpine_like();
    let expected: usize = records.iter().map(|r| r.relation_count()).sum();

    let service = service_at(&temp.path().join("graph.db"), Arc::new(StaticSource::new(records)));
    let stats = service.get_stats().unwrap();

    assert_eq!(stats.quads, expected as u64);
    assert!(stats.nodes > 0);
}

#[test]
fn test_direct_dependents() {
    let temp = TempDir::new().unwrap();
    let records = vec![
        PackageRecord::new("A").depends(["libc>=1.0"]),
        PackageRecord::new("B").provides(["libc"]),
    ];
    let service = service_at(&temp.path().join("graph.db"), Arc::new(StaticSource::new(records)));

    assert_eq!(service.get_dependents("A").unwrap().dependencies, vec!["B"]);
    assert!(service.get_dependents("B").unwrap().dependencies.is_empty());
}

#[test]
fn test_curl_dependents() {
    let temp = TempDir::new().unwrap();
    let service = service_at(
        &temp.path().join("graph.db"),
        Arc::new(StaticSource::new(alpine_like())),
    );

    assert_eq!(
        service.get_dependents("curl").unwrap().dependencies,
        vec!["ca-certificates", "musl", "openssl", "zlib"]
    );
    assert_eq!(
        service.get_transitive_dependents("curl", 2).unwrap().dependencies,
        vec!["musl"]
    );
}

#[test]
fn test_empty_input_then_rebuild() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("graph.db");

    let service = service_at(&path, Arc::new(StaticSource::new(vec![])));
    let stats = service.get_stats().unwrap();
    assert_eq!((stats.nodes, stats.quads), (0, 0));
    drop(service);

    let service = service_at(&path, Arc::new(StaticSource::new(alpine_like())));
    let outcome = service.bootstrap(None).unwrap();
    assert!(matches!(
        outcome,
        BootstrapOutcome::Rebuilt {
            reason: RebuildReason::Empty,
            ..
        }
    ));
    assert!(service.get_stats().unwrap().quads > 0);
}

#[test]
fn test_reopen_yields_identical_stats() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("graph.db");

    let first = service_at(&path, Arc::new(StaticSource::new(alpine_like())));
    let before = first.get_stats().unwrap();
    drop(first);

    // A completed build is reused without consulting the source
    let second = service_at(&path, Arc::new(StaticSource::new(vec![])));
    assert!(matches!(
        second.bootstrap(None).unwrap(),
        BootstrapOutcome::Reused(_)
    ));
    assert_eq!(second.get_stats().unwrap(), before);
}

#[test]
fn test_concurrent_bootstrap_single_ingestion() {
    let temp = TempDir::new().unwrap();
    let source = Arc::new(CountingSource {
        records: alpine_like(),
        loads: AtomicUsize::new(0),
    });
    let service = service_at(&temp.path().join("graph.db"), source.clone());
    let expected: u64 = alpine_like().iter().map(|r| r.relation_count() as u64).sum();

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                let stats = service.get_stats().unwrap();
                assert_eq!(stats.quads, expected);
            });
        }
    });

    assert_eq!(source.loads.load(Ordering::SeqCst), 1);
    assert_eq!(service.graph().state(), GraphState::Ready);
}

#[test]
fn test_json_index_source() {
    let temp = TempDir::new().unwrap();
    let index = temp.path().join("index.json");
    std::fs::write(&index, serde_json::to_string(&alpine_like()).unwrap()).unwrap();

    let service = service_at(
        &temp.path().join("graph.db"),
        Arc::new(JsonIndexSource::new(&index)),
    );
    let quads = service.describe("curl-doc").unwrap();
    assert_eq!(quads.len(), 2);
    assert_eq!(quads[1].object, "curl");
    assert_eq!(quads[1].label, "curl=7.69.1");
}

#[test]
fn test_write_failure_mid_build_then_retry() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("graph.db");
    let inner = open_store(&StoreConfig::sqlite(&path)).unwrap();
    let graph = PackageGraph::new(
        Arc::new(FailingStore::new(inner.clone(), 2)),
        RebuildPolicy::Snapshot,
    );
    let source = StaticSource::new(alpine_like());

    let err = graph.ensure_ready(&source, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StorageWrite);
    assert_eq!(graph.state(), GraphState::Uninitialized);
    // Only the first record's batch landed, and no marker was written
    assert_eq!(inner.stats().unwrap().quad_count, 1);
    assert_eq!(graph.marker().unwrap(), None);

    let outcome = graph.ensure_ready(&source, None).unwrap();
    assert!(matches!(
        outcome,
        BootstrapOutcome::Rebuilt {
            reason: RebuildReason::Incomplete,
            ..
        }
    ));
    assert_eq!(graph.state(), GraphState::Ready);

    let expected: u64 = alpine_like().iter().map(|r| r.relation_count() as u64).sum();
    assert_eq!(graph.stats().unwrap().quads, expected);
    assert!(graph.marker().unwrap().is_some());
}
