//! Graph Builder for Package Relationship Graphs
//!
//! Converts package records into quads and appends them to a [`QuadStore`].
//!
//! ## Usage
//!
//! ```ignore
//! use apki_core::builder::GraphBuilder;
//!
//! let report = GraphBuilder::new().build(store.as_ref(), &records)?;
//! println!("wrote {} quads", report.quads);
//! ```

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::quad::{Predicate, Quad};
use crate::record::PackageRecord;
use crate::store::{QuadStore, StoreError};

/// Characters that start a version/operator qualifier.
const COMPARATORS: [char; 4] = ['=', '<', '>', '~'];

// ============================================================================
// Name Handling
// ============================================================================

/// Strip a trailing version/operator qualifier from a raw dependency string.
///
/// The bare name is everything before the first `=`, `<`, `>` or `~`; a string
/// without any of them is returned unchanged.
///
/// ```
/// use apki_core::bare_name;
///
/// assert_eq!(bare_name("libc>=1.2"), "libc");
/// assert_eq!(bare_name("so:libfoo.so.1"), "so:libfoo.so.1");
/// ```
pub fn bare_name(raw: &str) -> &str {
    match raw.find(COMPARATORS) {
        Some(idx) => &raw[..idx],
        None => raw,
    }
}

/// Hex SHA-256 of a record sequence, sensitive to order and every field.
pub fn fingerprint(records: &[PackageRecord]) -> String {
    let mut hasher = Sha256::new();
    for record in records {
        hasher.update(record.name.as_bytes());
        hasher.update([0u8]);
        for (tag, entries) in [
            (b'p', &record.provides),
            (b'd', &record.depends),
            (b'i', &record.install_if),
        ] {
            hasher.update([tag]);
            hasher.update((entries.len() as u64).to_le_bytes());
            for entry in entries {
                hasher.update(entry.as_bytes());
                hasher.update([0u8]);
            }
        }
        hasher.update([0xffu8]);
    }
    format!("{:x}", hasher.finalize())
}

/// Quads produced by one record, in write order.
pub fn record_quads(record: &PackageRecord) -> Vec<Quad> {
    let mut quads = Vec::with_capacity(record.relation_count());
    for (predicate, entries) in [
        (Predicate::Provide, &record.provides),
        (Predicate::Depend, &record.depends),
        (Predicate::InstallIf, &record.install_if),
    ] {
        for raw in entries {
            quads.push(Quad::new(
                record.name.as_str(),
                predicate.as_str(),
                bare_name(raw),
                raw.as_str(),
            ));
        }
    }
    quads
}

// ============================================================================
// Progress
// ============================================================================

/// Observer for long-running builds.
pub trait BuildProgress: Send + Sync {
    /// Called once before the first record with the record count.
    fn on_start(&self, _total: usize) {}

    /// Called after each record has been written.
    fn on_record(&self, _done: usize) {}

    /// Called once after the last record.
    fn on_finish(&self) {}
}

/// Progress observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl BuildProgress for NoProgress {}

// ============================================================================
// Graph Builder
// ============================================================================

/// Summary of a completed build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Records ingested
    pub records: usize,
    /// Quads written
    pub quads: usize,
}

/// Writes package records into a quad store.
///
/// Writes happen one record at a time. A failure stops the build and leaves
/// the quads of earlier records in the store.
#[derive(Default)]
pub struct GraphBuilder<'a> {
    progress: Option<&'a dyn BuildProgress>,
}

impl<'a> GraphBuilder<'a> {
    /// Create a builder without progress reporting.
    pub fn new() -> Self {
        Self { progress: None }
    }

    /// Report progress to `progress`.
    pub fn with_progress(mut self, progress: &'a dyn BuildProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Append the quads of every record to `store`.
    pub fn build(
        &self,
        store: &dyn QuadStore,
        records: &[PackageRecord],
    ) -> Result<BuildReport, StoreError> {
        let progress: &dyn BuildProgress = self.progress.unwrap_or(&NoProgress);
        progress.on_start(records.len());

        let mut report = BuildReport::default();
        for (i, record) in records.iter().enumerate() {
            let quads = record_quads(record);
            if !quads.is_empty() {
                store.add_quads(&quads)?;
            }

            report.records += 1;
            report.quads += quads.len();
            progress.on_record(i + 1);
        }

        progress.on_finish();
        debug!(
            records = report.records,
            quads = report.quads,
            "package records written"
        );
        Ok(report)
    }
}
