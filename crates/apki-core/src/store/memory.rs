//! In-memory quad store
//!
//! Keeps quads in a vector with subject/object position indexes. Nothing is
//! persisted; every `open_store` with the memory backend starts empty.

use super::{BackendKind, QuadStore, StoreError, StoreStats};
use crate::quad::Quad;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::path::Path;

#[derive(Debug, Default)]
struct MemoryState {
    quads: Vec<Quad>,
    /// subject -> positions in `quads`
    by_subject: HashMap<String, Vec<usize>>,
    /// object -> positions in `quads`
    by_object: HashMap<String, Vec<usize>>,
    metadata: HashMap<String, String>,
}

impl MemoryState {
    fn push(&mut self, quad: &Quad) {
        let pos = self.quads.len();
        self.by_subject
            .entry(quad.subject.clone())
            .or_default()
            .push(pos);
        self.by_object
            .entry(quad.object.clone())
            .or_default()
            .push(pos);
        self.quads.push(quad.clone());
    }
}

/// Quad store held entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryQuadStore {
    state: RwLock<MemoryState>,
}

impl MemoryQuadStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl QuadStore for MemoryQuadStore {
    fn backend(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn location(&self) -> Option<&Path> {
        None
    }

    fn add_quad(&self, quad: &Quad) -> Result<(), StoreError> {
        self.state.write().push(quad);
        Ok(())
    }

    fn add_quads(&self, quads: &[Quad]) -> Result<(), StoreError> {
        let mut state = self.state.write();
        for quad in quads {
            state.push(quad);
        }
        Ok(())
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        let state = self.state.read();
        let nodes: HashSet<&str> = state
            .by_subject
            .keys()
            .chain(state.by_object.keys())
            .map(String::as_str)
            .collect();

        Ok(StoreStats {
            node_count: nodes.len() as u64,
            quad_count: state.quads.len() as u64,
        })
    }

    fn traverse_out(
        &self,
        nodes: &HashSet<String>,
        predicate: &str,
    ) -> Result<HashSet<String>, StoreError> {
        let state = self.state.read();
        Ok(nodes
            .iter()
            .filter_map(|node| state.by_subject.get(node))
            .flatten()
            .map(|&pos| &state.quads[pos])
            .filter(|quad| quad.predicate == predicate)
            .map(|quad| quad.object.clone())
            .collect())
    }

    fn traverse_in(
        &self,
        nodes: &HashSet<String>,
        predicate: &str,
    ) -> Result<HashSet<String>, StoreError> {
        let state = self.state.read();
        Ok(nodes
            .iter()
            .filter_map(|node| state.by_object.get(node))
            .flatten()
            .map(|&pos| &state.quads[pos])
            .filter(|quad| quad.predicate == predicate)
            .map(|quad| quad.subject.clone())
            .collect())
    }

    fn quads_with_subject(&self, subject: &str) -> Result<Vec<Quad>, StoreError> {
        let state = self.state.read();
        Ok(state
            .by_subject
            .get(subject)
            .map(|positions| positions.iter().map(|&pos| state.quads[pos].clone()).collect())
            .unwrap_or_default())
    }

    fn metadata(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.state.read().metadata.get(key).cloned())
    }

    fn set_metadata(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.state
            .write()
            .metadata
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn reset(&self) -> Result<(), StoreError> {
        *self.state.write() = MemoryState::default();
        Ok(())
    }
}
