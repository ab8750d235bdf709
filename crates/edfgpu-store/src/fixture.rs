//! Cluster state loaded from a JSON fixture

use edfgpu_core::{EdfGpuError, EdfGpuResult, Node, WorkItem};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::object_store::MemoryObjectStore;
use crate::snapshot::MemorySnapshot;

/// Nodes, items already bound to them, and items waiting to be scheduled
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterFixture {
    /// Execution nodes
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Items already running, keyed by node name
    #[serde(default)]
    pub bound: HashMap<String, Vec<WorkItem>>,
    /// Items waiting to be admitted and placed
    #[serde(default)]
    pub pending: Vec<WorkItem>,
}

impl ClusterFixture {
    /// Parse a fixture from JSON
    pub fn from_json(content: &str) -> EdfGpuResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a fixture from a JSON file
    pub fn from_file(path: &Path) -> EdfGpuResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EdfGpuError::Config(format!("Failed to read cluster file: {}", e))
        })?;
        Self::from_json(&content)
    }

    /// Seed an object store with the pending items and freeze the node snapshot.
    ///
    /// Returns the stored copies of the pending items, carrying their versions.
    pub async fn load(self) -> (MemoryObjectStore, MemorySnapshot, Vec<WorkItem>) {
        let store = MemoryObjectStore::new();
        let mut pending = Vec::with_capacity(self.pending.len());
        for item in self.pending {
            pending.push(store.insert(item).await);
        }

        info!(
            nodes = self.nodes.len(),
            pending = pending.len(),
            "Loaded cluster fixture"
        );

        let snapshot = MemorySnapshot::build(self.nodes, self.bound);
        (store, snapshot, pending)
    }
}
