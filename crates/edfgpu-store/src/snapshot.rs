//! Immutable node snapshot

use edfgpu_core::{EdfGpuError, EdfGpuResult, Node, NodeInfo, ResourceSnapshot, WorkItem};
use std::collections::HashMap;
use tracing::warn;

/// Nodes and their bound work items, frozen for one scheduling attempt
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshot {
    nodes: HashMap<String, NodeInfo>,
}

impl MemorySnapshot {
    /// Build a snapshot from prepared entries; entries without a node are skipped
    pub fn from_infos(infos: Vec<NodeInfo>) -> Self {
        let nodes = infos
            .into_iter()
            .filter_map(|info| {
                let name = info.node()?.name.clone();
                Some((name, info))
            })
            .collect();
        Self { nodes }
    }

    /// Build a snapshot by grouping bound items under their node names.
    ///
    /// Items bound to a node not in `nodes` are dropped.
    pub fn build(nodes: Vec<Node>, mut bound: HashMap<String, Vec<WorkItem>>) -> Self {
        let mut infos = HashMap::with_capacity(nodes.len());
        for node in nodes {
            let items = bound.remove(&node.name).unwrap_or_default();
            infos.insert(node.name.clone(), NodeInfo::new(node, items));
        }

        for (name, items) in bound {
            warn!(
                node = %name,
                items = items.len(),
                "Ignoring items bound to unknown node"
            );
        }

        Self { nodes: infos }
    }

    /// Register a name whose descriptor has gone missing
    pub fn with_missing_node(mut self, name: impl Into<String>) -> Self {
        self.nodes.insert(name.into(), NodeInfo::default());
        self
    }
}

impl ResourceSnapshot for MemorySnapshot {
    fn get_node(&self, name: &str) -> EdfGpuResult<NodeInfo> {
        self.nodes
            .get(name)
            .cloned()
            .ok_or_else(|| EdfGpuError::NotFound(format!("node {}", name)))
    }

    fn list_nodes(&self) -> Vec<String> {
        let mut names: Vec<String> = self.nodes.keys().cloned().collect();
        names.sort();
        names
    }
}
