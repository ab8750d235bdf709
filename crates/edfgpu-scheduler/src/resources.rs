//! Read-only GPU resource extraction from work items and nodes

use edfgpu_core::{GpuAwareArgs, Node, NodeInfo, WorkItem};

/// Known GPU generations and their ordinal rank
const GENERATION_RANKS: &[(&str, i64)] = &[("v100", 7), ("a100", 8), ("h100", 9)];

/// Reads GPU counts and hardware labels using the configured keys
#[derive(Debug, Clone)]
pub struct GpuExtractor {
    args: GpuAwareArgs,
}

impl GpuExtractor {
    /// Create an extractor for the given resource and label keys
    pub fn new(args: GpuAwareArgs) -> Self {
        Self { args }
    }

    /// Total GPUs requested across all of the item's containers
    pub fn requested_gpu_count(&self, item: &WorkItem) -> i64 {
        item.containers
            .iter()
            .filter_map(|c| c.requests.get(&self.args.resource_name))
            .map(|q| (*q).max(0))
            .fold(0i64, |acc, q| acc.saturating_add(q))
    }

    /// GPU capacity reported by the node, zero if absent
    pub fn capacity_gpu_count(&self, node: &Node) -> i64 {
        node.capacity
            .get(&self.args.resource_name)
            .copied()
            .unwrap_or(0)
            .max(0)
    }

    /// GPUs requested by every item already bound to the node
    pub fn allocated_gpu_count(&self, node_info: &NodeInfo) -> i64 {
        node_info
            .bound_items
            .iter()
            .map(|item| self.requested_gpu_count(item))
            .fold(0i64, |acc, q| acc.saturating_add(q))
    }

    /// GPU memory in whole GB from the memory label, zero if absent or unparsable
    pub fn gpu_memory_gb(&self, node: &Node) -> i64 {
        node.labels
            .get(&self.args.memory_label)
            .map(|v| parse_memory_gb(v))
            .unwrap_or(0)
    }

    /// Whether the interconnect label names the high-bandwidth fabric
    pub fn has_high_bandwidth_interconnect(&self, node: &Node) -> bool {
        node.labels
            .get(&self.args.interconnect_label)
            .is_some_and(|v| *v == self.args.interconnect_value)
    }

    /// Ordinal rank of the node's GPU generation, zero if unknown
    pub fn gpu_generation_rank(&self, node: &Node) -> i64 {
        node.labels
            .get(&self.args.generation_label)
            .map(|v| generation_rank(v))
            .unwrap_or(0)
    }
}

/// Parse a memory label such as `16`, `80Gi`, `24GB` or `40960Mi` into whole GB.
///
/// Megabyte units are floored to whole GB. Negative or malformed values yield 0.
pub fn parse_memory_gb(raw: &str) -> i64 {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);

    let Ok(value) = digits.parse::<i64>() else {
        return 0;
    };

    match unit.trim().to_ascii_lowercase().as_str() {
        "" | "g" | "gb" | "gi" | "gib" => value,
        "m" | "mb" | "mi" | "mib" => value / 1024,
        _ => 0,
    }
}

/// Rank a generation label via the fixed lookup table.
///
/// Labels are trimmed and lowercased before the lookup, so `A100` and
/// ` a100 ` both rank 8. Unknown labels rank 0.
pub fn generation_rank(raw: &str) -> i64 {
    let label = raw.trim().to_ascii_lowercase();
    GENERATION_RANKS
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, rank)| *rank)
        .unwrap_or(0)
}
