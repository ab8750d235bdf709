//! GPU-aware node filtering and scoring
//!
//! Filtering rejects nodes without enough free GPUs or GPU memory. Scoring
//! adds four independently weighted terms:
//! - **Utilization**: prefer nodes with more GPUs free (weight 2)
//! - **Memory**: prefer more GPU memory (weight 3, unbounded)
//! - **Interconnect**: flat bonus for a high-bandwidth fabric
//! - **Generation**: prefer newer GPUs (weight 10)

use edfgpu_core::{
    FilterPlugin, GpuAwareArgs, Node, NodeInfo, Plugin, ResourceSnapshot, ScorePlugin, Status,
    WorkItem,
};
use std::sync::Arc;
use tracing::debug;

use crate::resources::GpuExtractor;

/// Name the filter and score hooks are registered under
pub const GPU_AWARE_PLUGIN_NAME: &str = "GPUAware";

const UTILIZATION_WEIGHT: i64 = 2;
const MEMORY_WEIGHT: i64 = 3;
const INTERCONNECT_BONUS: i64 = 100;
const GENERATION_WEIGHT: i64 = 10;

/// Individual score components, for debugging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub utilization: i64,
    pub memory: i64,
    pub interconnect: i64,
    pub generation: i64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> i64 {
        self.utilization
            .saturating_add(self.memory)
            .saturating_add(self.interconnect)
            .saturating_add(self.generation)
    }
}

/// Filter and score plugin for GPU placement
pub struct GpuAware {
    extractor: GpuExtractor,
    min_gpu_memory_gb: i64,
    snapshot: Arc<dyn ResourceSnapshot>,
}

impl GpuAware {
    /// Create the plugin over the host's node snapshot
    pub fn new(args: GpuAwareArgs, snapshot: Arc<dyn ResourceSnapshot>) -> Self {
        Self {
            min_gpu_memory_gb: args.min_gpu_memory_gb,
            extractor: GpuExtractor::new(args),
            snapshot,
        }
    }

    /// Score components for a node with the given bound items
    pub fn breakdown(&self, node: &Node, node_info: &NodeInfo) -> ScoreBreakdown {
        let capacity = self.extractor.capacity_gpu_count(node);
        let allocated = self.extractor.allocated_gpu_count(node_info);

        let utilization = if capacity > 0 {
            let utilization_pct = allocated.saturating_mul(100) / capacity;
            (100 - utilization_pct).saturating_mul(UTILIZATION_WEIGHT)
        } else {
            0
        };

        let interconnect = if self.extractor.has_high_bandwidth_interconnect(node) {
            INTERCONNECT_BONUS
        } else {
            0
        };

        ScoreBreakdown {
            utilization,
            memory: self.extractor.gpu_memory_gb(node).saturating_mul(MEMORY_WEIGHT),
            interconnect,
            generation: self
                .extractor
                .gpu_generation_rank(node)
                .saturating_mul(GENERATION_WEIGHT),
        }
    }
}

impl Plugin for GpuAware {
    fn name(&self) -> &str {
        GPU_AWARE_PLUGIN_NAME
    }
}

impl FilterPlugin for GpuAware {
    fn filter(&self, item: &WorkItem, node_info: &NodeInfo) -> Status {
        let requested = self.extractor.requested_gpu_count(item);
        if requested == 0 {
            return Status::success();
        }

        let Some(node) = node_info.node() else {
            return Status::error("node not found");
        };

        let capacity = self.extractor.capacity_gpu_count(node);
        let allocated = self.extractor.allocated_gpu_count(node_info);
        let available = capacity - allocated;
        if available < requested {
            debug!(
                item = %item.key(),
                node = %node.name,
                requested = requested,
                available = available,
                "Node lacks free GPUs"
            );
            return Status::unschedulable(format!(
                "insufficient GPU: need {}, available {}",
                requested, available
            ));
        }

        let memory = self.extractor.gpu_memory_gb(node);
        if memory < self.min_gpu_memory_gb {
            debug!(
                item = %item.key(),
                node = %node.name,
                memory_gb = memory,
                "Node lacks GPU memory"
            );
            return Status::unschedulable(format!(
                "insufficient GPU memory: need {}GB, available {}GB",
                self.min_gpu_memory_gb, memory
            ));
        }

        Status::success()
    }
}

impl ScorePlugin for GpuAware {
    fn score(&self, item: &WorkItem, node_name: &str) -> (i64, Status) {
        let node_info = match self.snapshot.get_node(node_name) {
            Ok(info) => info,
            Err(e) => return (0, Status::error(e.to_string())),
        };
        let Some(node) = node_info.node() else {
            return (0, Status::error(format!("node {} not found", node_name)));
        };

        let breakdown = self.breakdown(node, &node_info);
        debug!(
            item = %item.key(),
            node = node_name,
            ?breakdown,
            "Scored node"
        );

        (breakdown.total(), Status::success())
    }
}
