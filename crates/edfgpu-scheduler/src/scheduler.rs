//! Scheduling cycle driving the registered plugins
//!
//! This mirrors what the host scheduler does with the plugins: run the
//! pre-enqueue hooks, order the queue, then filter and score every node for
//! each item in turn.

use edfgpu_core::{
    EdfGpuError, EdfGpuResult, FallbackComparator, FilterPlugin, ObjectStore, Plugin,
    PreEnqueuePlugin, QueueSortPlugin, Registry, ResourceSnapshot, ScorePlugin, SchedulerConfig,
    WorkItem,
};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::deadline::DeadlineAssigner;
use crate::edf::{EdfQueueSort, EDF_PLUGIN_NAME};
use crate::gpu_aware::GpuAware;
use crate::placement::{select_node, NodeScore, Placement};

/// Register the EDF and GPU-aware plugins for the given configuration
pub fn default_registry(
    config: &SchedulerConfig,
    store: Arc<dyn ObjectStore>,
    snapshot: Arc<dyn ResourceSnapshot>,
    fallback: Arc<dyn FallbackComparator>,
) -> EdfGpuResult<Registry> {
    let mut registry = Registry::new();

    registry.register_queue_sort(Arc::new(EdfQueueSort::new(&config.edf, fallback)))?;
    registry.register_pre_enqueue(Arc::new(DeadlineAssigner::new(config.edf.clone(), store)))?;

    let gpu = Arc::new(GpuAware::new(config.gpu.clone(), snapshot));
    registry.register_filter(gpu.clone())?;
    registry.register_score(gpu)?;

    Ok(registry)
}

/// Runs admission, ordering and placement over a node snapshot
pub struct Scheduler {
    registry: Registry,
    queue_sort: Arc<dyn QueueSortPlugin>,
    snapshot: Arc<dyn ResourceSnapshot>,
}

impl Scheduler {
    /// Create a scheduler using the queue sort plugin registered as `queue_sort`
    pub fn new(
        registry: Registry,
        queue_sort: &str,
        snapshot: Arc<dyn ResourceSnapshot>,
    ) -> EdfGpuResult<Self> {
        let sorter = registry.queue_sort(queue_sort).ok_or_else(|| {
            EdfGpuError::Registry(format!("queue-sort plugin {} not registered", queue_sort))
        })?;

        info!(
            queue_sort = queue_sort,
            nodes = snapshot.list_nodes().len(),
            "Scheduler initialized"
        );

        Ok(Self {
            registry,
            queue_sort: sorter,
            snapshot,
        })
    }

    /// Create a scheduler with the EDF and GPU-aware plugins
    pub fn from_config(
        config: &SchedulerConfig,
        store: Arc<dyn ObjectStore>,
        snapshot: Arc<dyn ResourceSnapshot>,
        fallback: Arc<dyn FallbackComparator>,
    ) -> EdfGpuResult<Self> {
        let registry = default_registry(config, store, snapshot.clone(), fallback)?;
        Self::new(registry, EDF_PLUGIN_NAME, snapshot)
    }

    /// Run every pre-enqueue hook on each item, items concurrently.
    ///
    /// Items rejected by a hook are dropped from the returned queue.
    pub async fn admit(&self, items: Vec<WorkItem>) -> Vec<WorkItem> {
        let hooks = self.registry.pre_enqueuers();

        let admitted = join_all(items.into_iter().map(|mut item| {
            let hooks = hooks.clone();
            async move {
                for hook in &hooks {
                    let status = hook.on_admission(&mut item).await;
                    if !status.is_success() {
                        warn!(
                            item = %item.key(),
                            plugin = hook.name(),
                            status = %status,
                            "Item rejected before enqueue"
                        );
                        return None;
                    }
                }
                Some(item)
            }
        }))
        .await;

        admitted.into_iter().flatten().collect()
    }

    /// Sort items into queue order
    pub fn order(&self, items: &mut [WorkItem]) {
        items.sort_by(|a, b| self.queue_sort.compare(a, b));
    }

    /// Filter every node, score the survivors and pick the best
    pub fn schedule_one(&self, item: &WorkItem) -> Placement {
        let filters = self.registry.filters();
        let scorers = self.registry.scorers();

        let mut nodes = self.snapshot.list_nodes();
        nodes.sort();

        let mut reasons = Vec::new();
        let mut feasible = Vec::new();

        for name in nodes {
            let node_info = match self.snapshot.get_node(&name) {
                Ok(info) => info,
                Err(e) => {
                    reasons.push(format!("{}: {}", name, e));
                    continue;
                }
            };

            let rejection = filters
                .iter()
                .map(|f| f.filter(item, &node_info))
                .find(|status| !status.is_success());

            match rejection {
                Some(status) => {
                    debug!(item = %item.key(), node = %name, status = %status, "Node filtered out");
                    reasons.push(format!("{}: {}", name, status.message()));
                }
                None => feasible.push(name),
            }
        }

        let mut scores = Vec::with_capacity(feasible.len());
        'nodes: for name in feasible {
            let mut total: i64 = 0;
            for scorer in &scorers {
                let (score, status) = scorer.score(item, &name);
                if !status.is_success() {
                    warn!(
                        item = %item.key(),
                        node = %name,
                        plugin = scorer.name(),
                        status = %status,
                        "Score failed, skipping node"
                    );
                    reasons.push(format!("{}: {}", name, status.message()));
                    continue 'nodes;
                }
                total = total.saturating_add(score);
            }
            scores.push(NodeScore {
                node: name,
                score: total,
            });
        }

        match select_node(&scores) {
            Some(best) => Placement::Node {
                node: best.node.clone(),
                score: best.score,
            },
            None => Placement::Unschedulable { reasons },
        }
    }

    /// Admit, order and place a batch of pending items
    pub async fn run(&self, pending: Vec<WorkItem>) -> Vec<(WorkItem, Placement)> {
        let mut queue = self.admit(pending).await;
        self.order(&mut queue);

        queue
            .into_iter()
            .map(|item| {
                let placement = self.schedule_one(&item);
                info!(item = %item.key(), placement = %placement, "Scheduling attempt");
                (item, placement)
            })
            .collect()
    }
}
