//! Plugin capability traits, external collaborators, and the plugin registry
//!
//! The host scheduler calls into this crate through four extension points:
//! queue sort, pre-enqueue, filter, and score. Each is a separate trait so a
//! plugin implements only the capabilities it offers and is registered by
//! name for each of them.

use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{EdfGpuError, EdfGpuResult, ItemKey, NodeInfo, Status, WorkItem};

/// Common plugin identity
pub trait Plugin: Send + Sync {
    /// Name the plugin is registered under
    fn name(&self) -> &str;
}

/// Orders the pending queue; must be a strict total order
pub trait QueueSortPlugin: Plugin {
    /// Whether `a` should be considered before `b`
    fn less(&self, a: &WorkItem, b: &WorkItem) -> bool;

    /// `less` expressed as an `Ordering`, for use with `sort_by`
    fn compare(&self, a: &WorkItem, b: &WorkItem) -> Ordering {
        if self.less(a, b) {
            Ordering::Less
        } else if self.less(b, a) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }
}

/// Invoked once per work item before it enters the queue
#[async_trait]
pub trait PreEnqueuePlugin: Plugin {
    async fn on_admission(&self, item: &mut WorkItem) -> Status;
}

/// Boolean eligibility of a node for a work item
pub trait FilterPlugin: Plugin {
    fn filter(&self, item: &WorkItem, node_info: &NodeInfo) -> Status;
}

/// Desirability of an eligible node for a work item
pub trait ScorePlugin: Plugin {
    fn score(&self, item: &WorkItem, node_name: &str) -> (i64, Status);
}

/// Host-provided default ordering, consumed when deadlines cannot decide
pub trait FallbackComparator: Send + Sync {
    fn less(&self, a: &WorkItem, b: &WorkItem) -> bool;
}

/// Read-only view of nodes and their bound work items
pub trait ResourceSnapshot: Send + Sync {
    /// Snapshot entry for a node, `NotFound` if unknown
    fn get_node(&self, name: &str) -> EdfGpuResult<NodeInfo>;

    /// Names of all nodes in the snapshot
    fn list_nodes(&self) -> Vec<String>;
}

/// Narrow interface onto the cluster object store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read the current state of a work item
    async fn get_work_item(&self, key: &ItemKey) -> EdfGpuResult<WorkItem>;

    /// Set one annotation if the stored version equals `expected_version`.
    ///
    /// Returns the new version on success and `Conflict` otherwise.
    async fn conditional_update_annotation(
        &self,
        key: &ItemKey,
        annotation: &str,
        value: &str,
        expected_version: u64,
    ) -> EdfGpuResult<u64>;
}

/// Plugins registered by name for each extension point
#[derive(Default)]
pub struct Registry {
    queue_sort: HashMap<String, Arc<dyn QueueSortPlugin>>,
    pre_enqueue: HashMap<String, Arc<dyn PreEnqueuePlugin>>,
    filter: HashMap<String, Arc<dyn FilterPlugin>>,
    score: HashMap<String, Arc<dyn ScorePlugin>>,
}

fn insert_unique<T: ?Sized>(
    map: &mut HashMap<String, Arc<T>>,
    point: &str,
    name: &str,
    plugin: Arc<T>,
) -> EdfGpuResult<()> {
    if map.contains_key(name) {
        return Err(EdfGpuError::Registry(format!(
            "{} plugin {} already registered",
            point, name
        )));
    }
    map.insert(name.to_string(), plugin);
    Ok(())
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_queue_sort(&mut self, plugin: Arc<dyn QueueSortPlugin>) -> EdfGpuResult<()> {
        let name = plugin.name().to_string();
        insert_unique(&mut self.queue_sort, "queue-sort", &name, plugin)
    }

    pub fn register_pre_enqueue(&mut self, plugin: Arc<dyn PreEnqueuePlugin>) -> EdfGpuResult<()> {
        let name = plugin.name().to_string();
        insert_unique(&mut self.pre_enqueue, "pre-enqueue", &name, plugin)
    }

    pub fn register_filter(&mut self, plugin: Arc<dyn FilterPlugin>) -> EdfGpuResult<()> {
        let name = plugin.name().to_string();
        insert_unique(&mut self.filter, "filter", &name, plugin)
    }

    pub fn register_score(&mut self, plugin: Arc<dyn ScorePlugin>) -> EdfGpuResult<()> {
        let name = plugin.name().to_string();
        insert_unique(&mut self.score, "score", &name, plugin)
    }

    pub fn queue_sort(&self, name: &str) -> Option<Arc<dyn QueueSortPlugin>> {
        self.queue_sort.get(name).cloned()
    }

    pub fn pre_enqueue(&self, name: &str) -> Option<Arc<dyn PreEnqueuePlugin>> {
        self.pre_enqueue.get(name).cloned()
    }

    pub fn filter(&self, name: &str) -> Option<Arc<dyn FilterPlugin>> {
        self.filter.get(name).cloned()
    }

    pub fn score(&self, name: &str) -> Option<Arc<dyn ScorePlugin>> {
        self.score.get(name).cloned()
    }

    /// All registered filter plugins, sorted by name
    pub fn filters(&self) -> Vec<Arc<dyn FilterPlugin>> {
        sorted_values(&self.filter)
    }

    /// All registered score plugins, sorted by name
    pub fn scorers(&self) -> Vec<Arc<dyn ScorePlugin>> {
        sorted_values(&self.score)
    }

    /// All registered pre-enqueue plugins, sorted by name
    pub fn pre_enqueuers(&self) -> Vec<Arc<dyn PreEnqueuePlugin>> {
        sorted_values(&self.pre_enqueue)
    }
}

fn sorted_values<T: ?Sized>(map: &HashMap<String, Arc<T>>) -> Vec<Arc<T>> {
    let mut names: Vec<&String> = map.keys().collect();
    names.sort();
    names.into_iter().map(|n| Arc::clone(&map[n])).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ByName;

    impl Plugin for ByName {
        fn name(&self) -> &str {
            "ByName"
        }
    }

    impl QueueSortPlugin for ByName {
        fn less(&self, a: &WorkItem, b: &WorkItem) -> bool {
            a.name < b.name
        }
    }

    struct AlwaysFits(&'static str);

    impl Plugin for AlwaysFits {
        fn name(&self) -> &str {
            self.0
        }
    }

    impl FilterPlugin for AlwaysFits {
        fn filter(&self, _item: &WorkItem, _node_info: &NodeInfo) -> Status {
            Status::success()
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = Registry::new();
        registry.register_queue_sort(Arc::new(ByName)).unwrap();

        let sorter = registry.queue_sort("ByName").unwrap();
        let a = WorkItem::new("default", "a");
        let b = WorkItem::new("default", "b");
        assert!(sorter.less(&a, &b));
        assert!(registry.queue_sort("Missing").is_none());
    }

    struct Admit;

    impl Plugin for Admit {
        fn name(&self) -> &str {
            "Admit"
        }
    }

    #[async_trait]
    impl PreEnqueuePlugin for Admit {
        async fn on_admission(&self, _item: &mut WorkItem) -> Status {
            Status::success()
        }
    }

    struct Flat(i64);

    impl Plugin for Flat {
        fn name(&self) -> &str {
            "Flat"
        }
    }

    impl ScorePlugin for Flat {
        fn score(&self, _item: &WorkItem, _node_name: &str) -> (i64, Status) {
            (self.0, Status::success())
        }
    }

    #[test]
    fn test_compare_follows_less() {
        let sorter = ByName;
        let a = WorkItem::new("default", "a");
        let b = WorkItem::new("default", "b");
        assert_eq!(sorter.compare(&a, &b), Ordering::Less);
        assert_eq!(sorter.compare(&b, &a), Ordering::Greater);
        assert_eq!(sorter.compare(&a, &a.clone()), Ordering::Equal);

        let mut queue = vec![b.clone(), a.clone()];
        queue.sort_by(|x, y| sorter.compare(x, y));
        assert_eq!(queue[0].name, "a");
    }

    #[test]
    fn test_lookup_per_extension_point() {
        let mut registry = Registry::new();
        registry.register_pre_enqueue(Arc::new(Admit)).unwrap();
        registry.register_filter(Arc::new(AlwaysFits("Fits"))).unwrap();
        registry.register_score(Arc::new(Flat(7))).unwrap();

        assert_eq!(registry.pre_enqueue("Admit").unwrap().name(), "Admit");
        assert_eq!(registry.filter("Fits").unwrap().name(), "Fits");

        let scorer = registry.score("Flat").unwrap();
        let (score, status) = scorer.score(&WorkItem::new("default", "a"), "n1");
        assert_eq!(score, 7);
        assert!(status.is_success());

        // Names are scoped to their extension point
        assert!(registry.pre_enqueue("Fits").is_none());
        assert!(registry.filter("Flat").is_none());
        assert!(registry.score("Admit").is_none());
        assert!(registry.queue_sort("Admit").is_none());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = Registry::new();
        registry.register_filter(Arc::new(AlwaysFits("Fits"))).unwrap();
        let err = registry
            .register_filter(Arc::new(AlwaysFits("Fits")))
            .unwrap_err();
        assert!(matches!(err, EdfGpuError::Registry(_)));
    }

    #[test]
    fn test_filters_sorted_by_name() {
        let mut registry = Registry::new();
        registry.register_filter(Arc::new(AlwaysFits("Zeta"))).unwrap();
        registry.register_filter(Arc::new(AlwaysFits("Alpha"))).unwrap();

        let names: Vec<String> = registry
            .filters()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }
}
