//! Default priority ordering used as the EDF fallback

use edfgpu_core::{FallbackComparator, WorkItem};
use std::cmp::Ordering;

/// Higher priority first, then older items, then by `namespace/name`
#[derive(Debug, Clone, Copy, Default)]
pub struct PrioritySort;

impl FallbackComparator for PrioritySort {
    fn less(&self, a: &WorkItem, b: &WorkItem) -> bool {
        let pa = a.priority.unwrap_or(0);
        let pb = b.priority.unwrap_or(0);

        pb.cmp(&pa)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.namespace.cmp(&b.namespace))
            .then_with(|| a.name.cmp(&b.name))
            == Ordering::Less
    }
}
