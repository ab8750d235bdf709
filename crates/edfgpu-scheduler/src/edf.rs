//! Earliest-deadline-first queue ordering

use chrono::{DateTime, Utc};
use edfgpu_core::{EdfArgs, FallbackComparator, Plugin, QueueSortPlugin, WorkItem};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

use crate::deadline::parse_deadline;

/// Name the queue sort and pre-enqueue hooks are registered under
pub const EDF_PLUGIN_NAME: &str = "EDFQueueSort";

/// Orders pending items by absolute deadline.
///
/// Items carrying a valid deadline always come before items without one.
/// Two items without deadlines, or with identical deadlines, are ordered by
/// the injected fallback comparator.
pub struct EdfQueueSort {
    deadline_annotation: String,
    fallback: Arc<dyn FallbackComparator>,
}

impl EdfQueueSort {
    /// Create a comparator reading deadlines from the configured annotation
    pub fn new(args: &EdfArgs, fallback: Arc<dyn FallbackComparator>) -> Self {
        Self {
            deadline_annotation: args.deadline_annotation.clone(),
            fallback,
        }
    }

    /// Parsed deadline of an item; absent, empty, or malformed values are `None`
    pub fn deadline_of(&self, item: &WorkItem) -> Option<DateTime<Utc>> {
        let raw = item.annotation(&self.deadline_annotation)?;
        let parsed = parse_deadline(raw);
        if parsed.is_none() && !raw.is_empty() {
            debug!(
                item = %item.key(),
                key = %self.deadline_annotation,
                value = raw,
                "Invalid deadline format"
            );
        }
        parsed
    }
}

impl Plugin for EdfQueueSort {
    fn name(&self) -> &str {
        EDF_PLUGIN_NAME
    }
}

impl QueueSortPlugin for EdfQueueSort {
    fn less(&self, a: &WorkItem, b: &WorkItem) -> bool {
        match (self.deadline_of(a), self.deadline_of(b)) {
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => self.fallback.less(a, b),
            (Some(da), Some(db)) => match da.cmp(&db) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => self.fallback.less(a, b),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::priority::PrioritySort;
    use chrono::TimeZone;
    use edfgpu_core::DEFAULT_DEADLINE_ANNOTATION;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn sorter() -> EdfQueueSort {
        EdfQueueSort::new(&EdfArgs::default(), Arc::new(PrioritySort))
    }

    fn item(name: &str, priority: i32, deadline: Option<&str>) -> WorkItem {
        let item = WorkItem::new("default", name)
            .with_priority(priority)
            .with_created_at(t0());
        match deadline {
            Some(d) => item.with_annotation(DEFAULT_DEADLINE_ANNOTATION, d),
            None => item,
        }
    }

    #[test]
    fn test_earlier_deadline_first_regardless_of_priority() {
        let s = sorter();
        let urgent = item("urgent", 0, Some("2024-03-01T12:00:10Z"));
        let relaxed = item("relaxed", 1000, Some("2024-03-01T13:00:00Z"));

        assert!(s.less(&urgent, &relaxed));
        assert!(!s.less(&relaxed, &urgent));
    }

    #[test]
    fn test_deadline_beats_no_deadline() {
        let s = sorter();
        let a = item("a", 0, Some("2024-03-01T12:00:10Z"));
        let b = item("b", 1000, None);

        assert!(s.less(&a, &b));
        assert!(!s.less(&b, &a));
    }

    #[test]
    fn test_invalid_and_empty_deadlines_are_absent() {
        let s = sorter();
        let valid = item("valid", 0, Some("2024-03-01T12:00:10Z"));
        let garbage = item("garbage", 1000, Some("next tuesday"));
        let empty = item("empty", 1000, Some(""));

        assert!(s.deadline_of(&garbage).is_none());
        assert!(s.deadline_of(&empty).is_none());
        assert!(s.less(&valid, &garbage));
        assert!(s.less(&valid, &empty));
    }

    #[test]
    fn test_no_deadlines_match_fallback() {
        let s = sorter();
        let fallback = PrioritySort;
        let high = item("high", 100, None);
        let low = item("low", 1, None);

        assert_eq!(s.less(&high, &low), fallback.less(&high, &low));
        assert_eq!(s.less(&low, &high), fallback.less(&low, &high));
        assert!(s.less(&high, &low));
    }

    #[test]
    fn test_equal_deadlines_tie_break_on_fallback() {
        let s = sorter();
        let a = item("a", 5, Some("2024-03-01T12:00:10Z"));
        let b = item("b", 50, Some("2024-03-01T14:00:10+02:00"));

        assert!(s.less(&b, &a));
        assert!(!s.less(&a, &b));
    }

    #[test]
    fn test_strict_total_order() {
        let s = sorter();
        let items = vec![
            item("a", 0, Some("2024-03-01T12:00:10Z")),
            item("b", 10, Some("2024-03-01T12:00:10Z")),
            item("c", 10, Some("2024-03-01T12:05:00Z")),
            item("d", 100, None),
            item("e", 0, None),
            item("f", 0, Some("bogus")),
            item("g", 100, Some("")),
            item("h", 0, None),
        ];

        for a in &items {
            assert!(!s.less(a, a), "irreflexive for {}", a.name);
            for b in &items {
                assert!(
                    !(s.less(a, b) && s.less(b, a)),
                    "asymmetric for {} {}",
                    a.name,
                    b.name
                );
                for c in &items {
                    if s.less(a, b) && s.less(b, c) {
                        assert!(s.less(a, c), "transitive for {} {} {}", a.name, b.name, c.name);
                    }
                }
            }
        }
    }

    #[test]
    fn test_sort_by_compare() {
        let s = sorter();
        let mut queue = vec![
            item("none-high", 100, None),
            item("late", 0, Some("2024-03-01T13:00:00Z")),
            item("none-low", 1, None),
            item("soon", 0, Some("2024-03-01T12:00:10Z")),
        ];
        queue.sort_by(|a, b| s.compare(a, b));

        let names: Vec<&str> = queue.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["soon", "late", "none-high", "none-low"]);
    }

    #[test]
    fn test_custom_fallback_is_used() {
        struct ReverseName;
        impl FallbackComparator for ReverseName {
            fn less(&self, a: &WorkItem, b: &WorkItem) -> bool {
                a.name > b.name
            }
        }

        let s = EdfQueueSort::new(&EdfArgs::default(), Arc::new(ReverseName));
        let a = item("a", 100, None);
        let z = item("z", 0, None);
        assert!(s.less(&z, &a));
    }
}
