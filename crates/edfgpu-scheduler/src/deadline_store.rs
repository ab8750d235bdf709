//! Conditional persistence of the deadline annotation

use edfgpu_core::{EdfGpuError, EdfGpuResult, ItemKey, ObjectStore, WorkItem};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Result of a deadline write attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    /// The annotation was written; carries the item's new version
    Written { version: u64 },
    /// A non-empty value was already there (possibly written by a racing admitter)
    AlreadyPresent(String),
}

/// Writes the deadline annotation through the object store, only if absent
pub struct DeadlineStore {
    store: Arc<dyn ObjectStore>,
    timeout: Duration,
}

impl DeadlineStore {
    /// Create an adapter whose store calls give up after `timeout`
    pub fn new(store: Arc<dyn ObjectStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Make a single conditional write of `key = value` against `item.version`.
    ///
    /// On a version conflict the item is re-read: if another writer already
    /// set the key the winner's value is returned, otherwise the conflict is
    /// surfaced with the current version so the caller can decide to retry.
    pub async fn try_assign_deadline(
        &self,
        item: &WorkItem,
        key: &str,
        value: &str,
    ) -> EdfGpuResult<Assignment> {
        if let Some(existing) = non_empty(item, key) {
            return Ok(Assignment::AlreadyPresent(existing.to_string()));
        }

        let item_key = item.key();
        match self.update(&item_key, key, value, item.version).await {
            Ok(version) => Ok(Assignment::Written { version }),
            Err(e) if e.is_conflict() => {
                let current = self.read(&item_key).await?;
                if let Some(existing) = non_empty(&current, key) {
                    debug!(
                        item = %item_key,
                        deadline = existing,
                        "Deadline already written by another admitter"
                    );
                    return Ok(Assignment::AlreadyPresent(existing.to_string()));
                }
                Err(EdfGpuError::Conflict {
                    key: item_key.to_string(),
                    expected: item.version,
                    actual: current.version,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn update(
        &self,
        item_key: &ItemKey,
        key: &str,
        value: &str,
        expected_version: u64,
    ) -> EdfGpuResult<u64> {
        tokio::time::timeout(
            self.timeout,
            self.store
                .conditional_update_annotation(item_key, key, value, expected_version),
        )
        .await
        .map_err(|_| EdfGpuError::Timeout(self.timeout.as_millis() as u64))?
    }

    async fn read(&self, item_key: &ItemKey) -> EdfGpuResult<WorkItem> {
        tokio::time::timeout(self.timeout, self.store.get_work_item(item_key))
            .await
            .map_err(|_| EdfGpuError::Timeout(self.timeout.as_millis() as u64))?
    }
}

fn non_empty<'a>(item: &'a WorkItem, key: &str) -> Option<&'a str> {
    item.annotation(key).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use edfgpu_store::MemoryObjectStore;

    const KEY: &str = "scheduling.ui.ac.id/deadline";

    fn adapter(store: Arc<dyn ObjectStore>) -> DeadlineStore {
        DeadlineStore::new(store, Duration::from_millis(500))
    }

    #[tokio::test]
    async fn test_writes_when_absent() {
        let store = Arc::new(MemoryObjectStore::new());
        let item = store.insert(WorkItem::new("default", "job")).await;

        let outcome = adapter(store.clone())
            .try_assign_deadline(&item, KEY, "2024-01-01T00:10:00Z")
            .await
            .unwrap();

        assert_eq!(outcome, Assignment::Written { version: item.version + 1 });
        let stored = store.get_work_item(&item.key()).await.unwrap();
        assert_eq!(stored.annotation(KEY), Some("2024-01-01T00:10:00Z"));
    }

    #[tokio::test]
    async fn test_skips_when_present() {
        let store = Arc::new(MemoryObjectStore::new());
        let item = store
            .insert(WorkItem::new("default", "job").with_annotation(KEY, "2024-01-01T00:00:00Z"))
            .await;

        let outcome = adapter(store.clone())
            .try_assign_deadline(&item, KEY, "2030-01-01T00:00:00Z")
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Assignment::AlreadyPresent("2024-01-01T00:00:00Z".to_string())
        );
        let stored = store.get_work_item(&item.key()).await.unwrap();
        assert_eq!(stored.version, item.version);
    }

    #[tokio::test]
    async fn test_empty_value_is_overwritten() {
        let store = Arc::new(MemoryObjectStore::new());
        let item = store
            .insert(WorkItem::new("default", "job").with_annotation(KEY, ""))
            .await;

        let outcome = adapter(store)
            .try_assign_deadline(&item, KEY, "2024-01-01T00:10:00Z")
            .await
            .unwrap();
        assert!(matches!(outcome, Assignment::Written { .. }));
    }

    #[tokio::test]
    async fn test_conflict_with_racing_writer_accepts_winner() {
        let store = Arc::new(MemoryObjectStore::new());
        let stale = store.insert(WorkItem::new("default", "job")).await;
        store
            .conditional_update_annotation(&stale.key(), KEY, "2024-01-01T00:05:00Z", stale.version)
            .await
            .unwrap();

        let outcome = adapter(store)
            .try_assign_deadline(&stale, KEY, "2024-01-01T00:10:00Z")
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Assignment::AlreadyPresent("2024-01-01T00:05:00Z".to_string())
        );
    }

    #[tokio::test]
    async fn test_conflict_without_deadline_is_surfaced() {
        let store = Arc::new(MemoryObjectStore::new());
        let stale = store.insert(WorkItem::new("default", "job")).await;
        store
            .conditional_update_annotation(&stale.key(), "team", "vision", stale.version)
            .await
            .unwrap();

        let err = adapter(store)
            .try_assign_deadline(&stale, KEY, "2024-01-01T00:10:00Z")
            .await
            .unwrap_err();
        match err {
            EdfGpuError::Conflict { expected, actual, .. } => {
                assert_eq!(expected, stale.version);
                assert_eq!(actual, stale.version + 1);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    struct HangingStore;

    #[async_trait]
    impl ObjectStore for HangingStore {
        async fn get_work_item(&self, key: &ItemKey) -> EdfGpuResult<WorkItem> {
            Err(EdfGpuError::NotFound(key.to_string()))
        }

        async fn conditional_update_annotation(
            &self,
            _key: &ItemKey,
            _annotation: &str,
            _value: &str,
            _expected_version: u64,
        ) -> EdfGpuResult<u64> {
            futures::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_hung_store_times_out() {
        let adapter = DeadlineStore::new(Arc::new(HangingStore), Duration::from_millis(20));
        let err = adapter
            .try_assign_deadline(&WorkItem::new("default", "job"), KEY, "2024-01-01T00:10:00Z")
            .await
            .unwrap_err();
        assert!(matches!(err, EdfGpuError::Timeout(20)));
    }
}
