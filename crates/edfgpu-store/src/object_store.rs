//! Versioned in-memory object store

use async_trait::async_trait;
use edfgpu_core::{EdfGpuError, EdfGpuResult, ItemKey, ObjectStore, WorkItem};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Work items indexed by key, each carrying an optimistic-concurrency version
pub struct MemoryObjectStore {
    /// Stored items
    items: RwLock<HashMap<ItemKey, WorkItem>>,
    /// When set, every conditional update fails with this transport error
    update_failure: RwLock<Option<String>>,
}

impl MemoryObjectStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            update_failure: RwLock::new(None),
        }
    }

    /// Create or replace an item, bumping its version.
    ///
    /// Returns the stored copy so callers hold the current version.
    pub async fn insert(&self, mut item: WorkItem) -> WorkItem {
        let mut items = self.items.write().await;
        let key = item.key();
        item.version = items.get(&key).map_or(1, |existing| existing.version + 1);
        items.insert(key.clone(), item.clone());

        debug!(item = %key, version = item.version, "Stored work item");
        item
    }

    /// All stored items, ordered by key
    pub async fn list(&self) -> Vec<WorkItem> {
        let items = self.items.read().await;
        let mut list: Vec<WorkItem> = items.values().cloned().collect();
        list.sort_by(|a, b| a.key().cmp(&b.key()));
        list
    }

    /// Make every subsequent conditional update fail with a transport error
    pub async fn fail_updates(&self, message: impl Into<String>) {
        *self.update_failure.write().await = Some(message.into());
    }

    /// Stop injecting update failures
    pub async fn heal(&self) {
        *self.update_failure.write().await = None;
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_work_item(&self, key: &ItemKey) -> EdfGpuResult<WorkItem> {
        let items = self.items.read().await;
        items
            .get(key)
            .cloned()
            .ok_or_else(|| EdfGpuError::NotFound(format!("work item {}", key)))
    }

    async fn conditional_update_annotation(
        &self,
        key: &ItemKey,
        annotation: &str,
        value: &str,
        expected_version: u64,
    ) -> EdfGpuResult<u64> {
        if let Some(message) = self.update_failure.read().await.clone() {
            return Err(EdfGpuError::Transport(message));
        }

        let mut items = self.items.write().await;
        let item = items
            .get_mut(key)
            .ok_or_else(|| EdfGpuError::NotFound(format!("work item {}", key)))?;

        if item.version != expected_version {
            return Err(EdfGpuError::Conflict {
                key: key.to_string(),
                expected: expected_version,
                actual: item.version,
            });
        }

        item.annotations
            .insert(annotation.to_string(), value.to_string());
        item.version += 1;

        debug!(
            item = %key,
            annotation = annotation,
            version = item.version,
            "Updated annotation"
        );

        Ok(item.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_assigns_versions() {
        let store = MemoryObjectStore::new();
        let first = store.insert(WorkItem::new("default", "job")).await;
        assert_eq!(first.version, 1);

        let second = store.insert(WorkItem::new("default", "job")).await;
        assert_eq!(second.version, 2);
        assert_eq!(store.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_conditional_update() {
        let store = MemoryObjectStore::new();
        let item = store.insert(WorkItem::new("default", "job")).await;

        let version = store
            .conditional_update_annotation(&item.key(), "k", "v", item.version)
            .await
            .unwrap();
        assert_eq!(version, item.version + 1);

        let stored = store.get_work_item(&item.key()).await.unwrap();
        assert_eq!(stored.annotation("k"), Some("v"));
        assert_eq!(stored.version, version);
    }

    #[tokio::test]
    async fn test_stale_version_conflicts() {
        let store = MemoryObjectStore::new();
        let item = store.insert(WorkItem::new("default", "job")).await;
        store
            .conditional_update_annotation(&item.key(), "k", "v1", item.version)
            .await
            .unwrap();

        let err = store
            .conditional_update_annotation(&item.key(), "k", "v2", item.version)
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let stored = store.get_work_item(&item.key()).await.unwrap();
        assert_eq!(stored.annotation("k"), Some("v1"));
    }

    #[tokio::test]
    async fn test_unknown_item() {
        let store = MemoryObjectStore::new();
        let key = ItemKey::new("default", "ghost");

        assert!(matches!(
            store.get_work_item(&key).await,
            Err(EdfGpuError::NotFound(_))
        ));
        assert!(matches!(
            store.conditional_update_annotation(&key, "k", "v", 1).await,
            Err(EdfGpuError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryObjectStore::new();
        let item = store.insert(WorkItem::new("default", "job")).await;

        store.fail_updates("connection reset").await;
        let err = store
            .conditional_update_annotation(&item.key(), "k", "v", item.version)
            .await
            .unwrap_err();
        assert!(matches!(err, EdfGpuError::Transport(ref m) if m == "connection reset"));

        store.heal().await;
        assert!(store
            .conditional_update_annotation(&item.key(), "k", "v", item.version)
            .await
            .is_ok());
    }
}
