//! Work item, node, and snapshot type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Identity of a work item in the object store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey {
    /// Namespace the item lives in
    pub namespace: String,
    /// Name, unique within the namespace
    pub name: String,
}

impl ItemKey {
    /// Create a new item key
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A schedulable unit of work (e.g. a pod)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    /// Unique identifier assigned by the object store
    #[serde(default = "Uuid::new_v4")]
    pub uid: Uuid,
    /// Namespace
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Name
    pub name: String,
    /// Key/value annotations
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// Sub-components and their resource requests
    #[serde(default)]
    pub containers: Vec<Container>,
    /// Scheduling priority (higher is more important)
    #[serde(default)]
    pub priority: Option<i32>,
    /// Creation timestamp
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Optimistic concurrency token
    #[serde(default)]
    pub version: u64,
}

fn default_namespace() -> String {
    "default".to_string()
}

impl WorkItem {
    /// Create a new work item with no annotations or requests
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uid: Uuid::new_v4(),
            namespace: namespace.into(),
            name: name.into(),
            annotations: BTreeMap::new(),
            containers: Vec::new(),
            priority: None,
            created_at: Utc::now(),
            version: 0,
        }
    }

    /// Store key for this item
    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.namespace.clone(), self.name.clone())
    }

    /// Annotation value, if present
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    /// Builder-style helper to set an annotation
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Builder-style helper to append a container
    pub fn with_container(mut self, container: Container) -> Self {
        self.containers.push(container);
        self
    }

    /// Builder-style helper to set the priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Builder-style helper to set the creation time
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// A sub-component of a work item with its own resource requests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Container {
    /// Container name
    pub name: String,
    /// Requested quantity per resource kind
    #[serde(default)]
    pub requests: BTreeMap<String, i64>,
}

impl Container {
    /// Create a container with no requests
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requests: BTreeMap::new(),
        }
    }

    /// Builder-style helper to add a resource request
    pub fn with_request(mut self, resource: impl Into<String>, quantity: i64) -> Self {
        self.requests.insert(resource.into(), quantity);
        self
    }
}

/// An execution node that work items can be placed on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique node name
    pub name: String,
    /// Capacity per resource kind
    #[serde(default)]
    pub capacity: BTreeMap<String, i64>,
    /// Labels describing hardware (GPU memory, interconnect, generation)
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl Node {
    /// Create a node with empty capacity and labels
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capacity: BTreeMap::new(),
            labels: BTreeMap::new(),
        }
    }

    /// Builder-style helper to set a capacity entry
    pub fn with_capacity(mut self, resource: impl Into<String>, quantity: i64) -> Self {
        self.capacity.insert(resource.into(), quantity);
        self
    }

    /// Builder-style helper to set a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

/// Snapshot entry for one node: its descriptor plus the items bound to it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Node descriptor; `None` when the snapshot has lost track of it
    pub node: Option<Node>,
    /// Work items currently bound to the node
    #[serde(default)]
    pub bound_items: Vec<WorkItem>,
}

impl NodeInfo {
    /// Create a snapshot entry for a node
    pub fn new(node: Node, bound_items: Vec<WorkItem>) -> Self {
        Self {
            node: Some(node),
            bound_items,
        }
    }

    /// Node descriptor, if present
    pub fn node(&self) -> Option<&Node> {
        self.node.as_ref()
    }
}
