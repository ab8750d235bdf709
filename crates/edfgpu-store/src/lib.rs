//! edfgpu-store: In-memory cluster state
//!
//! This crate provides stand-ins for the host's collaborators:
//! - A versioned object store with conditional annotation updates
//! - An immutable node snapshot
//! - JSON cluster fixtures for the simulator

pub mod fixture;
pub mod object_store;
pub mod snapshot;

pub use fixture::ClusterFixture;
pub use object_store::MemoryObjectStore;
pub use snapshot::MemorySnapshot;
