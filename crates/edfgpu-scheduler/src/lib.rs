//! edfgpu-scheduler: EDF queue ordering and GPU-aware placement
//!
//! This crate provides the scheduling policy plugins:
//! - Deadline assignment on admission and its conditional persistence
//! - Earliest-deadline-first queue ordering with a priority fallback
//! - GPU resource extraction, admission filtering and node scoring
//! - A scheduling cycle that drives the plugins over a node snapshot

pub mod deadline;
pub mod deadline_store;
pub mod edf;
pub mod gpu_aware;
pub mod placement;
pub mod priority;
pub mod resources;
pub mod scheduler;

pub use deadline::DeadlineAssigner;
pub use deadline_store::{Assignment, DeadlineStore};
pub use edf::{EdfQueueSort, EDF_PLUGIN_NAME};
pub use gpu_aware::{GpuAware, ScoreBreakdown, GPU_AWARE_PLUGIN_NAME};
pub use placement::{NodeScore, Placement};
pub use priority::PrioritySort;
pub use resources::GpuExtractor;
pub use scheduler::{default_registry, Scheduler};
