//! edfgpu-core: Core types and traits for edfgpu
//!
//! This crate provides the fundamental types used throughout the edfgpu system:
//! - Work item, node, and snapshot types
//! - Plugin capability traits and the plugin registry
//! - Interfaces onto the host's object store and node snapshot
//! - Configuration types
//! - Error handling

pub mod clock;
pub mod config;
pub mod error;
pub mod framework;
pub mod model;
pub mod status;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use framework::*;
pub use model::*;
pub use status::*;
