//! Storage layer for Trellis
//!
//! This crate implements the in-memory graph backend:
//! - MemoryBackend: property graph behind a `parking_lot::RwLock`
//! - Snapshot transactions with nested joining
//! - Query evaluation: chains of path and filter fragments over the graph

#![warn(missing_docs)]
#![warn(clippy::all)]

mod eval;
mod graph;
pub mod memory;

pub use graph::Element;
pub use memory::{MemoryBackend, MemoryTransaction};
