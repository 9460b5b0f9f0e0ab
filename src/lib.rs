//! Trellis - traversal, query and mutation engine for a multi-tenant inventory graph
//!
//! Entities (tenants, environments, feeds, resource types, metric types,
//! resources, metrics, ...) are addressed by typed hierarchical paths and
//! connected by typed relationships. Clients navigate the hierarchy with a
//! fluent API; the engine turns every position into a query tree executed by
//! a pluggable backend.
//!
//! # Quick Start
//!
//! ```
//! use trellis::{Blueprint, Creatable, Deletable, Fetchable, Inventory, MemoryBackend, Pager};
//!
//! let inventory = Inventory::new(MemoryBackend::new());
//! let acme = inventory.tenants().create(Blueprint::tenant("acme")).unwrap();
//! acme.environments().create(Blueprint::environment("staging")).unwrap();
//!
//! assert_eq!(acme.environments().entities(&Pager::unlimited()).unwrap().len(), 1);
//! acme.delete().unwrap();
//! assert!(inventory.tenants().entities(&Pager::unlimited()).unwrap().is_empty());
//! ```
//!
//! # Architecture
//!
//! - [`trellis_core`]: path algebra, entity model, query trees, backend SPI
//! - [`trellis_storage`]: in-memory backend
//! - [`trellis_engine`]: traversal, mutation, integrity rules, notifications

pub use trellis_core::*;
pub use trellis_engine::*;
pub use trellis_storage::{Element, MemoryBackend, MemoryTransaction};
