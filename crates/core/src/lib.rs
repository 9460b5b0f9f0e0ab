//! Core types and traits for Trellis
//!
//! This crate defines the foundations shared by the engine and every backend:
//! - Path algebra: typed canonical and relative paths, their string codec and
//!   segment type inference
//! - Entity model: entity kinds, blueprints, updates, relationships
//! - Query language: filters, query trees and their builders, paging
//! - Error: the error taxonomy
//! - Traits: the backend SPI ([`InventoryBackend`])

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod filter;
pub mod model;
pub mod paging;
pub mod path;
pub mod query;
pub mod traits;

pub use error::{Error, Result};
pub use filter::Filter;
pub use model::{
    Blueprint, BlueprintKind, DataEntity, Direction, Entity, EntityRole, EntityType, Environment,
    Feed, InventoryEntity, MetadataPack, Metric, MetricDataType, MetricType, MetricUnit,
    OperationType, Properties, Relationship, Resource, ResourceType, Tenant, Update, WellKnown,
};
pub use paging::{Order, OrderField, Page, Pager};
pub use path::{CanonicalPath, Extender, Path, RelativePath, Segment, SegmentType};
pub use query::{FragmentMode, Query, QueryBuilder, QueryFragment, SymmetricExtender};
pub use traits::InventoryBackend;
