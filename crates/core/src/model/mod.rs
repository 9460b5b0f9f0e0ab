//! Entity model
//!
//! Every inventory entity is addressed by a [`CanonicalPath`]; the path prefix
//! encodes its containment ancestry. The set of entity kinds is closed and
//! dispatch over it is a `match` on [`EntityType`] or [`Entity`].
//!
//! | Kind | Segment | Contained by |
//! |------|---------|--------------|
//! | Tenant | `t` | (root) |
//! | Environment | `e` | tenant |
//! | Feed | `f` | tenant |
//! | ResourceType | `rt` | tenant, feed |
//! | MetricType | `mt` | tenant, feed |
//! | Resource | `r` | environment, feed, resource |
//! | Metric | `m` | environment, feed, resource |
//! | OperationType | `ot` | resource type |
//! | DataEntity | `d` | resource, resource type, operation type |
//! | MetadataPack | `mp` | tenant |
//! | Relationship | `rl` | (root) |

mod blueprint;
mod entities;
mod relationship;
mod update;

pub use blueprint::{Blueprint, BlueprintKind};
pub use entities::{
    DataEntity, Entity, Environment, Feed, MetadataPack, Metric, MetricDataType, MetricType,
    MetricUnit, OperationType, Resource, ResourceType, Tenant,
};
pub use relationship::{Direction, EntityRole, Relationship, WellKnown};
pub use update::Update;

use crate::path::{CanonicalPath, SegmentType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Free-form entity properties
pub type Properties = BTreeMap<String, serde_json::Value>;

/// The closed set of entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityType {
    /// Top-level owner of everything else
    Tenant,
    /// Deployment environment
    Environment,
    /// Agent reporting resources and metrics
    Feed,
    /// Type of resources
    ResourceType,
    /// Type of metrics
    MetricType,
    /// Monitored resource
    Resource,
    /// Metric of a resource
    Metric,
    /// Operation offered by a resource type
    OperationType,
    /// Structured data attached to an entity under a role
    DataEntity,
    /// Group of resource and metric types
    MetadataPack,
    /// Edge between two entities
    Relationship,
}

impl EntityType {
    /// All entity types (for iteration)
    pub const ALL: [EntityType; 11] = [
        EntityType::Tenant,
        EntityType::Environment,
        EntityType::Feed,
        EntityType::ResourceType,
        EntityType::MetricType,
        EntityType::Resource,
        EntityType::Metric,
        EntityType::OperationType,
        EntityType::DataEntity,
        EntityType::MetadataPack,
        EntityType::Relationship,
    ];

    /// Human-readable name
    pub const fn name(&self) -> &'static str {
        match self {
            EntityType::Tenant => "Tenant",
            EntityType::Environment => "Environment",
            EntityType::Feed => "Feed",
            EntityType::ResourceType => "ResourceType",
            EntityType::MetricType => "MetricType",
            EntityType::Resource => "Resource",
            EntityType::Metric => "Metric",
            EntityType::OperationType => "OperationType",
            EntityType::DataEntity => "DataEntity",
            EntityType::MetadataPack => "MetadataPack",
            EntityType::Relationship => "Relationship",
        }
    }

    /// Segment type addressing entities of this kind
    pub const fn segment_type(&self) -> SegmentType {
        match self {
            EntityType::Tenant => SegmentType::Tenant,
            EntityType::Environment => SegmentType::Environment,
            EntityType::Feed => SegmentType::Feed,
            EntityType::ResourceType => SegmentType::ResourceType,
            EntityType::MetricType => SegmentType::MetricType,
            EntityType::Resource => SegmentType::Resource,
            EntityType::Metric => SegmentType::Metric,
            EntityType::OperationType => SegmentType::OperationType,
            EntityType::DataEntity => SegmentType::DataEntity,
            EntityType::MetadataPack => SegmentType::MetadataPack,
            EntityType::Relationship => SegmentType::Relationship,
        }
    }

    /// Entity kind of a segment type; `None` for `sd` and `..`
    pub const fn from_segment_type(segment_type: SegmentType) -> Option<EntityType> {
        match segment_type {
            SegmentType::Tenant => Some(EntityType::Tenant),
            SegmentType::Environment => Some(EntityType::Environment),
            SegmentType::Feed => Some(EntityType::Feed),
            SegmentType::ResourceType => Some(EntityType::ResourceType),
            SegmentType::MetricType => Some(EntityType::MetricType),
            SegmentType::Resource => Some(EntityType::Resource),
            SegmentType::Metric => Some(EntityType::Metric),
            SegmentType::OperationType => Some(EntityType::OperationType),
            SegmentType::DataEntity => Some(EntityType::DataEntity),
            SegmentType::MetadataPack => Some(EntityType::MetadataPack),
            SegmentType::Relationship => Some(EntityType::Relationship),
            SegmentType::StructuredData | SegmentType::Up => None,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Entity kind usable as a static tag by the traversal engine
pub trait InventoryEntity: Clone + fmt::Debug + Send + Sync + 'static {
    /// Kind tag
    const ENTITY_TYPE: EntityType;

    /// Down-cast from the tagged union; `None` on a kind mismatch
    fn from_entity(entity: Entity) -> Option<Self>;

    /// Up-cast into the tagged union
    fn into_entity(self) -> Entity;

    /// Canonical path of this entity
    fn path(&self) -> &CanonicalPath;

    /// Last path segment id
    fn id(&self) -> &str {
        self.path().id().unwrap_or_default()
    }
}
