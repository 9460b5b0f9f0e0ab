//! Entity structs and the [`Entity`] tagged union

use super::{EntityType, InventoryEntity, Properties, Relationship};
use crate::path::CanonicalPath;
use serde::{Deserialize, Serialize};

/// Unit of a metric type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricUnit {
    /// Dimensionless
    #[default]
    None,
    /// Milliseconds
    Milliseconds,
    /// Seconds
    Seconds,
    /// Minutes
    Minutes,
    /// Bytes
    Bytes,
    /// Kilobytes
    Kilobytes,
    /// Megabytes
    Megabytes,
    /// Gigabytes
    Gigabytes,
    /// Percentage
    Percentage,
}

/// How metric values are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricDataType {
    /// Instantaneous value
    #[default]
    Gauge,
    /// Up/down state
    Availability,
    /// Monotonic counter
    Counter,
    /// Rate of a counter
    CounterRate,
    /// Rate of a gauge
    GaugeRate,
    /// Free text
    String,
}

macro_rules! plain_entity {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            /// Canonical path
            pub path: CanonicalPath,
            /// Display name
            pub name: Option<String>,
            /// Free-form properties
            pub properties: Properties,
        }

        impl $name {
            /// Entity at `path` with no name and no properties
            pub fn new(path: CanonicalPath) -> Self {
                $name {
                    path,
                    name: None,
                    properties: Properties::new(),
                }
            }
        }
    };
}

plain_entity!(
    /// Top-level owner of an inventory
    Tenant
);
plain_entity!(
    /// Deployment environment of a tenant
    Environment
);
plain_entity!(
    /// Agent reporting resources and metrics
    Feed
);
plain_entity!(
    /// Type of resources
    ResourceType
);
plain_entity!(
    /// Operation offered by a resource type
    OperationType
);

/// Type of metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricType {
    /// Canonical path
    pub path: CanonicalPath,
    /// Display name
    pub name: Option<String>,
    /// Free-form properties
    pub properties: Properties,
    /// Unit of the values
    pub unit: MetricUnit,
    /// Interpretation of the values
    pub data_type: MetricDataType,
    /// Default collection interval in seconds
    pub collection_interval: Option<u64>,
}

/// Monitored resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Canonical path
    pub path: CanonicalPath,
    /// Display name
    pub name: Option<String>,
    /// Free-form properties
    pub properties: Properties,
    /// The resource type defining this resource
    pub resource_type: CanonicalPath,
}

/// Metric of a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Canonical path
    pub path: CanonicalPath,
    /// Display name
    pub name: Option<String>,
    /// Free-form properties
    pub properties: Properties,
    /// The metric type defining this metric
    pub metric_type: CanonicalPath,
    /// Collection interval in seconds, overriding the metric type's
    pub collection_interval: Option<u64>,
}

/// Structured value attached to an entity under a role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEntity {
    /// Canonical path; the id is the role
    pub path: CanonicalPath,
    /// Display name
    pub name: Option<String>,
    /// Free-form properties
    pub properties: Properties,
    /// The data
    pub value: serde_json::Value,
}

impl DataEntity {
    /// Role of the data under its owner (`configuration`, ...)
    pub fn role(&self) -> &str {
        self.path.id().unwrap_or_default()
    }
}

/// Group of resource and metric types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataPack {
    /// Canonical path
    pub path: CanonicalPath,
    /// Display name
    pub name: Option<String>,
    /// Free-form properties
    pub properties: Properties,
    /// Incorporated resource and metric types
    pub members: Vec<CanonicalPath>,
}

/// Any inventory entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Entity {
    /// Tenant
    Tenant(Tenant),
    /// Environment
    Environment(Environment),
    /// Feed
    Feed(Feed),
    /// Resource type
    ResourceType(ResourceType),
    /// Metric type
    MetricType(MetricType),
    /// Resource
    Resource(Resource),
    /// Metric
    Metric(Metric),
    /// Operation type
    OperationType(OperationType),
    /// Data entity
    DataEntity(DataEntity),
    /// Metadata pack
    MetadataPack(MetadataPack),
    /// Relationship
    Relationship(Relationship),
}

macro_rules! each_entity {
    ($value:expr, $e:ident => $body:expr) => {
        match $value {
            Entity::Tenant($e) => $body,
            Entity::Environment($e) => $body,
            Entity::Feed($e) => $body,
            Entity::ResourceType($e) => $body,
            Entity::MetricType($e) => $body,
            Entity::Resource($e) => $body,
            Entity::Metric($e) => $body,
            Entity::OperationType($e) => $body,
            Entity::DataEntity($e) => $body,
            Entity::MetadataPack($e) => $body,
            Entity::Relationship($e) => $body,
        }
    };
}

impl Entity {
    /// Kind of this entity
    pub fn entity_type(&self) -> EntityType {
        match self {
            Entity::Tenant(_) => EntityType::Tenant,
            Entity::Environment(_) => EntityType::Environment,
            Entity::Feed(_) => EntityType::Feed,
            Entity::ResourceType(_) => EntityType::ResourceType,
            Entity::MetricType(_) => EntityType::MetricType,
            Entity::Resource(_) => EntityType::Resource,
            Entity::Metric(_) => EntityType::Metric,
            Entity::OperationType(_) => EntityType::OperationType,
            Entity::DataEntity(_) => EntityType::DataEntity,
            Entity::MetadataPack(_) => EntityType::MetadataPack,
            Entity::Relationship(_) => EntityType::Relationship,
        }
    }

    /// Canonical path
    pub fn path(&self) -> &CanonicalPath {
        each_entity!(self, e => &e.path)
    }

    /// Last path segment id
    pub fn id(&self) -> &str {
        self.path().id().unwrap_or_default()
    }

    /// Display name; for relationships, the relationship name
    pub fn name(&self) -> Option<&str> {
        match self {
            Entity::Tenant(e) => e.name.as_deref(),
            Entity::Environment(e) => e.name.as_deref(),
            Entity::Feed(e) => e.name.as_deref(),
            Entity::ResourceType(e) => e.name.as_deref(),
            Entity::MetricType(e) => e.name.as_deref(),
            Entity::Resource(e) => e.name.as_deref(),
            Entity::Metric(e) => e.name.as_deref(),
            Entity::OperationType(e) => e.name.as_deref(),
            Entity::DataEntity(e) => e.name.as_deref(),
            Entity::MetadataPack(e) => e.name.as_deref(),
            Entity::Relationship(r) => Some(r.name.as_str()),
        }
    }

    /// Free-form properties
    pub fn properties(&self) -> &Properties {
        each_entity!(self, e => &e.properties)
    }

    pub(crate) fn properties_mut(&mut self) -> &mut Properties {
        each_entity!(self, e => &mut e.properties)
    }

    /// Down-cast to a concrete kind
    pub fn downcast<E: InventoryEntity>(self) -> Option<E> {
        E::from_entity(self)
    }

    /// The relationship, if this is one
    pub fn as_relationship(&self) -> Option<&Relationship> {
        match self {
            Entity::Relationship(r) => Some(r),
            _ => None,
        }
    }
}

macro_rules! inventory_entity {
    ($name:ident) => {
        impl InventoryEntity for $name {
            const ENTITY_TYPE: EntityType = EntityType::$name;

            fn from_entity(entity: Entity) -> Option<Self> {
                match entity {
                    Entity::$name(e) => Some(e),
                    _ => None,
                }
            }

            fn into_entity(self) -> Entity {
                Entity::$name(self)
            }

            fn path(&self) -> &CanonicalPath {
                &self.path
            }
        }

        impl From<$name> for Entity {
            fn from(e: $name) -> Self {
                Entity::$name(e)
            }
        }
    };
}

inventory_entity!(Tenant);
inventory_entity!(Environment);
inventory_entity!(Feed);
inventory_entity!(ResourceType);
inventory_entity!(MetricType);
inventory_entity!(Resource);
inventory_entity!(Metric);
inventory_entity!(OperationType);
inventory_entity!(DataEntity);
inventory_entity!(MetadataPack);
inventory_entity!(Relationship);

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> CanonicalPath {
        s.parse().unwrap()
    }

    #[test]
    fn test_downcast() {
        let entity: Entity = Environment::new(path("/t;a/e;prod")).into();
        assert_eq!(entity.entity_type(), EntityType::Environment);
        assert_eq!(entity.id(), "prod");
        assert!(entity.clone().downcast::<Tenant>().is_none());
        let env = entity.downcast::<Environment>().unwrap();
        assert_eq!(env.path.to_string(), "/t;a/e;prod");
    }

    #[test]
    fn test_data_entity_role() {
        let d = DataEntity {
            path: path("/t;a/rt;x/d;configuration"),
            name: None,
            properties: Properties::new(),
            value: serde_json::json!({"port": 8080}),
        };
        assert_eq!(d.role(), "configuration");
    }

    #[test]
    fn test_entity_serde_is_tagged() {
        let entity: Entity = Tenant::new(path("/t;acme")).into();
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["kind"], "Tenant");
        assert_eq!(json["path"], "/t;acme");
        let back: Entity = serde_json::from_value(json).unwrap();
        assert_eq!(back, entity);
    }
}
