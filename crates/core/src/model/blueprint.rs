//! Blueprints: the data needed to create an entity

use super::{
    DataEntity, Entity, EntityType, Environment, Feed, MetadataPack, Metric, MetricDataType,
    MetricType, MetricUnit, OperationType, Properties, Resource, ResourceType, Tenant,
};
use crate::error::{Error, Result};
use crate::path::{CanonicalPath, Path};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind-specific part of a [`Blueprint`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum BlueprintKind {
    /// Tenant
    Tenant,
    /// Environment
    Environment,
    /// Feed
    Feed,
    /// Resource type
    ResourceType,
    /// Metric type
    MetricType {
        /// Unit of the values
        unit: MetricUnit,
        /// Interpretation of the values
        data_type: MetricDataType,
        /// Default collection interval in seconds
        collection_interval: Option<u64>,
    },
    /// Resource
    Resource {
        /// Defining resource type; relative paths resolve against the parent
        resource_type: Path,
    },
    /// Metric
    Metric {
        /// Defining metric type; relative paths resolve against the parent
        metric_type: Path,
        /// Collection interval in seconds
        collection_interval: Option<u64>,
    },
    /// Operation type
    OperationType,
    /// Data entity
    DataEntity {
        /// The data
        value: serde_json::Value,
    },
    /// Metadata pack
    MetadataPack {
        /// Incorporated resource and metric types
        members: Vec<Path>,
    },
}

/// Everything needed to create one entity
///
/// ```
/// use trellis_core::model::Blueprint;
///
/// let bp = Blueprint::resource("web-1", "../rt;linux".parse().unwrap())
///     .with_name("Web server")
///     .with_property("rack", serde_json::json!(4));
/// assert_eq!(bp.id, "web-1");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    /// Proposed id, unique among siblings of the same kind
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Free-form properties
    pub properties: Properties,
    /// Extra relationships from the new entity, by name
    pub outgoing: BTreeMap<String, Vec<Path>>,
    /// Extra relationships to the new entity, by name
    pub incoming: BTreeMap<String, Vec<Path>>,
    /// Kind-specific data
    pub kind: BlueprintKind,
}

impl Blueprint {
    fn of(id: impl Into<String>, kind: BlueprintKind) -> Self {
        Blueprint {
            id: id.into(),
            name: None,
            properties: Properties::new(),
            outgoing: BTreeMap::new(),
            incoming: BTreeMap::new(),
            kind,
        }
    }

    /// Tenant blueprint
    pub fn tenant(id: impl Into<String>) -> Self {
        Blueprint::of(id, BlueprintKind::Tenant)
    }

    /// Environment blueprint
    pub fn environment(id: impl Into<String>) -> Self {
        Blueprint::of(id, BlueprintKind::Environment)
    }

    /// Feed blueprint; the id is a proposal subject to the feed id strategy
    pub fn feed(id: impl Into<String>) -> Self {
        Blueprint::of(id, BlueprintKind::Feed)
    }

    /// Resource type blueprint
    pub fn resource_type(id: impl Into<String>) -> Self {
        Blueprint::of(id, BlueprintKind::ResourceType)
    }

    /// Metric type blueprint
    pub fn metric_type(id: impl Into<String>, unit: MetricUnit, data_type: MetricDataType) -> Self {
        Blueprint::of(
            id,
            BlueprintKind::MetricType {
                unit,
                data_type,
                collection_interval: None,
            },
        )
    }

    /// Resource blueprint
    pub fn resource(id: impl Into<String>, resource_type: Path) -> Self {
        Blueprint::of(id, BlueprintKind::Resource { resource_type })
    }

    /// Metric blueprint
    pub fn metric(id: impl Into<String>, metric_type: Path) -> Self {
        Blueprint::of(
            id,
            BlueprintKind::Metric {
                metric_type,
                collection_interval: None,
            },
        )
    }

    /// Operation type blueprint
    pub fn operation_type(id: impl Into<String>) -> Self {
        Blueprint::of(id, BlueprintKind::OperationType)
    }

    /// Data entity blueprint; the role becomes the id
    pub fn data(role: impl Into<String>, value: serde_json::Value) -> Self {
        Blueprint::of(role, BlueprintKind::DataEntity { value })
    }

    /// Metadata pack blueprint
    pub fn metadata_pack(id: impl Into<String>, members: Vec<Path>) -> Self {
        Blueprint::of(id, BlueprintKind::MetadataPack { members })
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a property
    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Declare an extra relationship from the new entity to `target`
    pub fn with_outgoing(mut self, name: impl Into<String>, target: Path) -> Self {
        self.outgoing.entry(name.into()).or_default().push(target);
        self
    }

    /// Declare an extra relationship from `source` to the new entity
    pub fn with_incoming(mut self, name: impl Into<String>, source: Path) -> Self {
        self.incoming.entry(name.into()).or_default().push(source);
        self
    }

    /// Set the collection interval of a metric or metric type
    ///
    /// Ignored for other kinds.
    pub fn with_collection_interval(mut self, seconds: u64) -> Self {
        match &mut self.kind {
            BlueprintKind::MetricType {
                collection_interval,
                ..
            }
            | BlueprintKind::Metric {
                collection_interval,
                ..
            } => *collection_interval = Some(seconds),
            _ => {}
        }
        self
    }

    /// Kind of the entity this blueprint creates
    pub fn entity_type(&self) -> EntityType {
        match self.kind {
            BlueprintKind::Tenant => EntityType::Tenant,
            BlueprintKind::Environment => EntityType::Environment,
            BlueprintKind::Feed => EntityType::Feed,
            BlueprintKind::ResourceType => EntityType::ResourceType,
            BlueprintKind::MetricType { .. } => EntityType::MetricType,
            BlueprintKind::Resource { .. } => EntityType::Resource,
            BlueprintKind::Metric { .. } => EntityType::Metric,
            BlueprintKind::OperationType => EntityType::OperationType,
            BlueprintKind::DataEntity { .. } => EntityType::DataEntity,
            BlueprintKind::MetadataPack { .. } => EntityType::MetadataPack,
        }
    }

    /// The entity this blueprint describes once placed at `path`
    ///
    /// Relative type and member references resolve against the parent of
    /// `path`.
    pub fn to_entity(&self, path: &CanonicalPath) -> Result<Entity> {
        let path_type = path.entity_type();
        if path_type != Some(self.entity_type()) {
            return Err(Error::invalid_path(format!(
                "'{}' does not address a {}",
                path,
                self.entity_type()
            )));
        }
        let path = path.clone();
        let name = self.name.clone();
        let properties = self.properties.clone();
        let entity = match &self.kind {
            BlueprintKind::Tenant => Entity::Tenant(Tenant {
                path,
                name,
                properties,
            }),
            BlueprintKind::Environment => Entity::Environment(Environment {
                path,
                name,
                properties,
            }),
            BlueprintKind::Feed => Entity::Feed(Feed {
                path,
                name,
                properties,
            }),
            BlueprintKind::ResourceType => Entity::ResourceType(ResourceType {
                path,
                name,
                properties,
            }),
            BlueprintKind::MetricType {
                unit,
                data_type,
                collection_interval,
            } => Entity::MetricType(MetricType {
                path,
                name,
                properties,
                unit: *unit,
                data_type: *data_type,
                collection_interval: *collection_interval,
            }),
            BlueprintKind::Resource { resource_type } => {
                let resource_type = resource_type.resolve_for(&path)?;
                Entity::Resource(Resource {
                    path,
                    name,
                    properties,
                    resource_type,
                })
            }
            BlueprintKind::Metric {
                metric_type,
                collection_interval,
            } => {
                let metric_type = metric_type.resolve_for(&path)?;
                Entity::Metric(Metric {
                    path,
                    name,
                    properties,
                    metric_type,
                    collection_interval: *collection_interval,
                })
            }
            BlueprintKind::OperationType => Entity::OperationType(OperationType {
                path,
                name,
                properties,
            }),
            BlueprintKind::DataEntity { value } => Entity::DataEntity(DataEntity {
                path,
                name,
                properties,
                value: value.clone(),
            }),
            BlueprintKind::MetadataPack { members } => {
                let members = members
                    .iter()
                    .map(|m| m.resolve_for(&path))
                    .collect::<Result<Vec<_>>>()?;
                Entity::MetadataPack(MetadataPack {
                    path,
                    name,
                    properties,
                    members,
                })
            }
        };
        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_follows_kind() {
        assert_eq!(Blueprint::tenant("t").entity_type(), EntityType::Tenant);
        let metric = Blueprint::metric("m", "/t;a/mt;cpu".parse().unwrap());
        assert_eq!(metric.entity_type(), EntityType::Metric);
    }

    #[test]
    fn test_builders_accumulate() {
        let bp = Blueprint::environment("prod")
            .with_name("Production")
            .with_outgoing("incorporates", "/t;a/f;agent".parse().unwrap())
            .with_outgoing("incorporates", "/t;a/f;other".parse().unwrap());
        assert_eq!(bp.name.as_deref(), Some("Production"));
        assert_eq!(bp.outgoing["incorporates"].len(), 2);
        assert!(bp.incoming.is_empty());
    }

    #[test]
    fn test_to_entity_resolves_against_parent() {
        let bp = Blueprint::resource("r1", "../rt;linux".parse().unwrap()).with_name("Host");
        let entity = bp.to_entity(&"/t;a/e;prod/r;r1".parse().unwrap()).unwrap();
        match entity {
            Entity::Resource(r) => {
                assert_eq!(r.resource_type.to_string(), "/t;a/rt;linux");
                assert_eq!(r.name.as_deref(), Some("Host"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_to_entity_checks_path_kind() {
        let bp = Blueprint::environment("prod");
        assert!(bp.to_entity(&"/t;a/f;prod".parse().unwrap()).is_err());
        assert!(Blueprint::tenant("t")
            .to_entity(&"/t;t".parse().unwrap())
            .is_ok());
    }

    #[test]
    fn test_collection_interval_only_for_metrics() {
        let bp = Blueprint::metric("m", "../mt;x".parse().unwrap()).with_collection_interval(30);
        assert!(matches!(
            bp.kind,
            BlueprintKind::Metric {
                collection_interval: Some(30),
                ..
            }
        ));
        let other = Blueprint::feed("f").with_collection_interval(30);
        assert_eq!(other.kind, BlueprintKind::Feed);
    }
}
