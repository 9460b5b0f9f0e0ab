//! In-place entity updates

use super::{Entity, EntityType, MetricUnit, Properties};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Changes to apply to an existing entity; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Update {
    /// New display name
    pub name: Option<String>,
    /// Replacement property map
    pub properties: Option<Properties>,
    /// New unit (metric types)
    pub unit: Option<MetricUnit>,
    /// New collection interval in seconds (metrics and metric types)
    pub collection_interval: Option<u64>,
    /// New value (data entities)
    pub value: Option<serde_json::Value>,
}

impl Update {
    /// Empty update
    pub fn new() -> Self {
        Update::default()
    }

    /// Set the name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace all properties
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = Some(properties);
        self
    }

    /// Set one property on top of the current replacement map
    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties
            .get_or_insert_with(Properties::new)
            .insert(key.into(), value);
        self
    }

    /// Set the unit
    pub fn with_unit(mut self, unit: MetricUnit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Set the collection interval
    pub fn with_collection_interval(mut self, seconds: u64) -> Self {
        self.collection_interval = Some(seconds);
        self
    }

    /// Set the data value
    pub fn with_value(mut self, value: serde_json::Value) -> Self {
        self.value = Some(value);
        self
    }

    /// Reject fields that do not apply to `entity_type`
    pub fn validate_for(&self, entity_type: EntityType) -> Result<()> {
        let reject = |field: &str| {
            Err(Error::illegal(format!(
                "'{}' cannot be updated on a {}",
                field, entity_type
            )))
        };
        if self.name.is_some() && entity_type == EntityType::Relationship {
            return reject("name");
        }
        if self.unit.is_some() && entity_type != EntityType::MetricType {
            return reject("unit");
        }
        if self.collection_interval.is_some()
            && !matches!(entity_type, EntityType::MetricType | EntityType::Metric)
        {
            return reject("collection_interval");
        }
        if self.value.is_some() && entity_type != EntityType::DataEntity {
            return reject("value");
        }
        Ok(())
    }

    /// Apply to `entity` after validating
    pub fn apply(&self, entity: &mut Entity) -> Result<()> {
        self.validate_for(entity.entity_type())?;
        if let Some(properties) = &self.properties {
            *entity.properties_mut() = properties.clone();
        }
        match entity {
            Entity::MetricType(mt) => {
                if let Some(unit) = self.unit {
                    mt.unit = unit;
                }
                if let Some(interval) = self.collection_interval {
                    mt.collection_interval = Some(interval);
                }
            }
            Entity::Metric(m) => {
                if let Some(interval) = self.collection_interval {
                    m.collection_interval = Some(interval);
                }
            }
            Entity::DataEntity(d) => {
                if let Some(value) = &self.value {
                    d.value = value.clone();
                }
            }
            _ => {}
        }
        if let Some(name) = &self.name {
            set_name(entity, name.clone());
        }
        Ok(())
    }
}

fn set_name(entity: &mut Entity, name: String) {
    let slot = match entity {
        Entity::Tenant(e) => &mut e.name,
        Entity::Environment(e) => &mut e.name,
        Entity::Feed(e) => &mut e.name,
        Entity::ResourceType(e) => &mut e.name,
        Entity::MetricType(e) => &mut e.name,
        Entity::Resource(e) => &mut e.name,
        Entity::Metric(e) => &mut e.name,
        Entity::OperationType(e) => &mut e.name,
        Entity::DataEntity(e) => &mut e.name,
        Entity::MetadataPack(e) => &mut e.name,
        // rejected by validate_for
        Entity::Relationship(_) => return,
    };
    *slot = Some(name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Environment, MetricDataType, MetricType};

    #[test]
    fn test_apply_name_and_properties() {
        let mut entity: Entity = Environment::new("/t;a/e;b".parse().unwrap()).into();
        Update::new()
            .with_name("Staging")
            .with_property("region", serde_json::json!("eu"))
            .apply(&mut entity)
            .unwrap();
        assert_eq!(entity.name(), Some("Staging"));
        assert_eq!(entity.properties()["region"], "eu");
    }

    #[test]
    fn test_inapplicable_fields_are_illegal() {
        let update = Update::new().with_unit(MetricUnit::Bytes);
        assert!(matches!(
            update.validate_for(EntityType::Resource),
            Err(Error::IllegalOperation { .. })
        ));
        assert!(update.validate_for(EntityType::MetricType).is_ok());
        assert!(Update::new()
            .with_name("x")
            .validate_for(EntityType::Relationship)
            .is_err());
    }

    #[test]
    fn test_apply_metric_type_fields() {
        let mut entity: Entity = MetricType {
            path: "/t;a/mt;cpu".parse().unwrap(),
            name: None,
            properties: Properties::new(),
            unit: MetricUnit::None,
            data_type: MetricDataType::Gauge,
            collection_interval: None,
        }
        .into();
        Update::new()
            .with_unit(MetricUnit::Percentage)
            .with_collection_interval(60)
            .apply(&mut entity)
            .unwrap();
        match entity {
            Entity::MetricType(mt) => {
                assert_eq!(mt.unit, MetricUnit::Percentage);
                assert_eq!(mt.collection_interval, Some(60));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
