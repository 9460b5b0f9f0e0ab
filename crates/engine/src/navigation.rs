//! Kind-specific navigation from single-entity positions

use trellis_core::{
    DataEntity, Environment, Feed, InventoryBackend, MetadataPack, Metric, MetricType,
    OperationType, Resource, ResourceType, Tenant, WellKnown,
};

use crate::positions::{Associated, Multiple, Single};

impl<B: InventoryBackend> Single<B, Tenant> {
    /// Environments of the tenant
    pub fn environments(&self) -> Multiple<B, Environment> {
        self.contained()
    }

    /// Feeds registered under the tenant
    pub fn feeds(&self) -> Multiple<B, Feed> {
        self.contained()
    }

    /// Resource types of the tenant
    pub fn resource_types(&self) -> Multiple<B, ResourceType> {
        self.contained()
    }

    /// Metric types of the tenant
    pub fn metric_types(&self) -> Multiple<B, MetricType> {
        self.contained()
    }

    /// Metadata packs of the tenant
    pub fn metadata_packs(&self) -> Multiple<B, MetadataPack> {
        self.contained()
    }
}

impl<B: InventoryBackend> Single<B, Environment> {
    /// Resources directly in the environment
    pub fn resources(&self) -> Multiple<B, Resource> {
        self.contained()
    }

    /// Metrics directly in the environment
    pub fn metrics(&self) -> Multiple<B, Metric> {
        self.contained()
    }

    /// Feeds incorporated by the environment
    pub fn feeds(&self) -> Associated<B, Feed> {
        self.associated(WellKnown::Incorporates)
    }
}

impl<B: InventoryBackend> Single<B, Feed> {
    /// Resources reported by the feed
    pub fn resources(&self) -> Multiple<B, Resource> {
        self.contained()
    }

    /// Metrics reported by the feed
    pub fn metrics(&self) -> Multiple<B, Metric> {
        self.contained()
    }

    /// Resource types declared by the feed
    pub fn resource_types(&self) -> Multiple<B, ResourceType> {
        self.contained()
    }

    /// Metric types declared by the feed
    pub fn metric_types(&self) -> Multiple<B, MetricType> {
        self.contained()
    }
}

impl<B: InventoryBackend> Single<B, Resource> {
    /// Resources contained by this one
    pub fn children(&self) -> Multiple<B, Resource> {
        self.contained()
    }

    /// Resources this one is a parent of, contained or not
    pub fn all_children(&self) -> Associated<B, Resource> {
        self.associated(WellKnown::IsParentOf)
    }

    /// Metrics contained by the resource
    pub fn metrics(&self) -> Multiple<B, Metric> {
        self.contained()
    }

    /// Metrics incorporated by the resource
    pub fn incorporated_metrics(&self) -> Associated<B, Metric> {
        self.associated(WellKnown::Incorporates)
    }

    /// Data entities attached to the resource
    pub fn data(&self) -> Multiple<B, DataEntity> {
        self.contained()
    }
}

impl<B: InventoryBackend> Single<B, ResourceType> {
    /// Operation types of the resource type
    pub fn operation_types(&self) -> Multiple<B, OperationType> {
        self.contained()
    }

    /// Data entities attached to the resource type
    pub fn data(&self) -> Multiple<B, DataEntity> {
        self.contained()
    }

    /// Resources of this type
    pub fn resources(&self) -> Multiple<B, Resource> {
        self.related(WellKnown::Defines)
    }

    /// Metric types incorporated by the resource type
    pub fn metric_types(&self) -> Associated<B, MetricType> {
        self.associated(WellKnown::Incorporates)
    }
}

impl<B: InventoryBackend> Single<B, MetricType> {
    /// Metrics of this type
    pub fn metrics(&self) -> Multiple<B, Metric> {
        self.related(WellKnown::Defines)
    }
}

impl<B: InventoryBackend> Single<B, OperationType> {
    /// Data entities attached to the operation type
    pub fn data(&self) -> Multiple<B, DataEntity> {
        self.contained()
    }
}

impl<B: InventoryBackend> Single<B, MetadataPack> {
    /// Resource types in the pack
    pub fn resource_types(&self) -> Multiple<B, ResourceType> {
        self.related(WellKnown::Incorporates)
    }

    /// Metric types in the pack
    pub fn metric_types(&self) -> Multiple<B, MetricType> {
        self.related(WellKnown::Incorporates)
    }
}
