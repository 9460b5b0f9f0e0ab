//! Inventory: entry point of the fluent API
//!
//! ```
//! use trellis_core::{Blueprint, Path};
//! use trellis_engine::{Creatable, Fetchable, Inventory};
//! use trellis_storage::MemoryBackend;
//!
//! let inventory = Inventory::new(MemoryBackend::new());
//! let tenant = inventory.tenants().create(Blueprint::tenant("acme")).unwrap();
//! tenant.environments().create(Blueprint::environment("prod")).unwrap();
//! tenant.resource_types().create(Blueprint::resource_type("host")).unwrap();
//!
//! let prod = tenant.environments().get("prod");
//! prod.resources()
//!     .create(Blueprint::resource("web-1", "../rt;host".parse::<Path>().unwrap()))
//!     .unwrap();
//! assert_eq!(prod.resources().entity().unwrap().resource_type.to_string(), "/t;acme/rt;host");
//! ```

use std::sync::Arc;
use tracing::debug;
use trellis_core::{
    CanonicalPath, Direction, EntityType, Error, Filter, InventoryBackend, InventoryEntity, Query,
    Result, Tenant, WellKnown,
};

use crate::config::Configuration;
use crate::context::{Shared, TraversalContext};
use crate::notify::{Interest, Notification, Observers, Subscription};
use crate::positions::{Multiple, Relationships, Single};

/// Handle to one inventory over backend `B`
///
/// Cloning is cheap; clones share the backend, configuration and observers.
/// A handle is meant to be driven by one thread at a time.
pub struct Inventory<B: InventoryBackend> {
    shared: Arc<Shared<B>>,
}

impl<B: InventoryBackend> Clone for Inventory<B> {
    fn clone(&self) -> Self {
        Inventory {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<B: InventoryBackend> std::fmt::Debug for Inventory<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inventory")
            .field("config", &self.shared.config)
            .field("observers", &self.shared.observers)
            .finish()
    }
}

fn selecting(entity_type: EntityType) -> Query {
    Query::filter()
        .with([Filter::entity_type(entity_type)])
        .get()
}

impl<B: InventoryBackend> Inventory<B> {
    /// Inventory over `backend` with the default configuration
    pub fn new(backend: B) -> Self {
        Self::with_configuration(backend, Configuration::default())
    }

    /// Inventory over `backend` configured by `config`
    pub fn with_configuration(backend: B, config: Configuration) -> Self {
        debug!(target: "trellis::inventory", ?config, "inventory initialized");
        Inventory {
            shared: Arc::new(Shared {
                backend,
                config,
                observers: Observers::new(),
            }),
        }
    }

    /// The backend
    pub fn backend(&self) -> &B {
        &self.shared.backend
    }

    /// The configuration
    pub fn configuration(&self) -> &Configuration {
        &self.shared.config
    }

    /// The subscriber registry
    pub fn observers(&self) -> &Observers {
        &self.shared.observers
    }

    /// Call `callback` after every committed mutation matching `interest`
    pub fn observable<F>(&self, interest: Interest, callback: F) -> Subscription
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.shared.observers.subscribe(interest, callback)
    }

    /// All tenants
    pub fn tenants(&self) -> Multiple<B, Tenant> {
        Multiple::new(TraversalContext::root(
            Arc::clone(&self.shared),
            EntityType::Tenant,
            selecting(EntityType::Tenant),
        ))
    }

    /// All relationships
    pub fn relationships(&self) -> Relationships<B> {
        Relationships::new(
            TraversalContext::root(
                Arc::clone(&self.shared),
                EntityType::Relationship,
                selecting(EntityType::Relationship),
            ),
            None,
        )
    }

    /// The entity at `path`
    ///
    /// The returned position supports everything a position reached by
    /// navigation does, including updates and deletes.
    ///
    /// # Errors
    ///
    /// `InvalidPath` if `path` does not address an `E`.
    pub fn inspect<E: InventoryEntity>(&self, path: &CanonicalPath) -> Result<Single<B, E>> {
        if path.entity_type() != Some(E::ENTITY_TYPE) {
            return Err(Error::invalid_path(format!(
                "'{}' does not address a {}",
                path,
                E::ENTITY_TYPE
            )));
        }
        let context = match path.parent().and_then(|p| p.entity_type().map(|t| (p, t))) {
            Some((parent, parent_type)) if E::ENTITY_TYPE != EntityType::Relationship => {
                TraversalContext::root(
                    Arc::clone(&self.shared),
                    parent_type,
                    selecting(parent_type)
                        .extend()
                        .filter()
                        .with([Filter::path(parent)])
                        .get(),
                )
                .proceed_to(WellKnown::Contains, Direction::Outgoing, E::ENTITY_TYPE)
            }
            _ => TraversalContext::root(
                Arc::clone(&self.shared),
                E::ENTITY_TYPE,
                selecting(E::ENTITY_TYPE),
            ),
        };
        Ok(Single::new(context.narrowed([Filter::path(path.clone())])))
    }
}
