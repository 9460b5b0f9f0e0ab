//! Traversal positions
//!
//! A [`TraversalContext`] describes one position of a traversal expression:
//! the query locating the parent position (`source_path`), the query
//! narrowing it down to the entities of interest (`select_candidates`) and
//! the kind of those entities. Contexts are immutable; every navigation step
//! returns a new one.

use std::fmt;
use std::sync::Arc;
use trellis_core::{
    Direction, EntityType, Filter, InventoryBackend, Query, SymmetricExtender,
};

use crate::config::Configuration;
use crate::notify::Observers;

/// State shared by every context of one inventory
pub(crate) struct Shared<B> {
    pub(crate) backend: B,
    pub(crate) config: Configuration,
    pub(crate) observers: Observers,
}

/// One position of a traversal
pub struct TraversalContext<B: InventoryBackend> {
    shared: Arc<Shared<B>>,
    source_path: Query,
    select_candidates: Query,
    entity_type: EntityType,
    previous: Option<Arc<TraversalContext<B>>>,
}

impl<B: InventoryBackend> Clone for TraversalContext<B> {
    fn clone(&self) -> Self {
        TraversalContext {
            shared: Arc::clone(&self.shared),
            source_path: self.source_path.clone(),
            select_candidates: self.select_candidates.clone(),
            entity_type: self.entity_type,
            previous: self.previous.clone(),
        }
    }
}

impl<B: InventoryBackend> fmt::Debug for TraversalContext<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraversalContext")
            .field("source_path", &self.source_path.to_string())
            .field("select_candidates", &self.select_candidates.to_string())
            .field("entity_type", &self.entity_type)
            .field("has_previous", &self.previous.is_some())
            .finish()
    }
}

impl<B: InventoryBackend> TraversalContext<B> {
    /// Top-level position selecting entities of `entity_type` matching `select`
    pub(crate) fn root(shared: Arc<Shared<B>>, entity_type: EntityType, select: Query) -> Self {
        TraversalContext {
            shared,
            source_path: Query::empty(),
            select_candidates: select,
            entity_type,
            previous: None,
        }
    }

    pub(crate) fn backend(&self) -> &B {
        &self.shared.backend
    }

    pub(crate) fn config(&self) -> &Configuration {
        &self.shared.config
    }

    pub(crate) fn observers(&self) -> &Observers {
        &self.shared.observers
    }

    pub(crate) fn shared(&self) -> &Arc<Shared<B>> {
        &self.shared
    }

    /// Query locating the parent position
    pub fn source_path(&self) -> &Query {
        &self.source_path
    }

    /// Query narrowing the parent position down to this one
    pub fn select_candidates(&self) -> &Query {
        &self.select_candidates
    }

    /// Kind of the selected entities
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// The position this one was reached from
    pub fn previous(&self) -> Option<&TraversalContext<B>> {
        self.previous.as_deref()
    }

    /// The complete query selecting this position's entities
    pub fn select(&self) -> Query {
        self.source_path
            .extend()
            .merge(&self.select_candidates, Clone::clone)
            .get()
    }

    /// Same position, further narrowed by `filters`
    pub fn narrowed<I>(&self, filters: I) -> Self
    where
        I: IntoIterator<Item = Filter>,
    {
        let mut next = self.clone();
        next.select_candidates = SymmetricExtender::new(self.select_candidates.clone())
            .filter()
            .with(filters)
            .get();
        next
    }

    /// Fold the candidates into the source path, selecting all of them
    pub fn proceed(&self) -> Self {
        TraversalContext {
            shared: Arc::clone(&self.shared),
            source_path: self.select(),
            select_candidates: Query::empty(),
            entity_type: self.entity_type,
            previous: Some(Arc::new(self.clone())),
        }
    }

    /// Follow `relationship` in `direction` to entities of `entity_type`
    pub fn proceed_to(
        &self,
        relationship: impl AsRef<str>,
        direction: Direction,
        entity_type: EntityType,
    ) -> Self {
        let hop = match direction {
            Direction::Incoming => Filter::by_incoming(relationship),
            _ => Filter::by(relationship),
        };
        TraversalContext {
            shared: Arc::clone(&self.shared),
            source_path: self.select().extend().path().with([hop]).get(),
            select_candidates: Query::filter()
                .with([Filter::entity_type(entity_type)])
                .get(),
            entity_type,
            previous: Some(Arc::new(self.clone())),
        }
    }

    /// Move from the selected entities to their relationships in `direction`
    pub fn proceed_to_relationships(&self, direction: Direction) -> Self {
        TraversalContext {
            shared: Arc::clone(&self.shared),
            source_path: self
                .select()
                .extend()
                .path()
                .with([Filter::to_edges(direction)])
                .get(),
            select_candidates: Query::empty(),
            entity_type: EntityType::Relationship,
            previous: Some(Arc::new(self.clone())),
        }
    }

    /// Same candidates, located through `source_path` instead
    pub fn replace_path(&self, source_path: Query) -> Self {
        let mut next = self.clone();
        next.source_path = source_path;
        next
    }
}
