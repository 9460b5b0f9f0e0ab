//! Typed positions of the fluent API
//!
//! A position wraps a [`TraversalContext`] and fixes the entity kind it
//! yields. Capabilities are traits so that generic code can ask for exactly
//! what it needs:
//!
//! | Position | Fetchable | Creatable | Updatable | Deletable | Associable |
//! |----------|-----------|-----------|-----------|-----------|------------|
//! | [`Single`] | yes | - | yes | yes | - |
//! | [`Multiple`] | yes | yes | - | - | - |
//! | [`Associated`] | yes | - | - | - | yes |
//! | [`Relationships`] | yes | - | - | - | - |

use std::fmt;
use std::marker::PhantomData;
use trellis_core::{
    Blueprint, CanonicalPath, Direction, Error, Filter, InventoryBackend, InventoryEntity, Page,
    Pager, Properties, Relationship, Result, Update, WellKnown,
};

use crate::associator;
use crate::context::TraversalContext;
use crate::fetcher;
use crate::mutator;

// ============================================================================
// Capabilities
// ============================================================================

/// Positions that can be read
pub trait Fetchable {
    /// Kind of the fetched entities
    type Entity: InventoryEntity;

    /// The only (or first) entity at this position
    ///
    /// # Errors
    ///
    /// `EntityNotFound` if there is none.
    fn entity(&self) -> Result<Self::Entity>;

    /// All entities at this position, paged
    fn entities(&self, pager: &Pager) -> Result<Page<Self::Entity>>;

    /// True if at least one entity is at this position
    fn exists(&self) -> Result<bool> {
        match self.entity() {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Positions new entities can be created at
pub trait Creatable {
    /// Position of a created entity
    type Created;

    /// Create the entity described by `blueprint`
    fn create(&self, blueprint: Blueprint) -> Result<Self::Created>;
}

/// Positions whose entity can be updated
pub trait Updatable {
    /// Apply `update`
    fn update(&self, update: Update) -> Result<()>;
}

/// Positions whose entity can be deleted
pub trait Deletable {
    /// Delete, cascading over `contains`
    fn delete(&self) -> Result<()>;
}

/// Positions that relate their origin to existing entities
pub trait Associable {
    /// Relate the origin to the entity at `path`
    fn associate(&self, path: &CanonicalPath) -> Result<Relationship>;

    /// Remove the relationship to the entity at `path`
    fn disassociate(&self, path: &CanonicalPath) -> Result<Relationship>;

    /// The relationship to the entity at `path`
    fn association_with(&self, path: &CanonicalPath) -> Result<Relationship>;
}

// ============================================================================
// Single
// ============================================================================

/// Position of one entity
pub struct Single<B: InventoryBackend, E> {
    context: TraversalContext<B>,
    _entity: PhantomData<fn() -> E>,
}

impl<B: InventoryBackend, E> Clone for Single<B, E> {
    fn clone(&self) -> Self {
        Single {
            context: self.context.clone(),
            _entity: PhantomData,
        }
    }
}

impl<B: InventoryBackend, E> fmt::Debug for Single<B, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Single").field(&self.context).finish()
    }
}

impl<B: InventoryBackend, E: InventoryEntity> Single<B, E> {
    pub(crate) fn new(context: TraversalContext<B>) -> Self {
        Single {
            context,
            _entity: PhantomData,
        }
    }

    /// The underlying traversal context
    pub fn context(&self) -> &TraversalContext<B> {
        &self.context
    }

    /// Relationships of this entity in `direction`
    pub fn relationships(&self, direction: Direction) -> Relationships<B> {
        Relationships::new(
            self.context.proceed_to_relationships(direction),
            Some((self.context.clone(), direction)),
        )
    }

    pub(crate) fn contained<C: InventoryEntity>(&self) -> Multiple<B, C> {
        Multiple::new(self.context.proceed_to(
            WellKnown::Contains,
            Direction::Outgoing,
            C::ENTITY_TYPE,
        ))
    }

    pub(crate) fn related<C: InventoryEntity>(
        &self,
        relationship: WellKnown,
    ) -> Multiple<B, C> {
        Multiple::new(
            self.context
                .proceed_to(relationship, Direction::Outgoing, C::ENTITY_TYPE),
        )
    }

    pub(crate) fn associated<C: InventoryEntity>(
        &self,
        relationship: WellKnown,
    ) -> Associated<B, C> {
        Associated::new(self.context.clone(), relationship.name())
    }
}

impl<B: InventoryBackend, E: InventoryEntity> Fetchable for Single<B, E> {
    type Entity = E;

    fn entity(&self) -> Result<E> {
        fetcher::typed_entity(&self.context)
    }

    fn entities(&self, pager: &Pager) -> Result<Page<E>> {
        fetcher::typed_entities(&self.context, pager)
    }
}

impl<B: InventoryBackend, E: InventoryEntity> Updatable for Single<B, E> {
    fn update(&self, update: Update) -> Result<()> {
        mutator::update(&self.context, &update).map(|_| ())
    }
}

impl<B: InventoryBackend, E: InventoryEntity> Deletable for Single<B, E> {
    fn delete(&self) -> Result<()> {
        mutator::delete(&self.context)
    }
}

// ============================================================================
// Multiple
// ============================================================================

/// Position of a collection of entities of one kind
pub struct Multiple<B: InventoryBackend, E> {
    context: TraversalContext<B>,
    _entity: PhantomData<fn() -> E>,
}

impl<B: InventoryBackend, E> Clone for Multiple<B, E> {
    fn clone(&self) -> Self {
        Multiple {
            context: self.context.clone(),
            _entity: PhantomData,
        }
    }
}

impl<B: InventoryBackend, E> fmt::Debug for Multiple<B, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Multiple").field(&self.context).finish()
    }
}

impl<B: InventoryBackend, E: InventoryEntity> Multiple<B, E> {
    pub(crate) fn new(context: TraversalContext<B>) -> Self {
        Multiple {
            context,
            _entity: PhantomData,
        }
    }

    /// The underlying traversal context
    pub fn context(&self) -> &TraversalContext<B> {
        &self.context
    }

    /// The entity with `id` in this collection
    pub fn get(&self, id: impl Into<String>) -> Single<B, E> {
        Single::new(self.context.narrowed([Filter::id(id)]))
    }

    /// Entities of this collection whose `property` equals `value`
    pub fn select(&self, property: impl Into<String>, value: serde_json::Value) -> Self {
        Multiple::new(self.context.narrowed([Filter::property(property, value)]))
    }

    /// Entities of this collection matching `filter`
    pub fn filtered(&self, filter: Filter) -> Self {
        Multiple::new(self.context.narrowed([filter]))
    }

    /// Update the entity with `id`
    pub fn update(&self, id: impl Into<String>, update: Update) -> Result<()> {
        self.get(id).update(update)
    }

    /// Delete the entity with `id` and everything it contains
    pub fn delete(&self, id: impl Into<String>) -> Result<()> {
        self.get(id).delete()
    }
}

impl<B: InventoryBackend, E: InventoryEntity> Fetchable for Multiple<B, E> {
    type Entity = E;

    fn entity(&self) -> Result<E> {
        fetcher::typed_entity(&self.context)
    }

    fn entities(&self, pager: &Pager) -> Result<Page<E>> {
        fetcher::typed_entities(&self.context, pager)
    }
}

impl<B: InventoryBackend, E: InventoryEntity> Creatable for Multiple<B, E> {
    type Created = Single<B, E>;

    fn create(&self, blueprint: Blueprint) -> Result<Single<B, E>> {
        let created = mutator::create(&self.context, &blueprint)?;
        Ok(self.get(created.id()))
    }
}

// ============================================================================
// Associated
// ============================================================================

/// Entities related to one origin entity by a client-managed relationship
pub struct Associated<B: InventoryBackend, E> {
    origin: TraversalContext<B>,
    relationship: &'static str,
    related: TraversalContext<B>,
    _entity: PhantomData<fn() -> E>,
}

impl<B: InventoryBackend, E> fmt::Debug for Associated<B, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Associated")
            .field("relationship", &self.relationship)
            .field("related", &self.related)
            .finish()
    }
}

impl<B: InventoryBackend, E: InventoryEntity> Associated<B, E> {
    pub(crate) fn new(origin: TraversalContext<B>, relationship: &'static str) -> Self {
        let related = origin.proceed_to(relationship, Direction::Outgoing, E::ENTITY_TYPE);
        Associated {
            origin,
            relationship,
            related,
            _entity: PhantomData,
        }
    }

    /// Name of the relationship
    pub fn relationship(&self) -> &str {
        self.relationship
    }

    /// The related entity with `id`
    pub fn get(&self, id: impl Into<String>) -> Single<B, E> {
        Single::new(self.related.narrowed([Filter::id(id)]))
    }
}

impl<B: InventoryBackend, E: InventoryEntity> Fetchable for Associated<B, E> {
    type Entity = E;

    fn entity(&self) -> Result<E> {
        fetcher::typed_entity(&self.related)
    }

    fn entities(&self, pager: &Pager) -> Result<Page<E>> {
        fetcher::typed_entities(&self.related, pager)
    }
}

impl<B: InventoryBackend, E: InventoryEntity> Associable for Associated<B, E> {
    fn associate(&self, path: &CanonicalPath) -> Result<Relationship> {
        associator::associate(&self.origin, self.relationship, E::ENTITY_TYPE, path)
    }

    fn disassociate(&self, path: &CanonicalPath) -> Result<Relationship> {
        associator::disassociate(&self.origin, self.relationship, E::ENTITY_TYPE, path)
    }

    fn association_with(&self, path: &CanonicalPath) -> Result<Relationship> {
        associator::association_with(&self.origin, self.relationship, E::ENTITY_TYPE, path)
    }
}

// ============================================================================
// Relationships
// ============================================================================

/// Position of a set of relationships
pub struct Relationships<B: InventoryBackend> {
    context: TraversalContext<B>,
    origin: Option<(TraversalContext<B>, Direction)>,
}

impl<B: InventoryBackend> fmt::Debug for Relationships<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relationships")
            .field("context", &self.context)
            .field("direction", &self.origin.as_ref().map(|(_, d)| *d))
            .finish()
    }
}

impl<B: InventoryBackend> Relationships<B> {
    pub(crate) fn new(
        context: TraversalContext<B>,
        origin: Option<(TraversalContext<B>, Direction)>,
    ) -> Self {
        Relationships { context, origin }
    }

    /// Only relationships called `name`
    pub fn named(&self, name: &str) -> Self {
        Relationships {
            context: self
                .context
                .narrowed([Filter::named(associator::normalize(name))]),
            origin: self.origin.clone(),
        }
    }

    /// The relationship with `id`
    pub fn get(&self, id: impl Into<String>) -> Single<B, Relationship> {
        Single::new(self.context.narrowed([Filter::id(id)]))
    }

    /// Relate the origin of this position to the entity at `other`
    ///
    /// # Errors
    ///
    /// `IllegalOperation` on a position without an origin, in both
    /// directions, for `contains`, or when a relationship rule forbids it.
    pub fn link_with(
        &self,
        name: &str,
        other: &CanonicalPath,
        properties: Properties,
    ) -> Result<Relationship> {
        let Some((origin, direction)) = &self.origin else {
            return Err(Error::illegal(
                "relationships can only be linked from an entity",
            ));
        };
        associator::link_with(origin, name, *direction, other, &properties)
    }

    /// Update the relationship with `id`
    pub fn update(&self, id: impl Into<String>, update: Update) -> Result<()> {
        self.get(id).update(update)
    }

    /// Delete the relationship with `id`, subject to the relationship rules
    pub fn delete(&self, id: impl Into<String>) -> Result<()> {
        self.get(id).delete()
    }
}

impl<B: InventoryBackend> Fetchable for Relationships<B> {
    type Entity = Relationship;

    fn entity(&self) -> Result<Relationship> {
        fetcher::typed_entity(&self.context)
    }

    fn entities(&self, pager: &Pager) -> Result<Page<Relationship>> {
        fetcher::typed_entities(&self.context, pager)
    }
}
