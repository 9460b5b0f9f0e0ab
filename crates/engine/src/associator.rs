//! Explicit relationship creation and removal
//!
//! Every edge the engine creates, implicitly during entity creation or on
//! client request, goes through [`link`]; every explicit removal goes
//! through [`unlink`]. Both run the integrity rules first.

use tracing::info;
use trellis_core::{
    CanonicalPath, Direction, Entity, EntityType, Error, InventoryBackend, Properties,
    Relationship, Result, WellKnown,
};

use crate::context::TraversalContext;
use crate::fetcher;
use crate::notify::Notification;
use crate::rules;
use crate::transaction::in_transaction;

/// Canonical spelling of a relationship name (`owns` is `incorporates`)
pub(crate) fn normalize(name: &str) -> String {
    WellKnown::from_name(name)
        .map(|w| w.name().to_string())
        .unwrap_or_else(|| name.to_string())
}

/// Reject relationships clients may not manage themselves
pub(crate) fn ensure_client_managed(name: &str) -> Result<()> {
    if name == WellKnown::Contains.name() {
        return Err(Error::illegal(
            "'contains' is managed by entity creation and deletion",
        ));
    }
    Ok(())
}

fn path_of<B: InventoryBackend>(backend: &B, element: &B::Element) -> Result<CanonicalPath> {
    Ok(backend.convert(element)?.path().clone())
}

/// Create the edge `name` from `source` to `target` after checking the rules
pub(crate) fn link<B: InventoryBackend>(
    backend: &B,
    source: &B::Element,
    target: &B::Element,
    name: &str,
    properties: &Properties,
) -> Result<Entity> {
    if backend.has_relationship(source, target, name)? {
        return Err(Error::relation_exists(
            name,
            path_of(backend, source)?.to_string(),
            path_of(backend, target)?.to_string(),
        ));
    }
    rules::check_create(backend, source, Direction::Outgoing, name, target)?;
    let edge = backend.relate(source, target, name, properties)?;
    backend.convert(&edge)
}

/// Delete the relationship `edge` after checking the rules
pub(crate) fn unlink<B: InventoryBackend>(
    backend: &B,
    edge: &B::Element,
    relationship: &Relationship,
) -> Result<()> {
    let source = backend.find(&relationship.source)?;
    let target = backend.find(&relationship.target)?;
    rules::check_delete(
        backend,
        &source,
        Direction::Outgoing,
        &relationship.name,
        &target,
    )?;
    backend.delete(edge)
}

fn endpoint<B: InventoryBackend>(
    backend: &B,
    path: &CanonicalPath,
    expected: EntityType,
) -> Result<B::Element> {
    let element = backend.find(path)?;
    let found = backend.element_type(&element)?;
    if found != expected {
        return Err(Error::illegal(format!(
            "'{}' is a {}, expected a {}",
            path, found, expected
        )));
    }
    Ok(element)
}

fn as_relationship(entity: Entity) -> Result<Relationship> {
    fetcher::typed(entity)
}

/// Relate the entity at `source` to the `target_type` entity at `target`
pub fn associate<B: InventoryBackend>(
    source: &TraversalContext<B>,
    relationship: &str,
    target_type: EntityType,
    target: &CanonicalPath,
) -> Result<Relationship> {
    let name = normalize(relationship);
    ensure_client_managed(&name)?;
    let backend = source.backend();
    let created = in_transaction(backend, true, || {
        let from = fetcher::element(source)?;
        let to = endpoint(backend, target, target_type)?;
        link(backend, &from, &to, &name, &Properties::new())
    })?;
    info!(target: "trellis::mutation", path = %created.path(), relationship = %name, "associated");
    source
        .observers()
        .notify_all(&[Notification::created(created.clone())]);
    as_relationship(created)
}

/// Remove the relationship created by [`associate`]
pub fn disassociate<B: InventoryBackend>(
    source: &TraversalContext<B>,
    relationship: &str,
    target_type: EntityType,
    target: &CanonicalPath,
) -> Result<Relationship> {
    let name = normalize(relationship);
    ensure_client_managed(&name)?;
    let backend = source.backend();
    let removed = in_transaction(backend, true, || {
        let from = fetcher::element(source)?;
        let to = endpoint(backend, target, target_type)?;
        let edge = backend.get_relationship(&from, &to, &name)?;
        let removed = as_relationship(backend.convert(&edge)?)?;
        unlink(backend, &edge, &removed)?;
        Ok(removed)
    })?;
    info!(target: "trellis::mutation", path = %removed.path, relationship = %name, "disassociated");
    source
        .observers()
        .notify_all(&[Notification::deleted(removed.clone().into())]);
    Ok(removed)
}

/// The relationship created by [`associate`]
///
/// # Errors
///
/// `RelationNotFound` if the two entities are not related.
pub fn association_with<B: InventoryBackend>(
    source: &TraversalContext<B>,
    relationship: &str,
    target_type: EntityType,
    target: &CanonicalPath,
) -> Result<Relationship> {
    let name = normalize(relationship);
    let backend = source.backend();
    let from = fetcher::element(source)?;
    let to = endpoint(backend, target, target_type)?;
    let edge = backend.get_relationship(&from, &to, &name)?;
    as_relationship(backend.convert(&edge)?)
}

/// Relate the single entity at `origin` to the entity at `other`
///
/// The edge goes out of `origin` for [`Direction::Outgoing`] and into it for
/// [`Direction::Incoming`].
pub fn link_with<B: InventoryBackend>(
    origin: &TraversalContext<B>,
    relationship: &str,
    direction: Direction,
    other: &CanonicalPath,
    properties: &Properties,
) -> Result<Relationship> {
    let name = normalize(relationship);
    ensure_client_managed(&name)?;
    let backend = origin.backend();
    let created = in_transaction(backend, true, || {
        let here = fetcher::element(origin)?;
        let there = backend.find(other)?;
        let (source, target) = match direction {
            Direction::Outgoing => (&here, &there),
            Direction::Incoming => (&there, &here),
            Direction::Both => {
                return Err(Error::illegal(format!(
                    "'{}' needs a direction to be created",
                    name
                )))
            }
        };
        link(backend, source, target, &name, properties)
    })?;
    info!(target: "trellis::mutation", path = %created.path(), relationship = %name, "linked");
    origin
        .observers()
        .notify_all(&[Notification::created(created.clone())]);
    as_relationship(created)
}
