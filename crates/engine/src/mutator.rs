//! Creates, updates and cascading deletes at a traversal position
//!
//! Each mutation runs in one backend transaction. Notifications are
//! collected while the transaction runs and delivered only after it
//! committed, so a failed mutation is never reported.

use std::collections::HashSet;
use tracing::{debug, info};
use trellis_core::{
    Blueprint, CanonicalPath, Direction, Entity, EntityType, Error, Filter, InventoryBackend,
    Pager, Properties, Result, SegmentType, Update, WellKnown,
};

use crate::associator;
use crate::context::TraversalContext;
use crate::fetcher;
use crate::notify::Notification;
use crate::transaction::in_transaction;

// ============================================================================
// Create
// ============================================================================

/// Entity kinds that may contain a new entity of `entity_type`
fn parent_types(entity_type: EntityType) -> Result<&'static [EntityType]> {
    use EntityType::*;
    Ok(match entity_type {
        Tenant => &[],
        Environment | Feed | MetadataPack => &[Tenant],
        ResourceType | MetricType => &[Tenant, Feed],
        Resource | Metric => &[Environment, Feed, Resource],
        OperationType => &[ResourceType],
        DataEntity => &[Resource, ResourceType, OperationType],
        Relationship => {
            return Err(Error::illegal(
                "relationships are created by linking entities",
            ))
        }
    })
}

/// Element and path of the entity that will contain a new `entity_type`
fn resolve_parent<B: InventoryBackend>(
    context: &TraversalContext<B>,
    entity_type: EntityType,
) -> Result<Option<(B::Element, CanonicalPath)>> {
    let allowed = parent_types(entity_type)?;
    if allowed.is_empty() {
        return Ok(None);
    }
    let previous = context.previous().ok_or_else(|| {
        Error::illegal(format!("a {} needs a parent to be created under", entity_type))
    })?;
    let (element, parent) = fetcher::located(previous)?;
    if !allowed.contains(&parent.entity_type()) {
        return Err(Error::illegal(format!(
            "a {} cannot be created under the {} '{}'",
            entity_type,
            parent.entity_type(),
            parent.path()
        )));
    }
    Ok(Some((element, parent.path().clone())))
}

fn exists<B: InventoryBackend>(backend: &B, path: &CanonicalPath) -> Result<bool> {
    match backend.find(path) {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

fn choose_id<B: InventoryBackend>(
    context: &TraversalContext<B>,
    parent: Option<&CanonicalPath>,
    blueprint: &Blueprint,
) -> Result<String> {
    match (blueprint.entity_type(), parent) {
        (EntityType::Feed, Some(parent)) => {
            let backend = context.backend();
            let is_taken = |candidate: &str| -> Result<bool> {
                exists(backend, &parent.extend(SegmentType::Feed, candidate)?)
            };
            context
                .config()
                .feed_id_strategy()
                .generate(parent, blueprint, &is_taken)
        }
        _ => Ok(blueprint.id.clone()),
    }
}

fn expect_type<B: InventoryBackend>(
    backend: &B,
    path: &CanonicalPath,
    allowed: &[EntityType],
) -> Result<B::Element> {
    let element = backend.find(path)?;
    let found = backend.element_type(&element)?;
    if !allowed.contains(&found) {
        return Err(Error::illegal(format!(
            "'{}' is a {}, which cannot be referenced here",
            path, found
        )));
    }
    Ok(element)
}

/// Relationships every entity of a kind gets besides `contains`
fn wire_up<B: InventoryBackend>(
    backend: &B,
    element: &B::Element,
    entity: &Entity,
    parent: Option<&B::Element>,
) -> Result<Vec<Entity>> {
    let empty = Properties::new();
    let mut created = Vec::new();
    match entity {
        Entity::Resource(resource) => {
            let definition =
                expect_type(backend, &resource.resource_type, &[EntityType::ResourceType])?;
            created.push(associator::link(
                backend,
                &definition,
                element,
                WellKnown::Defines.name(),
                &empty,
            )?);
            if let Some(parent) = parent {
                if backend.element_type(parent)? == EntityType::Resource {
                    created.push(associator::link(
                        backend,
                        parent,
                        element,
                        WellKnown::IsParentOf.name(),
                        &empty,
                    )?);
                }
            }
        }
        Entity::Metric(metric) => {
            let definition =
                expect_type(backend, &metric.metric_type, &[EntityType::MetricType])?;
            created.push(associator::link(
                backend,
                &definition,
                element,
                WellKnown::Defines.name(),
                &empty,
            )?);
        }
        Entity::MetadataPack(pack) => {
            for member in &pack.members {
                let member = expect_type(
                    backend,
                    member,
                    &[EntityType::ResourceType, EntityType::MetricType],
                )?;
                created.push(associator::link(
                    backend,
                    element,
                    &member,
                    WellKnown::Incorporates.name(),
                    &empty,
                )?);
            }
        }
        Entity::Tenant(_)
        | Entity::Environment(_)
        | Entity::Feed(_)
        | Entity::ResourceType(_)
        | Entity::MetricType(_)
        | Entity::OperationType(_)
        | Entity::DataEntity(_)
        | Entity::Relationship(_) => {}
    }
    Ok(created)
}

/// Relationships declared by the blueprint itself
fn declared<B: InventoryBackend>(
    backend: &B,
    element: &B::Element,
    path: &CanonicalPath,
    blueprint: &Blueprint,
) -> Result<Vec<Entity>> {
    let empty = Properties::new();
    let mut created = Vec::new();
    for (direction, declarations) in [
        (Direction::Outgoing, &blueprint.outgoing),
        (Direction::Incoming, &blueprint.incoming),
    ] {
        for (name, others) in declarations {
            let name = associator::normalize(name);
            associator::ensure_client_managed(&name)?;
            for other in others {
                let other = backend.find(&other.resolve_for(path)?)?;
                let edge = match direction {
                    Direction::Incoming => associator::link(backend, &other, element, &name, &empty)?,
                    _ => associator::link(backend, element, &other, &name, &empty)?,
                };
                created.push(edge);
            }
        }
    }
    Ok(created)
}

/// Create the entity described by `blueprint` at the position of `context`
///
/// The new entity is contained by the single entity of the previous
/// position. The entity, its `contains` edge and the relationships added by
/// wiring are reported as created, in that order.
///
/// # Errors
///
/// - `EntityAlreadyExists` if a sibling of the same kind has the id
/// - `IllegalOperation` if the blueprint kind does not fit the position or a
///   relationship rule is violated
/// - `EntityNotFound` if the parent or a referenced entity is missing
pub fn create<B: InventoryBackend>(
    context: &TraversalContext<B>,
    blueprint: &Blueprint,
) -> Result<Entity> {
    let entity_type = blueprint.entity_type();
    if entity_type != context.entity_type() {
        return Err(Error::illegal(format!(
            "cannot create a {} where {} entities live",
            entity_type,
            context.entity_type()
        )));
    }
    let backend = context.backend();
    let (entity, notifications) = in_transaction(backend, true, || {
        let parent = resolve_parent(context, entity_type)?;
        let parent_path = parent.as_ref().map(|(_, p)| p);
        let id = choose_id(context, parent_path, blueprint)?;
        if id.is_empty() {
            return Err(Error::invalid_path(format!(
                "a {} needs a non-empty id",
                entity_type
            )));
        }
        let sibling = backend.query(
            &context.narrowed([Filter::id(id.clone())]).select(),
            &Pager::single(),
        )?;
        let path = match parent_path {
            Some(parent) => parent.extend(entity_type.segment_type(), id)?,
            None => CanonicalPath::of_tenant(id),
        };
        if !sibling.is_empty() || exists(backend, &path)? {
            return Err(Error::already_exists(&path));
        }

        let element = backend.persist(&path, blueprint)?;
        let entity = backend.convert(&element)?;
        let mut notifications = vec![Notification::created(entity.clone())];
        if let Some((parent_element, _)) = &parent {
            let contains = associator::link(
                backend,
                parent_element,
                &element,
                WellKnown::Contains.name(),
                &Properties::new(),
            )?;
            notifications.push(Notification::created(contains));
        }
        let wired = wire_up(backend, &element, &entity, parent.as_ref().map(|(e, _)| e))?;
        let declared = declared(backend, &element, &path, blueprint)?;
        notifications.extend(
            wired
                .into_iter()
                .chain(declared)
                .map(Notification::created),
        );
        Ok((entity, notifications))
    })?;
    info!(target: "trellis::mutation", path = %entity.path(), "created");
    context.observers().notify_all(&notifications);
    Ok(entity)
}

// ============================================================================
// Update
// ============================================================================

/// Apply `update` to the single entity selected by `context`
///
/// # Errors
///
/// `EntityNotFound` if nothing is selected; `IllegalOperation` if the
/// update sets a field the entity kind does not have.
pub fn update<B: InventoryBackend>(context: &TraversalContext<B>, update: &Update) -> Result<Entity> {
    let backend = context.backend();
    let (original, updated) = in_transaction(backend, true, || {
        let (element, original) = fetcher::located(context)?;
        update.validate_for(original.entity_type())?;
        backend.update(&element, update)?;
        Ok((original, backend.convert(&element)?))
    })?;
    info!(target: "trellis::mutation", path = %updated.path(), "updated");
    context.observers().notify_all(&[Notification::updated(
        updated.clone(),
        original,
        update.clone(),
    )]);
    Ok(updated)
}

// ============================================================================
// Delete
// ============================================================================

fn is_defining<B: InventoryBackend>(backend: &B, element: &B::Element) -> Result<bool> {
    backend.has_relationship_in(element, Direction::Outgoing, WellKnown::Defines.name())
}

/// Delete the single entity selected by `context` with everything it
/// contains
///
/// Entities that define others are deleted last, and only if nothing they
/// define is left at that point. Removed relationships are reported before
/// removed entities.
///
/// # Errors
///
/// `IllegalOperation` if a defining entity would orphan the entities it
/// defines; nothing is deleted in that case.
pub fn delete<B: InventoryBackend>(context: &TraversalContext<B>) -> Result<()> {
    let backend = context.backend();
    let notifications = in_transaction(backend, true, || {
        let (element, entity) = fetcher::located(context)?;
        if let Entity::Relationship(relationship) = &entity {
            associator::unlink(backend, &element, relationship)?;
            return Ok(vec![Notification::deleted(entity)]);
        }

        let mut closure = vec![element.clone()];
        closure.extend(backend.transitive_closure(
            &element,
            WellKnown::Contains.name(),
            Direction::Outgoing,
        )?);
        let mut defining = Vec::new();
        let mut plain = Vec::new();
        for member in closure {
            if is_defining(backend, &member)? {
                defining.push(member);
            } else {
                plain.push(member);
            }
        }

        let mut seen = HashSet::new();
        let mut relationships = Vec::new();
        for member in plain.iter().chain(defining.iter()) {
            for edge in backend.get_relationships(member, Direction::Both)? {
                if seen.insert(edge.clone()) {
                    relationships.push(Notification::deleted(backend.convert(&edge)?));
                }
            }
        }

        let mut entities = Vec::with_capacity(plain.len() + defining.len());
        for member in &plain {
            entities.push(Notification::deleted(backend.convert(member)?));
            backend.delete(member)?;
        }
        for member in &defining {
            let doomed = backend.convert(member)?;
            // the plain deletions above may have removed what it defines
            if is_defining(backend, member)? {
                return Err(Error::illegal(format!(
                    "'{}' still defines other entities",
                    doomed.path()
                )));
            }
            entities.push(Notification::deleted(doomed));
            backend.delete(member)?;
        }
        debug!(
            target: "trellis::mutation",
            entities = entities.len(),
            relationships = relationships.len(),
            "subtree removed"
        );
        relationships.extend(entities);
        Ok(relationships)
    })?;
    info!(target: "trellis::mutation", query = %context.select(), "deleted");
    context.observers().notify_all(&notifications);
    Ok(())
}

