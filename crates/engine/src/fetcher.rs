//! Reads at a traversal position

use tracing::debug;
use trellis_core::{Entity, Error, InventoryBackend, InventoryEntity, Page, Pager, Result};

use crate::context::TraversalContext;

fn not_found<B: InventoryBackend>(context: &TraversalContext<B>) -> Error {
    Error::entity_not_found(context.entity_type().name(), context.select().to_string())
}

/// The backend element of the single entity selected by `context`
///
/// Under a result filter the first accepted match is returned, so hidden
/// entities never shadow visible ones.
pub(crate) fn element<B: InventoryBackend>(context: &TraversalContext<B>) -> Result<B::Element> {
    let backend = context.backend();
    let query = context.select();
    if context.config().result_filter().is_none() {
        let page = backend.query(&query, &Pager::single())?;
        return page.items.into_iter().next().ok_or_else(|| not_found(context));
    }
    for element in backend.query(&query, &Pager::unlimited())? {
        if context.config().accepts(&backend.convert(&element)?) {
            return Ok(element);
        }
    }
    Err(not_found(context))
}

/// The backend element and entity selected by `context`
pub(crate) fn located<B: InventoryBackend>(
    context: &TraversalContext<B>,
) -> Result<(B::Element, Entity)> {
    let element = element(context)?;
    let entity = context.backend().convert(&element)?;
    Ok((element, entity))
}

/// The single entity selected by `context`
///
/// # Errors
///
/// `EntityNotFound` if nothing matches, or if the configured result filter
/// rejects the match.
pub fn entity<B: InventoryBackend>(context: &TraversalContext<B>) -> Result<Entity> {
    located(context).map(|(_, entity)| entity)
}

/// All entities selected by `context`, paged by `pager`
///
/// Entities rejected by the result filter are removed before paging, so
/// pages stay full and the total size counts visible entities only.
pub fn entities<B: InventoryBackend>(
    context: &TraversalContext<B>,
    pager: &Pager,
) -> Result<Page<Entity>> {
    let backend = context.backend();
    let query = context.select();
    let page = if context.config().result_filter().is_none() {
        backend.query(&query, pager)?.try_map(|e| backend.convert(&e))?
    } else {
        let mut visible = Vec::new();
        for element in backend.query(&query, &pager.unpaged())? {
            let entity = backend.convert(&element)?;
            if context.config().accepts(&entity) {
                visible.push(entity);
            }
        }
        pager.apply(visible)
    };
    debug!(
        target: "trellis::fetch",
        %query,
        returned = page.items.len(),
        total = page.total_size,
        "fetched"
    );
    Ok(page)
}

/// Down-cast a fetched entity
pub(crate) fn typed<E: InventoryEntity>(entity: Entity) -> Result<E> {
    let found = entity.entity_type();
    E::from_entity(entity).ok_or_else(|| {
        Error::backend(format!(
            "expected a {}, the backend returned a {}",
            E::ENTITY_TYPE,
            found
        ))
    })
}

/// [`entity`], down-cast
pub fn typed_entity<B: InventoryBackend, E: InventoryEntity>(
    context: &TraversalContext<B>,
) -> Result<E> {
    entity(context).and_then(typed)
}

/// [`entities`], down-cast
pub fn typed_entities<B: InventoryBackend, E: InventoryEntity>(
    context: &TraversalContext<B>,
    pager: &Pager,
) -> Result<Page<E>> {
    entities(context, pager)?.try_map(typed)
}
