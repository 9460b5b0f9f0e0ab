//! MemoryBackend: in-memory implementation of the backend SPI
//!
//! # Design Notes
//!
//! - **One lock**: the whole graph sits behind a single `parking_lot::RwLock`
//! - **Snapshot transactions**: a writable transaction clones the graph;
//!   rollback swaps the clone back in, commit drops it
//! - **Nested transactions** join the outermost one; rolling back a nested
//!   transaction marks the outer one rollback-only

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};
use trellis_core::{
    Blueprint, CanonicalPath, Direction, Entity, EntityType, Error, InventoryBackend, Page, Pager,
    Properties, Query, Relationship, Result, Update,
};
use uuid::Uuid;

use crate::eval;
use crate::graph::{Element, Graph};

#[derive(Debug, Default)]
struct TxnState {
    depth: usize,
    snapshot: Option<Graph>,
    rollback_only: bool,
}

/// Handle of an open [`MemoryBackend`] transaction
#[derive(Debug)]
#[must_use = "transactions must be committed or rolled back"]
pub struct MemoryTransaction {
    writable: bool,
    outermost: bool,
}

impl MemoryTransaction {
    /// True if opened as writable
    pub fn is_writable(&self) -> bool {
        self.writable
    }
}

/// In-memory property graph
///
/// Thread-safe through `parking_lot` locks. Intended for tests and for
/// embedders that do not need persistence.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    graph: RwLock<Graph>,
    txn: Mutex<TxnState>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.graph.read().vertices.len()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.graph.read().edges.len()
    }

    /// True while a transaction is open
    pub fn in_transaction(&self) -> bool {
        self.txn.lock().depth > 0
    }
}

impl InventoryBackend for MemoryBackend {
    type Element = Element;
    type Transaction = MemoryTransaction;

    fn start_transaction(&self, writable: bool) -> Result<MemoryTransaction> {
        let mut txn = self.txn.lock();
        let outermost = txn.depth == 0;
        txn.depth += 1;
        if outermost {
            txn.rollback_only = false;
            if writable {
                txn.snapshot = Some(self.graph.read().clone());
            }
        } else if writable && txn.snapshot.is_none() {
            // a read transaction is being upgraded by a nested writer
            txn.snapshot = Some(self.graph.read().clone());
        }
        debug!(target: "trellis::storage", writable, depth = txn.depth, "transaction started");
        Ok(MemoryTransaction {
            writable,
            outermost,
        })
    }

    fn commit(&self, transaction: MemoryTransaction) -> Result<()> {
        let mut txn = self.txn.lock();
        if txn.depth == 0 {
            return Err(Error::Transaction {
                reason: "commit without an open transaction".to_string(),
            });
        }
        txn.depth -= 1;
        if !transaction.outermost {
            return Ok(());
        }
        let snapshot = txn.snapshot.take();
        if txn.rollback_only {
            txn.rollback_only = false;
            if let Some(snapshot) = snapshot {
                *self.graph.write() = snapshot;
            }
            warn!(target: "trellis::storage", "commit of a rollback-only transaction");
            return Err(Error::Transaction {
                reason: "a nested transaction was rolled back".to_string(),
            });
        }
        debug!(target: "trellis::storage", "transaction committed");
        Ok(())
    }

    fn rollback(&self, transaction: MemoryTransaction) -> Result<()> {
        let mut txn = self.txn.lock();
        if txn.depth == 0 {
            return Err(Error::Transaction {
                reason: "rollback without an open transaction".to_string(),
            });
        }
        txn.depth -= 1;
        if !transaction.outermost {
            txn.rollback_only = true;
            return Ok(());
        }
        txn.rollback_only = false;
        if let Some(snapshot) = txn.snapshot.take() {
            *self.graph.write() = snapshot;
        }
        debug!(target: "trellis::storage", "transaction rolled back");
        Ok(())
    }

    fn query(&self, query: &Query, pager: &Pager) -> Result<Page<Element>> {
        let graph = self.graph.read();
        let mut found = eval::evaluate(&graph, query);
        if !pager.orders.is_empty() {
            let mut keyed = found
                .into_iter()
                .map(|e| graph.entity(&e).map(|entity| (e, entity)))
                .collect::<Result<Vec<_>>>()?;
            keyed.sort_by(|(_, a), (_, b)| pager.compare(a, b));
            found = keyed.into_iter().map(|(e, _)| e).collect();
        }
        debug!(target: "trellis::storage", %query, found = found.len(), "query");
        Ok(pager.apply(found))
    }

    fn find(&self, path: &CanonicalPath) -> Result<Element> {
        self.graph.read().lookup(path).ok_or_else(|| {
            Error::entity_not_found(
                path.entity_type()
                    .map(|t| t.name())
                    .unwrap_or("entity"),
                path.to_string(),
            )
        })
    }

    fn convert(&self, element: &Element) -> Result<Entity> {
        self.graph.read().entity(element)
    }

    fn extract_id(&self, element: &Element) -> Result<String> {
        let graph = self.graph.read();
        Ok(graph.path(element)?.id().unwrap_or_default().to_string())
    }

    fn element_type(&self, element: &Element) -> Result<EntityType> {
        self.graph.read().element_type(element)
    }

    fn persist(&self, path: &CanonicalPath, blueprint: &Blueprint) -> Result<Element> {
        let entity = blueprint.to_entity(path)?;
        let element = self.graph.write().insert_vertex(entity)?;
        debug!(target: "trellis::storage", %path, "persisted");
        Ok(element)
    }

    fn update(&self, element: &Element, update: &Update) -> Result<()> {
        let mut graph = self.graph.write();
        match element {
            Element::Vertex(id) => {
                let entity = graph
                    .vertices
                    .get_mut(id)
                    .ok_or_else(|| Error::entity_not_found("entity", format!("{:?}", element)))?;
                update.apply(entity)
            }
            Element::Edge(id) => {
                let record = graph
                    .edges
                    .get_mut(id)
                    .ok_or_else(|| Error::entity_not_found("Relationship", format!("{:?}", element)))?;
                let mut entity = Entity::Relationship(record.relationship.clone());
                update.apply(&mut entity)?;
                if let Entity::Relationship(updated) = entity {
                    record.relationship = updated;
                }
                Ok(())
            }
        }
    }

    fn delete(&self, element: &Element) -> Result<()> {
        let mut graph = self.graph.write();
        match element {
            Element::Vertex(id) => {
                let entity = graph.remove_vertex(*id)?;
                debug!(target: "trellis::storage", path = %entity.path(), "vertex deleted");
            }
            Element::Edge(id) => {
                let relationship = graph.remove_edge(*id)?;
                debug!(target: "trellis::storage", %relationship, "edge deleted");
            }
        }
        Ok(())
    }

    fn relate(
        &self,
        source: &Element,
        target: &Element,
        name: &str,
        properties: &Properties,
    ) -> Result<Element> {
        let mut graph = self.graph.write();
        let source_id = Graph::vertex_id(source)?;
        let target_id = Graph::vertex_id(target)?;
        let mut relationship = Relationship::new(
            Uuid::new_v4().to_string(),
            name,
            graph.vertex(source_id)?.path().clone(),
            graph.vertex(target_id)?.path().clone(),
        );
        relationship.properties = properties.clone();
        debug!(target: "trellis::storage", %relationship, "edge created");
        graph.insert_edge(source_id, target_id, relationship)
    }

    fn has_relationship(&self, source: &Element, target: &Element, name: &str) -> Result<bool> {
        let graph = self.graph.read();
        let source_id = Graph::vertex_id(source)?;
        let target_id = Graph::vertex_id(target)?;
        Ok(graph
            .named_edges(source_id, Direction::Outgoing, name)
            .iter()
            .any(|e| graph.edges.get(e).map(|r| r.target) == Some(target_id)))
    }

    fn has_relationship_in(&self, element: &Element, direction: Direction, name: &str) -> Result<bool> {
        let graph = self.graph.read();
        let id = Graph::vertex_id(element)?;
        Ok(!graph.named_edges(id, direction, name).is_empty())
    }

    fn get_relationship(&self, source: &Element, target: &Element, name: &str) -> Result<Element> {
        let graph = self.graph.read();
        let source_id = Graph::vertex_id(source)?;
        let target_id = Graph::vertex_id(target)?;
        graph
            .named_edges(source_id, Direction::Outgoing, name)
            .into_iter()
            .find(|e| graph.edges.get(e).map(|r| r.target) == Some(target_id))
            .map(Element::Edge)
            .ok_or_else(|| {
                let path_of = |id: u64| {
                    graph
                        .vertex(id)
                        .map(|e| e.path().to_string())
                        .unwrap_or_else(|_| "*".to_string())
                };
                Error::relation_not_found(name, path_of(source_id), path_of(target_id))
            })
    }

    fn get_relationships(&self, element: &Element, direction: Direction) -> Result<Vec<Element>> {
        let graph = self.graph.read();
        let id = Graph::vertex_id(element)?;
        graph.vertex(id)?;
        Ok(graph
            .edges_of(id, direction)
            .into_iter()
            .map(Element::Edge)
            .collect())
    }

    fn transitive_closure(
        &self,
        element: &Element,
        name: &str,
        direction: Direction,
    ) -> Result<Vec<Element>> {
        let graph = self.graph.read();
        let id = Graph::vertex_id(element)?;
        graph.vertex(id)?;
        Ok(graph
            .closure(id, name, direction)
            .into_iter()
            .map(Element::Vertex)
            .collect())
    }
}
