//! Property graph held by the memory backend
//!
//! Vertices hold entities, edges hold relationships. Vertices and edges share
//! one id counter, so ordering elements by id is insertion order.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeMap, VecDeque};
use trellis_core::{CanonicalPath, Direction, Entity, EntityType, Error, Relationship, Result};

/// Handle to a vertex or an edge of a [`MemoryBackend`](crate::MemoryBackend)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    /// An entity
    Vertex(u64),
    /// A relationship
    Edge(u64),
}

impl Element {
    /// Insertion sequence number
    pub fn seq(&self) -> u64 {
        match self {
            Element::Vertex(id) | Element::Edge(id) => *id,
        }
    }

    /// True for vertices
    pub fn is_vertex(&self) -> bool {
        matches!(self, Element::Vertex(_))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct EdgeRecord {
    pub(crate) source: u64,
    pub(crate) target: u64,
    pub(crate) relationship: Relationship,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Graph {
    next_id: u64,
    pub(crate) vertices: BTreeMap<u64, Entity>,
    pub(crate) edges: BTreeMap<u64, EdgeRecord>,
    by_path: FxHashMap<CanonicalPath, Element>,
    outgoing: FxHashMap<u64, Vec<u64>>,
    incoming: FxHashMap<u64, Vec<u64>>,
}

fn unknown(element: &Element) -> Error {
    Error::entity_not_found("element", format!("{:?}", element))
}

impl Graph {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub(crate) fn lookup(&self, path: &CanonicalPath) -> Option<Element> {
        self.by_path.get(path).copied()
    }

    /// All elements in insertion order
    pub(crate) fn all(&self) -> Vec<Element> {
        let mut all: Vec<Element> = self
            .vertices
            .keys()
            .map(|&id| Element::Vertex(id))
            .chain(self.edges.keys().map(|&id| Element::Edge(id)))
            .collect();
        all.sort_by_key(Element::seq);
        all
    }

    pub(crate) fn vertex(&self, id: u64) -> Result<&Entity> {
        self.vertices
            .get(&id)
            .ok_or_else(|| unknown(&Element::Vertex(id)))
    }

    pub(crate) fn edge(&self, id: u64) -> Result<&EdgeRecord> {
        self.edges.get(&id).ok_or_else(|| unknown(&Element::Edge(id)))
    }

    pub(crate) fn vertex_id(element: &Element) -> Result<u64> {
        match element {
            Element::Vertex(id) => Ok(*id),
            Element::Edge(_) => Err(Error::backend(format!(
                "expected an entity, got relationship {:?}",
                element
            ))),
        }
    }

    pub(crate) fn entity(&self, element: &Element) -> Result<Entity> {
        match element {
            Element::Vertex(id) => self.vertex(*id).cloned(),
            Element::Edge(id) => Ok(Entity::Relationship(self.edge(*id)?.relationship.clone())),
        }
    }

    pub(crate) fn path(&self, element: &Element) -> Result<&CanonicalPath> {
        match element {
            Element::Vertex(id) => Ok(self.vertex(*id)?.path()),
            Element::Edge(id) => Ok(&self.edge(*id)?.relationship.path),
        }
    }

    pub(crate) fn element_type(&self, element: &Element) -> Result<EntityType> {
        match element {
            Element::Vertex(id) => Ok(self.vertex(*id)?.entity_type()),
            Element::Edge(id) => self.edge(*id).map(|_| EntityType::Relationship),
        }
    }

    pub(crate) fn insert_vertex(&mut self, entity: Entity) -> Result<Element> {
        if self.by_path.contains_key(entity.path()) {
            return Err(Error::already_exists(entity.path()));
        }
        let id = self.allocate();
        let element = Element::Vertex(id);
        self.by_path.insert(entity.path().clone(), element);
        self.vertices.insert(id, entity);
        Ok(element)
    }

    pub(crate) fn insert_edge(
        &mut self,
        source: u64,
        target: u64,
        relationship: Relationship,
    ) -> Result<Element> {
        self.vertex(source)?;
        self.vertex(target)?;
        if self.by_path.contains_key(&relationship.path) {
            return Err(Error::relation_exists(
                relationship.name.clone(),
                relationship.source.to_string(),
                relationship.target.to_string(),
            ));
        }
        let id = self.allocate();
        let element = Element::Edge(id);
        self.by_path.insert(relationship.path.clone(), element);
        self.outgoing.entry(source).or_default().push(id);
        self.incoming.entry(target).or_default().push(id);
        self.edges.insert(
            id,
            EdgeRecord {
                source,
                target,
                relationship,
            },
        );
        Ok(element)
    }

    pub(crate) fn remove_edge(&mut self, id: u64) -> Result<Relationship> {
        let record = self
            .edges
            .remove(&id)
            .ok_or_else(|| unknown(&Element::Edge(id)))?;
        self.by_path.remove(&record.relationship.path);
        if let Some(out) = self.outgoing.get_mut(&record.source) {
            out.retain(|&e| e != id);
        }
        if let Some(inc) = self.incoming.get_mut(&record.target) {
            inc.retain(|&e| e != id);
        }
        Ok(record.relationship)
    }

    /// Remove a vertex and every edge touching it
    pub(crate) fn remove_vertex(&mut self, id: u64) -> Result<Entity> {
        let incident = self.edges_of(id, Direction::Both);
        for edge in incident {
            self.remove_edge(edge)?;
        }
        self.outgoing.remove(&id);
        self.incoming.remove(&id);
        let entity = self
            .vertices
            .remove(&id)
            .ok_or_else(|| unknown(&Element::Vertex(id)))?;
        self.by_path.remove(entity.path());
        Ok(entity)
    }

    /// Edge ids of a vertex in `direction`, each once, in insertion order
    pub(crate) fn edges_of(&self, vertex: u64, direction: Direction) -> Vec<u64> {
        let empty = Vec::new();
        let out = self.outgoing.get(&vertex).unwrap_or(&empty);
        let inc = self.incoming.get(&vertex).unwrap_or(&empty);
        let mut edges: Vec<u64> = match direction {
            Direction::Outgoing => out.clone(),
            Direction::Incoming => inc.clone(),
            Direction::Both => out.iter().chain(inc.iter()).copied().collect(),
        };
        edges.sort_unstable();
        edges.dedup();
        edges
    }

    /// Vertex at the other end of `edge` when seen from `direction`
    pub(crate) fn far_ends(record: &EdgeRecord, from: u64, direction: Direction) -> Vec<u64> {
        match direction {
            Direction::Outgoing => vec![record.target],
            Direction::Incoming => vec![record.source],
            Direction::Both if record.source == from => vec![record.target],
            Direction::Both => vec![record.source],
        }
    }

    pub(crate) fn named_edges(&self, vertex: u64, direction: Direction, name: &str) -> Vec<u64> {
        self.edges_of(vertex, direction)
            .into_iter()
            .filter(|id| {
                self.edges
                    .get(id)
                    .map(|r| r.relationship.name == name)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Breadth-first closure over edges `name`, `start` excluded
    pub(crate) fn closure(&self, start: u64, name: &str, direction: Direction) -> Vec<u64> {
        let mut seen = FxHashSet::default();
        seen.insert(start);
        let mut queue = VecDeque::from([start]);
        let mut reached = Vec::new();
        while let Some(current) = queue.pop_front() {
            for edge in self.named_edges(current, direction, name) {
                let Some(record) = self.edges.get(&edge) else {
                    continue;
                };
                for next in Graph::far_ends(record, current, direction) {
                    if seen.insert(next) {
                        reached.push(next);
                        queue.push_back(next);
                    }
                }
            }
        }
        reached
    }
}
