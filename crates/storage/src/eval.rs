//! Query evaluation over the in-memory graph

use crate::graph::{Element, Graph};
use rustc_hash::FxHashSet;
use trellis_core::{Direction, EntityRole, Filter, Query, QueryFragment};

/// Union of all chains of `query`, duplicates removed, in insertion order
pub(crate) fn evaluate(graph: &Graph, query: &Query) -> Vec<Element> {
    let mut seen = FxHashSet::default();
    let mut result: Vec<Element> = query
        .fragment_chains()
        .iter()
        .flat_map(|chain| run_chain(graph, chain))
        .filter(|e| seen.insert(*e))
        .collect();
    result.sort_by_key(Element::seq);
    result
}

fn run_chain(graph: &Graph, chain: &[QueryFragment]) -> Vec<Element> {
    let mut current = graph.all();
    for fragment in chain {
        if current.is_empty() {
            break;
        }
        let filter = fragment.filter();
        let moves = match filter {
            Filter::SwitchElementType { .. } => true,
            Filter::Related { .. } => fragment.is_path(),
            _ => false,
        };
        current = if moves {
            hop(graph, &current, filter)
        } else {
            current.into_iter().filter(|e| matches(graph, e, filter)).collect()
        };
    }
    current
}

fn hop(graph: &Graph, current: &[Element], filter: &Filter) -> Vec<Element> {
    let mut seen = FxHashSet::default();
    let mut next = Vec::new();
    let mut push = |e: Element| {
        if seen.insert(e) {
            next.push(e);
        }
    };

    match filter {
        Filter::Related {
            relationship,
            role,
            other,
        } => {
            // the current elements are the other end of the edge
            let direction = role.opposite().direction();
            for element in current {
                let Element::Vertex(v) = element else {
                    continue;
                };
                if let Some(required) = other {
                    if graph.path(element).ok() != Some(required) {
                        continue;
                    }
                }
                for edge in graph.named_edges(*v, direction, relationship) {
                    if let Some(record) = graph.edges.get(&edge) {
                        for far in Graph::far_ends(record, *v, direction) {
                            push(Element::Vertex(far));
                        }
                    }
                }
            }
        }
        Filter::SwitchElementType {
            direction,
            from_edges: false,
        } => {
            for element in current {
                if let Element::Vertex(v) = element {
                    for edge in graph.edges_of(*v, *direction) {
                        push(Element::Edge(edge));
                    }
                }
            }
        }
        Filter::SwitchElementType {
            direction,
            from_edges: true,
        } => {
            for element in current {
                let Element::Edge(id) = element else {
                    continue;
                };
                let Some(record) = graph.edges.get(id) else {
                    continue;
                };
                match direction {
                    Direction::Outgoing => push(Element::Vertex(record.target)),
                    Direction::Incoming => push(Element::Vertex(record.source)),
                    Direction::Both => {
                        push(Element::Vertex(record.source));
                        push(Element::Vertex(record.target));
                    }
                }
            }
        }
        other => {
            return current
                .iter()
                .copied()
                .filter(|e| matches(graph, e, other))
                .collect()
        }
    }
    next
}

fn matches(graph: &Graph, element: &Element, filter: &Filter) -> bool {
    let Ok(entity) = graph.entity(element) else {
        return false;
    };
    match filter {
        Filter::Ids(ids) => ids.iter().any(|id| id == entity.id()),
        Filter::Types(types) => types.contains(&entity.entity_type()),
        Filter::CanonicalPaths(paths) => paths.contains(entity.path()),
        Filter::RelativePaths { origin, paths } => paths
            .iter()
            .filter_map(|p| p.apply_to(origin).ok())
            .any(|p| &p == entity.path()),
        Filter::PropertyValues { property, values } => entity
            .properties()
            .get(property)
            .map(|v| values.contains(v))
            .unwrap_or(false),
        Filter::Related {
            relationship,
            role,
            other,
        } => {
            let Element::Vertex(v) = element else {
                return false;
            };
            let direction = role.direction();
            graph
                .named_edges(*v, direction, relationship)
                .iter()
                .filter_map(|edge| graph.edges.get(edge))
                .any(|record| match other {
                    None => true,
                    Some(required) => {
                        let far = match role {
                            EntityRole::Target => record.source,
                            EntityRole::Source => record.target,
                        };
                        graph
                            .vertex(far)
                            .map(|e| e.path() == required)
                            .unwrap_or(false)
                    }
                })
        }
        Filter::RelationshipNames(names) => match entity.as_relationship() {
            Some(r) => names.contains(&r.name),
            None => false,
        },
        // handled as a hop
        Filter::SwitchElementType { .. } => true,
    }
}
