//! Navigation filters
//!
//! A [`Filter`] is either a hop through the topology or a predicate on the
//! current element set, depending on whether it is wrapped in a path or a
//! filter [`QueryFragment`](crate::query::QueryFragment).
//!
//! | Filter | As path fragment | As filter fragment |
//! |--------|------------------|--------------------|
//! | `Related` | hop to the other end of matching edges | keep elements with a matching edge |
//! | `SwitchElementType` | vertices to edges, or edges to vertices | (same) |
//! | everything else | narrow | narrow |

use crate::model::{Direction, EntityRole, EntityType, WellKnown};
use crate::path::{CanonicalPath, RelativePath};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One navigation step or predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    /// Elements with one of the ids (last path segment, or relationship id)
    Ids(Vec<String>),
    /// Elements of one of the kinds
    Types(Vec<EntityType>),
    /// Elements at one of the paths
    CanonicalPaths(Vec<CanonicalPath>),
    /// Elements at one of the paths, resolved against `origin`
    RelativePaths {
        /// Resolution origin
        origin: CanonicalPath,
        /// Paths relative to `origin`
        paths: Vec<RelativePath>,
    },
    /// Elements whose property has one of the values
    PropertyValues {
        /// Property name
        property: String,
        /// Accepted values
        values: Vec<serde_json::Value>,
    },
    /// Elements playing `role` in a `relationship` edge
    Related {
        /// Relationship name
        relationship: String,
        /// Role of the selected element in the edge
        role: EntityRole,
        /// Required other end of the edge
        other: Option<CanonicalPath>,
    },
    /// Relationships with one of the names
    RelationshipNames(Vec<String>),
    /// Switch between vertices and edges
    SwitchElementType {
        /// From vertices: which incident edges. From edges: outgoing selects
        /// targets, incoming selects sources.
        direction: Direction,
        /// True when the current elements are edges
        from_edges: bool,
    },
}

impl Filter {
    /// Elements with the given ids
    pub fn ids<I, S>(ids: I) -> Filter
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::Ids(ids.into_iter().map(Into::into).collect())
    }

    /// Elements with the given id
    pub fn id(id: impl Into<String>) -> Filter {
        Filter::Ids(vec![id.into()])
    }

    /// Elements of the given kind
    pub fn entity_type(entity_type: EntityType) -> Filter {
        Filter::Types(vec![entity_type])
    }

    /// The element at `path`
    pub fn path(path: CanonicalPath) -> Filter {
        Filter::CanonicalPaths(vec![path])
    }

    /// Elements whose `property` equals `value`
    pub fn property(property: impl Into<String>, value: serde_json::Value) -> Filter {
        Filter::PropertyValues {
            property: property.into(),
            values: vec![value],
        }
    }

    /// Hop along `relationship` from source to target
    pub fn by(relationship: impl AsRef<str>) -> Filter {
        Filter::Related {
            relationship: relationship.as_ref().to_string(),
            role: EntityRole::Target,
            other: None,
        }
    }

    /// Hop along `relationship` from target to source
    pub fn by_incoming(relationship: impl AsRef<str>) -> Filter {
        Filter::Related {
            relationship: relationship.as_ref().to_string(),
            role: EntityRole::Source,
            other: None,
        }
    }

    /// Hop along `contains`
    pub fn contained() -> Filter {
        Filter::by(WellKnown::Contains)
    }

    /// Elements targeted by `relationship` from `source`
    pub fn target_of(relationship: impl AsRef<str>, source: CanonicalPath) -> Filter {
        Filter::Related {
            relationship: relationship.as_ref().to_string(),
            role: EntityRole::Target,
            other: Some(source),
        }
    }

    /// Elements with a `relationship` edge to `target`
    pub fn source_of(relationship: impl AsRef<str>, target: CanonicalPath) -> Filter {
        Filter::Related {
            relationship: relationship.as_ref().to_string(),
            role: EntityRole::Source,
            other: Some(target),
        }
    }

    /// Relationships with the given name
    pub fn named(name: impl Into<String>) -> Filter {
        Filter::RelationshipNames(vec![name.into()])
    }

    /// From vertices to their edges in `direction`
    pub fn to_edges(direction: Direction) -> Filter {
        Filter::SwitchElementType {
            direction,
            from_edges: false,
        }
    }

    /// From edges to their endpoints in `direction`
    pub fn to_vertices(direction: Direction) -> Filter {
        Filter::SwitchElementType {
            direction,
            from_edges: true,
        }
    }

    /// True for the filters that move to other elements when used as a path
    pub fn is_hop(&self) -> bool {
        matches!(self, Filter::Related { .. } | Filter::SwitchElementType { .. })
    }
}

fn join<T: fmt::Display>(items: &[T], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Ids(ids) => {
                f.write_str("ids[")?;
                join(ids, f)?;
                f.write_str("]")
            }
            Filter::Types(types) => {
                f.write_str("types[")?;
                join(types, f)?;
                f.write_str("]")
            }
            Filter::CanonicalPaths(paths) => {
                f.write_str("paths[")?;
                join(paths, f)?;
                f.write_str("]")
            }
            Filter::RelativePaths { origin, paths } => {
                write!(f, "paths@{}[", origin)?;
                join(paths, f)?;
                f.write_str("]")
            }
            Filter::PropertyValues { property, values } => {
                write!(f, "{}=[", property)?;
                join(values, f)?;
                f.write_str("]")
            }
            Filter::Related {
                relationship,
                role,
                other,
            } => {
                let arrow = match role {
                    EntityRole::Target => "-[",
                    EntityRole::Source => "<-[",
                };
                write!(f, "{}{}]", arrow, relationship)?;
                if let Some(other) = other {
                    write!(f, "({})", other)?;
                }
                Ok(())
            }
            Filter::RelationshipNames(names) => {
                f.write_str("named[")?;
                join(names, f)?;
                f.write_str("]")
            }
            Filter::SwitchElementType {
                direction,
                from_edges,
            } => {
                let to = if *from_edges { "vertices" } else { "edges" };
                write!(f, "{}({:?})", to, direction)
            }
        }
    }
}
