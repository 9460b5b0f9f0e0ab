//! Relationships between entities

use super::Properties;
use crate::path::CanonicalPath;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relationship names with engine-enforced semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WellKnown {
    /// The containment tree; only created and deleted with entities
    Contains,
    /// From a type entity to its instances
    Defines,
    /// Membership without containment (`owns` is an alias)
    Incorporates,
    /// Resource hierarchy that may go beyond containment
    IsParentOf,
}

impl WellKnown {
    /// All well-known relationships
    pub const ALL: [WellKnown; 4] = [
        WellKnown::Contains,
        WellKnown::Defines,
        WellKnown::Incorporates,
        WellKnown::IsParentOf,
    ];

    /// Relationship name as stored
    pub const fn name(&self) -> &'static str {
        match self {
            WellKnown::Contains => "contains",
            WellKnown::Defines => "defines",
            WellKnown::Incorporates => "incorporates",
            WellKnown::IsParentOf => "isParentOf",
        }
    }

    /// Parse a stored name; `owns` resolves to [`WellKnown::Incorporates`]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "contains" => Some(WellKnown::Contains),
            "defines" => Some(WellKnown::Defines),
            "incorporates" | "owns" => Some(WellKnown::Incorporates),
            "isParentOf" => Some(WellKnown::IsParentOf),
            _ => None,
        }
    }
}

impl fmt::Display for WellKnown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl AsRef<str> for WellKnown {
    fn as_ref(&self) -> &str {
        self.name()
    }
}

/// Direction of an edge relative to an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// The entity is the source
    Outgoing,
    /// The entity is the target
    Incoming,
    /// Either
    Both,
}

impl Direction {
    /// The reverse direction; `Both` stays `Both`
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Outgoing => Direction::Incoming,
            Direction::Incoming => Direction::Outgoing,
            Direction::Both => Direction::Both,
        }
    }
}

/// Role of an entity at one end of a relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRole {
    /// The entity the edge goes out from
    Source,
    /// The entity the edge points to
    Target,
}

impl EntityRole {
    /// The other end
    pub fn opposite(self) -> EntityRole {
        match self {
            EntityRole::Source => EntityRole::Target,
            EntityRole::Target => EntityRole::Source,
        }
    }

    /// Direction in which an entity in this role sees the edge
    pub fn direction(self) -> Direction {
        match self {
            EntityRole::Source => Direction::Outgoing,
            EntityRole::Target => Direction::Incoming,
        }
    }
}

/// A named, directed edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// `/rl;<id>`
    pub path: CanonicalPath,
    /// Relationship name
    pub name: String,
    /// Source entity
    pub source: CanonicalPath,
    /// Target entity
    pub target: CanonicalPath,
    /// Free-form properties
    pub properties: Properties,
}

impl Relationship {
    /// New relationship with no properties
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        source: CanonicalPath,
        target: CanonicalPath,
    ) -> Self {
        Relationship {
            path: CanonicalPath::of_relationship(id),
            name: name.into(),
            source,
            target,
            properties: Properties::new(),
        }
    }

    /// Relationship id
    pub fn id(&self) -> &str {
        self.path.id().unwrap_or_default()
    }

    /// True if this is the given well-known relationship
    pub fn is(&self, well_known: WellKnown) -> bool {
        WellKnown::from_name(&self.name) == Some(well_known)
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -[{}]-> {}", self.source, self.name, self.target)
    }
}
