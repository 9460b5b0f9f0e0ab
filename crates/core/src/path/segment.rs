//! Segment types, path segments and the valid-progression table
//!
//! Every step of a path is a [`Segment`]: a typed id. Which segment types may
//! follow each other in a canonical path is fixed by the progression table:
//!
//! | After | Allowed |
//! |-------|---------|
//! | (start) | tenant, relationship |
//! | tenant | environment, feed, resource type, metric type, metadata pack |
//! | environment | resource, metric |
//! | feed | resource, metric, resource type, metric type |
//! | resource | resource, metric, data entity |
//! | resource type | operation type, data entity |
//! | operation type | data entity |
//! | data entity, structured data | structured data |
//!
//! `Up` never appears in canonical paths.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

/// The typed tag of one path step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SegmentType {
    /// Tenant (`t`)
    Tenant,
    /// Environment (`e`)
    Environment,
    /// Feed (`f`)
    Feed,
    /// Resource type (`rt`)
    ResourceType,
    /// Metric type (`mt`)
    MetricType,
    /// Resource (`r`)
    Resource,
    /// Metric (`m`)
    Metric,
    /// Operation type (`ot`)
    OperationType,
    /// Data entity (`d`)
    DataEntity,
    /// Key inside a data entity's structured value (`sd`)
    StructuredData,
    /// Metadata pack (`mp`)
    MetadataPack,
    /// Relationship (`rl`)
    Relationship,
    /// Relative-path-only step to the parent (`..`)
    Up,
}

impl SegmentType {
    /// All segment types (for iteration)
    pub const ALL: [SegmentType; 13] = [
        SegmentType::Tenant,
        SegmentType::Environment,
        SegmentType::Feed,
        SegmentType::ResourceType,
        SegmentType::MetricType,
        SegmentType::Resource,
        SegmentType::Metric,
        SegmentType::OperationType,
        SegmentType::DataEntity,
        SegmentType::StructuredData,
        SegmentType::MetadataPack,
        SegmentType::Relationship,
        SegmentType::Up,
    ];

    /// Short serialized name
    pub const fn serial(&self) -> &'static str {
        match self {
            SegmentType::Tenant => "t",
            SegmentType::Environment => "e",
            SegmentType::Feed => "f",
            SegmentType::ResourceType => "rt",
            SegmentType::MetricType => "mt",
            SegmentType::Resource => "r",
            SegmentType::Metric => "m",
            SegmentType::OperationType => "ot",
            SegmentType::DataEntity => "d",
            SegmentType::StructuredData => "sd",
            SegmentType::MetadataPack => "mp",
            SegmentType::Relationship => "rl",
            SegmentType::Up => "..",
        }
    }

    /// Parse from the short serialized name
    pub fn from_serial(serial: &str) -> Option<Self> {
        SegmentType::ALL
            .iter()
            .copied()
            .find(|t| t.serial() == serial)
    }

    /// Segment types legally following `previous` in a canonical path.
    ///
    /// `None` is the start of the path.
    pub fn valid_successors(previous: Option<SegmentType>) -> &'static [SegmentType] {
        PROGRESSIONS
            .get(&previous)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `next` may directly follow `previous` in a canonical path
    pub fn can_follow(previous: Option<SegmentType>, next: SegmentType) -> bool {
        SegmentType::valid_successors(previous).contains(&next)
    }

    /// Whether `target` is reachable from `self` by zero or more progressions
    pub fn can_reach(self, target: SegmentType) -> bool {
        REACHABILITY
            .get(&self)
            .map(|reachable| reachable.contains(&target))
            .unwrap_or(false)
    }
}

impl fmt::Display for SegmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.serial())
    }
}

static PROGRESSIONS: Lazy<HashMap<Option<SegmentType>, Vec<SegmentType>>> = Lazy::new(|| {
    use SegmentType::*;

    let mut table = HashMap::new();
    table.insert(None, vec![Tenant, Relationship]);
    table.insert(
        Some(Tenant),
        vec![Environment, MetricType, ResourceType, Feed, MetadataPack],
    );
    table.insert(Some(Environment), vec![Resource, Metric]);
    table.insert(Some(Feed), vec![Resource, Metric, ResourceType, MetricType]);
    table.insert(Some(Resource), vec![Resource, Metric, DataEntity]);
    table.insert(Some(ResourceType), vec![OperationType, DataEntity]);
    table.insert(Some(OperationType), vec![DataEntity]);
    table.insert(Some(DataEntity), vec![StructuredData]);
    table.insert(Some(StructuredData), vec![StructuredData]);
    table.insert(Some(Metric), vec![]);
    table.insert(Some(MetricType), vec![]);
    table.insert(Some(MetadataPack), vec![]);
    table.insert(Some(Relationship), vec![]);
    table
});

// reflexive-transitive closure of the progression table
static REACHABILITY: Lazy<HashMap<SegmentType, HashSet<SegmentType>>> = Lazy::new(|| {
    SegmentType::ALL
        .iter()
        .map(|&start| {
            let mut seen = HashSet::from([start]);
            let mut queue = VecDeque::from([start]);
            while let Some(current) = queue.pop_front() {
                for &next in SegmentType::valid_successors(Some(current)) {
                    if seen.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
            (start, seen)
        })
        .collect()
});

/// One step of a path: a segment type and an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Segment {
    segment_type: SegmentType,
    id: String,
}

impl Segment {
    /// Create a new segment
    pub fn new(segment_type: SegmentType, id: impl Into<String>) -> Self {
        Segment {
            segment_type,
            id: id.into(),
        }
    }

    /// The `..` segment of relative paths
    pub fn up() -> Self {
        Segment::new(SegmentType::Up, "")
    }

    /// Segment type
    pub fn segment_type(&self) -> SegmentType {
        self.segment_type
    }

    /// Segment id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// True if this is an `Up` segment
    pub fn is_up(&self) -> bool {
        self.segment_type == SegmentType::Up
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_up() {
            return f.write_str("..");
        }
        write!(
            f,
            "{};{}",
            self.segment_type.serial(),
            super::codec::encode(&self.id)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_round_trip() {
        for t in SegmentType::ALL {
            assert_eq!(SegmentType::from_serial(t.serial()), Some(t));
        }
        assert_eq!(SegmentType::from_serial("x"), None);
    }

    #[test]
    fn test_start_allows_tenant_and_relationship_only() {
        assert!(SegmentType::can_follow(None, SegmentType::Tenant));
        assert!(SegmentType::can_follow(None, SegmentType::Relationship));
        assert!(!SegmentType::can_follow(None, SegmentType::Environment));
        assert!(!SegmentType::can_follow(None, SegmentType::Up));
    }

    #[test]
    fn test_tenant_progressions() {
        let t = Some(SegmentType::Tenant);
        assert!(SegmentType::can_follow(t, SegmentType::Environment));
        assert!(SegmentType::can_follow(t, SegmentType::Feed));
        assert!(SegmentType::can_follow(t, SegmentType::ResourceType));
        assert!(SegmentType::can_follow(t, SegmentType::MetricType));
        assert!(!SegmentType::can_follow(t, SegmentType::Resource));
        assert!(!SegmentType::can_follow(t, SegmentType::Metric));
    }

    #[test]
    fn test_leaves_have_no_successors() {
        assert!(SegmentType::valid_successors(Some(SegmentType::Relationship)).is_empty());
        assert!(SegmentType::valid_successors(Some(SegmentType::Metric)).is_empty());
        assert!(SegmentType::valid_successors(Some(SegmentType::Up)).is_empty());
        assert_eq!(
            SegmentType::valid_successors(Some(SegmentType::StructuredData)),
            &[SegmentType::StructuredData]
        );
    }

    #[test]
    fn test_reachability() {
        assert!(SegmentType::Tenant.can_reach(SegmentType::Resource));
        assert!(SegmentType::Resource.can_reach(SegmentType::Resource));
        assert!(SegmentType::Feed.can_reach(SegmentType::DataEntity));
        assert!(!SegmentType::MetricType.can_reach(SegmentType::Resource));
        assert!(!SegmentType::ResourceType.can_reach(SegmentType::Resource));
    }

    #[test]
    fn test_segment_display_escapes_id() {
        assert_eq!(Segment::new(SegmentType::Tenant, "a b").to_string(), "t;a%20b");
        assert_eq!(Segment::up().to_string(), "..");
    }
}
