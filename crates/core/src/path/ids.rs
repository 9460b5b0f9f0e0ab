//! Positional id extraction from canonical paths

use super::{CanonicalPath, Extender, RelativePath, Segment, SegmentType};

/// Typed view of the ids along a canonical path
///
/// ```
/// use trellis_core::path::CanonicalPath;
///
/// let p: CanonicalPath = "/t;acme/e;prod/r;host/r;nic/m;rx".parse().unwrap();
/// let ids = p.ids();
/// assert_eq!(ids.tenant_id(), Some("acme"));
/// assert_eq!(ids.environment_id(), Some("prod"));
/// assert_eq!(ids.resource_id(), Some("nic"));
/// assert_eq!(ids.resource_path().unwrap().to_string(), "r;host/r;nic");
/// assert_eq!(ids.metric_id(), Some("rx"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Ids<'a> {
    path: &'a CanonicalPath,
}

impl<'a> Ids<'a> {
    pub(crate) fn new(path: &'a CanonicalPath) -> Self {
        Ids { path }
    }

    fn first_of(&self, segment_type: SegmentType) -> Option<&'a str> {
        self.path
            .segments()
            .iter()
            .find(|s| s.segment_type() == segment_type)
            .map(Segment::id)
    }

    /// Tenant id; the root of every non-relationship path
    pub fn tenant_id(&self) -> Option<&'a str> {
        self.path
            .segments()
            .first()
            .filter(|s| s.segment_type() == SegmentType::Tenant)
            .map(Segment::id)
    }

    /// Environment id
    pub fn environment_id(&self) -> Option<&'a str> {
        self.first_of(SegmentType::Environment)
    }

    /// Feed id
    pub fn feed_id(&self) -> Option<&'a str> {
        self.first_of(SegmentType::Feed)
    }

    /// Resource type id
    pub fn resource_type_id(&self) -> Option<&'a str> {
        self.first_of(SegmentType::ResourceType)
    }

    /// Metric type id
    pub fn metric_type_id(&self) -> Option<&'a str> {
        self.first_of(SegmentType::MetricType)
    }

    /// Metric id
    pub fn metric_id(&self) -> Option<&'a str> {
        self.first_of(SegmentType::Metric)
    }

    /// Operation type id
    pub fn operation_type_id(&self) -> Option<&'a str> {
        self.first_of(SegmentType::OperationType)
    }

    /// Metadata pack id
    pub fn metadata_pack_id(&self) -> Option<&'a str> {
        self.first_of(SegmentType::MetadataPack)
    }

    /// Relationship id
    pub fn relationship_id(&self) -> Option<&'a str> {
        self.first_of(SegmentType::Relationship)
    }

    /// Data entity role
    pub fn data_role(&self) -> Option<&'a str> {
        self.first_of(SegmentType::DataEntity)
    }

    /// Id of the innermost resource
    pub fn resource_id(&self) -> Option<&'a str> {
        self.path
            .segments()
            .iter()
            .rev()
            .find(|s| s.segment_type() == SegmentType::Resource)
            .map(Segment::id)
    }

    /// The chain of nested resources, e.g. `r;host/r;nic`
    pub fn resource_path(&self) -> Option<RelativePath> {
        let resources: Vec<Segment> = self
            .path
            .segments()
            .iter()
            .filter(|s| s.segment_type() == SegmentType::Resource)
            .cloned()
            .collect();
        if resources.is_empty() {
            return None;
        }
        Extender::relative()
            .extend_all(resources)
            .and_then(Extender::get_relative)
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_scoped_ids() {
        let p: CanonicalPath = "/t;a/f;f1/rt;linux/ot;start".parse().unwrap();
        let ids = p.ids();
        assert_eq!(ids.tenant_id(), Some("a"));
        assert_eq!(ids.feed_id(), Some("f1"));
        assert_eq!(ids.environment_id(), None);
        assert_eq!(ids.resource_type_id(), Some("linux"));
        assert_eq!(ids.operation_type_id(), Some("start"));
        assert!(ids.resource_path().is_none());
    }

    #[test]
    fn test_relationship_ids() {
        let p = CanonicalPath::of_relationship("abc");
        assert_eq!(p.ids().relationship_id(), Some("abc"));
        assert_eq!(p.ids().tenant_id(), None);
    }

    #[test]
    fn test_data_role() {
        let p: CanonicalPath = "/t;a/rt;x/d;configuration".parse().unwrap();
        assert_eq!(p.ids().data_role(), Some("configuration"));
        assert_eq!(p.ids().metadata_pack_id(), None);
    }
}
