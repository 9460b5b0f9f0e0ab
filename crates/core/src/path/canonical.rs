//! Canonical (absolute) paths

use super::{
    inference::{self, TypeProvider},
    join_segments, parse_token, Extender, Ids, RelativePath, Segment, SegmentType, Window,
};
use crate::error::{Error, Result};
use crate::model::EntityType;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Absolute address of an entity
///
/// The root segment is always a tenant or a relationship, and every
/// following segment obeys the progression table. Cloning, [`up`](Self::up)
/// and [`down`](Self::down) never copy segments.
#[derive(Clone)]
pub struct CanonicalPath {
    window: Window,
}

impl CanonicalPath {
    pub(crate) fn from_window(window: Window) -> Self {
        CanonicalPath { window }
    }

    pub(crate) fn window(&self) -> &Window {
        &self.window
    }

    /// Start building a path from nothing
    pub fn empty() -> Extender {
        Extender::canonical()
    }

    /// Path of a tenant
    pub fn of_tenant(id: impl Into<String>) -> CanonicalPath {
        CanonicalPath::from_window(Window::new(vec![Segment::new(SegmentType::Tenant, id)]))
    }

    /// Path of a relationship
    pub fn of_relationship(id: impl Into<String>) -> CanonicalPath {
        CanonicalPath::from_window(Window::new(vec![Segment::new(
            SegmentType::Relationship,
            id,
        )]))
    }

    /// Build from a list of segments, validating progressions
    pub fn from_segments<I>(segments: I) -> Result<CanonicalPath>
    where
        I: IntoIterator<Item = Segment>,
    {
        Extender::canonical().extend_all(segments)?.get()
    }

    /// Append a segment
    ///
    /// # Errors
    ///
    /// `InvalidPath` if `segment_type` may not follow the current terminal type.
    pub fn extend(&self, segment_type: SegmentType, id: impl Into<String>) -> Result<CanonicalPath> {
        Extender::appending(self).extend(segment_type, id)?.get()
    }

    /// Continue building after this path
    pub fn modified(&self) -> Extender {
        Extender::appending(self)
    }

    /// Replay segments from the root against this path
    pub fn replay(&self) -> Extender {
        Extender::replaying(self)
    }

    /// True if the window is non-empty
    pub fn is_defined(&self) -> bool {
        self.window.is_defined()
    }

    /// Segments in this path, root first
    pub fn segments(&self) -> &[Segment] {
        self.window.segments()
    }

    /// Iterate segments, root first
    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments().iter()
    }

    /// Number of segments
    pub fn depth(&self) -> usize {
        self.segments().len()
    }

    /// Terminal segment; `None` when undefined
    pub fn segment(&self) -> Option<&Segment> {
        self.window.last()
    }

    /// Terminal segment type; `None` when undefined
    pub fn segment_type(&self) -> Option<SegmentType> {
        self.segment().map(Segment::segment_type)
    }

    /// Entity type addressed by this path; `None` when undefined or when the
    /// terminal segment is structured data
    pub fn entity_type(&self) -> Option<EntityType> {
        self.segment_type().and_then(EntityType::from_segment_type)
    }

    /// Id of the terminal segment; `None` when undefined
    pub fn id(&self) -> Option<&str> {
        self.segment().map(Segment::id)
    }

    /// Path with the last segment removed; may be undefined
    pub fn up(&self) -> CanonicalPath {
        self.up_n(1)
    }

    /// Path with the last `n` segments removed; may be undefined
    pub fn up_n(&self, n: usize) -> CanonicalPath {
        CanonicalPath::from_window(self.window.up(n))
    }

    /// Path one segment deeper along the shared sequence; may be undefined
    pub fn down(&self) -> CanonicalPath {
        self.down_n(1)
    }

    /// Path `n` segments deeper along the shared sequence; may be undefined
    pub fn down_n(&self, n: usize) -> CanonicalPath {
        CanonicalPath::from_window(self.window.down(n))
    }

    /// Defined parent path, `None` for roots
    pub fn parent(&self) -> Option<CanonicalPath> {
        let up = self.up();
        up.is_defined().then_some(up)
    }

    /// The root segment as a path
    pub fn root(&self) -> CanonicalPath {
        self.up_n(self.depth().saturating_sub(1))
    }

    /// Strict ancestor check by segment equality
    pub fn is_parent_of(&self, other: &CanonicalPath) -> bool {
        let mine = self.segments();
        let theirs = other.segments();
        !mine.is_empty() && mine.len() < theirs.len() && theirs.starts_with(mine)
    }

    /// True if both paths are windows into the same segment sequence
    pub fn shares_memory_with(&self, other: &CanonicalPath) -> bool {
        self.window.shares_backing_with(&other.window)
    }

    /// Positional id extraction
    pub fn ids(&self) -> Ids<'_> {
        Ids::new(self)
    }

    /// Express this path relative to `origin`
    pub fn to_relative_from(&self, origin: &CanonicalPath) -> Result<RelativePath> {
        let mine = self.segments();
        let theirs = origin.segments();
        let common = mine
            .iter()
            .zip(theirs.iter())
            .take_while(|(a, b)| a == b)
            .count();
        let ups = (0..theirs.len() - common).map(|_| Segment::up());
        Extender::relative()
            .extend_all(ups.chain(mine[common..].iter().cloned()))?
            .get_relative()
    }

    /// Parse a path whose segments may omit their type tags
    ///
    /// Missing types are deduced by `provider`; see [`TypeProvider`].
    pub fn from_partial_str(s: &str, provider: &mut dyn TypeProvider) -> Result<CanonicalPath> {
        let body = s
            .strip_prefix('/')
            .ok_or_else(|| Error::invalid_path(format!("canonical path must start with '/': '{}'", s)))?;
        if body.is_empty() {
            return Err(Error::invalid_path("canonical path must have at least one segment"));
        }

        let tokens: Vec<&str> = body.split('/').collect();
        let mut extender = Extender::canonical();
        let mut previous: Option<SegmentType> = None;
        for (i, token) in tokens.iter().enumerate() {
            let (explicit, id) = parse_token(token)?;
            let is_last = i + 1 == tokens.len();
            let segment_type = match explicit {
                Some(t) => t,
                None => provider.deduce(s, previous, &id, is_last)?,
            };
            extender.push(Segment::new(segment_type, id))?;
            previous = Some(segment_type);
        }
        extender.get()
    }

    /// Parse a path whose untyped segments are deduced from the intended
    /// final entity type
    pub fn from_partial_str_with_intent(
        s: &str,
        intended_final: Option<SegmentType>,
    ) -> Result<CanonicalPath> {
        let mut provider = inference::IntendedTypeProvider::new(intended_final);
        CanonicalPath::from_partial_str(s, &mut provider)
    }
}

struct StrictProvider;

impl TypeProvider for StrictProvider {
    fn deduce(
        &mut self,
        path: &str,
        _previous: Option<SegmentType>,
        id: &str,
        _is_last: bool,
    ) -> Result<SegmentType> {
        Err(Error::invalid_path(format!(
            "segment '{}' of '{}' has no type",
            id, path
        )))
    }
}

impl FromStr for CanonicalPath {
    type Err = Error;

    /// Parse the fully typed string form (`/t;a/e;b`)
    fn from_str(s: &str) -> Result<Self> {
        CanonicalPath::from_partial_str(s, &mut StrictProvider)
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("/")?;
        join_segments(self.segments(), f)
    }
}

impl fmt::Debug for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_defined() {
            write!(f, "CanonicalPath({})", self)
        } else {
            f.write_str("CanonicalPath(<undefined>)")
        }
    }
}

impl PartialEq for CanonicalPath {
    fn eq(&self, other: &Self) -> bool {
        self.segments() == other.segments()
    }
}

impl Eq for CanonicalPath {}

impl Hash for CanonicalPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.segments().hash(state);
    }
}

impl PartialOrd for CanonicalPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CanonicalPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.segments().cmp(other.segments())
    }
}

impl<'a> IntoIterator for &'a CanonicalPath {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for CanonicalPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CanonicalPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
