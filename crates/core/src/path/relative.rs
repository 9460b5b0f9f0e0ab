//! Relative paths

use super::{join_segments, parse_token, CanonicalPath, Extender, Segment, Window};
use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Path resolved against an origin
///
/// Any number of `..` segments may lead the path; after them the segments are
/// not validated until the path is applied to a canonical origin.
#[derive(Clone)]
pub struct RelativePath {
    window: Window,
}

impl RelativePath {
    pub(crate) fn from_window(window: Window) -> Self {
        RelativePath { window }
    }

    pub(crate) fn window(&self) -> &Window {
        &self.window
    }

    /// Start building a relative path
    pub fn empty() -> Extender {
        Extender::relative()
    }

    /// Continue building after this path
    pub fn modified(&self) -> Extender {
        Extender::appending_relative(self)
    }

    /// Segments, `..` included
    pub fn segments(&self) -> &[Segment] {
        self.window.segments()
    }

    /// True if the window is non-empty
    pub fn is_defined(&self) -> bool {
        self.window.is_defined()
    }

    /// Number of leading `..` segments
    pub fn up_count(&self) -> usize {
        self.segments().iter().take_while(|s| s.is_up()).count()
    }

    /// Terminal segment
    pub fn segment(&self) -> Option<&Segment> {
        self.window.last()
    }

    /// Drop the last segment
    pub fn up(&self) -> RelativePath {
        RelativePath::from_window(self.window.up(1))
    }

    /// Re-admit the next segment of the shared sequence
    pub fn down(&self) -> RelativePath {
        RelativePath::from_window(self.window.down(1))
    }

    /// Resolve against `origin`
    ///
    /// # Errors
    ///
    /// `InvalidPath` if the path climbs above the root of `origin` or the
    /// resulting segments violate the progression table.
    pub fn apply_to(&self, origin: &CanonicalPath) -> Result<CanonicalPath> {
        let ups = self.up_count();
        if ups > origin.depth() {
            return Err(Error::invalid_path(format!(
                "'{}' climbs above the root of '{}'",
                self, origin
            )));
        }
        let base = origin.up_n(ups);
        let extender = if base.is_defined() {
            Extender::appending(&base)
        } else {
            Extender::canonical()
        };
        extender
            .extend_all(self.segments()[ups..].iter().cloned())?
            .get()
    }
}

impl FromStr for RelativePath {
    type Err = Error;

    /// Parse `../../rt;x` style strings; the empty string is the empty path
    fn from_str(s: &str) -> Result<Self> {
        if s.starts_with('/') {
            return Err(Error::invalid_path(format!(
                "relative path must not start with '/': '{}'",
                s
            )));
        }
        let mut extender = Extender::relative();
        if s.is_empty() {
            return extender.get_relative();
        }
        for token in s.split('/') {
            if token == ".." {
                extender.push(Segment::up())?;
                continue;
            }
            match parse_token(token)? {
                (Some(segment_type), id) => extender.push(Segment::new(segment_type, id))?,
                (None, id) => {
                    return Err(Error::invalid_path(format!(
                        "segment '{}' of relative path '{}' has no type",
                        id, s
                    )))
                }
            }
        }
        extender.get_relative()
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        join_segments(self.segments(), f)
    }
}

impl fmt::Debug for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RelativePath({})", self)
    }
}

impl PartialEq for RelativePath {
    fn eq(&self, other: &Self) -> bool {
        self.segments() == other.segments()
    }
}

impl Eq for RelativePath {}

impl Hash for RelativePath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.segments().hash(state);
    }
}

impl Serialize for RelativePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RelativePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(s: &str) -> CanonicalPath {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let rel: RelativePath = "../../rt;x".parse().unwrap();
        assert_eq!(rel.up_count(), 2);
        assert_eq!(rel.to_string(), "../../rt;x");
        assert_eq!(rel.segment().unwrap().id(), "x");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!("/t;a".parse::<RelativePath>().is_err());
        assert!("r;a/..".parse::<RelativePath>().is_err());
        assert!("x".parse::<RelativePath>().is_err());
    }

    #[test]
    fn test_empty_relative_path_resolves_to_origin() {
        let rel: RelativePath = "".parse().unwrap();
        let origin = canonical("/t;a/e;b");
        assert_eq!(rel.apply_to(&origin).unwrap(), origin);
    }

    #[test]
    fn test_apply_to() {
        let origin = canonical("/t;a/e;b/r;c");
        let rel: RelativePath = "../m;cpu".parse().unwrap();
        assert_eq!(rel.apply_to(&origin).unwrap().to_string(), "/t;a/e;b/m;cpu");
    }

    #[test]
    fn test_apply_to_validates_result() {
        let origin = canonical("/t;a/e;b");
        let rel: RelativePath = "../r;x".parse().unwrap();
        assert!(matches!(rel.apply_to(&origin), Err(Error::InvalidPath { .. })));
    }

    #[test]
    fn test_apply_to_cannot_climb_above_root() {
        let origin = canonical("/t;a");
        let to_new_root: RelativePath = "../t;b".parse().unwrap();
        assert_eq!(to_new_root.apply_to(&origin).unwrap().to_string(), "/t;b");
        let too_far: RelativePath = "../../t;b".parse().unwrap();
        assert!(too_far.apply_to(&origin).is_err());
    }
}
