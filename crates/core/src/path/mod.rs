//! Path algebra
//!
//! Entities are addressed by typed hierarchical paths:
//!
//! ```text
//! /t;acme/e;prod/r;server-1/m;cpu      canonical (absolute)
//! ../rt;linux                          relative (resolved against an origin)
//! ```
//!
//! A path is a window `(start, end)` into a shared, immutable segment
//! sequence. [`CanonicalPath::up`] and [`CanonicalPath::down`] produce new
//! windows over the same sequence without copying, and the [`Extender`]
//! keeps sharing the sequence for as long as the appended segments agree
//! with it.
//!
//! A window with `start >= end` is *undefined*: check
//! [`CanonicalPath::is_defined`] before asking for its terminal segment.

mod canonical;
pub mod codec;
mod extender;
mod ids;
mod inference;
mod relative;
mod segment;

pub use canonical::CanonicalPath;
pub use extender::Extender;
pub use ids::Ids;
pub use inference::{IntendedTypeProvider, TypeProvider};
pub use relative::RelativePath;
pub use segment::{Segment, SegmentType};

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Either kind of path, as found in blueprints and path strings
///
/// A leading `/` selects the canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Path {
    /// Absolute path
    Canonical(CanonicalPath),
    /// Path relative to an implicit origin
    Relative(RelativePath),
}

impl Path {
    /// Resolve against `origin`; canonical paths are returned as they are.
    pub fn resolve(&self, origin: &CanonicalPath) -> Result<CanonicalPath> {
        match self {
            Path::Canonical(p) => Ok(p.clone()),
            Path::Relative(r) => r.apply_to(origin),
        }
    }

    /// Resolve a reference made by the entity at `path`
    ///
    /// Relative references start at the parent of `path`; a root entity can
    /// only make canonical references.
    pub fn resolve_for(&self, path: &CanonicalPath) -> Result<CanonicalPath> {
        match (self, path.parent()) {
            (Path::Canonical(p), _) => Ok(p.clone()),
            (Path::Relative(r), Some(parent)) => r.apply_to(&parent),
            (Path::Relative(r), None) => Err(Error::invalid_path(format!(
                "relative reference '{}' of root entity '{}'",
                r, path
            ))),
        }
    }

    /// True for the canonical variant
    pub fn is_canonical(&self) -> bool {
        matches!(self, Path::Canonical(_))
    }
}

impl FromStr for Path {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.starts_with('/') {
            s.parse().map(Path::Canonical)
        } else {
            s.parse().map(Path::Relative)
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Path::Canonical(p) => p.fmt(f),
            Path::Relative(p) => p.fmt(f),
        }
    }
}

impl From<CanonicalPath> for Path {
    fn from(p: CanonicalPath) -> Self {
        Path::Canonical(p)
    }
}

impl From<RelativePath> for Path {
    fn from(p: RelativePath) -> Self {
        Path::Relative(p)
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A `(start, end)` window into a shared segment sequence
#[derive(Clone)]
pub(crate) struct Window {
    pub(crate) backing: Arc<Vec<Segment>>,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

impl Window {
    pub(crate) fn new(segments: Vec<Segment>) -> Self {
        let end = segments.len();
        Window {
            backing: Arc::new(segments),
            start: 0,
            end,
        }
    }

    pub(crate) fn is_defined(&self) -> bool {
        self.start < self.end && self.end <= self.backing.len()
    }

    pub(crate) fn segments(&self) -> &[Segment] {
        if self.is_defined() {
            &self.backing[self.start..self.end]
        } else {
            &[]
        }
    }

    pub(crate) fn last(&self) -> Option<&Segment> {
        self.segments().last()
    }

    /// Drop `n` trailing segments; may become undefined
    pub(crate) fn up(&self, n: usize) -> Window {
        Window {
            backing: Arc::clone(&self.backing),
            start: self.start,
            end: self.end.saturating_sub(n).max(self.start),
        }
    }

    /// Re-admit `n` trailing segments of the backing sequence; may become undefined
    pub(crate) fn down(&self, n: usize) -> Window {
        let end = self.end + n;
        if end > self.backing.len() {
            Window {
                backing: Arc::clone(&self.backing),
                start: self.start,
                end: self.start,
            }
        } else {
            Window {
                backing: Arc::clone(&self.backing),
                start: self.start,
                end,
            }
        }
    }

    pub(crate) fn shares_backing_with(&self, other: &Window) -> bool {
        Arc::ptr_eq(&self.backing, &other.backing)
    }
}

pub(crate) fn join_segments(segments: &[Segment], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            f.write_str("/")?;
        }
        write!(f, "{}", segment)?;
    }
    Ok(())
}

/// Split one `type;id` token into its (optional) type and decoded id
pub(crate) fn parse_token(token: &str) -> Result<(Option<SegmentType>, String)> {
    if token.is_empty() {
        return Err(Error::invalid_path("empty path segment"));
    }
    match token.split_once(';') {
        Some((serial, id)) => {
            let segment_type = SegmentType::from_serial(serial)
                .filter(|t| *t != SegmentType::Up)
                .ok_or_else(|| Error::invalid_path(format!("unknown segment type '{}'", serial)))?;
            if id.contains(';') {
                return Err(Error::invalid_path(format!(
                    "unescaped ';' in segment '{}'",
                    token
                )));
            }
            Ok((Some(segment_type), codec::decode(id)?.into_owned()))
        }
        None => Ok((None, codec::decode(token)?.into_owned())),
    }
}
