//! Incremental path construction
//!
//! An [`Extender`] either starts from nothing, continues after an existing
//! path, or *replays* segments against an origin path. While the appended
//! segments agree with the shared backing sequence the extender only moves
//! its window end; the first disagreement switches it to an owned copy.
//!
//! Replay rules on the first disagreement with the origin:
//!
//! | Position | Segment | Outcome |
//! |----------|---------|---------|
//! | 0 | relationship | origin discarded, path restarts at the relationship |
//! | 0 | anything else | full append: the segments are put under the origin |
//! | inside the origin | any | `InvalidPath` |
//! | past the origin | any | copy and append |

use super::{CanonicalPath, RelativePath, Segment, SegmentType, Window};
use crate::error::{Error, Result};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Canonical,
    Relative,
}

/// Builder for canonical and relative paths
#[derive(Clone)]
pub struct Extender {
    kind: Kind,
    backing: Arc<Vec<Segment>>,
    start: usize,
    // end of the constructed window while sharing `backing`
    end: usize,
    // end of the origin being replayed; appending past it never fails
    origin_end: usize,
    owned: Option<Vec<Segment>>,
}

impl Extender {
    /// Start a new canonical path from nothing
    pub fn canonical() -> Self {
        Extender::fresh(Kind::Canonical)
    }

    /// Start a new relative path from nothing
    pub fn relative() -> Self {
        Extender::fresh(Kind::Relative)
    }

    fn fresh(kind: Kind) -> Self {
        Extender {
            kind,
            backing: Arc::new(Vec::new()),
            start: 0,
            end: 0,
            origin_end: 0,
            owned: Some(Vec::new()),
        }
    }

    /// Continue after the last segment of `path`
    pub fn appending(path: &CanonicalPath) -> Self {
        let window = path.window();
        Extender {
            kind: Kind::Canonical,
            backing: Arc::clone(&window.backing),
            start: window.start,
            end: window.end.max(window.start),
            origin_end: window.end.max(window.start),
            owned: None,
        }
    }

    /// Continue after the last segment of a relative path
    pub fn appending_relative(path: &RelativePath) -> Self {
        let window = path.window();
        Extender {
            kind: Kind::Relative,
            backing: Arc::clone(&window.backing),
            start: window.start,
            end: window.end.max(window.start),
            origin_end: window.end.max(window.start),
            owned: None,
        }
    }

    /// Replay segments from the root against `origin`
    pub fn replaying(origin: &CanonicalPath) -> Self {
        let window = origin.window();
        Extender {
            kind: Kind::Canonical,
            backing: Arc::clone(&window.backing),
            start: window.start,
            end: window.start,
            origin_end: window.end.max(window.start),
            owned: None,
        }
    }

    /// Number of segments constructed so far
    pub fn len(&self) -> usize {
        match &self.owned {
            Some(v) => v.len(),
            None => self.end - self.start,
        }
    }

    /// True if nothing has been constructed yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True while the result still shares memory with the origin
    pub fn is_sharing(&self) -> bool {
        self.owned.is_none()
    }

    fn last_type(&self) -> Option<SegmentType> {
        match &self.owned {
            Some(v) => v.last().map(Segment::segment_type),
            None if self.end > self.start => Some(self.backing[self.end - 1].segment_type()),
            None => None,
        }
    }

    fn origin_segments(&self) -> &[Segment] {
        &self.backing[self.start..self.origin_end]
    }

    fn check(kind: Kind, previous: Option<SegmentType>, segment: &Segment) -> Result<()> {
        match kind {
            Kind::Canonical => {
                if SegmentType::can_follow(previous, segment.segment_type()) {
                    Ok(())
                } else {
                    Err(Error::invalid_path(match previous {
                        Some(p) => format!(
                            "segment type '{}' cannot follow '{}'",
                            segment.segment_type(),
                            p
                        ),
                        None => format!(
                            "canonical path cannot start with segment type '{}'",
                            segment.segment_type()
                        ),
                    }))
                }
            }
            Kind::Relative => match previous {
                Some(p) if segment.is_up() && p != SegmentType::Up => Err(Error::invalid_path(
                    "'..' may only appear at the beginning of a relative path",
                )),
                _ => Ok(()),
            },
        }
    }

    /// Append one segment
    ///
    /// # Errors
    ///
    /// `InvalidPath` when the progression table forbids the segment, or when
    /// a replayed segment diverges from the origin mid-path.
    pub fn extend(mut self, segment_type: SegmentType, id: impl Into<String>) -> Result<Self> {
        self.push(Segment::new(segment_type, id))?;
        Ok(self)
    }

    /// Append a sequence of segments
    pub fn extend_all<I>(mut self, segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = Segment>,
    {
        for segment in segments {
            self.push(segment)?;
        }
        Ok(self)
    }

    /// Append one segment in place
    pub fn push(&mut self, segment: Segment) -> Result<()> {
        let kind = self.kind;
        if let Some(owned) = &mut self.owned {
            let previous = owned.last().map(Segment::segment_type);
            Self::check(kind, previous, &segment)?;
            owned.push(segment);
            return Ok(());
        }

        let position = self.end - self.start;
        if self.end < self.backing.len() && self.backing[self.end] == segment {
            Self::check(kind, self.last_type(), &segment)?;
            self.end += 1;
            return Ok(());
        }

        if position == 0 && self.origin_end > self.start {
            if segment.segment_type() == SegmentType::Relationship {
                Self::check(kind, None, &segment)?;
                self.owned = Some(vec![segment]);
            } else {
                let origin = self.origin_segments().to_vec();
                let previous = origin.last().map(Segment::segment_type);
                Self::check(kind, previous, &segment)?;
                let mut owned = origin;
                owned.push(segment);
                self.owned = Some(owned);
            }
            return Ok(());
        }

        if self.end < self.origin_end {
            return Err(Error::invalid_path(format!(
                "segment '{}' diverges from origin segment '{}' at position {}",
                segment, self.backing[self.end], position
            )));
        }

        Self::check(kind, self.last_type(), &segment)?;
        let mut owned = self.backing[self.start..self.end].to_vec();
        owned.push(segment);
        self.owned = Some(owned);
        Ok(())
    }

    fn into_window(self) -> Window {
        match self.owned {
            Some(segments) => Window::new(segments),
            None => Window {
                backing: self.backing,
                start: self.start,
                end: self.end,
            },
        }
    }

    /// Finish a canonical path
    ///
    /// # Errors
    ///
    /// `InvalidPath` if nothing was appended or this is a relative extender.
    pub fn get(self) -> Result<CanonicalPath> {
        if self.kind != Kind::Canonical {
            return Err(Error::invalid_path("relative extender cannot produce a canonical path"));
        }
        if self.is_empty() {
            return Err(Error::invalid_path("canonical path must have at least one segment"));
        }
        Ok(CanonicalPath::from_window(self.into_window()))
    }

    /// Finish a relative path (may be empty)
    pub fn get_relative(self) -> Result<RelativePath> {
        if self.kind != Kind::Relative {
            return Err(Error::invalid_path("canonical extender cannot produce a relative path"));
        }
        Ok(RelativePath::from_window(self.into_window()))
    }
}
