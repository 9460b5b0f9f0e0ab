//! Deduction of segment types omitted from path strings
//!
//! `/t;acme/prod/web` is accepted when the caller says a resource is
//! intended: `prod` must be an environment or a feed, and since both lead to a
//! resource the deduction fails with `AmbiguousPath` unless the type is
//! spelled out.

use super::SegmentType;
use crate::error::{Error, Result};

/// Deduce the type of an untyped segment
pub trait TypeProvider {
    /// Type of the segment `id` following `previous` in `path`
    fn deduce(
        &mut self,
        path: &str,
        previous: Option<SegmentType>,
        id: &str,
        is_last: bool,
    ) -> Result<SegmentType>;
}

/// Deduces types from context and an intended final segment type
#[derive(Debug, Clone, Copy, Default)]
pub struct IntendedTypeProvider {
    intended: Option<SegmentType>,
}

impl IntendedTypeProvider {
    /// Provider aiming at `intended` (`None`: only unique successors are deduced)
    pub fn new(intended: Option<SegmentType>) -> Self {
        IntendedTypeProvider { intended }
    }

    // a route of at least one more step from `from` to `target`
    fn leads_to(from: SegmentType, target: SegmentType) -> bool {
        SegmentType::valid_successors(Some(from))
            .iter()
            .any(|next| next.can_reach(target))
    }
}

impl TypeProvider for IntendedTypeProvider {
    fn deduce(
        &mut self,
        path: &str,
        previous: Option<SegmentType>,
        id: &str,
        is_last: bool,
    ) -> Result<SegmentType> {
        if matches!(
            previous,
            Some(SegmentType::DataEntity) | Some(SegmentType::StructuredData)
        ) {
            return Ok(SegmentType::StructuredData);
        }

        let successors = SegmentType::valid_successors(previous);
        let candidates: Vec<SegmentType> = match self.intended {
            Some(target) if is_last && successors.contains(&target) => return Ok(target),
            Some(target) if is_last => {
                return Err(Error::invalid_path(format!(
                    "'{}' ends '{}' but cannot be a {}",
                    id,
                    path,
                    target.serial()
                )))
            }
            Some(target) => successors
                .iter()
                .copied()
                .filter(|&s| IntendedTypeProvider::leads_to(s, target))
                .collect(),
            None => successors.to_vec(),
        };

        match candidates.as_slice() {
            [single] => Ok(*single),
            [] => Err(Error::invalid_path(format!(
                "no segment type for '{}' in '{}' leads to {}",
                id,
                path,
                self.intended
                    .map(|t| t.serial().to_string())
                    .unwrap_or_else(|| "any entity".to_string())
            ))),
            many => Err(Error::AmbiguousPath {
                path: path.to_string(),
                candidates: many.iter().map(|t| t.serial().to_string()).collect(),
            }),
        }
    }
}
