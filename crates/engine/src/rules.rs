//! Relationship integrity rules
//!
//! Checks run before a relationship is created or deleted. Each well-known
//! relationship name maps to a fixed list of checks:
//!
//! | Relationship | On create | On delete |
//! |--------------|-----------|-----------|
//! | `contains` | no diamonds, no loops | always rejected |
//! | `incorporates` | no diamonds, no loops | - |
//! | `isParentOf` | no loops | rejected while a parallel `contains` exists |
//! | `defines` | no diamonds | - |
//!
//! Other names are not checked. Every violation is an `IllegalOperation`.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::warn;
use trellis_core::{Direction, Error, InventoryBackend, Result, WellKnown};

/// One structural check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Check {
    NoDiamond,
    NoLoop,
    NeverDelete,
    NoParallelContains,
}

struct RuleSet {
    create: &'static [Check],
    delete: &'static [Check],
}

static RULES: Lazy<HashMap<&'static str, RuleSet>> = Lazy::new(|| {
    let mut rules = HashMap::new();
    rules.insert(
        WellKnown::Contains.name(),
        RuleSet {
            create: &[Check::NoDiamond, Check::NoLoop],
            delete: &[Check::NeverDelete],
        },
    );
    rules.insert(
        WellKnown::Incorporates.name(),
        RuleSet {
            create: &[Check::NoDiamond, Check::NoLoop],
            delete: &[],
        },
    );
    rules.insert(
        WellKnown::IsParentOf.name(),
        RuleSet {
            create: &[Check::NoLoop],
            delete: &[Check::NoParallelContains],
        },
    );
    rules.insert(
        WellKnown::Defines.name(),
        RuleSet {
            create: &[Check::NoDiamond],
            delete: &[],
        },
    );
    rules
});

fn reject(relationship: &str, reason: String) -> Error {
    warn!(target: "trellis::rules", relationship, %reason, "rule violation");
    Error::illegal(reason)
}

/// Source and target of an edge seen from `origin` in `direction`
fn endpoints<'a, E>(origin: &'a E, direction: Direction, other: &'a E) -> (&'a E, &'a E) {
    match direction {
        Direction::Incoming => (other, origin),
        _ => (origin, other),
    }
}

/// Verify that an edge `relationship` may be created between `origin` and
/// `other`, going out of `origin` for `Direction::Outgoing` and into it for
/// `Direction::Incoming`
pub fn check_create<B: InventoryBackend>(
    backend: &B,
    origin: &B::Element,
    direction: Direction,
    relationship: &str,
    other: &B::Element,
) -> Result<()> {
    let Some(rules) = RULES.get(relationship) else {
        return Ok(());
    };
    for check in rules.create {
        match check {
            Check::NoDiamond => no_diamond(backend, origin, direction, relationship, other)?,
            Check::NoLoop => no_loop(backend, origin, direction, relationship, other)?,
            Check::NeverDelete | Check::NoParallelContains => {}
        }
    }
    Ok(())
}

/// Verify that the edge `relationship` between `origin` and `other` may be
/// deleted
pub fn check_delete<B: InventoryBackend>(
    backend: &B,
    origin: &B::Element,
    direction: Direction,
    relationship: &str,
    other: &B::Element,
) -> Result<()> {
    let Some(rules) = RULES.get(relationship) else {
        return Ok(());
    };
    for check in rules.delete {
        match check {
            Check::NeverDelete => {
                return Err(reject(
                    relationship,
                    format!("'{}' relationships cannot be deleted explicitly", relationship),
                ))
            }
            Check::NoParallelContains => {
                let (source, target) = endpoints(origin, direction, other);
                if backend.has_relationship(source, target, WellKnown::Contains.name())? {
                    return Err(reject(
                        relationship,
                        format!(
                            "'{}' cannot be deleted while a parallel 'contains' exists",
                            relationship
                        ),
                    ));
                }
            }
            Check::NoDiamond | Check::NoLoop => {}
        }
    }
    Ok(())
}

fn no_diamond<B: InventoryBackend>(
    backend: &B,
    origin: &B::Element,
    direction: Direction,
    relationship: &str,
    other: &B::Element,
) -> Result<()> {
    if direction == Direction::Both {
        return Err(reject(
            relationship,
            format!("'{}' cannot be created in both directions", relationship),
        ));
    }
    let (source, target) = endpoints(origin, direction, other);
    if backend.has_relationship_in(target, Direction::Incoming, relationship)?
        && !backend.has_relationship(source, target, relationship)?
    {
        return Err(reject(
            relationship,
            format!(
                "target of '{}' already has an incoming '{}' from another entity",
                relationship, relationship
            ),
        ));
    }
    Ok(())
}

fn no_loop<B: InventoryBackend>(
    backend: &B,
    origin: &B::Element,
    direction: Direction,
    relationship: &str,
    other: &B::Element,
) -> Result<()> {
    if direction == Direction::Both {
        return Err(reject(
            relationship,
            format!("'{}' cannot be created in both directions", relationship),
        ));
    }
    if origin == other {
        return Err(reject(
            relationship,
            format!("'{}' cannot point from an entity to itself", relationship),
        ));
    }
    let opposite = match direction {
        Direction::Outgoing => Direction::Incoming,
        _ => Direction::Outgoing,
    };
    let closure = backend.transitive_closure(origin, relationship, opposite)?;
    if closure.contains(other) {
        return Err(reject(
            relationship,
            format!("'{}' would close a loop", relationship),
        ));
    }
    Ok(())
}
