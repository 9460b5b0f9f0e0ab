//! Error types for Trellis
//!
//! This module defines the error taxonomy shared by every crate in the
//! workspace. We use `thiserror` for automatic `Display` and `Error` trait
//! implementations.
//!
//! | Category | Variants |
//! |----------|----------|
//! | Lookup | `EntityNotFound`, `RelationNotFound` |
//! | Collision | `EntityAlreadyExists`, `RelationAlreadyExists` |
//! | Path algebra | `InvalidPath`, `AmbiguousPath`, `Decode` |
//! | Integrity | `IllegalOperation` |
//! | Infrastructure | `Backend`, `Transaction`, `Configuration` |
//!
//! None of these errors are retried inside the engine: they are raised to
//! the caller of the operation that detected them.

use thiserror::Error;

/// Result type alias for Trellis operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Trellis
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A lookup yielded no matching, applicable element
    #[error("entity not found: {entity_type} matching {query}")]
    EntityNotFound {
        /// Kind of entity that was looked up
        entity_type: String,
        /// Human-readable description of the lookup
        query: String,
    },

    /// An entity with the same id already exists under the same parent
    #[error("entity already exists: {path}")]
    EntityAlreadyExists {
        /// Canonical path of the colliding entity
        path: String,
    },

    /// No relationship matched an association-specific lookup
    #[error("relationship not found: {name} ({source_path} -> {target_path})")]
    RelationNotFound {
        /// Relationship name (or id) that was looked up
        name: String,
        /// Source end, `*` when unconstrained
        source_path: String,
        /// Target end, `*` when unconstrained
        target_path: String,
    },

    /// The relationship being created already exists
    #[error("relationship already exists: {name} ({source_path} -> {target_path})")]
    RelationAlreadyExists {
        /// Relationship name
        name: String,
        /// Source end
        source_path: String,
        /// Target end
        target_path: String,
    },

    /// A path is malformed or violates the segment progression rules
    #[error("invalid path: {reason}")]
    InvalidPath {
        /// What is wrong with the path
        reason: String,
    },

    /// The type of an untyped path segment cannot be decided
    #[error("ambiguous path {path}: segment could be any of {candidates:?}")]
    AmbiguousPath {
        /// The path being parsed
        path: String,
        /// The segment types that were possible
        candidates: Vec<String>,
    },

    /// A percent-escaped id could not be decoded
    #[error("decode error: {reason}")]
    Decode {
        /// What is wrong with the input
        reason: String,
    },

    /// A structurally invalid request (relationship rule violation,
    /// deleting a defining entity whose dependents remain, ...)
    #[error("illegal operation: {reason}")]
    IllegalOperation {
        /// Why the operation is rejected
        reason: String,
    },

    /// Backend-specific failure, passed through uninterpreted
    #[error("backend error: {message}")]
    Backend {
        /// Backend message
        message: String,
    },

    /// Transaction lifecycle failure (commit or rollback could not complete)
    #[error("transaction error: {reason}")]
    Transaction {
        /// Details
        reason: String,
    },

    /// Configuration could not be loaded or is inconsistent
    #[error("configuration error: {reason}")]
    Configuration {
        /// Details
        reason: String,
    },
}

impl Error {
    /// Create an `EntityNotFound` error
    pub fn entity_not_found(entity_type: impl Into<String>, query: impl Into<String>) -> Self {
        Error::EntityNotFound {
            entity_type: entity_type.into(),
            query: query.into(),
        }
    }

    /// Create an `EntityAlreadyExists` error
    pub fn already_exists(path: impl ToString) -> Self {
        Error::EntityAlreadyExists {
            path: path.to_string(),
        }
    }

    /// Create a `RelationNotFound` error
    pub fn relation_not_found(
        name: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Error::RelationNotFound {
            name: name.into(),
            source_path: source.into(),
            target_path: target.into(),
        }
    }

    /// Create a `RelationAlreadyExists` error
    pub fn relation_exists(
        name: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Error::RelationAlreadyExists {
            name: name.into(),
            source_path: source.into(),
            target_path: target.into(),
        }
    }

    /// Create an `InvalidPath` error
    pub fn invalid_path(reason: impl Into<String>) -> Self {
        Error::InvalidPath {
            reason: reason.into(),
        }
    }

    /// Create a `Decode` error
    pub fn decode(reason: impl Into<String>) -> Self {
        Error::Decode {
            reason: reason.into(),
        }
    }

    /// Create an `IllegalOperation` error
    pub fn illegal(reason: impl Into<String>) -> Self {
        Error::IllegalOperation {
            reason: reason.into(),
        }
    }

    /// Create a `Backend` error
    pub fn backend(message: impl Into<String>) -> Self {
        Error::Backend {
            message: message.into(),
        }
    }

    /// Create a `Configuration` error
    pub fn configuration(reason: impl Into<String>) -> Self {
        Error::Configuration {
            reason: reason.into(),
        }
    }

    /// True for `EntityNotFound` and `RelationNotFound`
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::EntityNotFound { .. } | Error::RelationNotFound { .. }
        )
    }

    /// True for `EntityAlreadyExists` and `RelationAlreadyExists`
    pub fn is_already_exists(&self) -> bool {
        matches!(
            self,
            Error::EntityAlreadyExists { .. } | Error::RelationAlreadyExists { .. }
        )
    }

    /// True for path algebra failures
    pub fn is_path_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidPath { .. } | Error::AmbiguousPath { .. } | Error::Decode { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_entity_not_found() {
        let err = Error::entity_not_found("Environment", "/t;a/e;missing");
        let msg = err.to_string();
        assert!(msg.contains("entity not found"));
        assert!(msg.contains("Environment"));
        assert!(msg.contains("/t;a/e;missing"));
    }

    #[test]
    fn test_error_display_already_exists() {
        let err = Error::already_exists("/t;a");
        assert_eq!(err.to_string(), "entity already exists: /t;a");
    }

    #[test]
    fn test_error_display_relation() {
        let err = Error::relation_exists("incorporates", "/t;a/e;x", "/t;a/f;y");
        let msg = err.to_string();
        assert!(msg.contains("incorporates"));
        assert!(msg.contains("/t;a/e;x -> /t;a/f;y"));
    }

    #[test]
    fn test_error_display_ambiguous() {
        let err = Error::AmbiguousPath {
            path: "/t;a/x/r;y".to_string(),
            candidates: vec!["e".to_string(), "f".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("ambiguous path"));
        assert!(msg.contains("\"e\""));
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::entity_not_found("Tenant", "x").is_not_found());
        assert!(Error::relation_not_found("contains", "*", "*").is_not_found());
        assert!(!Error::illegal("nope").is_not_found());
        assert!(Error::already_exists("/t;a").is_already_exists());
        assert!(Error::decode("truncated").is_path_error());
        assert!(Error::invalid_path("bad").is_path_error());
        assert!(!Error::backend("io").is_path_error());
    }

    #[test]
    fn test_error_pattern_matching() {
        let err = Error::illegal("cannot delete contains");
        match err {
            Error::IllegalOperation { reason } => assert_eq!(reason, "cannot delete contains"),
            _ => panic!("Wrong error variant"),
        }
    }
}
