//! Backend SPI
//!
//! The traversal engine drives every read and write through
//! [`InventoryBackend`], so that the graph store can be swapped without
//! touching the engine. Backends deal in their own element handles; the
//! engine only converts them to [`Entity`] values at the edge.

use crate::error::Result;
use crate::model::{Blueprint, Direction, Entity, EntityType, Properties, Update};
use crate::paging::{Page, Pager};
use crate::path::CanonicalPath;
use crate::query::Query;
use std::fmt;
use std::hash::Hash;

/// Property-graph store consumed by the engine
///
/// Vertices are entities, edges are relationships; both are represented by
/// [`InventoryBackend::Element`].
///
/// Thread safety: implementations must be `Send + Sync`. The engine itself
/// drives one logical traversal from a single thread at a time.
///
/// # Errors
///
/// Lookups that find nothing return `EntityNotFound` or `RelationNotFound`;
/// store failures are reported as `Backend` and passed through as they are.
pub trait InventoryBackend: Send + Sync {
    /// Handle to a vertex or an edge
    type Element: Clone + Eq + Hash + fmt::Debug + Send + Sync;

    /// Open transaction
    type Transaction: Send;

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Begin a transaction; writable transactions may be rolled back
    fn start_transaction(&self, writable: bool) -> Result<Self::Transaction>;

    /// Make the transaction's changes permanent
    fn commit(&self, transaction: Self::Transaction) -> Result<()>;

    /// Discard the transaction's changes
    fn rollback(&self, transaction: Self::Transaction) -> Result<()>;

    // =========================================================================
    // Reads
    // =========================================================================

    /// Execute the union of all chains of `query`, paged and ordered by `pager`
    ///
    /// Each chain starts from the set of all elements; path fragments move
    /// the set and filter fragments narrow it. Duplicates across chains are
    /// reported once.
    fn query(&self, query: &Query, pager: &Pager) -> Result<Page<Self::Element>>;

    /// The vertex or edge at `path`
    fn find(&self, path: &CanonicalPath) -> Result<Self::Element>;

    /// Convert to an entity
    fn convert(&self, element: &Self::Element) -> Result<Entity>;

    /// Last path segment id of the element
    fn extract_id(&self, element: &Self::Element) -> Result<String>;

    /// Kind of the element
    fn element_type(&self, element: &Self::Element) -> Result<EntityType>;

    // =========================================================================
    // Writes
    // =========================================================================

    /// Store a new vertex at `path`
    fn persist(&self, path: &CanonicalPath, blueprint: &Blueprint) -> Result<Self::Element>;

    /// Apply `update` to an existing vertex or edge
    fn update(&self, element: &Self::Element, update: &Update) -> Result<()>;

    /// Remove a vertex (with its incident edges) or an edge
    fn delete(&self, element: &Self::Element) -> Result<()>;

    /// Create an edge
    fn relate(
        &self,
        source: &Self::Element,
        target: &Self::Element,
        name: &str,
        properties: &Properties,
    ) -> Result<Self::Element>;

    // =========================================================================
    // Relationships
    // =========================================================================

    /// True if an edge `name` goes from `source` to `target`
    fn has_relationship(
        &self,
        source: &Self::Element,
        target: &Self::Element,
        name: &str,
    ) -> Result<bool>;

    /// True if `element` has any edge `name` in `direction`
    fn has_relationship_in(
        &self,
        element: &Self::Element,
        direction: Direction,
        name: &str,
    ) -> Result<bool>;

    /// The edge `name` from `source` to `target`
    ///
    /// # Errors
    ///
    /// `RelationNotFound` when there is none.
    fn get_relationship(
        &self,
        source: &Self::Element,
        target: &Self::Element,
        name: &str,
    ) -> Result<Self::Element>;

    /// All edges of `element` in `direction`, each once
    fn get_relationships(
        &self,
        element: &Self::Element,
        direction: Direction,
    ) -> Result<Vec<Self::Element>>;

    /// Every vertex reachable from `element` by following edges `name` in
    /// `direction`, `element` itself excluded, nearest first
    fn transitive_closure(
        &self,
        element: &Self::Element,
        name: &str,
        direction: Direction,
    ) -> Result<Vec<Self::Element>>;
}
