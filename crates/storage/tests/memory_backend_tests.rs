//! Integration tests for MemoryBackend
//!
//! These tests drive the backend only through the `InventoryBackend` trait:
//! - Query evaluation with paging and ordering
//! - Cascading removal of incident edges
//! - Transitive closure ordering
//! - Transaction snapshots

use serde_json::json;
use trellis_core::{
    Blueprint, CanonicalPath, Direction, Filter, InventoryBackend, Order, OrderField, Pager,
    Path, Properties, Query,
};
use trellis_storage::{Element, MemoryBackend};

// ============================================================================
// Helper Functions
// ============================================================================

fn path(s: &str) -> CanonicalPath {
    s.parse().unwrap()
}

fn contained(backend: &MemoryBackend, parent: &str, child: &str, blueprint: Blueprint) -> Element {
    let parent = backend.find(&path(parent)).unwrap();
    let child = backend.persist(&path(child), &blueprint).unwrap();
    backend
        .relate(&parent, &child, "contains", &Properties::new())
        .unwrap();
    child
}

/// Tenant `t` with environments `e1..e3` named `c`, `a`, `b`
fn populated() -> MemoryBackend {
    let backend = MemoryBackend::new();
    backend.persist(&path("/t;t"), &Blueprint::tenant("t")).unwrap();
    for (id, name) in [("e1", "c"), ("e2", "a"), ("e3", "b")] {
        contained(
            &backend,
            "/t;t",
            &format!("/t;t/e;{}", id),
            Blueprint::environment(id).with_name(name),
        );
    }
    backend
}

fn environments_of(tenant: &str) -> Query {
    Query::path()
        .with([Filter::path(path(tenant)), Filter::contained()])
        .filter()
        .with([Filter::entity_type(trellis_core::EntityType::Environment)])
        .get()
}

fn ids(backend: &MemoryBackend, elements: &[Element]) -> Vec<String> {
    elements
        .iter()
        .map(|e| backend.extract_id(e).unwrap())
        .collect()
}

// ============================================================================
// Query Tests
// ============================================================================

mod queries {
    use super::*;

    #[test]
    fn test_unlimited_query_returns_insertion_order() {
        let backend = populated();
        let page = backend
            .query(&environments_of("/t;t"), &Pager::unlimited())
            .unwrap();
        assert_eq!(page.total_size, 3);
        assert_eq!(ids(&backend, &page.items), vec!["e1", "e2", "e3"]);
    }

    #[test]
    fn test_ordering_and_paging() {
        let backend = populated();
        let pager = Pager::of(0, 2).ordered_by(Order::asc(OrderField::Name));
        let page = backend.query(&environments_of("/t;t"), &pager).unwrap();
        assert_eq!(page.total_size, 3);
        assert_eq!(ids(&backend, &page.items), vec!["e2", "e3"]);
        assert!(page.has_next());

        let second = backend
            .query(
                &environments_of("/t;t"),
                &Pager::of(1, 2).ordered_by(Order::asc(OrderField::Name)),
            )
            .unwrap();
        assert_eq!(ids(&backend, &second.items), vec!["e1"]);
        assert!(!second.has_next());
    }

    #[test]
    fn test_property_filter() {
        let backend = MemoryBackend::new();
        backend
            .persist(
                &path("/t;a"),
                &Blueprint::tenant("a").with_property("tier", json!("gold")),
            )
            .unwrap();
        backend
            .persist(
                &path("/t;b"),
                &Blueprint::tenant("b").with_property("tier", json!("silver")),
            )
            .unwrap();
        let q = Query::filter()
            .with([Filter::property("tier", json!("gold"))])
            .get();
        let page = backend.query(&q, &Pager::unlimited()).unwrap();
        assert_eq!(ids(&backend, &page.items), vec!["a"]);
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let backend = populated();
        let page = backend.query(&Query::empty(), &Pager::unlimited()).unwrap();
        // one tenant, three environments, three contains edges
        assert_eq!(page.total_size, 7);
    }
}

// ============================================================================
// Graph Structure Tests
// ============================================================================

mod structure {
    use super::*;

    #[test]
    fn test_delete_vertex_removes_incident_edges() {
        let backend = populated();
        let env = backend.find(&path("/t;t/e;e1")).unwrap();
        backend.delete(&env).unwrap();
        assert_eq!(backend.vertex_count(), 3);
        assert_eq!(backend.edge_count(), 2);
        let tenant = backend.find(&path("/t;t")).unwrap();
        assert_eq!(
            backend
                .get_relationships(&tenant, Direction::Outgoing)
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn test_transitive_closure_nearest_first() {
        let backend = MemoryBackend::new();
        backend.persist(&path("/t;t"), &Blueprint::tenant("t")).unwrap();
        contained(&backend, "/t;t", "/t;t/e;e", Blueprint::environment("e"));
        let rt = contained(&backend, "/t;t", "/t;t/rt;rt", Blueprint::resource_type("rt"));
        let r1 = contained(
            &backend,
            "/t;t/e;e",
            "/t;t/e;e/r;r1",
            Blueprint::resource("r1", Path::Canonical(path("/t;t/rt;rt"))),
        );
        let r2 = contained(
            &backend,
            "/t;t/e;e/r;r1",
            "/t;t/e;e/r;r1/r;r2",
            Blueprint::resource("r2", Path::Canonical(path("/t;t/rt;rt"))),
        );
        let tenant = backend.find(&path("/t;t")).unwrap();
        let env = backend.find(&path("/t;t/e;e")).unwrap();
        let closure = backend
            .transitive_closure(&tenant, "contains", Direction::Outgoing)
            .unwrap();
        assert_eq!(closure, vec![env, rt, r1, r2]);

        let up = backend
            .transitive_closure(&r2, "contains", Direction::Incoming)
            .unwrap();
        assert_eq!(up, vec![r1, env, tenant]);
    }

    #[test]
    fn test_relationships_are_addressable_by_path() {
        let backend = populated();
        let q = Query::path()
            .with([
                Filter::path(path("/t;t")),
                Filter::to_edges(Direction::Outgoing),
            ])
            .get();
        let page = backend.query(&q, &Pager::unlimited()).unwrap();
        assert_eq!(page.total_size, 3);
        for edge in page.items {
            let entity = backend.convert(&edge).unwrap();
            assert!(entity.path().segment_type() == Some(trellis_core::SegmentType::Relationship));
            assert_eq!(backend.find(entity.path()).unwrap(), edge);
        }
    }
}

// ============================================================================
// Transaction Tests
// ============================================================================

mod transactions {
    use super::*;

    #[test]
    fn test_commit_keeps_changes() {
        let backend = MemoryBackend::new();
        let tx = backend.start_transaction(true).unwrap();
        backend.persist(&path("/t;a"), &Blueprint::tenant("a")).unwrap();
        backend.commit(tx).unwrap();
        assert!(backend.find(&path("/t;a")).is_ok());
    }

    #[test]
    fn test_nested_commit_joins_outer_rollback() {
        let backend = MemoryBackend::new();
        let outer = backend.start_transaction(true).unwrap();
        let inner = backend.start_transaction(true).unwrap();
        backend.persist(&path("/t;a"), &Blueprint::tenant("a")).unwrap();
        backend.commit(inner).unwrap();
        backend.rollback(outer).unwrap();
        assert!(backend.find(&path("/t;a")).is_err());
    }

    #[test]
    fn test_commit_without_transaction_fails() {
        let backend = MemoryBackend::new();
        let tx = backend.start_transaction(false).unwrap();
        backend.commit(tx).unwrap();
        let stray = backend.start_transaction(false).unwrap();
        backend.rollback(stray).unwrap();
        assert!(!backend.in_transaction());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod paging {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Concatenating every page yields the unpaged result
        #[test]
        fn prop_pages_partition_the_result(count in 0usize..12, size in 1usize..5) {
            let backend = MemoryBackend::new();
            backend.persist(&path("/t;t"), &Blueprint::tenant("t")).unwrap();
            for i in 0..count {
                let id = format!("e{:02}", i);
                let child = format!("/t;t/e;{}", id);
                contained(&backend, "/t;t", &child, Blueprint::environment(id));
            }
            let query = environments_of("/t;t");
            let all = backend.query(&query, &Pager::unlimited()).unwrap();
            prop_assert_eq!(all.total_size, count);

            let mut collected = Vec::new();
            let mut page = 0;
            loop {
                let current = backend.query(&query, &Pager::of(page, size)).unwrap();
                prop_assert_eq!(current.total_size, count);
                prop_assert!(current.len() <= size);
                collected.extend(ids(&backend, &current.items));
                if !current.has_next() {
                    break;
                }
                page += 1;
            }
            prop_assert_eq!(collected, ids(&backend, &all.items));
        }
    }
}
