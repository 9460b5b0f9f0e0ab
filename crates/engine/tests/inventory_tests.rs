//! End-to-end tests of the fluent inventory API over MemoryBackend
//!
//! These tests verify that:
//! - Creates wire containment, definition and declared relationships
//! - Cascading deletes respect defining entities and roll back on conflict
//! - Notifications are delivered after commit, relationships before entities
//! - Reads are stable and honor the configured result filter

use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use trellis_core::{
    Blueprint, CanonicalPath, Entity, EntityType, Environment, Error, MetricDataType,
    MetricUnit, Pager, Path, Resource, Update,
};
use trellis_engine::{
    Action, ActionContext, Configuration, Creatable, Deletable, Fetchable, Interest, Inventory,
    Notification, Single, Updatable, UuidFeedIdStrategy,
};
use trellis_storage::MemoryBackend;

// ============================================================================
// Helper Functions
// ============================================================================

type Recorded = Arc<Mutex<Vec<Notification>>>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn inventory() -> Inventory<MemoryBackend> {
    init_tracing();
    Inventory::new(MemoryBackend::new())
}

fn path(s: &str) -> CanonicalPath {
    s.parse().unwrap()
}

fn rel(s: &str) -> Path {
    s.parse().unwrap()
}

/// Record every notification of `action`, whatever the entity type
fn record(inventory: &Inventory<MemoryBackend>, action: Action) -> Recorded {
    let recorded: Recorded = Arc::new(Mutex::new(Vec::new()));
    for entity_type in EntityType::ALL {
        let sink = Arc::clone(&recorded);
        let _subscription = inventory.observable(Interest::new(action, entity_type), move |n| {
            sink.lock().push(n.clone())
        });
    }
    recorded
}

fn kinds(recorded: &Recorded) -> Vec<EntityType> {
    recorded.lock().iter().map(|n| n.entity.entity_type()).collect()
}

fn relationship_names(recorded: &Recorded) -> Vec<String> {
    recorded
        .lock()
        .iter()
        .filter_map(|n| n.entity.as_relationship().map(|r| r.name.clone()))
        .collect()
}

/// Tenant `t1` with environment `e1`, resource type `rt1` and resource
/// `e1/r1` of type `rt1`
fn scenario(inventory: &Inventory<MemoryBackend>) -> Single<MemoryBackend, trellis_core::Tenant> {
    let t1 = inventory.tenants().create(Blueprint::tenant("t1")).unwrap();
    t1.environments()
        .create(Blueprint::environment("e1"))
        .unwrap();
    t1.resource_types()
        .create(Blueprint::resource_type("rt1"))
        .unwrap();
    t1.environments()
        .get("e1")
        .resources()
        .create(Blueprint::resource("r1", rel("../rt;rt1")))
        .unwrap();
    t1
}

// ============================================================================
// End-to-end
// ============================================================================

#[test]
fn test_end_to_end_lifecycle() {
    let inventory = inventory();
    let deleted = record(&inventory, Action::Deleted);
    let t1 = scenario(&inventory);

    let r1: Resource = t1.environments().get("e1").resources().get("r1").entity().unwrap();
    assert_eq!(r1.path.to_string(), "/t;t1/e;e1/r;r1");
    assert_eq!(r1.resource_type.to_string(), "/t;t1/rt;rt1");

    // rt1 lives outside e1, so deleting e1 succeeds and takes r1 with it
    t1.environments().delete("e1").unwrap();
    assert!(!t1.environments().get("e1").exists().unwrap());
    assert!(t1
        .resource_types()
        .get("rt1")
        .resources()
        .entities(&Pager::unlimited())
        .unwrap()
        .is_empty());
    assert_eq!(
        kinds(&deleted),
        vec![
            EntityType::Relationship,
            EntityType::Relationship,
            EntityType::Relationship,
            EntityType::Environment,
            EntityType::Resource,
        ]
    );

    deleted.lock().clear();
    t1.delete().unwrap();
    assert_eq!(
        kinds(&deleted),
        vec![
            EntityType::Relationship,
            EntityType::Tenant,
            EntityType::ResourceType,
        ]
    );
    assert_eq!(inventory.backend().vertex_count(), 0);
    assert_eq!(inventory.backend().edge_count(), 0);
}

#[test]
fn test_create_notifies_entity_then_contains_then_wiring() {
    let inventory = inventory();
    let t1 = scenario(&inventory);
    let created = record(&inventory, Action::Created);

    t1.environments()
        .get("e1")
        .resources()
        .create(Blueprint::resource("r2", rel("../rt;rt1")))
        .unwrap();

    assert_eq!(
        kinds(&created),
        vec![
            EntityType::Resource,
            EntityType::Relationship,
            EntityType::Relationship,
        ]
    );
    assert_eq!(relationship_names(&created), vec!["contains", "defines"]);
}

// ============================================================================
// Cascading delete
// ============================================================================

mod cascading_delete {
    use super::*;

    #[test]
    fn test_defining_type_cannot_be_deleted() {
        let inventory = inventory();
        let deleted = record(&inventory, Action::Deleted);
        let t1 = scenario(&inventory);

        let err = t1.resource_types().delete("rt1").unwrap_err();
        assert!(matches!(err, Error::IllegalOperation { .. }));
        assert!(t1.resource_types().get("rt1").exists().unwrap());
        assert_eq!(
            t1.resource_types()
                .get("rt1")
                .resources()
                .entities(&Pager::unlimited())
                .unwrap()
                .len(),
            1
        );
        assert!(deleted.lock().is_empty());
    }

    #[test]
    fn test_subtree_with_types_and_instances_is_deleted() {
        let inventory = inventory();
        let t1 = scenario(&inventory);
        // rt1 defines r1, both are inside t1
        t1.delete().unwrap();
        assert!(inventory
            .tenants()
            .entities(&Pager::unlimited())
            .unwrap()
            .is_empty());
        assert_eq!(inventory.backend().vertex_count(), 0);
    }

    #[test]
    fn test_type_defining_outside_the_subtree_blocks_delete() {
        let inventory = inventory();
        let t = inventory.tenants().create(Blueprint::tenant("t")).unwrap();
        let feed = t.feeds().create(Blueprint::feed("f")).unwrap();
        feed.resource_types()
            .create(Blueprint::resource_type("frt"))
            .unwrap();
        let env = t.environments().create(Blueprint::environment("e")).unwrap();
        env.resources()
            .create(Blueprint::resource("r", rel("/t;t/f;f/rt;frt")))
            .unwrap();
        let before = inventory.backend().vertex_count();

        let err = t.feeds().delete("f").unwrap_err();
        assert!(matches!(err, Error::IllegalOperation { .. }));
        assert_eq!(inventory.backend().vertex_count(), before);
        assert!(feed.exists().unwrap());
    }

    #[test]
    fn test_nested_resources_are_removed() {
        let inventory = inventory();
        let t1 = scenario(&inventory);
        let r1 = t1.environments().get("e1").resources().get("r1");
        r1.children()
            .create(Blueprint::resource("r2", rel("../../rt;rt1")))
            .unwrap();
        assert_eq!(
            r1.all_children()
                .entities(&Pager::unlimited())
                .unwrap()
                .len(),
            1
        );
        r1.delete().unwrap();
        assert!(!inventory
            .inspect::<Resource>(&path("/t;t1/e;e1/r;r1/r;r2"))
            .unwrap()
            .exists()
            .unwrap());
    }
}

// ============================================================================
// Create
// ============================================================================

mod create {
    use super::*;

    #[test]
    fn test_duplicate_sibling_rejected() {
        let inventory = inventory();
        let t1 = scenario(&inventory);
        let err = t1
            .environments()
            .create(Blueprint::environment("e1"))
            .unwrap_err();
        assert!(err.is_already_exists());
        assert_eq!(
            t1.environments()
                .entities(&Pager::unlimited())
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_kind_must_fit_position() {
        let inventory = inventory();
        let t1 = scenario(&inventory);
        let err = t1.environments().create(Blueprint::feed("f")).unwrap_err();
        assert!(matches!(err, Error::IllegalOperation { .. }));
    }

    #[test]
    fn test_missing_type_rolls_back() {
        let inventory = inventory();
        let t1 = scenario(&inventory);
        let before = inventory.backend().vertex_count();
        let err = t1
            .environments()
            .get("e1")
            .resources()
            .create(Blueprint::resource("r9", rel("../rt;nope")))
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(inventory.backend().vertex_count(), before);
        assert!(!inventory.backend().in_transaction());
    }

    #[test]
    fn test_metrics_and_metric_types() {
        let inventory = inventory();
        let t = inventory.tenants().create(Blueprint::tenant("t")).unwrap();
        let mt = t
            .metric_types()
            .create(
                Blueprint::metric_type("cpu", MetricUnit::Percentage, MetricDataType::Gauge)
                    .with_collection_interval(30),
            )
            .unwrap();
        let env = t.environments().create(Blueprint::environment("e")).unwrap();
        env.metrics()
            .create(Blueprint::metric("cpu-1", rel("../mt;cpu")))
            .unwrap();
        let metrics = mt.metrics().entities(&Pager::unlimited()).unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics.items[0].metric_type.to_string(), "/t;t/mt;cpu");
        assert_eq!(mt.entity().unwrap().collection_interval, Some(30));
    }

    #[test]
    fn test_metadata_pack_incorporates_members() {
        let inventory = inventory();
        let t = inventory.tenants().create(Blueprint::tenant("t")).unwrap();
        t.resource_types()
            .create(Blueprint::resource_type("host"))
            .unwrap();
        let pack = t
            .metadata_packs()
            .create(Blueprint::metadata_pack("mp", vec![rel("rt;host")]))
            .unwrap();
        let members = pack.resource_types().entities(&Pager::unlimited()).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members.items[0].path.to_string(), "/t;t/rt;host");
    }

    #[test]
    fn test_declared_relationships_are_wired() {
        let inventory = inventory();
        let created = record(&inventory, Action::Created);
        let t1 = scenario(&inventory);
        let env = t1.environments().get("e1");
        env.resources()
            .create(
                Blueprint::resource("db", rel("../rt;rt1"))
                    .with_incoming("dependsOn", rel("r;r1")),
            )
            .unwrap();
        assert_eq!(
            relationship_names(&created)
                .into_iter()
                .filter(|n| n == "dependsOn")
                .count(),
            1
        );
        let r1 = env.resources().get("r1");
        let outgoing = r1
            .relationships(trellis_core::Direction::Outgoing)
            .named("dependsOn")
            .entity()
            .unwrap();
        assert_eq!(outgoing.target.to_string(), "/t;t1/e;e1/r;db");
    }

    #[test]
    fn test_tenant_references_must_be_canonical() {
        let inventory = inventory();
        scenario(&inventory);
        let err = inventory
            .tenants()
            .create(Blueprint::tenant("t2").with_outgoing("dependsOn", rel("e;e1")))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));
        assert!(!inventory.tenants().get("t2").exists().unwrap());

        inventory
            .tenants()
            .create(Blueprint::tenant("t3").with_outgoing("dependsOn", rel("/t;t1/e;e1")))
            .unwrap();
        let edge = inventory
            .tenants()
            .get("t3")
            .relationships(trellis_core::Direction::Outgoing)
            .named("dependsOn")
            .entity()
            .unwrap();
        assert_eq!(edge.target.to_string(), "/t;t1/e;e1");
    }

    #[test]
    fn test_declaring_contains_is_rejected() {
        let inventory = inventory();
        let t1 = scenario(&inventory);
        let err = t1
            .environments()
            .create(Blueprint::environment("e2").with_outgoing("contains", rel("e;e1")))
            .unwrap_err();
        assert!(matches!(err, Error::IllegalOperation { .. }));
        assert!(!t1.environments().get("e2").exists().unwrap());
    }

    #[test]
    fn test_data_entities() {
        let inventory = inventory();
        let t1 = scenario(&inventory);
        let r1 = t1.environments().get("e1").resources().get("r1");
        r1.data()
            .create(Blueprint::data("configuration", json!({"port": 8080})))
            .unwrap();
        let data = r1.data().get("configuration").entity().unwrap();
        assert_eq!(data.role(), "configuration");
        assert_eq!(data.value["port"], json!(8080));
    }
}

// ============================================================================
// Feeds
// ============================================================================

mod feeds {
    use super::*;

    #[test]
    fn test_uuid_strategy_assigns_ids() {
        init_tracing();
        let config = Configuration::builder()
            .feed_id_strategy(UuidFeedIdStrategy)
            .build();
        let inventory = Inventory::with_configuration(MemoryBackend::new(), config);
        let t = inventory.tenants().create(Blueprint::tenant("t")).unwrap();
        let feed = t.feeds().create(Blueprint::feed("")).unwrap().entity().unwrap();
        assert!(uuid::Uuid::parse_str(feed.path.id().unwrap()).is_ok());
    }

    #[test]
    fn test_taken_feed_id_rejected() {
        let inventory = inventory();
        let t = inventory.tenants().create(Blueprint::tenant("t")).unwrap();
        t.feeds().create(Blueprint::feed("agent")).unwrap();
        let err = t.feeds().create(Blueprint::feed("agent")).unwrap_err();
        assert!(err.is_already_exists());
    }

    #[test]
    fn test_environment_incorporates_feeds() {
        use trellis_engine::Associable;

        let inventory = inventory();
        let t = inventory.tenants().create(Blueprint::tenant("t")).unwrap();
        t.feeds().create(Blueprint::feed("agent")).unwrap();
        let env = t.environments().create(Blueprint::environment("e")).unwrap();
        let rel = env.feeds().associate(&path("/t;t/f;agent")).unwrap();
        assert_eq!(rel.name, "incorporates");
        assert_eq!(env.feeds().entities(&Pager::unlimited()).unwrap().len(), 1);
        assert_eq!(env.feeds().association_with(&path("/t;t/f;agent")).unwrap(), rel);
        env.feeds().disassociate(&path("/t;t/f;agent")).unwrap();
        assert!(matches!(
            env.feeds().association_with(&path("/t;t/f;agent")),
            Err(Error::RelationNotFound { .. })
        ));
    }
}

// ============================================================================
// Update and reads
// ============================================================================

mod reads_and_updates {
    use super::*;

    #[test]
    fn test_update_notifies_with_original() {
        let inventory = inventory();
        let t1 = scenario(&inventory);
        let updated = record(&inventory, Action::Updated);
        t1.environments()
            .update("e1", Update::new().with_name("Production"))
            .unwrap();
        let env: Environment = t1.environments().get("e1").entity().unwrap();
        assert_eq!(env.name.as_deref(), Some("Production"));

        let notifications = updated.lock();
        assert_eq!(notifications.len(), 1);
        match &notifications[0].context {
            ActionContext::Updated { original, update } => {
                assert_eq!(original.name(), None);
                assert_eq!(update.name.as_deref(), Some("Production"));
            }
            other => panic!("unexpected context {:?}", other),
        }
    }

    #[test]
    fn test_inapplicable_update_rejected() {
        let inventory = inventory();
        let t1 = scenario(&inventory);
        let err = t1
            .environments()
            .get("e1")
            .update(Update::new().with_unit(MetricUnit::Bytes))
            .unwrap_err();
        assert!(matches!(err, Error::IllegalOperation { .. }));
    }

    #[test]
    fn test_missing_entity_not_found() {
        let inventory = inventory();
        let t1 = scenario(&inventory);
        let err = t1.environments().get("nope").entity().unwrap_err();
        assert!(err.is_not_found());
        assert!(t1
            .environments()
            .update("nope", Update::new().with_name("x"))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_reads_are_idempotent() {
        let inventory = inventory();
        let t1 = scenario(&inventory);
        t1.environments()
            .create(Blueprint::environment("e2").with_property("tier", json!("gold")))
            .unwrap();
        let pager = Pager::of(0, 1).ordered_by(trellis_core::Order::desc(
            trellis_core::OrderField::Id,
        ));
        let first = t1.environments().entities(&pager).unwrap();
        let second = t1.environments().entities(&pager).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.total_size, 2);
        assert_eq!(first.items[0].path.to_string(), "/t;t1/e;e2");

        let gold = t1.environments().select("tier", json!("gold"));
        assert_eq!(gold.entities(&Pager::unlimited()).unwrap().len(), 1);
    }

    #[test]
    fn test_result_filter_hides_entities() {
        init_tracing();
        let config = Configuration::builder()
            .result_filter(|e: &Entity| e.id() != "hidden")
            .build();
        let inventory = Inventory::with_configuration(MemoryBackend::new(), config);
        inventory.tenants().create(Blueprint::tenant("shown")).unwrap();
        inventory.tenants().create(Blueprint::tenant("hidden")).unwrap();
        let page = inventory.tenants().entities(&Pager::unlimited()).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page.total_size, 1);
        assert!(inventory
            .tenants()
            .get("hidden")
            .entity()
            .unwrap_err()
            .is_not_found());
    }

    fn hiding_h(ids: &[&str]) -> Inventory<MemoryBackend> {
        init_tracing();
        let config = Configuration::builder()
            .result_filter(|e: &Entity| !e.id().starts_with('h'))
            .build();
        let inventory = Inventory::with_configuration(MemoryBackend::new(), config);
        for id in ids {
            inventory.tenants().create(Blueprint::tenant(*id)).unwrap();
        }
        inventory
    }

    fn tenant_paths(page: &trellis_core::Page<trellis_core::Tenant>) -> Vec<String> {
        page.items.iter().map(|t| t.path.to_string()).collect()
    }

    #[test]
    fn test_result_filter_applies_before_paging() {
        let inventory = hiding_h(&["a", "h1", "h2", "d", "e"]);
        let tenants = inventory.tenants();

        let first = tenants.entities(&Pager::of(0, 2)).unwrap();
        assert_eq!(tenant_paths(&first), vec!["/t;a", "/t;d"]);
        assert_eq!(first.total_size, 3);
        assert!(first.has_next());

        let second = tenants.entities(&Pager::of(1, 2)).unwrap();
        assert_eq!(tenant_paths(&second), vec!["/t;e"]);
        assert_eq!(second.total_size, 3);
        assert!(!second.has_next());

        let ordered = tenants
            .entities(
                &Pager::of(0, 2)
                    .ordered_by(trellis_core::Order::desc(trellis_core::OrderField::Id)),
            )
            .unwrap();
        assert_eq!(tenant_paths(&ordered), vec!["/t;e", "/t;d"]);
        assert_eq!(ordered.total_size, 3);
    }

    #[test]
    fn test_hidden_first_match_does_not_shadow_visible_one() {
        let inventory = hiding_h(&["h", "a"]);
        let tenant = inventory.tenants().entity().unwrap();
        assert_eq!(tenant.path.to_string(), "/t;a");
        assert!(inventory.tenants().exists().unwrap());

        let all_hidden = hiding_h(&["h1", "h2"]);
        assert!(all_hidden.tenants().entity().unwrap_err().is_not_found());
        assert!(!all_hidden.tenants().exists().unwrap());
    }

    #[test]
    fn test_inspect_by_path() {
        let inventory = inventory();
        scenario(&inventory);
        let env = inventory
            .inspect::<Environment>(&path("/t;t1/e;e1"))
            .unwrap();
        assert_eq!(env.entity().unwrap().path.to_string(), "/t;t1/e;e1");
        assert_eq!(env.resources().entities(&Pager::unlimited()).unwrap().len(), 1);
        assert!(matches!(
            inventory.inspect::<Resource>(&path("/t;t1/e;e1")),
            Err(Error::InvalidPath { .. })
        ));
        env.delete().unwrap();
        assert!(!env.exists().unwrap());
    }

    #[test]
    fn test_notification_serializes() {
        let inventory = inventory();
        let created = record(&inventory, Action::Created);
        inventory.tenants().create(Blueprint::tenant("t")).unwrap();
        let json = serde_json::to_value(&created.lock()[0]).unwrap();
        assert_eq!(json["action"], json!("created"));
        assert_eq!(json["entity"]["path"], json!("/t;t"));
    }
}
