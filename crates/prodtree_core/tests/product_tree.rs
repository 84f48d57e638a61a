use prodtree_core::db::open_db_in_memory;
use prodtree_core::{
    ProductId, ProductRepository, SqliteProductRepository, TreeService, TreeServiceError,
    DEFAULT_TREE_DEPTH,
};
use rusqlite::Connection;
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

/// Creates a single parent/child chain of `levels` products, returning
/// every id top-down.
fn seed_chain(conn: &Connection, levels: u32) -> Vec<ProductId> {
    let repo = SqliteProductRepository::try_new(conn).unwrap();
    let service = TreeService::new(SqliteProductRepository::try_new(conn).unwrap());

    let mut ids = Vec::new();
    for level in 0..levels {
        let record = repo.create_product(&format!("Level {level}")).unwrap();
        if let Some(parent) = ids.last().copied() {
            service.link_products(parent, record.product_uuid).unwrap();
        }
        ids.push(record.product_uuid);
    }
    ids
}

#[test]
fn reader_returns_all_levels_of_shallow_fixture() {
    let conn = setup();
    let ids = seed_chain(&conn, 4);
    let service = TreeService::new(SqliteProductRepository::try_new(&conn).unwrap());

    let tree = service.product_tree(ids[0], None).unwrap();
    assert_eq!(tree.depth(), 4);

    // Walk to the deepest node: every level inside the bound is expanded.
    let mut cursor = &tree;
    for expected_id in &ids {
        assert_eq!(cursor.product_uuid, *expected_id);
        let children = cursor.children.as_ref().expect("inside depth bound");
        match children.first() {
            Some(child) => cursor = child,
            None => break,
        }
    }
    // The true leaf is marked with an empty child list, not `None`.
    assert_eq!(cursor.product_uuid, ids[3]);
    assert_eq!(cursor.children.as_deref(), Some(&[][..]));
}

#[test]
fn reader_stops_at_default_depth_bound() {
    let conn = setup();
    let ids = seed_chain(&conn, 10);
    let service = TreeService::new(SqliteProductRepository::try_new(&conn).unwrap());

    let tree = service.product_tree(ids[0], None).unwrap();
    // Root plus DEFAULT_TREE_DEPTH expanded generations.
    assert_eq!(tree.depth(), DEFAULT_TREE_DEPTH + 1);

    let mut cursor = &tree;
    while let Some(children) = cursor.children.as_ref() {
        cursor = children.first().expect("chain continues to the bound");
    }
    // The node at the bound exists but its children were not expanded.
    assert_eq!(cursor.product_uuid, ids[DEFAULT_TREE_DEPTH as usize]);
    assert!(cursor.children.is_none());
}

#[test]
fn reader_honors_explicit_depth_bound() {
    let conn = setup();
    let ids = seed_chain(&conn, 3);
    let service = TreeService::new(SqliteProductRepository::try_new(&conn).unwrap());

    let tree = service.product_tree(ids[0], Some(0)).unwrap();
    assert!(tree.children.is_none());
    assert_eq!(tree.depth(), 1);

    let one_level = service.product_tree(ids[0], Some(1)).unwrap();
    let children = one_level.children.as_ref().unwrap();
    assert_eq!(children.len(), 1);
    assert!(children[0].children.is_none());
}

#[test]
fn reader_fails_for_unknown_root() {
    let conn = setup();
    let service = TreeService::new(SqliteProductRepository::try_new(&conn).unwrap());

    let unknown = Uuid::new_v4();
    let err = service.product_tree(unknown, None).unwrap_err();
    assert!(matches!(err, TreeServiceError::ProductNotFound(id) if id == unknown));
}

#[test]
fn reader_aborts_whole_read_on_dangling_link() {
    let conn = setup();
    let ids = seed_chain(&conn, 3);
    let service = TreeService::new(SqliteProductRepository::try_new(&conn).unwrap());

    // Break the middle row behind the repository's back.
    conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
    conn.execute(
        "DELETE FROM products WHERE product_uuid = ?1;",
        [ids[1].to_string()],
    )
    .unwrap();

    let err = service.product_tree(ids[0], None).unwrap_err();
    assert!(matches!(err, TreeServiceError::ProductNotFound(id) if id == ids[1]));
}

#[test]
fn reader_includes_attributes_on_every_node() {
    let conn = setup();
    let repo = SqliteProductRepository::try_new(&conn).unwrap();
    let service = TreeService::new(SqliteProductRepository::try_new(&conn).unwrap());

    let parent = repo.create_product("Parent").unwrap();
    let child = repo.create_product("Child").unwrap();
    service
        .link_products(parent.product_uuid, child.product_uuid)
        .unwrap();
    repo.create_attribute(
        child.product_uuid,
        "Bore",
        &[prodtree_core::ValueInput {
            amount: "12".to_string(),
            unit: "mm".to_string(),
        }],
    )
    .unwrap();

    let tree = service.product_tree(parent.product_uuid, None).unwrap();
    assert!(tree.attributes.is_empty());
    let child_node = &tree.children.as_ref().unwrap()[0];
    assert_eq!(child_node.attributes.len(), 1);
    assert_eq!(child_node.attributes[0].name, "Bore");
    assert_eq!(child_node.attributes[0].values[0].amount, "12");
}

#[test]
fn link_rejects_self_reference() {
    let conn = setup();
    let repo = SqliteProductRepository::try_new(&conn).unwrap();
    let service = TreeService::new(SqliteProductRepository::try_new(&conn).unwrap());

    let product = repo.create_product("Loner").unwrap();
    let err = service
        .link_products(product.product_uuid, product.product_uuid)
        .unwrap_err();
    assert!(matches!(err, TreeServiceError::CycleDetected { .. }));
}

#[test]
fn link_rejects_ancestor_cycle() {
    let conn = setup();
    let ids = seed_chain(&conn, 3);
    let service = TreeService::new(SqliteProductRepository::try_new(&conn).unwrap());

    let err = service.link_products(ids[2], ids[0]).unwrap_err();
    assert!(matches!(
        err,
        TreeServiceError::CycleDetected {
            parent_uuid,
            child_uuid
        } if parent_uuid == ids[2] && child_uuid == ids[0]
    ));
}

#[test]
fn link_is_idempotent() {
    let conn = setup();
    let repo = SqliteProductRepository::try_new(&conn).unwrap();
    let service = TreeService::new(SqliteProductRepository::try_new(&conn).unwrap());

    let parent = repo.create_product("Parent").unwrap();
    let child = repo.create_product("Child").unwrap();
    service
        .link_products(parent.product_uuid, child.product_uuid)
        .unwrap();
    service
        .link_products(parent.product_uuid, child.product_uuid)
        .unwrap();

    let children = repo.list_child_ids(parent.product_uuid).unwrap();
    assert_eq!(children, vec![child.product_uuid]);
}

#[test]
fn link_rejects_missing_endpoints() {
    let conn = setup();
    let repo = SqliteProductRepository::try_new(&conn).unwrap();
    let service = TreeService::new(SqliteProductRepository::try_new(&conn).unwrap());

    let product = repo.create_product("Real").unwrap();
    let missing = Uuid::new_v4();

    let err = service.link_products(product.product_uuid, missing).unwrap_err();
    assert!(matches!(err, TreeServiceError::ProductNotFound(id) if id == missing));

    let err = service.link_products(missing, product.product_uuid).unwrap_err();
    assert!(matches!(err, TreeServiceError::ProductNotFound(id) if id == missing));
}

#[test]
fn shared_child_appears_under_both_parents_and_is_not_a_root() {
    let conn = setup();
    let repo = SqliteProductRepository::try_new(&conn).unwrap();
    let service = TreeService::new(SqliteProductRepository::try_new(&conn).unwrap());

    let parent_a = repo.create_product("A parent").unwrap();
    let parent_b = repo.create_product("B parent").unwrap();
    let shared = repo.create_product("Shared").unwrap();
    service
        .link_products(parent_a.product_uuid, shared.product_uuid)
        .unwrap();
    service
        .link_products(parent_b.product_uuid, shared.product_uuid)
        .unwrap();

    let roots = repo.list_root_ids().unwrap();
    assert!(roots.contains(&parent_a.product_uuid));
    assert!(roots.contains(&parent_b.product_uuid));
    assert!(!roots.contains(&shared.product_uuid));

    for parent in [parent_a.product_uuid, parent_b.product_uuid] {
        let tree = service.product_tree(parent, None).unwrap();
        let children = tree.children.as_ref().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].product_uuid, shared.product_uuid);
    }
}

#[test]
fn unlink_restores_root_status() {
    let conn = setup();
    let repo = SqliteProductRepository::try_new(&conn).unwrap();
    let service = TreeService::new(SqliteProductRepository::try_new(&conn).unwrap());

    let parent = repo.create_product("Parent").unwrap();
    let child = repo.create_product("Child").unwrap();
    service
        .link_products(parent.product_uuid, child.product_uuid)
        .unwrap();
    assert!(!repo.list_root_ids().unwrap().contains(&child.product_uuid));

    service
        .unlink_products(parent.product_uuid, child.product_uuid)
        .unwrap();
    assert!(repo.list_root_ids().unwrap().contains(&child.product_uuid));
    assert!(repo.list_child_ids(parent.product_uuid).unwrap().is_empty());
}
