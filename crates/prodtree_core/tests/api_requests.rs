use prodtree_core::db::open_db_in_memory;
use prodtree_core::{
    list_products, mutate_product_tree, product_tree, seed_demo_catalog, ApiError,
    ProductTreeDraft, ProductTreeRequest, TreeMutationRequest, SEED_DEPTH,
};
use uuid::Uuid;

#[test]
fn seeding_builds_expected_catalog_shape() {
    let conn = open_db_in_memory().unwrap();
    let summary = seed_demo_catalog(&conn).unwrap();

    assert_eq!(summary.depth, SEED_DEPTH);
    assert_eq!(summary.root_uuids.len(), 4);
    // Four roots, two children per node, four levels: 4 * (1+2+4+8).
    assert_eq!(summary.product_count, 60);
}

#[test]
fn list_products_returns_exactly_the_seeded_roots() {
    let conn = open_db_in_memory().unwrap();
    let summary = seed_demo_catalog(&conn).unwrap();

    let listed = list_products(&conn).unwrap();
    assert_eq!(listed.len(), summary.root_uuids.len());
    for root_uuid in &summary.root_uuids {
        assert!(listed.iter().any(|item| item.product_uuid == *root_uuid));
    }
}

#[test]
fn tree_request_expands_seeded_root_to_fixture_depth() {
    let conn = open_db_in_memory().unwrap();
    let summary = seed_demo_catalog(&conn).unwrap();

    let tree = product_tree(
        &conn,
        &ProductTreeRequest {
            product_uuid: summary.root_uuids[0],
            max_depth: None,
        },
    )
    .unwrap();

    // The fixture is shallower than the default bound, so every level is
    // expanded and true leaves carry empty child lists.
    assert_eq!(tree.depth(), SEED_DEPTH);
    let mut cursor = &tree;
    while let Some(children) = cursor.children.as_ref() {
        if children.is_empty() {
            break;
        }
        assert_eq!(children.len(), 2);
        cursor = &children[0];
    }
    assert_eq!(cursor.children.as_ref().map(Vec::len), Some(0));

    // Every seeded node carries its single attribute with one value.
    assert_eq!(tree.attributes.len(), 1);
    assert_eq!(tree.attributes[0].values.len(), 1);
    assert_eq!(tree.attributes[0].values[0].unit, "mm");
}

#[test]
fn tree_request_for_unknown_root_fails() {
    let conn = open_db_in_memory().unwrap();
    seed_demo_catalog(&conn).unwrap();

    let err = product_tree(
        &conn,
        &ProductTreeRequest {
            product_uuid: Uuid::new_v4(),
            max_depth: None,
        },
    )
    .unwrap_err();
    assert!(matches!(err, ApiError::Tree(_)));
}

#[test]
fn mutation_request_reports_update_and_create() {
    let conn = open_db_in_memory().unwrap();
    let summary = seed_demo_catalog(&conn).unwrap();
    let target = summary.root_uuids[0];

    let updated = mutate_product_tree(
        &conn,
        &TreeMutationRequest {
            product_uuid: target,
            tree: ProductTreeDraft {
                product_uuid: None,
                name: "Renamed root".to_string(),
                attributes: Vec::new(),
                children: Vec::new(),
            },
        },
    )
    .unwrap();
    assert!(!updated.created);
    assert_eq!(updated.name, "Renamed root");

    let fresh = Uuid::new_v4();
    let created = mutate_product_tree(
        &conn,
        &TreeMutationRequest {
            product_uuid: fresh,
            tree: ProductTreeDraft {
                product_uuid: None,
                name: "Detached node".to_string(),
                attributes: Vec::new(),
                children: Vec::new(),
            },
        },
    )
    .unwrap();
    assert!(created.created);
    assert_eq!(created.product_uuid, fresh);

    // The created node has no links, so it shows up as a root.
    let listed = list_products(&conn).unwrap();
    assert!(listed.iter().any(|item| item.product_uuid == fresh));
}

#[test]
fn tree_serializes_with_stable_field_names() {
    let conn = open_db_in_memory().unwrap();
    let summary = seed_demo_catalog(&conn).unwrap();

    let tree = product_tree(
        &conn,
        &ProductTreeRequest {
            product_uuid: summary.root_uuids[0],
            max_depth: Some(0),
        },
    )
    .unwrap();

    let json = serde_json::to_value(&tree).unwrap();
    let object = json.as_object().unwrap();
    assert!(object.contains_key("product_uuid"));
    assert!(object.contains_key("name"));
    assert!(object.contains_key("attributes"));
    // Depth-bounded nodes serialize children as null, not as [].
    assert!(object.get("children").unwrap().is_null());
}

#[test]
fn tree_request_deserializes_without_depth_field() {
    let payload = format!(r#"{{"product_uuid":"{}"}}"#, Uuid::new_v4());
    let request: ProductTreeRequest = serde_json::from_str(&payload).unwrap();
    assert!(request.max_depth.is_none());
}
