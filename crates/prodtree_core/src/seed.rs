//! Deterministic demo catalog seeding.
//!
//! # Responsibility
//! - Build a small, reproducible product hierarchy for demos and smoke
//!   runs: a handful of roots, each expanded four levels deep.
//!
//! # Invariants
//! - Seeding the same connection twice doubles the catalog; callers that
//!   want a fresh demo store seed an empty database.
//! - Every seeded product owns exactly one attribute with one value.

use crate::model::product::{ProductId, ValueInput};
use crate::repo::product_repo::{ProductRepository, SqliteProductRepository};
use crate::service::product_service::ProductService;
use crate::service::tree_service::{TreeService, TreeServiceError};
use log::info;
use rusqlite::Connection;

/// Levels in each seeded tree, the root being level 1.
pub const SEED_DEPTH: u32 = 4;

const ROOT_COUNT: usize = 4;
const CHILDREN_PER_NODE: usize = 2;

const NAME_QUALIFIERS: &[&str] = &[
    "Rustic", "Sleek", "Granite", "Copper", "Modular", "Compact", "Heavy", "Slim",
];
const NAME_SUBJECTS: &[&str] = &[
    "Bracket", "Valve", "Panel", "Gear", "Hinge", "Coupler", "Frame", "Spindle",
];
const ATTRIBUTE_LABELS: &[&str] = &["Width", "Height", "Bore", "Weight"];

/// Outcome summary of one seeding run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    /// Ids of the seeded root products, in creation order.
    pub root_uuids: Vec<ProductId>,
    /// Total products created, roots included.
    pub product_count: u32,
    /// Levels per seeded tree.
    pub depth: u32,
}

/// Seeds the demo catalog into the provided connection.
///
/// Creates four roots; below each node two children are created and
/// linked until [`SEED_DEPTH`] levels exist. Names, attributes and values
/// are derived from a running counter, so repeated runs on fresh
/// databases produce identical catalogs.
pub fn seed_demo_catalog(conn: &Connection) -> Result<SeedSummary, TreeServiceError> {
    let products = ProductService::new(SqliteProductRepository::try_new(conn)?);
    let tree = TreeService::new(SqliteProductRepository::try_new(conn)?);

    let mut counter = 0usize;
    let mut product_count = 0u32;
    let mut root_uuids = Vec::with_capacity(ROOT_COUNT);

    for _ in 0..ROOT_COUNT {
        let root_uuid = create_seed_product(&products, &mut counter)?;
        product_count += 1;
        product_count += seed_children(&products, &tree, root_uuid, SEED_DEPTH - 1, &mut counter)?;
        root_uuids.push(root_uuid);
    }

    info!(
        "event=seed module=seed status=ok roots={} products={} depth={}",
        root_uuids.len(),
        product_count,
        SEED_DEPTH
    );

    Ok(SeedSummary {
        root_uuids,
        product_count,
        depth: SEED_DEPTH,
    })
}

fn seed_children<R: ProductRepository>(
    products: &ProductService<R>,
    tree: &TreeService<R>,
    parent_uuid: ProductId,
    levels_below: u32,
    counter: &mut usize,
) -> Result<u32, TreeServiceError> {
    if levels_below == 0 {
        return Ok(0);
    }

    let mut created = 0u32;
    for _ in 0..CHILDREN_PER_NODE {
        let child_uuid = create_seed_product(products, counter)?;
        tree.link_products(parent_uuid, child_uuid)?;
        created += 1;
        created += seed_children(products, tree, child_uuid, levels_below - 1, counter)?;
    }
    Ok(created)
}

fn create_seed_product<R: ProductRepository>(
    products: &ProductService<R>,
    counter: &mut usize,
) -> Result<ProductId, TreeServiceError> {
    let index = *counter;
    *counter += 1;

    let qualifier = NAME_QUALIFIERS[index % NAME_QUALIFIERS.len()];
    let subject = NAME_SUBJECTS[(index / NAME_QUALIFIERS.len()) % NAME_SUBJECTS.len()];
    let record = products.create_product(format!("{qualifier} {subject} {index}"))?;

    let label = ATTRIBUTE_LABELS[index % ATTRIBUTE_LABELS.len()];
    let value = ValueInput {
        amount: ((index + 1) * 10).to_string(),
        unit: "mm".to_string(),
    };
    products.attach_attribute(record.product_uuid, label, &[value])?;

    Ok(record.product_uuid)
}
