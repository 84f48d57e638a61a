//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `prodtree_core` wiring.
//! - Seed the demo catalog and print one root tree as JSON.

use prodtree_core::db::{open_db, open_db_in_memory};
use prodtree_core::{list_products, product_tree, seed_demo_catalog, ProductTreeRequest};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    // Optional first argument is a database file; without it the demo runs
    // against an in-memory store.
    let conn = match std::env::args().nth(1) {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };

    println!("prodtree_core version={}", prodtree_core::core_version());

    let summary = seed_demo_catalog(&conn)?;
    println!(
        "seeded roots={} products={} depth={}",
        summary.root_uuids.len(),
        summary.product_count,
        summary.depth
    );

    let roots = list_products(&conn)?;
    for root in &roots {
        println!("root {} {}", root.product_uuid, root.name);
    }

    if let Some(first) = roots.first() {
        let tree = product_tree(
            &conn,
            &ProductTreeRequest {
                product_uuid: first.product_uuid,
                max_depth: None,
            },
        )?;
        println!("{}", serde_json::to_string_pretty(&tree)?);
    }

    Ok(())
}
