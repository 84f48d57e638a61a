//! Core domain logic for the product catalog tree.
//! This crate is the single source of truth for catalog invariants.

pub mod api;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod seed;
pub mod service;

pub use api::{
    list_products, mutate_product_tree, product_tree, ApiError, ProductSummary,
    ProductTreeRequest, TreeMutationRequest, TreeMutationResponse,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::product::{
    AttributeId, AttributeRecord, AttributeValueRecord, NameValidationError, ProductId,
    ProductRecord, ValueId, ValueInput,
};
pub use model::tree::{
    AttributeDraft, ProductTree, ProductTreeDraft, TreeAttribute, TreeValue, ValueDraft,
};
pub use repo::product_repo::{
    AttributeEntry, ProductListQuery, ProductRepoError, ProductRepoResult, ProductRepository,
    SqliteProductRepository, UpsertOutcome,
};
pub use seed::{seed_demo_catalog, SeedSummary, SEED_DEPTH};
pub use service::product_service::ProductService;
pub use service::tree_service::{TreeMutation, TreeService, TreeServiceError, DEFAULT_TREE_DEPTH};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
