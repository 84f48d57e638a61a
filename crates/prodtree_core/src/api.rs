//! Request/response facade over the catalog services.
//!
//! # Responsibility
//! - Expose the three caller-facing operations: list products, fetch a
//!   bounded-depth tree, mutate a tree.
//! - Keep request/response shapes serializable and free of storage types.
//!
//! # Invariants
//! - Every operation validates the connection schema before touching data.
//! - Error text is stable and safe to surface to callers.

use crate::model::product::ProductId;
use crate::model::tree::{ProductTree, ProductTreeDraft};
use crate::repo::product_repo::{
    ProductRepoError, SqliteProductRepository, UpsertOutcome,
};
use crate::service::product_service::ProductService;
use crate::service::tree_service::{TreeService, TreeServiceError};
use log::info;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors surfaced by the api facade.
#[derive(Debug)]
pub enum ApiError {
    /// Repository-level failure (schema guard, persistence, validation).
    Repo(ProductRepoError),
    /// Tree service failure (missing node, cycle, invalid draft).
    Tree(TreeServiceError),
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Tree(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Tree(err) => Some(err),
        }
    }
}

impl From<ProductRepoError> for ApiError {
    fn from(value: ProductRepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<TreeServiceError> for ApiError {
    fn from(value: TreeServiceError) -> Self {
        Self::Tree(value)
    }
}

/// One product row in list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub product_uuid: ProductId,
    pub name: String,
}

/// Request for one bounded-depth tree fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTreeRequest {
    /// Root product to expand.
    pub product_uuid: ProductId,
    /// Child generations to expand below the root; `None` uses the
    /// service default.
    #[serde(default)]
    pub max_depth: Option<u32>,
}

/// Request for one tree mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeMutationRequest {
    /// Target product the draft's top-level scalar fields are written to.
    pub product_uuid: ProductId,
    /// Client-supplied nested structure. Only the top-level node's scalar
    /// fields are persisted.
    pub tree: ProductTreeDraft,
}

/// Response for one tree mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeMutationResponse {
    pub product_uuid: ProductId,
    pub name: String,
    /// `true` when the target node did not exist and was created.
    pub created: bool,
}

/// Lists every root product (products with no parent link).
///
/// # Call contract
/// - Read-only; never mutates the store.
/// - Ordering is deterministic across calls.
pub fn list_products(conn: &Connection) -> Result<Vec<ProductSummary>, ApiError> {
    let service = ProductService::new(SqliteProductRepository::try_new(conn)?);
    let roots = service.list_root_products()?;
    info!(
        "event=api_list_products module=api status=ok count={}",
        roots.len()
    );
    Ok(roots
        .into_iter()
        .map(|record| ProductSummary {
            product_uuid: record.product_uuid,
            name: record.name,
        })
        .collect())
}

/// Fetches the nested product tree for one root.
///
/// # Call contract
/// - Fails with a not-found error when the root is missing; a missing
///   linked child mid-walk fails the whole request.
/// - Nodes past the depth bound carry `children = null` in serialized
///   form; in-bound leaves carry an empty list.
pub fn product_tree(
    conn: &Connection,
    request: &ProductTreeRequest,
) -> Result<ProductTree, ApiError> {
    let service = TreeService::new(SqliteProductRepository::try_new(conn)?);
    let tree = service.product_tree(request.product_uuid, request.max_depth)?;
    info!(
        "event=api_product_tree module=api status=ok root={} depth={}",
        request.product_uuid,
        tree.depth()
    );
    Ok(tree)
}

/// Writes a tree draft back to the store.
///
/// # Call contract
/// - Upserts only the top-level node's scalar fields, keyed by the
///   request's `product_uuid`; child and attribute entries in the draft
///   are not persisted and existing links are left unchanged.
pub fn mutate_product_tree(
    conn: &Connection,
    request: &TreeMutationRequest,
) -> Result<TreeMutationResponse, ApiError> {
    let service = TreeService::new(SqliteProductRepository::try_new(conn)?);
    let mutation = service.mutate_tree(request.product_uuid, &request.tree)?;
    let created = mutation.outcome == UpsertOutcome::Created;
    info!(
        "event=api_mutate_tree module=api status=ok target={} created={}",
        request.product_uuid, created
    );
    Ok(TreeMutationResponse {
        product_uuid: mutation.product.product_uuid,
        name: mutation.product.name,
        created,
    })
}
