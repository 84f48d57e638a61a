//! Product tree use-case service.
//!
//! # Responsibility
//! - Walk the self-referential parent/child relation to a bounded depth
//!   and assemble the nested read model.
//! - Write client-supplied tree drafts back (top-level scalar fields only).
//! - Guard hierarchy edits against self-links and ancestor cycles.
//!
//! # Invariants
//! - A missing node anywhere in the walk aborts the whole read.
//! - `children = None` exactly when the depth budget reached zero.
//! - Link writes never turn the relation graph cyclic.

use crate::model::product::{ProductId, ProductRecord};
use crate::model::tree::{ProductTree, ProductTreeDraft, TreeAttribute, TreeValue};
use crate::repo::product_repo::{
    AttributeEntry, ProductRepoError, ProductRepository, UpsertOutcome,
};
use std::collections::{HashSet, VecDeque};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Child generations expanded below the requested root when the caller
/// does not pick a bound.
pub const DEFAULT_TREE_DEPTH: u32 = 7;

/// Errors from product tree service operations.
#[derive(Debug)]
pub enum TreeServiceError {
    /// Requested product (root or any descendant hit mid-walk) is missing.
    ProductNotFound(ProductId),
    /// Draft carries a blank name.
    InvalidName,
    /// Link operation would create a cycle (includes self-links).
    CycleDetected {
        parent_uuid: ProductId,
        child_uuid: ProductId,
    },
    /// Repository-level failure.
    Repo(ProductRepoError),
}

impl Display for TreeServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProductNotFound(id) => write!(f, "product not found: {id}"),
            Self::InvalidName => write!(f, "product name must not be blank"),
            Self::CycleDetected {
                parent_uuid,
                child_uuid,
            } => write!(
                f,
                "link would create cycle: child {child_uuid} under parent {parent_uuid}"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TreeServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ProductRepoError> for TreeServiceError {
    fn from(value: ProductRepoError) -> Self {
        match value {
            ProductRepoError::NotFound(product_uuid) => Self::ProductNotFound(product_uuid),
            ProductRepoError::Validation(_) => Self::InvalidName,
            other => Self::Repo(other),
        }
    }
}

/// Result of one tree mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeMutation {
    /// Whether the target node was created or updated.
    pub outcome: UpsertOutcome,
    /// The persisted row after the write.
    pub product: ProductRecord,
}

/// Product tree service facade.
pub struct TreeService<R: ProductRepository> {
    repo: R,
}

impl<R: ProductRepository> TreeService<R> {
    /// Creates a service from a repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Fetches the nested tree rooted at `root_uuid`.
    ///
    /// `max_depth` is the number of child generations to expand below the
    /// root; `None` uses [`DEFAULT_TREE_DEPTH`]. Nodes reached with an
    /// exhausted budget carry `children = None`; leaves inside the budget
    /// carry `Some(empty)`.
    ///
    /// # Errors
    /// - `ProductNotFound` when the root, or any linked child encountered
    ///   during the walk, has no row. The whole read fails; there are no
    ///   partial results.
    pub fn product_tree(
        &self,
        root_uuid: ProductId,
        max_depth: Option<u32>,
    ) -> Result<ProductTree, TreeServiceError> {
        let budget = max_depth.unwrap_or(DEFAULT_TREE_DEPTH);
        self.build_subtree(root_uuid, budget)
    }

    /// Writes a client-supplied tree draft back to the store.
    ///
    /// Best-effort by design: only the top-level node's scalar fields are
    /// persisted, as an upsert keyed by `target_uuid` (the draft's own id
    /// field is ignored). Child and attribute entries in the draft are not
    /// written; hierarchy edits go through [`TreeService::link_products`].
    pub fn mutate_tree(
        &self,
        target_uuid: ProductId,
        draft: &ProductTreeDraft,
    ) -> Result<TreeMutation, TreeServiceError> {
        let outcome = self.repo.upsert_product(target_uuid, draft.name.as_str())?;
        let product = self
            .repo
            .get_product(target_uuid)?
            .ok_or(TreeServiceError::ProductNotFound(target_uuid))?;
        Ok(TreeMutation { outcome, product })
    }

    /// Links `child_uuid` under `parent_uuid`.
    ///
    /// Rejects self-links and links that would make the child an ancestor
    /// of its own parent. Idempotent for an already-existing pair.
    pub fn link_products(
        &self,
        parent_uuid: ProductId,
        child_uuid: ProductId,
    ) -> Result<(), TreeServiceError> {
        if parent_uuid == child_uuid {
            return Err(TreeServiceError::CycleDetected {
                parent_uuid,
                child_uuid,
            });
        }
        if self.is_ancestor(child_uuid, parent_uuid)? {
            return Err(TreeServiceError::CycleDetected {
                parent_uuid,
                child_uuid,
            });
        }
        self.repo
            .link_products(parent_uuid, child_uuid)
            .map_err(Into::into)
    }

    /// Removes one parent/child link. Idempotent for absent pairs.
    pub fn unlink_products(
        &self,
        parent_uuid: ProductId,
        child_uuid: ProductId,
    ) -> Result<(), TreeServiceError> {
        self.repo
            .unlink_products(parent_uuid, child_uuid)
            .map_err(Into::into)
    }

    fn build_subtree(
        &self,
        product_uuid: ProductId,
        budget: u32,
    ) -> Result<ProductTree, TreeServiceError> {
        let product = self
            .repo
            .get_product(product_uuid)?
            .ok_or(TreeServiceError::ProductNotFound(product_uuid))?;
        let attributes = self
            .repo
            .attributes_for(product_uuid)?
            .into_iter()
            .map(tree_attribute)
            .collect();

        let children = if budget == 0 {
            None
        } else {
            let child_ids = self.repo.list_child_ids(product_uuid)?;
            let mut nodes = Vec::with_capacity(child_ids.len());
            for child_uuid in child_ids {
                nodes.push(self.build_subtree(child_uuid, budget - 1)?);
            }
            Some(nodes)
        };

        Ok(ProductTree {
            product_uuid: product.product_uuid,
            name: product.name,
            attributes,
            children,
        })
    }

    /// Walks all parent links upward from `start`, looking for `needle`.
    ///
    /// The relation is many-to-many, so this is a breadth-first walk over
    /// every ancestor path, with a visited set as the loop guard.
    fn is_ancestor(
        &self,
        needle: ProductId,
        start: ProductId,
    ) -> Result<bool, TreeServiceError> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            if current == needle {
                return Ok(true);
            }
            if !visited.insert(current) {
                continue;
            }
            for parent_uuid in self.repo.list_parent_ids(current)? {
                queue.push_back(parent_uuid);
            }
        }
        Ok(false)
    }
}

fn tree_attribute(entry: AttributeEntry) -> TreeAttribute {
    TreeAttribute {
        attribute_uuid: entry.attribute.attribute_uuid,
        name: entry.attribute.name,
        values: entry
            .values
            .into_iter()
            .map(|value| TreeValue {
                value_uuid: value.value_uuid,
                amount: value.amount,
                unit: value.unit,
            })
            .collect(),
    }
}
