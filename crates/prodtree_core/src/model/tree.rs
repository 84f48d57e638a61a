//! Nested tree read and write models.
//!
//! # Responsibility
//! - Define the depth-bounded nested structure returned by tree reads.
//! - Define the client-supplied draft structure accepted by tree writes.
//!
//! # Invariants
//! - `children = None` marks nodes at the traversal depth bound.
//! - `children = Some(empty)` marks true leaves inside the bound.

use crate::model::product::{AttributeId, ProductId, ValueId};
use serde::{Deserialize, Serialize};

/// One attribute with its values, as rendered inside a tree node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeAttribute {
    pub attribute_uuid: AttributeId,
    pub name: String,
    pub values: Vec<TreeValue>,
}

/// One amount/unit entry under a tree attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeValue {
    pub value_uuid: ValueId,
    pub amount: String,
    pub unit: String,
}

/// Depth-bounded nested product tree.
///
/// Mirrors the parent/child relation graph starting at one product. The
/// distinction between `None` and `Some(empty)` children lets callers tell
/// "not expanded" apart from "has no children".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTree {
    pub product_uuid: ProductId,
    pub name: String,
    pub attributes: Vec<TreeAttribute>,
    /// `None` when the depth budget was exhausted before expanding this
    /// node's children.
    pub children: Option<Vec<ProductTree>>,
}

impl ProductTree {
    /// Counts nesting levels actually present, the root being level 1.
    pub fn depth(&self) -> u32 {
        match &self.children {
            None => 1,
            Some(children) => {
                1 + children
                    .iter()
                    .map(ProductTree::depth)
                    .max()
                    .unwrap_or(0)
            }
        }
    }
}

/// Client-supplied nested structure accepted by tree mutation.
///
/// Only the top-level node's scalar fields are persisted; child and
/// attribute entries are carried for shape compatibility with tree reads
/// but are not written. Hierarchy edits go through explicit link
/// operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTreeDraft {
    /// Target id; `None` lets the store assign a fresh one on create.
    #[serde(default)]
    pub product_uuid: Option<ProductId>,
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<AttributeDraft>,
    #[serde(default)]
    pub children: Vec<ProductTreeDraft>,
}

/// Attribute payload inside a tree draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDraft {
    pub name: String,
    #[serde(default)]
    pub values: Vec<ValueDraft>,
}

/// Value payload inside a tree draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueDraft {
    pub amount: String,
    pub unit: String,
}
