//! Product, attribute and value records.
//!
//! # Responsibility
//! - Define the canonical rows stored in `products`, `attributes` and
//!   `attribute_values`.
//! - Provide name validation shared by every write path.
//!
//! # Invariants
//! - `product_uuid` is stable and never reused for another product.
//! - An attribute belongs to exactly one product, a value to exactly one
//!   attribute.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a product row.
pub type ProductId = Uuid;

/// Stable identifier for an attribute row.
pub type AttributeId = Uuid;

/// Stable identifier for an attribute value row.
pub type ValueId = Uuid;

/// Validation failure for product/attribute names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameValidationError {
    /// Name is empty or whitespace-only after trimming.
    Blank,
}

impl Display for NameValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank => write!(f, "name must not be blank"),
        }
    }
}

impl Error for NameValidationError {}

/// Trims a candidate name and rejects blank input.
pub fn normalize_name(value: &str) -> Result<String, NameValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(NameValidationError::Blank);
    }
    Ok(trimmed.to_string())
}

/// Canonical product row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Stable product id used for linking and tree traversal.
    pub product_uuid: ProductId,
    /// User-facing product name.
    pub name: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

/// Canonical attribute row, owned by one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRecord {
    /// Stable attribute id.
    pub attribute_uuid: AttributeId,
    /// Owning product id.
    pub product_uuid: ProductId,
    /// Attribute label, e.g. a dimension or material name.
    pub name: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

/// Canonical attribute value row, owned by one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValueRecord {
    /// Stable value id.
    pub value_uuid: ValueId,
    /// Owning attribute id.
    pub attribute_uuid: AttributeId,
    /// Magnitude kept as text to match caller-supplied formatting.
    pub amount: String,
    /// Unit label, e.g. `mm`.
    pub unit: String,
}

/// Value payload used when creating attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueInput {
    pub amount: String,
    pub unit: String,
}
