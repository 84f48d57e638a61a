//! Domain model for the product catalog.
//!
//! # Responsibility
//! - Define canonical records persisted by the repository layer.
//! - Define the nested tree read/write models exchanged with callers.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Product names are validated before persistence.

pub mod product;
pub mod tree;
