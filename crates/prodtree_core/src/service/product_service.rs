//! Product use-case service.
//!
//! # Responsibility
//! - Provide stable CRUD entry points for catalog callers.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - Service APIs never bypass repository validation contracts.
//! - Service layer remains storage-agnostic.

use crate::model::product::{ProductId, ProductRecord, ValueInput};
use crate::repo::product_repo::{
    AttributeEntry, ProductListQuery, ProductRepoError, ProductRepoResult, ProductRepository,
};

/// Use-case service wrapper for product CRUD operations.
pub struct ProductService<R: ProductRepository> {
    repo: R,
}

impl<R: ProductRepository> ProductService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a new product with a generated stable id.
    pub fn create_product(&self, name: impl AsRef<str>) -> ProductRepoResult<ProductRecord> {
        self.repo.create_product(name.as_ref())
    }

    /// Updates scalar fields of an existing product.
    ///
    /// Returns repository-level not-found or validation errors unchanged.
    pub fn update_product(
        &self,
        product_uuid: ProductId,
        name: impl AsRef<str>,
    ) -> ProductRepoResult<()> {
        self.repo.update_product(product_uuid, name.as_ref())
    }

    /// Gets one product by id.
    pub fn get_product(&self, product_uuid: ProductId) -> ProductRepoResult<Option<ProductRecord>> {
        self.repo.get_product(product_uuid)
    }

    /// Lists products using pagination options.
    pub fn list_products(&self, query: &ProductListQuery) -> ProductRepoResult<Vec<ProductRecord>> {
        self.repo.list_products(query)
    }

    /// Lists products that have no parent link.
    pub fn list_root_products(&self) -> ProductRepoResult<Vec<ProductRecord>> {
        let mut roots = Vec::new();
        for product_uuid in self.repo.list_root_ids()? {
            let record = self
                .repo
                .get_product(product_uuid)?
                .ok_or(ProductRepoError::NotFound(product_uuid))?;
            roots.push(record);
        }
        Ok(roots)
    }

    /// Attaches one attribute (with values) to an existing product.
    pub fn attach_attribute(
        &self,
        product_uuid: ProductId,
        name: impl AsRef<str>,
        values: &[ValueInput],
    ) -> ProductRepoResult<AttributeEntry> {
        self.repo.create_attribute(product_uuid, name.as_ref(), values)
    }

    /// Lists attributes (with values) owned by one product.
    pub fn attributes_for(&self, product_uuid: ProductId) -> ProductRepoResult<Vec<AttributeEntry>> {
        self.repo.attributes_for(product_uuid)
    }
}
