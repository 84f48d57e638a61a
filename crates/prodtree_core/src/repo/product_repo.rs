//! Product repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide persistence APIs for products, hierarchy links and attributes.
//! - Keep SQL details and ordering behavior inside the repository boundary.
//!
//! # Invariants
//! - Product listings order by `name ASC, product_uuid ASC`; link
//!   listings follow link creation order.
//! - Link writes are idempotent for an existing parent/child pair.
//! - Attribute writes are atomic with their value rows.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::product::{
    normalize_name, AttributeId, AttributeRecord, AttributeValueRecord, NameValidationError,
    ProductId, ProductRecord, ValueInput,
};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const PRODUCT_SELECT_SQL: &str = "SELECT
    product_uuid,
    name,
    created_at,
    updated_at
FROM products";

/// Result type used by product repository operations.
pub type ProductRepoResult<T> = Result<T, ProductRepoError>;

/// Errors from product repository operations.
#[derive(Debug)]
pub enum ProductRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Name failed validation before persistence.
    Validation(NameValidationError),
    /// Target product does not exist.
    NotFound(ProductId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for ProductRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "product not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "product repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "product repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "product repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid catalog data: {message}"),
        }
    }
}

impl Error for ProductRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for ProductRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for ProductRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<NameValidationError> for ProductRepoError {
    fn from(value: NameValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Which branch an upsert took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No row existed; a new product was inserted.
    Created,
    /// The product existed; scalar fields were updated.
    Updated,
}

/// Query options for listing products.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductListQuery {
    /// Maximum rows to return. `None` returns everything.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

/// One attribute together with its value rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeEntry {
    pub attribute: AttributeRecord,
    pub values: Vec<AttributeValueRecord>,
}

/// Repository interface for catalog persistence.
pub trait ProductRepository {
    /// Creates one product with a generated id.
    fn create_product(&self, name: &str) -> ProductRepoResult<ProductRecord>;
    /// Updates scalar fields of one product.
    fn update_product(&self, product_uuid: ProductId, name: &str) -> ProductRepoResult<()>;
    /// Creates the product when absent, else updates its scalar fields.
    fn upsert_product(&self, product_uuid: ProductId, name: &str)
        -> ProductRepoResult<UpsertOutcome>;
    /// Loads one product by id.
    fn get_product(&self, product_uuid: ProductId) -> ProductRepoResult<Option<ProductRecord>>;
    /// Lists products with stable ordering and pagination.
    fn list_products(&self, query: &ProductListQuery) -> ProductRepoResult<Vec<ProductRecord>>;
    /// Lists ids of products that are no link's child.
    fn list_root_ids(&self) -> ProductRepoResult<Vec<ProductId>>;
    /// Lists ids of direct children under one parent.
    fn list_child_ids(&self, parent_uuid: ProductId) -> ProductRepoResult<Vec<ProductId>>;
    /// Lists ids of direct parents of one child.
    fn list_parent_ids(&self, child_uuid: ProductId) -> ProductRepoResult<Vec<ProductId>>;
    /// Links one child under one parent. Idempotent for existing pairs.
    fn link_products(&self, parent_uuid: ProductId, child_uuid: ProductId)
        -> ProductRepoResult<()>;
    /// Removes one parent/child link. Idempotent for absent pairs.
    fn unlink_products(
        &self,
        parent_uuid: ProductId,
        child_uuid: ProductId,
    ) -> ProductRepoResult<()>;
    /// Creates one attribute with its value rows in a single transaction.
    fn create_attribute(
        &self,
        product_uuid: ProductId,
        name: &str,
        values: &[ValueInput],
    ) -> ProductRepoResult<AttributeEntry>;
    /// Lists attributes (with values) owned by one product.
    fn attributes_for(&self, product_uuid: ProductId) -> ProductRepoResult<Vec<AttributeEntry>>;
}

/// SQLite-backed product repository.
pub struct SqliteProductRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProductRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> ProductRepoResult<Self> {
        ensure_catalog_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ProductRepository for SqliteProductRepository<'_> {
    fn create_product(&self, name: &str) -> ProductRepoResult<ProductRecord> {
        let normalized = normalize_name(name)?;
        let product_uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO products (product_uuid, name) VALUES (?1, ?2);",
            params![product_uuid.to_string(), normalized],
        )?;
        load_required_product(self.conn, product_uuid)
    }

    fn update_product(&self, product_uuid: ProductId, name: &str) -> ProductRepoResult<()> {
        let normalized = normalize_name(name)?;
        let changed = self.conn.execute(
            "UPDATE products
             SET name = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE product_uuid = ?1;",
            params![product_uuid.to_string(), normalized],
        )?;
        if changed == 0 {
            return Err(ProductRepoError::NotFound(product_uuid));
        }
        Ok(())
    }

    fn upsert_product(
        &self,
        product_uuid: ProductId,
        name: &str,
    ) -> ProductRepoResult<UpsertOutcome> {
        let normalized = normalize_name(name)?;
        let changed = self.conn.execute(
            "UPDATE products
             SET name = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE product_uuid = ?1;",
            params![product_uuid.to_string(), normalized],
        )?;
        if changed > 0 {
            return Ok(UpsertOutcome::Updated);
        }

        self.conn.execute(
            "INSERT INTO products (product_uuid, name) VALUES (?1, ?2);",
            params![product_uuid.to_string(), normalized],
        )?;
        Ok(UpsertOutcome::Created)
    }

    fn get_product(&self, product_uuid: ProductId) -> ProductRepoResult<Option<ProductRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PRODUCT_SELECT_SQL} WHERE product_uuid = ?1;"))?;
        let mut rows = stmt.query([product_uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_product_row(row)?));
        }
        Ok(None)
    }

    fn list_products(&self, query: &ProductListQuery) -> ProductRepoResult<Vec<ProductRecord>> {
        let mut sql = format!("{PRODUCT_SELECT_SQL} ORDER BY name ASC, product_uuid ASC");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut products = Vec::new();
        while let Some(row) = rows.next()? {
            products.push(parse_product_row(row)?);
        }
        Ok(products)
    }

    fn list_root_ids(&self) -> ProductRepoResult<Vec<ProductId>> {
        let mut stmt = self.conn.prepare(
            "SELECT product_uuid
             FROM products
             WHERE product_uuid NOT IN (SELECT child_uuid FROM product_links)
             ORDER BY name ASC, product_uuid ASC;",
        )?;
        collect_id_rows(&mut stmt, [], "products.product_uuid")
    }

    fn list_child_ids(&self, parent_uuid: ProductId) -> ProductRepoResult<Vec<ProductId>> {
        // Read from the link table alone: a link whose child row vanished
        // must surface to the traversal instead of being filtered out.
        let mut stmt = self.conn.prepare(
            "SELECT child_uuid
             FROM product_links
             WHERE parent_uuid = ?1
             ORDER BY created_at ASC, child_uuid ASC;",
        )?;
        collect_id_rows(
            &mut stmt,
            [parent_uuid.to_string()],
            "product_links.child_uuid",
        )
    }

    fn list_parent_ids(&self, child_uuid: ProductId) -> ProductRepoResult<Vec<ProductId>> {
        let mut stmt = self.conn.prepare(
            "SELECT parent_uuid
             FROM product_links
             WHERE child_uuid = ?1
             ORDER BY created_at ASC, parent_uuid ASC;",
        )?;
        collect_id_rows(
            &mut stmt,
            [child_uuid.to_string()],
            "product_links.parent_uuid",
        )
    }

    fn link_products(
        &self,
        parent_uuid: ProductId,
        child_uuid: ProductId,
    ) -> ProductRepoResult<()> {
        ensure_product_exists(self.conn, parent_uuid)?;
        ensure_product_exists(self.conn, child_uuid)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO product_links (parent_uuid, child_uuid) VALUES (?1, ?2);",
            params![parent_uuid.to_string(), child_uuid.to_string()],
        )?;
        Ok(())
    }

    fn unlink_products(
        &self,
        parent_uuid: ProductId,
        child_uuid: ProductId,
    ) -> ProductRepoResult<()> {
        self.conn.execute(
            "DELETE FROM product_links WHERE parent_uuid = ?1 AND child_uuid = ?2;",
            params![parent_uuid.to_string(), child_uuid.to_string()],
        )?;
        Ok(())
    }

    fn create_attribute(
        &self,
        product_uuid: ProductId,
        name: &str,
        values: &[ValueInput],
    ) -> ProductRepoResult<AttributeEntry> {
        let normalized = normalize_name(name)?;
        ensure_product_exists(self.conn, product_uuid)?;

        let attribute_uuid = Uuid::new_v4();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO attributes (attribute_uuid, product_uuid, name) VALUES (?1, ?2, ?3);",
            params![
                attribute_uuid.to_string(),
                product_uuid.to_string(),
                normalized,
            ],
        )?;
        for value in values {
            tx.execute(
                "INSERT INTO attribute_values (value_uuid, attribute_uuid, amount, unit)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    Uuid::new_v4().to_string(),
                    attribute_uuid.to_string(),
                    value.amount,
                    value.unit,
                ],
            )?;
        }
        tx.commit()?;

        load_required_attribute(self.conn, attribute_uuid)
    }

    fn attributes_for(&self, product_uuid: ProductId) -> ProductRepoResult<Vec<AttributeEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                attribute_uuid,
                product_uuid,
                name,
                created_at,
                updated_at
             FROM attributes
             WHERE product_uuid = ?1
             ORDER BY name ASC, attribute_uuid ASC;",
        )?;
        let mut rows = stmt.query([product_uuid.to_string()])?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            let attribute = parse_attribute_row(row)?;
            let values = values_for_attribute(self.conn, attribute.attribute_uuid)?;
            entries.push(AttributeEntry { attribute, values });
        }
        Ok(entries)
    }
}

fn load_required_product(
    conn: &Connection,
    product_uuid: ProductId,
) -> ProductRepoResult<ProductRecord> {
    let mut stmt = conn.prepare(&format!("{PRODUCT_SELECT_SQL} WHERE product_uuid = ?1;"))?;
    let mut rows = stmt.query([product_uuid.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_product_row(row);
    }
    Err(ProductRepoError::NotFound(product_uuid))
}

fn load_required_attribute(
    conn: &Connection,
    attribute_uuid: AttributeId,
) -> ProductRepoResult<AttributeEntry> {
    let mut stmt = conn.prepare(
        "SELECT
            attribute_uuid,
            product_uuid,
            name,
            created_at,
            updated_at
         FROM attributes
         WHERE attribute_uuid = ?1;",
    )?;
    let mut rows = stmt.query([attribute_uuid.to_string()])?;
    if let Some(row) = rows.next()? {
        let attribute = parse_attribute_row(row)?;
        let values = values_for_attribute(conn, attribute.attribute_uuid)?;
        return Ok(AttributeEntry { attribute, values });
    }
    Err(ProductRepoError::InvalidData(format!(
        "attribute `{attribute_uuid}` vanished after insert"
    )))
}

fn values_for_attribute(
    conn: &Connection,
    attribute_uuid: AttributeId,
) -> ProductRepoResult<Vec<AttributeValueRecord>> {
    let mut stmt = conn.prepare(
        "SELECT
            value_uuid,
            attribute_uuid,
            amount,
            unit
         FROM attribute_values
         WHERE attribute_uuid = ?1
         ORDER BY created_at ASC, value_uuid ASC;",
    )?;
    let mut rows = stmt.query([attribute_uuid.to_string()])?;
    let mut values = Vec::new();
    while let Some(row) = rows.next()? {
        values.push(parse_value_row(row)?);
    }
    Ok(values)
}

fn ensure_product_exists(conn: &Connection, product_uuid: ProductId) -> ProductRepoResult<()> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM products WHERE product_uuid = ?1;",
            [product_uuid.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    if exists.is_none() {
        return Err(ProductRepoError::NotFound(product_uuid));
    }
    Ok(())
}

fn collect_id_rows<P: rusqlite::Params>(
    stmt: &mut rusqlite::Statement<'_>,
    bind: P,
    column: &'static str,
) -> ProductRepoResult<Vec<ProductId>> {
    let mut rows = stmt.query(bind)?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, column)?);
    }
    Ok(ids)
}

fn parse_product_row(row: &Row<'_>) -> ProductRepoResult<ProductRecord> {
    let uuid_text: String = row.get("product_uuid")?;
    Ok(ProductRecord {
        product_uuid: parse_uuid(&uuid_text, "products.product_uuid")?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_attribute_row(row: &Row<'_>) -> ProductRepoResult<AttributeRecord> {
    let attribute_text: String = row.get("attribute_uuid")?;
    let product_text: String = row.get("product_uuid")?;
    Ok(AttributeRecord {
        attribute_uuid: parse_uuid(&attribute_text, "attributes.attribute_uuid")?,
        product_uuid: parse_uuid(&product_text, "attributes.product_uuid")?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_value_row(row: &Row<'_>) -> ProductRepoResult<AttributeValueRecord> {
    let value_text: String = row.get("value_uuid")?;
    let attribute_text: String = row.get("attribute_uuid")?;
    Ok(AttributeValueRecord {
        value_uuid: parse_uuid(&value_text, "attribute_values.value_uuid")?,
        attribute_uuid: parse_uuid(&attribute_text, "attribute_values.attribute_uuid")?,
        amount: row.get("amount")?,
        unit: row.get("unit")?,
    })
}

fn parse_uuid(value: &str, column: &'static str) -> ProductRepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| ProductRepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn ensure_catalog_connection_ready(conn: &Connection) -> ProductRepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(ProductRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["products", "product_links", "attributes", "attribute_values"] {
        if !table_exists(conn, table)? {
            return Err(ProductRepoError::MissingRequiredTable(table));
        }
    }

    for column in ["product_uuid", "name", "created_at", "updated_at"] {
        if !table_has_column(conn, "products", column)? {
            return Err(ProductRepoError::MissingRequiredColumn {
                table: "products",
                column,
            });
        }
    }

    for column in ["parent_uuid", "child_uuid"] {
        if !table_has_column(conn, "product_links", column)? {
            return Err(ProductRepoError::MissingRequiredColumn {
                table: "product_links",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &'static str) -> ProductRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(
    conn: &Connection,
    table: &'static str,
    column: &'static str,
) -> ProductRepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
