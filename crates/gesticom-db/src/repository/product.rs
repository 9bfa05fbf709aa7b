//! # Product Repository
//!
//! Database operations for the inventory.
//!
//! ## Name-Prefix Search
//! ```text
//! User types: "Arr"
//!      │
//!      ▼
//! WHERE name >= 'Arr' AND name < 'Arr' || U+10FFFF
//!      │                 (range scan on idx_products_name)
//!      ▼
//! ┌──────────────────────────────┐
//! │ Arroz 1kg       ← MATCH      │
//! │ Arroz integral  ← MATCH      │
//! │ Atún lata                    │
//! └──────────────────────────────┘
//! ```
//! Matching is case-sensitive, like the range query it replaces.
//!
//! Stock is never edited through the sale path here; that belongs to the
//! [`StockLedger`](crate::ledger::StockLedger) inside the engine's transaction.
//! `update` only applies an absolute stock correction from the inventory form.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use gesticom_core::{Product, ProductInput};

/// Upper bound appended to a prefix for the range query.
const PREFIX_UPPER_BOUND: char = '\u{10FFFF}';

const PRODUCT_COLUMNS: &str = r#"
    id, code, name, description, unit_price_cents, stock_quantity,
    category, supplier, created_at, updated_at
"#;

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products ordered by name, optionally filtered by name prefix.
    ///
    /// An empty or blank prefix lists everything.
    pub async fn list(&self, name_prefix: Option<&str>) -> DbResult<Vec<Product>> {
        let prefix = name_prefix.map(str::trim).filter(|p| !p.is_empty());

        debug!(prefix = ?prefix, "Listing products");

        let products = match prefix {
            Some(prefix) => {
                let upper = format!("{prefix}{PREFIX_UPPER_BOUND}");
                sqlx::query_as::<_, Product>(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products WHERE name >= ?1 AND name < ?2 ORDER BY name"
                ))
                .bind(prefix)
                .bind(upper)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Product>(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        debug!(count = products.len(), "Product listing returned");
        Ok(products)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its scannable code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE code = ?1"
        ))
        .bind(code.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Products at or below `limit` units, lowest stock first.
    pub async fn list_low_stock(&self, limit: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE stock_quantity <= ?1 ORDER BY stock_quantity, name"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product. Input must already be validated.
    ///
    /// ## Errors
    /// - `UniqueViolation` if the code is taken
    pub async fn insert(&self, input: &ProductInput) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            code: input.code.trim().to_string(),
            name: input.name.trim().to_string(),
            description: input.description.clone(),
            unit_price_cents: input.unit_price_cents,
            stock_quantity: input.stock_quantity,
            category: input.category.clone(),
            supplier: input.supplier.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, code = %product.code, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, code, name, description, unit_price_cents, stock_quantity,
                category, supplier, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.unit_price_cents)
        .bind(product.stock_quantity)
        .bind(&product.category)
        .bind(&product.supplier)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_code_conflict(e, &product.code))?;

        info!(id = %product.id, code = %product.code, "Product created");
        Ok(product)
    }

    /// Replaces the editable fields of a product.
    ///
    /// `stock_quantity` is written as an absolute correction.
    pub async fn update(&self, id: &str, input: &ProductInput) -> DbResult<Product> {
        let now = Utc::now();
        let code = input.code.trim();

        debug!(id = %id, code = %code, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                code = ?2,
                name = ?3,
                description = ?4,
                unit_price_cents = ?5,
                stock_quantity = ?6,
                category = ?7,
                supplier = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(code)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.unit_price_cents)
        .bind(input.stock_quantity)
        .bind(&input.category)
        .bind(&input.supplier)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| map_code_conflict(e, code))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Hard-deletes a product. Past sales keep their denormalized lines.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id = %id, "Product deleted");
        Ok(())
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn map_code_conflict(err: sqlx::Error, code: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("code", code),
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
