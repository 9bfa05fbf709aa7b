//! # Sale Repository
//!
//! Read side of sales: the history view.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  SaleEngine::process_sale ──► Sale { status: Completed }               │
//! │                                    │                                    │
//! │  SaleEngine::void_sale ──────────► Sale { status: Voided }             │
//! │                                    │                                    │
//! │  SaleEngine::delete_voided_sale ─► (row and items removed)             │
//! │                                                                         │
//! │  This repository only reads. Every write goes through the engine.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use gesticom_core::{Sale, SaleItem, SaleStatus, SaleWithItems};

pub(crate) const SALE_COLUMNS: &str = r#"
    id, total_cents, operator_id, operator_name, status, created_at, voided_at, voided_by
"#;

pub(crate) const SALE_ITEM_COLUMNS: &str = r#"
    id, sale_id, position, product_id, product_name, quantity, unit_price_cents, subtotal_cents
"#;

/// Repository for sale reads.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Lists sales newest first, each with its line items.
    ///
    /// `status` narrows the listing; `None` returns every sale.
    pub async fn list(&self, status: Option<SaleStatus>) -> DbResult<Vec<SaleWithItems>> {
        debug!(status = ?status, "Listing sales");

        let sales = sqlx::query_as::<_, Sale>(&format!(
            r#"
            SELECT {SALE_COLUMNS} FROM sales
            WHERE ?1 IS NULL OR status = ?1
            ORDER BY julianday(created_at) DESC, rowid DESC
            "#
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, SaleItem>(&format!(
            r#"
            SELECT {SALE_ITEM_COLUMNS} FROM sale_items
            WHERE sale_id IN (SELECT id FROM sales WHERE ?1 IS NULL OR status = ?1)
            ORDER BY sale_id, position
            "#
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        let mut by_sale: HashMap<String, Vec<SaleItem>> = HashMap::new();
        for item in items {
            by_sale.entry(item.sale_id.clone()).or_default().push(item);
        }

        let listing: Vec<SaleWithItems> = sales
            .into_iter()
            .map(|sale| {
                let items = by_sale.remove(&sale.id).unwrap_or_default();
                SaleWithItems::new(sale, items)
            })
            .collect();

        debug!(count = listing.len(), "Sale listing returned");
        Ok(listing)
    }

    /// Gets a sale header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_sale(&mut conn, id).await
    }

    /// Gets a sale together with its line items.
    pub async fn get_with_items(&self, id: &str) -> DbResult<Option<SaleWithItems>> {
        let mut conn = self.pool.acquire().await?;
        let Some(sale) = fetch_sale(&mut conn, id).await? else {
            return Ok(None);
        };
        let items = fetch_items(&mut conn, id).await?;
        Ok(Some(SaleWithItems::new(sale, items)))
    }

    /// Gets the line items of a sale in line order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let mut conn = self.pool.acquire().await?;
        fetch_items(&mut conn, sale_id).await
    }

    /// Counts sales, optionally by status.
    pub async fn count(&self, status: Option<SaleStatus>) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE ?1 IS NULL OR status = ?1")
                .bind(status)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

/// Reads a sale header on an open connection or transaction.
pub(crate) async fn fetch_sale(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
    let sale = sqlx::query_as::<_, Sale>(&format!(
        "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(sale)
}

/// Reads the line items of a sale on an open connection or transaction.
pub(crate) async fn fetch_items(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleItem>> {
    let items = sqlx::query_as::<_, SaleItem>(&format!(
        "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY position"
    ))
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}
