//! # Stock Ledger
//!
//! Read and write access to per-product stock counts, bound to an open
//! transaction.
//!
//! ```text
//!   SaleEngine                     StockLedger<'c>
//!   ──────────                     ───────────────
//!   tx = pool.begin()
//!   ledger = StockLedger::new(&mut tx) ─► borrows the tx connection
//!        │
//!        ├── get(id)          SELECT name, unit_price_cents, stock_quantity
//!        ├── decrement(id, n) UPDATE ... SET stock = stock - n
//!        │                     WHERE id = ? AND stock >= n
//!        └── increment(id, n) UPDATE ... SET stock = stock + n
//!   tx.commit()
//! ```
//!
//! The ledger cannot be built from a pool, only from a connection the caller
//! already holds, so its calls can never interleave with the engine's checks
//! from outside the atomic unit.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::trace;

use crate::error::DbResult;

/// Stock-relevant view of a product inside a transaction.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StockEntry {
    pub name: String,
    pub unit_price_cents: i64,
    pub stock_quantity: i64,
}

/// Stock accessor over a borrowed connection.
pub struct StockLedger<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> StockLedger<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        StockLedger { conn }
    }

    /// Current stock of a product, `None` if it does not exist.
    pub async fn get(&mut self, product_id: &str) -> DbResult<Option<StockEntry>> {
        let entry = sqlx::query_as::<_, StockEntry>(
            "SELECT name, unit_price_cents, stock_quantity FROM products WHERE id = ?1",
        )
        .bind(product_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        trace!(product_id = %product_id, found = entry.is_some(), "Ledger read");
        Ok(entry)
    }

    /// Takes `quantity` units if at least that many are in stock.
    ///
    /// Returns `false`, and changes nothing, when stock is short or the
    /// product is missing.
    pub async fn decrement(&mut self, product_id: &str, quantity: i64) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity - ?2, updated_at = ?3
            WHERE id = ?1 AND stock_quantity >= ?2
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&mut *self.conn)
        .await?;

        trace!(product_id = %product_id, quantity, "Ledger decrement");
        Ok(result.rows_affected() == 1)
    }

    /// Adds `quantity` units in place, without reading first.
    ///
    /// Returns `false` when the product no longer exists.
    pub async fn increment(&mut self, product_id: &str, quantity: i64) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity + ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&mut *self.conn)
        .await?;

        trace!(product_id = %product_id, quantity, "Ledger increment");
        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use gesticom_core::ProductInput;

    async fn setup(stock: i64) -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .insert(&ProductInput {
                code: "P".to_string(),
                name: "Producto".to_string(),
                description: None,
                unit_price_cents: 1000,
                stock_quantity: stock,
                category: None,
                supplier: None,
            })
            .await
            .unwrap();
        (db, product.id)
    }

    #[tokio::test]
    async fn test_decrement_is_guarded() {
        let (db, id) = setup(3).await;
        let mut tx = db.pool().begin().await.unwrap();
        let mut ledger = StockLedger::new(&mut tx);

        assert!(ledger.decrement(&id, 2).await.unwrap());
        assert!(!ledger.decrement(&id, 2).await.unwrap());
        assert_eq!(ledger.get(&id).await.unwrap().unwrap().stock_quantity, 1);
        assert!(!ledger.decrement("missing", 1).await.unwrap());

        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_increment_reports_missing_products() {
        let (db, id) = setup(0).await;
        let mut tx = db.pool().begin().await.unwrap();
        let mut ledger = StockLedger::new(&mut tx);

        assert!(ledger.increment(&id, 4).await.unwrap());
        assert!(!ledger.increment("missing", 4).await.unwrap());
        assert!(ledger.get("missing").await.unwrap().is_none());
        tx.commit().await.unwrap();

        let product = db.products().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 4);
    }

    #[tokio::test]
    async fn test_rollback_discards_changes() {
        let (db, id) = setup(5).await;

        let mut tx = db.pool().begin().await.unwrap();
        StockLedger::new(&mut tx).decrement(&id, 5).await.unwrap();
        tx.rollback().await.unwrap();

        let product = db.products().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 5);
    }
}
