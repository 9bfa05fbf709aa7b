//! # Sale Transaction Engine
//!
//! Turns a finalized cart into a committed sale, and reverses it on void.
//!
//! ## Process Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  process_sale(request, operator)                                        │
//! │                                                                         │
//! │  validate request ── empty / bad quantity ──► Validation error         │
//! │       │                                                                 │
//! │  BEGIN ─────────────────────────────────────────────── one atomic unit  │
//! │       │                                                                 │
//! │  1. re-read live stock per product (demand summed across lines)        │
//! │       ├── product missing ─────────────────────────► ProductNotFound    │
//! │       └── stock < demand ──────────────────────────► InsufficientStock  │
//! │  2. guarded decrement per product                                      │
//! │  3. INSERT sale, sale_items, inventory_movements, activity_log         │
//! │       │                                                                 │
//! │  COMMIT ── busy / timeout ─────────────────────────► TransactionFailed  │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction: nothing is applied.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Void Sale
//! Strict on the sale record, best-effort on stock. A line whose product was
//! deleted is skipped and reported in [`VoidOutcome::unrestored`]; the status
//! still flips to voided.
//!
//! ## Retries
//! The engine never retries. A `TransactionFailed` means nothing was applied
//! and the caller may run the whole operation again.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::ledger::StockLedger;
use crate::repository::activity::{record_activity, record_movement, SALES_MODULE};
use crate::repository::sale::{fetch_items, fetch_sale, SaleRepository};
use gesticom_core::{
    CoreError, MovementKind, Operator, ProcessSaleRequest, Role, Sale, SaleItem, SaleStatus,
    SaleWithItems, UnrestoredLine, VoidOutcome,
};

// =============================================================================
// Configuration
// =============================================================================

/// Engine settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on one atomic unit, from BEGIN to COMMIT.
    /// Default: 5 seconds
    pub commit_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            commit_timeout: Duration::from_secs(5),
        }
    }
}

impl EngineConfig {
    pub fn commit_timeout(mut self, timeout: Duration) -> Self {
        self.commit_timeout = timeout;
        self
    }
}

// =============================================================================
// Engine
// =============================================================================

/// The sale transaction engine.
#[derive(Debug, Clone)]
pub struct SaleEngine {
    pool: SqlitePool,
    config: EngineConfig,
}

impl SaleEngine {
    pub fn new(pool: SqlitePool, config: EngineConfig) -> Self {
        SaleEngine { pool, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Commits a sale and its stock decrements as one unit.
    ///
    /// Line prices come from the request (price when the line entered the
    /// cart); product names come from the live read.
    ///
    /// ## Errors
    /// - `Validation(EmptyCart)` and other request shape errors
    /// - `ProductNotFound` if a line references a missing product
    /// - `InsufficientStock` naming the first short product
    /// - `DbError::TransactionFailed` on lock conflict or timeout
    pub async fn process_sale(
        &self,
        request: &ProcessSaleRequest,
        operator: &Operator,
    ) -> DbResult<SaleWithItems> {
        request.validate().map_err(CoreError::from)?;

        let sale_id = Uuid::new_v4().to_string();
        debug!(
            sale_id = %sale_id,
            operator = %operator.id,
            lines = request.lines.len(),
            "Processing sale"
        );

        let result = self
            .atomic("process sale", self.process_in_tx(&sale_id, request, operator))
            .await;

        match &result {
            Ok(created) => info!(
                sale_id = %created.sale.id,
                total = %created.sale.total(),
                lines = created.items.len(),
                operator = %operator.id,
                "Sale completed"
            ),
            Err(err) => debug!(sale_id = %sale_id, error = %err, "Sale rejected"),
        }

        result
    }

    /// Voids a completed sale and restores its stock where possible.
    ///
    /// ## Errors
    /// - `PermissionDenied` for non-admin operators, checked before anything else
    /// - `SaleNotFound`
    /// - `AlreadyVoided`, with no stock touched
    /// - `DbError::TransactionFailed` on lock conflict or timeout
    pub async fn void_sale(&self, sale_id: &str, operator: &Operator) -> DbResult<VoidOutcome> {
        operator.require_role(Role::Admin, "void sale")?;

        debug!(sale_id = %sale_id, operator = %operator.id, "Voiding sale");

        let outcome = self
            .atomic("void sale", self.void_in_tx(sale_id, operator))
            .await?;

        if outcome.is_partial() {
            warn!(
                sale_id = %sale_id,
                unrestored = outcome.unrestored.len(),
                restored = outcome.restored_lines,
                "Sale voided with incomplete stock restoration"
            );
        } else {
            info!(
                sale_id = %sale_id,
                restored = outcome.restored_lines,
                "Sale voided"
            );
        }

        Ok(outcome)
    }

    /// Removes a voided sale and its line items.
    ///
    /// ## Errors
    /// - `PermissionDenied` for non-admin operators
    /// - `SaleNotFound`
    /// - `InvalidSaleStatus` if the sale is not voided
    pub async fn delete_voided_sale(&self, sale_id: &str, operator: &Operator) -> DbResult<()> {
        operator.require_role(Role::Admin, "delete sale")?;

        self.atomic("delete sale", self.delete_in_tx(sale_id, operator))
            .await?;

        info!(sale_id = %sale_id, operator = %operator.id, "Voided sale deleted");
        Ok(())
    }

    /// Sale history, newest first, optionally filtered by status.
    pub async fn list_sales(&self, status: Option<SaleStatus>) -> DbResult<Vec<SaleWithItems>> {
        SaleRepository::new(self.pool.clone()).list(status).await
    }

    /// One sale with its line items.
    pub async fn get_sale(&self, sale_id: &str) -> DbResult<SaleWithItems> {
        SaleRepository::new(self.pool.clone())
            .get_with_items(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()).into())
    }

    // -------------------------------------------------------------------------
    // Atomic units
    // -------------------------------------------------------------------------

    async fn process_in_tx(
        &self,
        sale_id: &str,
        request: &ProcessSaleRequest,
        operator: &Operator,
    ) -> DbResult<SaleWithItems> {
        let mut tx = self.pool.begin().await?;
        let demand = request.demand_by_product();
        let mut names: HashMap<&str, String> = HashMap::with_capacity(demand.len());

        let mut ledger = StockLedger::new(&mut tx);

        for &(product_id, requested) in &demand {
            let entry = ledger
                .get(product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

            if entry.stock_quantity < requested {
                return Err(CoreError::InsufficientStock {
                    product: entry.name,
                    available: entry.stock_quantity,
                    requested,
                }
                .into());
            }

            names.insert(product_id, entry.name);
        }

        for &(product_id, requested) in &demand {
            if !ledger.decrement(product_id, requested).await? {
                let product = names.get(product_id).cloned().unwrap_or_default();
                return Err(CoreError::InsufficientStock {
                    product,
                    available: 0,
                    requested,
                }
                .into());
            }
        }

        let now = Utc::now();
        let sale = Sale {
            id: sale_id.to_string(),
            total_cents: request.total().cents(),
            operator_id: operator.id.clone(),
            operator_name: operator.name.clone(),
            status: SaleStatus::Completed,
            created_at: now,
            voided_at: None,
            voided_by: None,
        };
        insert_sale(&mut tx, &sale).await?;

        let reason = format!("Sale #{sale_id}");
        let mut items = Vec::with_capacity(request.lines.len());

        for (position, line) in request.lines.iter().enumerate() {
            let item = SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.to_string(),
                position: position as i64,
                product_id: line.product_id.clone(),
                product_name: names
                    .get(line.product_id.as_str())
                    .cloned()
                    .unwrap_or_default(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                subtotal_cents: line.subtotal().cents(),
            };
            insert_sale_item(&mut tx, &item).await?;
            record_movement(
                &mut tx,
                &item.product_id,
                MovementKind::Out,
                item.quantity,
                &operator.name,
                &reason,
            )
            .await?;
            items.push(item);
        }

        let message = format!(
            "{} registered sale #{} for {}",
            operator.name,
            sale_id,
            sale.total()
        );
        record_activity(&mut tx, &operator.id, SALES_MODULE, &message).await?;

        tx.commit().await.map_err(commit_failed)?;

        Ok(SaleWithItems::new(sale, items))
    }

    async fn void_in_tx(&self, sale_id: &str, operator: &Operator) -> DbResult<VoidOutcome> {
        let mut tx = self.pool.begin().await?;

        let mut sale = fetch_sale(&mut tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        if !sale.is_voidable() {
            return Err(CoreError::AlreadyVoided(sale_id.to_string()).into());
        }

        let items = fetch_items(&mut tx, sale_id).await?;

        let mut restored = Vec::with_capacity(items.len());
        let mut unrestored = Vec::new();
        {
            let mut ledger = StockLedger::new(&mut tx);
            for item in &items {
                if ledger.increment(&item.product_id, item.quantity).await? {
                    restored.push(item);
                } else {
                    warn!(
                        sale_id = %sale_id,
                        product_id = %item.product_id,
                        quantity = item.quantity,
                        "Product no longer exists, stock not restored"
                    );
                    unrestored.push(UnrestoredLine {
                        product_id: item.product_id.clone(),
                        product_name: item.product_name.clone(),
                        quantity: item.quantity,
                    });
                }
            }
        }

        let reason = format!("Void of sale #{sale_id}");
        for item in &restored {
            record_movement(
                &mut tx,
                &item.product_id,
                MovementKind::In,
                item.quantity,
                &operator.name,
                &reason,
            )
            .await?;
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE sales SET status = ?2, voided_at = ?3, voided_by = ?4
            WHERE id = ?1 AND status = ?5
            "#,
        )
        .bind(sale_id)
        .bind(SaleStatus::Voided)
        .bind(now)
        .bind(&operator.id)
        .bind(SaleStatus::Completed)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::AlreadyVoided(sale_id.to_string()).into());
        }

        let message = if unrestored.is_empty() {
            format!("{} voided sale #{}", operator.name, sale_id)
        } else {
            format!(
                "{} voided sale #{} ({} line(s) not restocked)",
                operator.name,
                sale_id,
                unrestored.len()
            )
        };
        record_activity(&mut tx, &operator.id, SALES_MODULE, &message).await?;

        tx.commit().await.map_err(commit_failed)?;

        sale.status = SaleStatus::Voided;
        sale.voided_at = Some(now);
        sale.voided_by = Some(operator.id.clone());

        Ok(VoidOutcome {
            sale,
            restored_lines: restored.len(),
            unrestored,
        })
    }

    async fn delete_in_tx(&self, sale_id: &str, operator: &Operator) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let sale = fetch_sale(&mut tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        if sale.status != SaleStatus::Voided {
            return Err(CoreError::InvalidSaleStatus {
                sale_id: sale_id.to_string(),
                current_status: sale.status.to_string(),
            }
            .into());
        }

        sqlx::query("DELETE FROM sale_items WHERE sale_id = ?1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        let message = format!("{} deleted voided sale #{}", operator.name, sale_id);
        record_activity(&mut tx, &operator.id, SALES_MODULE, &message).await?;

        tx.commit().await.map_err(commit_failed)?;
        Ok(())
    }

    /// Runs one atomic unit under the commit timeout.
    ///
    /// On expiry the future is dropped, which rolls the transaction back.
    async fn atomic<T>(
        &self,
        operation: &'static str,
        unit: impl Future<Output = DbResult<T>>,
    ) -> DbResult<T> {
        let result = match tokio::time::timeout(self.config.commit_timeout, unit).await {
            Ok(result) => result,
            Err(_) => Err(DbError::TransactionFailed(format!(
                "{operation} did not commit within {} ms",
                self.config.commit_timeout.as_millis()
            ))),
        };

        if let Err(err @ DbError::TransactionFailed(_)) = &result {
            error!(operation, error = %err, "Atomic unit failed");
        }

        result
    }
}

fn commit_failed(err: sqlx::Error) -> DbError {
    match DbError::from(err) {
        err @ DbError::TransactionFailed(_) => err,
        other => DbError::TransactionFailed(other.to_string()),
    }
}

async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, total_cents, operator_id, operator_name, status,
            created_at, voided_at, voided_by
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&sale.id)
    .bind(sale.total_cents)
    .bind(&sale.operator_id)
    .bind(&sale.operator_name)
    .bind(sale.status)
    .bind(sale.created_at)
    .bind(sale.voided_at)
    .bind(&sale.voided_by)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_sale_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, position, product_id, product_name,
            quantity, unit_price_cents, subtotal_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(item.position)
    .bind(&item.product_id)
    .bind(&item.product_name)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.subtotal_cents)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use gesticom_core::{Cart, Product, ProductInput, SaleLineRequest, ValidationError};

    fn admin() -> Operator {
        Operator::new("u-admin", "Ana", Role::Admin)
    }

    fn worker() -> Operator {
        Operator::new("u-worker", "Luis", Role::Worker)
    }

    async fn setup() -> (Database, SaleEngine) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let engine = db.sale_engine(EngineConfig::default());
        (db, engine)
    }

    async fn product(db: &Database, code: &str, price: i64, stock: i64) -> Product {
        db.products()
            .insert(&ProductInput {
                code: code.to_string(),
                name: format!("Producto {code}"),
                description: None,
                unit_price_cents: price,
                stock_quantity: stock,
                category: None,
                supplier: None,
            })
            .await
            .unwrap()
    }

    async fn stock_of(db: &Database, id: &str) -> i64 {
        db.products()
            .get_by_id(id)
            .await
            .unwrap()
            .unwrap()
            .stock_quantity
    }

    fn line(product: &Product, quantity: i64) -> SaleLineRequest {
        SaleLineRequest {
            product_id: product.id.clone(),
            quantity,
            unit_price_cents: product.unit_price_cents,
        }
    }

    #[tokio::test]
    async fn test_end_to_end_sale_and_void() {
        let (db, engine) = setup().await;
        let p = product(&db, "P", 1000, 10).await;

        let mut cart = Cart::new();
        cart.add_line(&p, 3).unwrap();
        assert_eq!(cart.total().cents(), 3000);

        let created = engine
            .process_sale(&cart.to_sale_request(), &worker())
            .await
            .unwrap();
        assert_eq!(stock_of(&db, &p.id).await, 7);
        assert_eq!(created.sale.total_cents, 3000);
        assert_eq!(created.sale.status, SaleStatus::Completed);
        assert_eq!(created.sale.operator_name, "Luis");
        assert!(created.can_void);
        assert_eq!(created.items[0].product_name, "Producto P");
        assert_eq!(created.items[0].subtotal_cents, 3000);

        let outcome = engine.void_sale(&created.sale.id, &admin()).await.unwrap();
        assert_eq!(stock_of(&db, &p.id).await, 10);
        assert_eq!(outcome.sale.status, SaleStatus::Voided);
        assert_eq!(outcome.restored_lines, 1);
        assert!(!outcome.is_partial());

        let stored = engine.get_sale(&created.sale.id).await.unwrap();
        assert_eq!(stored.sale.status, SaleStatus::Voided);
        assert_eq!(stored.sale.voided_by.as_deref(), Some("u-admin"));
        assert!(!stored.can_void);

        let err = engine
            .void_sale(&created.sale.id, &admin())
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::AlreadyVoided(_))));
        assert_eq!(stock_of(&db, &p.id).await, 10);
    }

    #[tokio::test]
    async fn test_empty_request_is_rejected() {
        let (_db, engine) = setup().await;

        let err = engine
            .process_sale(&ProcessSaleRequest { lines: vec![] }, &worker())
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_domain(),
            Some(CoreError::Validation(ValidationError::EmptyCart))
        ));
    }

    #[tokio::test]
    async fn test_insufficient_stock_applies_nothing() {
        let (db, engine) = setup().await;
        let plenty = product(&db, "A", 100, 10).await;
        let short = product(&db, "B", 200, 1).await;

        let request = ProcessSaleRequest {
            lines: vec![line(&plenty, 2), line(&short, 2)],
        };
        let err = engine.process_sale(&request, &worker()).await.unwrap_err();

        match err.as_domain() {
            Some(CoreError::InsufficientStock {
                product,
                available,
                requested,
            }) => {
                assert_eq!(product, "Producto B");
                assert_eq!(*available, 1);
                assert_eq!(*requested, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(stock_of(&db, &plenty.id).await, 10);
        assert_eq!(stock_of(&db, &short.id).await, 1);
        assert_eq!(db.sales().count(None).await.unwrap(), 0);
        assert!(db.activity().list_movements(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_lines_are_checked_together() {
        let (db, engine) = setup().await;
        let p = product(&db, "A", 100, 5).await;

        let request = ProcessSaleRequest {
            lines: vec![line(&p, 3), line(&p, 3)],
        };
        let err = engine.process_sale(&request, &worker()).await.unwrap_err();

        assert!(matches!(
            err.as_domain(),
            Some(CoreError::InsufficientStock { requested: 6, .. })
        ));
        assert_eq!(stock_of(&db, &p.id).await, 5);
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let (db, engine) = setup().await;
        let p = product(&db, "A", 100, 5).await;

        let request = ProcessSaleRequest {
            lines: vec![
                line(&p, 1),
                SaleLineRequest {
                    product_id: "ghost".to_string(),
                    quantity: 1,
                    unit_price_cents: 100,
                },
            ],
        };
        let err = engine.process_sale(&request, &worker()).await.unwrap_err();

        assert!(matches!(err.as_domain(), Some(CoreError::ProductNotFound(id)) if id == "ghost"));
        assert_eq!(stock_of(&db, &p.id).await, 5);
    }

    #[tokio::test]
    async fn test_sale_writes_movements_and_activity() {
        let (db, engine) = setup().await;
        let a = product(&db, "A", 100, 5).await;
        let b = product(&db, "B", 250, 5).await;

        let request = ProcessSaleRequest {
            lines: vec![line(&a, 2), line(&b, 1)],
        };
        let created = engine.process_sale(&request, &worker()).await.unwrap();
        assert_eq!(created.sale.total_cents, 450);
        assert_eq!(created.items.len(), 2);
        assert_eq!(created.items[1].position, 1);

        let movements = db.activity().list_movements(Some(&a.id)).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].kind, MovementKind::Out);
        assert_eq!(movements[0].reason, format!("Sale #{}", created.sale.id));

        let activity = db.activity().list_activity(10).await.unwrap();
        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].actor_id, "u-worker");
        assert_eq!(activity[0].module, SALES_MODULE);
    }

    #[tokio::test]
    async fn test_void_requires_admin_regardless_of_state() {
        let (db, engine) = setup().await;
        let p = product(&db, "A", 100, 5).await;
        let created = engine
            .process_sale(&ProcessSaleRequest { lines: vec![line(&p, 1)] }, &worker())
            .await
            .unwrap();

        for sale_id in [created.sale.id.as_str(), "does-not-exist"] {
            let err = engine.void_sale(sale_id, &worker()).await.unwrap_err();
            assert!(matches!(
                err.as_domain(),
                Some(CoreError::PermissionDenied { .. })
            ));
        }

        assert_eq!(stock_of(&db, &p.id).await, 4);
        let sale = engine.get_sale(&created.sale.id).await.unwrap();
        assert_eq!(sale.sale.status, SaleStatus::Completed);
    }

    #[tokio::test]
    async fn test_void_unknown_sale() {
        let (_db, engine) = setup().await;

        let err = engine.void_sale("nope", &admin()).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::SaleNotFound(_))));
    }

    #[tokio::test]
    async fn test_void_skips_deleted_products() {
        let (db, engine) = setup().await;
        let kept = product(&db, "A", 100, 5).await;
        let gone = product(&db, "B", 200, 5).await;

        let request = ProcessSaleRequest {
            lines: vec![line(&kept, 2), line(&gone, 3)],
        };
        let created = engine.process_sale(&request, &worker()).await.unwrap();
        db.products().delete(&gone.id).await.unwrap();

        let outcome = engine.void_sale(&created.sale.id, &admin()).await.unwrap();

        assert!(outcome.is_partial());
        assert_eq!(outcome.restored_lines, 1);
        assert_eq!(outcome.unrestored.len(), 1);
        assert_eq!(outcome.unrestored[0].product_id, gone.id);
        assert_eq!(outcome.unrestored[0].quantity, 3);
        assert_eq!(outcome.sale.status, SaleStatus::Voided);
        assert_eq!(stock_of(&db, &kept.id).await, 5);

        let restocks = db.activity().list_movements(Some(&kept.id)).await.unwrap();
        assert_eq!(restocks[0].kind, MovementKind::In);
        assert!(db
            .activity()
            .list_movements(Some(&gone.id))
            .await
            .unwrap()
            .iter()
            .all(|m| m.kind == MovementKind::Out));
    }

    #[tokio::test]
    async fn test_delete_voided_sale() {
        let (db, engine) = setup().await;
        let p = product(&db, "A", 100, 5).await;
        let created = engine
            .process_sale(&ProcessSaleRequest { lines: vec![line(&p, 1)] }, &worker())
            .await
            .unwrap();
        let id = created.sale.id.clone();

        let err = engine.delete_voided_sale(&id, &admin()).await.unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(CoreError::InvalidSaleStatus { current_status, .. }) if current_status == "completed"
        ));

        engine.void_sale(&id, &admin()).await.unwrap();

        let err = engine.delete_voided_sale(&id, &worker()).await.unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(CoreError::PermissionDenied { .. })
        ));

        engine.delete_voided_sale(&id, &admin()).await.unwrap();
        assert!(db.sales().get_by_id(&id).await.unwrap().is_none());
        assert!(db.sales().get_items(&id).await.unwrap().is_empty());

        let err = engine.delete_voided_sale(&id, &admin()).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::SaleNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_sales_newest_first_with_filter() {
        let (db, engine) = setup().await;
        let p = product(&db, "A", 100, 10).await;

        let first = engine
            .process_sale(&ProcessSaleRequest { lines: vec![line(&p, 1)] }, &worker())
            .await
            .unwrap();
        let second = engine
            .process_sale(&ProcessSaleRequest { lines: vec![line(&p, 2)] }, &worker())
            .await
            .unwrap();
        engine.void_sale(&first.sale.id, &admin()).await.unwrap();

        let all = engine.list_sales(None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].sale.id, second.sale.id);
        assert_eq!(all[0].items.len(), 1);
        assert!(all[0].can_void);
        assert!(!all[1].can_void);

        let voided = engine.list_sales(Some(SaleStatus::Voided)).await.unwrap();
        assert_eq!(voided.len(), 1);
        assert_eq!(voided[0].sale.id, first.sale.id);
        assert_eq!(voided[0].items[0].quantity, 1);

        let err = engine.get_sale("nope").await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::SaleNotFound(_))));
    }

    // -------------------------------------------------------------------------
    // File-backed tests: several connections, real lock contention
    // -------------------------------------------------------------------------

    async fn file_db(dir: &tempfile::TempDir, busy: Duration) -> Database {
        Database::new(
            DbConfig::new(dir.path().join("gesticom.db"))
                .max_connections(8)
                .busy_timeout(busy),
        )
        .await
        .unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_never_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let db = file_db(&dir, Duration::from_secs(5)).await;
        let engine = db.sale_engine(EngineConfig::default().commit_timeout(Duration::from_secs(30)));
        let p = product(&db, "A", 100, 10).await;

        let mut handles = Vec::new();
        for i in 0..10 {
            let engine = engine.clone();
            let request = ProcessSaleRequest {
                lines: vec![line(&p, 3)],
            };
            let operator = Operator::new(format!("u{i}"), format!("Cajero {i}"), Role::Worker);
            handles.push(tokio::spawn(async move {
                engine.process_sale(&request, &operator).await
            }));
        }

        let mut sold = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(created) => sold += created.items[0].quantity,
                Err(err) => assert!(
                    err.is_retryable()
                        || matches!(err.as_domain(), Some(CoreError::InsufficientStock { .. })),
                    "unexpected error: {err}"
                ),
            }
        }

        assert!(sold <= 10);
        assert!(sold > 0);
        assert_eq!(stock_of(&db, &p.id).await, 10 - sold);
        assert_eq!(db.sales().count(None).await.unwrap(), sold / 3);
    }

    #[tokio::test]
    async fn test_lock_conflict_is_transaction_failed() {
        let dir = tempfile::tempdir().unwrap();
        let db = file_db(&dir, Duration::from_millis(50)).await;
        let engine = db.sale_engine(EngineConfig::default());
        let p = product(&db, "A", 100, 10).await;

        // Another writer holds the write lock
        let mut blocker = db.pool().begin().await.unwrap();
        sqlx::query("UPDATE products SET name = name WHERE id = ?1")
            .bind(&p.id)
            .execute(&mut *blocker)
            .await
            .unwrap();

        let err = engine
            .process_sale(&ProcessSaleRequest { lines: vec![line(&p, 1)] }, &worker())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::TransactionFailed(_)));
        assert!(err.is_retryable());

        blocker.rollback().await.unwrap();
        assert_eq!(stock_of(&db, &p.id).await, 10);
        assert_eq!(db.sales().count(None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_commit_timeout_is_transaction_failed() {
        let (db, _) = setup().await;
        let engine =
            db.sale_engine(EngineConfig::default().commit_timeout(Duration::from_millis(100)));
        let p = product(&db, "A", 100, 10).await;

        // The in-memory pool has a single connection; holding it stalls BEGIN
        let held = db.pool().acquire().await.unwrap();

        let err = engine
            .process_sale(&ProcessSaleRequest { lines: vec![line(&p, 1)] }, &worker())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::TransactionFailed(ref msg) if msg.contains("did not commit")));

        drop(held);
        assert_eq!(stock_of(&db, &p.id).await, 10);
        assert_eq!(db.sales().count(None).await.unwrap(), 0);
    }
}
