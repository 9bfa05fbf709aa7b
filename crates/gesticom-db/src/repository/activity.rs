//! # Activity Repository
//!
//! The audit trail: `activity_log` entries and `inventory_movements`.
//!
//! Rows are written by the sale engine inside its own transaction through
//! [`record_activity`] and [`record_movement`]; this repository reads them.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::error::DbResult;
use gesticom_core::{ActivityEntry, InventoryMovement, MovementKind};

/// Module name written on sale-related activity.
pub const SALES_MODULE: &str = "sales";

/// Repository for activity and movement reads.
#[derive(Debug, Clone)]
pub struct ActivityRepository {
    pool: SqlitePool,
}

impl ActivityRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ActivityRepository { pool }
    }

    /// Most recent activity first.
    pub async fn list_activity(&self, limit: i64) -> DbResult<Vec<ActivityEntry>> {
        let entries = sqlx::query_as::<_, ActivityEntry>(
            r#"
            SELECT id, actor_id, module, message, created_at
            FROM activity_log
            ORDER BY julianday(created_at) DESC, rowid DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Inventory movements, newest first, optionally for one product.
    pub async fn list_movements(&self, product_id: Option<&str>) -> DbResult<Vec<InventoryMovement>> {
        let movements = sqlx::query_as::<_, InventoryMovement>(
            r#"
            SELECT id, product_id, kind, quantity, operator_name, reason, created_at
            FROM inventory_movements
            WHERE ?1 IS NULL OR product_id = ?1
            ORDER BY julianday(created_at) DESC, rowid DESC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}

/// Appends an activity entry on an open connection or transaction.
pub async fn record_activity(
    conn: &mut SqliteConnection,
    actor_id: &str,
    module: &str,
    message: &str,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO activity_log (id, actor_id, module, message, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(actor_id)
    .bind(module)
    .bind(message)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Appends an inventory movement on an open connection or transaction.
pub async fn record_movement(
    conn: &mut SqliteConnection,
    product_id: &str,
    kind: MovementKind,
    quantity: i64,
    operator_name: &str,
    reason: &str,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO inventory_movements (
            id, product_id, kind, quantity, operator_name, reason, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(product_id)
    .bind(kind)
    .bind(quantity)
    .bind(operator_name)
    .bind(reason)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_record_and_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        record_activity(&mut conn, "u1", SALES_MODULE, "first").await.unwrap();
        record_activity(&mut conn, "u1", SALES_MODULE, "second").await.unwrap();
        record_movement(&mut conn, "p1", MovementKind::Out, 3, "Ana", "Sale #s1")
            .await
            .unwrap();
        record_movement(&mut conn, "p2", MovementKind::In, 1, "Ana", "Void of sale #s0")
            .await
            .unwrap();
        drop(conn);

        let repo = db.activity();

        let activity = repo.list_activity(10).await.unwrap();
        assert_eq!(activity.len(), 2);
        assert_eq!(activity[0].message, "second");
        assert_eq!(repo.list_activity(1).await.unwrap().len(), 1);

        assert_eq!(repo.list_movements(None).await.unwrap().len(), 2);
        let p1 = repo.list_movements(Some("p1")).await.unwrap();
        assert_eq!(p1.len(), 1);
        assert_eq!(p1[0].kind, MovementKind::Out);
        assert_eq!(p1[0].quantity, 3);
    }
}
