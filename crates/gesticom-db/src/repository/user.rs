//! # User Repository
//!
//! Operators and administrators.
//!
//! The `role` column is stored as free text and may be NULL. It is read
//! verbatim through [`Role::from_persisted`], so anything unexpected loads as
//! the least-privileged role.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use gesticom_core::validation::format_national_id;
use gesticom_core::{Role, User, UserInput};

/// Raw `users` row before role parsing.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    name: String,
    national_id: String,
    email: String,
    role: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            national_id: row.national_id,
            email: row.email,
            role: Role::from_persisted(row.role.as_deref()),
            active: row.active,
            created_at: row.created_at,
        }
    }
}

const USER_COLUMNS: &str = "id, name, national_id, email, role, active, created_at";

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Lists all users ordered by name.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?1"
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    /// Creates an active user. Input must already be validated.
    ///
    /// The national id is stored formatted and the email lowercased.
    pub async fn create(&self, input: &UserInput) -> DbResult<User> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            national_id: format_national_id(&input.national_id),
            email: input.email.trim().to_lowercase(),
            role: input.role.unwrap_or_default(),
            active: true,
            created_at: Utc::now(),
        };

        debug!(id = %user.id, role = %user.role, "Creating user");

        sqlx::query(
            r#"
            INSERT INTO users (id, name, national_id, email, role, active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.national_id)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(user.active)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_user_conflict(e, &user))?;

        info!(id = %user.id, role = %user.role, "User created");
        Ok(user)
    }

    /// Updates name, national id and email. The role changes only when given.
    pub async fn update(&self, id: &str, input: &UserInput) -> DbResult<User> {
        let national_id = format_national_id(&input.national_id);
        let email = input.email.trim().to_lowercase();

        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = ?2,
                national_id = ?3,
                email = ?4,
                role = COALESCE(?5, role)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(&national_id)
        .bind(&email)
        .bind(input.role.map(|r| r.as_str()))
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } if field.contains("email") => {
                DbError::duplicate("email", email.clone())
            }
            DbError::UniqueViolation { .. } => DbError::duplicate("national_id", national_id.clone()),
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        info!(id = %id, "User updated");
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Flips the `active` flag and returns the updated user.
    pub async fn toggle_active(&self, id: &str) -> DbResult<User> {
        let result = sqlx::query("UPDATE users SET active = NOT active WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        let user = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))?;

        info!(id = %id, active = user.active, "User active flag toggled");
        Ok(user)
    }
}

fn map_user_conflict(err: sqlx::Error, user: &User) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { field, .. } if field.contains("email") => {
            DbError::duplicate("email", user.email.clone())
        }
        DbError::UniqueViolation { .. } => DbError::duplicate("national_id", user.national_id.clone()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn input(email: &str, rut: &str, role: Option<Role>) -> UserInput {
        UserInput {
            name: "Ana Pérez".to_string(),
            national_id: rut.to_string(),
            email: email.to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_create_defaults_to_worker() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        let user = repo
            .create(&input("Ana@Gesticom.cl", "123456785", None))
            .await
            .unwrap();

        assert_eq!(user.role, Role::Worker);
        assert!(user.active);
        assert_eq!(user.email, "ana@gesticom.cl");
        assert_eq!(user.national_id, "12.345.678-5");

        let loaded = repo.get_by_email("ana@gesticom.cl").await.unwrap().unwrap();
        assert_eq!(loaded.id, user.id);
    }

    #[tokio::test]
    async fn test_unknown_or_missing_role_loads_as_worker() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        for (id, role) in [("u1", Some("owner")), ("u2", None), ("u3", Some("admin"))] {
            sqlx::query(
                "INSERT INTO users (id, name, national_id, email, role, active, created_at) VALUES (?1, 'X', ?1, ?2, ?3, 1, ?4)",
            )
            .bind(id)
            .bind(format!("{id}@gesticom.cl"))
            .bind(role)
            .bind(Utc::now())
            .execute(db.pool())
            .await
            .unwrap();
        }

        let repo = db.users();
        assert_eq!(repo.get_by_id("u1").await.unwrap().unwrap().role, Role::Worker);
        assert_eq!(repo.get_by_id("u2").await.unwrap().unwrap().role, Role::Worker);
        assert_eq!(repo.get_by_id("u3").await.unwrap().unwrap().role, Role::Admin);
    }

    #[tokio::test]
    async fn test_update_and_toggle() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        let user = repo
            .create(&input("ana@gesticom.cl", "12.345.678-5", Some(Role::Admin)))
            .await
            .unwrap();

        let mut edit = input("ana.p@gesticom.cl", "12.345.678-5", None);
        edit.name = "Ana P.".to_string();
        let updated = repo.update(&user.id, &edit).await.unwrap();
        assert_eq!(updated.name, "Ana P.");
        assert_eq!(updated.role, Role::Admin);

        let toggled = repo.toggle_active(&user.id).await.unwrap();
        assert!(!toggled.active);
        let toggled = repo.toggle_active(&user.id).await.unwrap();
        assert!(toggled.active);

        assert!(matches!(
            repo.toggle_active("missing").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        repo.create(&input("ana@gesticom.cl", "12.345.678-5", None))
            .await
            .unwrap();
        let err = repo
            .create(&input("ana@gesticom.cl", "11.111.111-1", None))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "email"));
    }
}
