//! # User Administration Routes
//!
//! Admin only. National ids are stored formatted (`12.345.678-5`) and emails
//! lowercased.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use gesticom_core::validation::validate_user_input;
use gesticom_core::{Role, User, UserInput};
use gesticom_db::DbError;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::session::CurrentOperator;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list).post(create))
        .route("/api/users/{id}", put(update))
        .route("/api/users/{id}/toggle-active", post(toggle_active))
}

/// GET /api/users
async fn list(State(state): State<AppState>, operator: CurrentOperator) -> ApiResult<Json<Vec<User>>> {
    operator.require(Role::Admin, "list users")?;
    Ok(Json(state.db.users().list().await?))
}

/// POST /api/users
async fn create(
    State(state): State<AppState>,
    operator: CurrentOperator,
    Json(input): Json<UserInput>,
) -> ApiResult<(StatusCode, Json<User>)> {
    operator.require(Role::Admin, "create user")?;
    validate_user_input(&input)?;

    let user = state.db.users().create(&input).await?;
    info!(user_id = %user.id, role = %user.role, by = %operator.0.id, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /api/users/{id}
async fn update(
    State(state): State<AppState>,
    operator: CurrentOperator,
    Path(id): Path<String>,
    Json(input): Json<UserInput>,
) -> ApiResult<Json<User>> {
    operator.require(Role::Admin, "update user")?;
    validate_user_input(&input)?;

    let user = state.db.users().update(&id, &input).await.map_err(user_not_found)?;
    info!(user_id = %user.id, by = %operator.0.id, "User updated");
    Ok(Json(user))
}

/// POST /api/users/{id}/toggle-active
///
/// An admin cannot deactivate their own account.
async fn toggle_active(
    State(state): State<AppState>,
    operator: CurrentOperator,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    operator.require(Role::Admin, "change user status")?;
    if id == operator.0.id {
        return Err(ApiError::validation("You cannot deactivate your own account"));
    }

    let user = state.db.users().toggle_active(&id).await.map_err(user_not_found)?;
    info!(user_id = %user.id, active = user.active, by = %operator.0.id, "User status changed");
    Ok(Json(user))
}

fn user_not_found(err: DbError) -> ApiError {
    match err {
        DbError::NotFound { id, .. } => gesticom_core::CoreError::UserNotFound(id).into(),
        other => other.into(),
    }
}
