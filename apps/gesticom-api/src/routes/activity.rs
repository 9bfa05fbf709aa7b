//! Activity log route (admin).

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use gesticom_core::{ActivityEntry, Role};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::session::CurrentOperator;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/activity", get(list))
}

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    limit: Option<i64>,
}

/// GET /api/activity
async fn list(
    State(state): State<AppState>,
    operator: CurrentOperator,
    Query(query): Query<ActivityQuery>,
) -> ApiResult<Json<Vec<ActivityEntry>>> {
    operator.require(Role::Admin, "view activity log")?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    Ok(Json(state.db.activity().list_activity(limit).await?))
}
