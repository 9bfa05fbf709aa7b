//! # Sale Routes
//!
//! | Path | Method | Role |
//! |------|--------|------|
//! | /api/sales?status= | GET | any |
//! | /api/sales | POST | admin (cashiers check out through the cart) |
//! | /api/sales/{id} | GET | any |
//! | /api/sales/{id}/void | POST | admin (checked by the engine) |
//! | /api/sales/{id} | DELETE | admin, voided sales only |

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use gesticom_core::{ProcessSaleRequest, Role, SaleStatus, SaleWithItems, VoidOutcome};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiResult;
use crate::session::CurrentOperator;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sales", get(list).post(process))
        .route("/api/sales/{id}", get(get_sale).delete(delete_voided))
        .route("/api/sales/{id}/void", post(void))
}

#[derive(Debug, Deserialize)]
pub struct SaleListQuery {
    status: Option<SaleStatus>,
}

/// Void result plus the message shown to the operator.
#[derive(Debug, Serialize)]
pub struct VoidResponse {
    pub message: String,
    #[serde(flatten)]
    pub outcome: VoidOutcome,
}

/// GET /api/sales
async fn list(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Query(query): Query<SaleListQuery>,
) -> ApiResult<Json<Vec<SaleWithItems>>> {
    let sales = state.engine.list_sales(query.status).await?;
    Ok(Json(sales))
}

/// POST /api/sales
///
/// Prices come from the request as-is, so only admins may record a sale
/// this way.
async fn process(
    State(state): State<AppState>,
    operator: CurrentOperator,
    Json(request): Json<ProcessSaleRequest>,
) -> ApiResult<(StatusCode, Json<SaleWithItems>)> {
    operator.require(Role::Admin, "record sale")?;

    let sale = state.engine.process_sale(&request, &operator.0).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// GET /api/sales/{id}
async fn get_sale(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleWithItems>> {
    Ok(Json(state.engine.get_sale(&id).await?))
}

/// POST /api/sales/{id}/void
async fn void(
    State(state): State<AppState>,
    operator: CurrentOperator,
    Path(id): Path<String>,
) -> ApiResult<Json<VoidResponse>> {
    let outcome = state.engine.void_sale(&id, &operator.0).await?;
    Ok(Json(VoidResponse {
        message: outcome.summary(),
        outcome,
    }))
}

/// DELETE /api/sales/{id}
async fn delete_voided(
    State(state): State<AppState>,
    operator: CurrentOperator,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.engine.delete_voided_sale(&id, &operator.0).await?;
    info!(sale_id = %id, by = %operator.0.id, "Voided sale removed from history");
    Ok(StatusCode::NO_CONTENT)
}
