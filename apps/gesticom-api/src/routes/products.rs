//! # Inventory Routes
//!
//! | Path | Method | Role |
//! |------|--------|------|
//! | /api/products?search= | GET | any |
//! | /api/products/low-stock?limit= | GET | any |
//! | /api/products/code/{code} | GET | any |
//! | /api/products/{id} | GET | any |
//! | /api/products/{id}/movements | GET | any |
//! | /api/products | POST | admin |
//! | /api/products/{id} | PUT, DELETE | admin |

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use gesticom_core::validation::{validate_product_input, validate_search_query};
use gesticom_core::{CoreError, InventoryMovement, Product, ProductInput, Role, StockLevel};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiResult;
use crate::session::CurrentOperator;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list).post(create))
        .route("/api/products/low-stock", get(low_stock))
        .route("/api/products/code/{code}", get(get_by_code))
        .route("/api/products/{id}", get(get_by_id).put(update).delete(delete))
        .route("/api/products/{id}/movements", get(movements))
}

/// Product with its display stock level.
#[derive(Debug, Clone, Serialize)]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: Product,
    pub stock_level: StockLevel,
    pub stock_label: &'static str,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        let stock_level = product.stock_level();
        ProductResponse {
            product,
            stock_level,
            stock_label: stock_level.label(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    limit: Option<i64>,
}

/// GET /api/products
async fn list(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<ProductResponse>>> {
    let prefix = match query.search.as_deref() {
        Some(raw) => Some(validate_search_query(raw)?).filter(|q| !q.is_empty()),
        None => None,
    };

    let products = state.db.products().list(prefix.as_deref()).await?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

/// GET /api/products/low-stock
async fn low_stock(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Query(query): Query<LowStockQuery>,
) -> ApiResult<Json<Vec<ProductResponse>>> {
    let limit = query.limit.unwrap_or(state.config.low_stock_limit).max(0);
    let products = state.db.products().list_low_stock(limit).await?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

/// GET /api/products/code/{code}
async fn get_by_code(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Path(code): Path<String>,
) -> ApiResult<Json<ProductResponse>> {
    let found = state.db.products().get_by_code(code.trim()).await?;
    let product = found.ok_or(CoreError::ProductNotFound(code))?;
    Ok(Json(product.into()))
}

/// GET /api/products/{id}
async fn get_by_id(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Path(id): Path<String>,
) -> ApiResult<Json<ProductResponse>> {
    let found = state.db.products().get_by_id(&id).await?;
    let product = found.ok_or(CoreError::ProductNotFound(id))?;
    Ok(Json(product.into()))
}

/// POST /api/products
async fn create(
    State(state): State<AppState>,
    operator: CurrentOperator,
    Json(input): Json<ProductInput>,
) -> ApiResult<(StatusCode, Json<ProductResponse>)> {
    operator.require(Role::Admin, "create product")?;
    validate_product_input(&input)?;

    let product = state.db.products().insert(&input).await?;
    info!(product_id = %product.id, code = %product.code, by = %operator.0.id, "Product created");
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// PUT /api/products/{id}
///
/// Replaces the descriptive fields and sets an absolute stock count.
async fn update(
    State(state): State<AppState>,
    operator: CurrentOperator,
    Path(id): Path<String>,
    Json(input): Json<ProductInput>,
) -> ApiResult<Json<ProductResponse>> {
    operator.require(Role::Admin, "update product")?;
    validate_product_input(&input)?;

    let product = state.db.products().update(&id, &input).await?;
    info!(product_id = %product.id, stock = product.stock_quantity, by = %operator.0.id, "Product updated");
    Ok(Json(product.into()))
}

/// DELETE /api/products/{id}
///
/// Past sales keep their own copy of the product name.
async fn delete(
    State(state): State<AppState>,
    operator: CurrentOperator,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    operator.require(Role::Admin, "delete product")?;

    state.db.products().delete(&id).await?;
    info!(product_id = %id, by = %operator.0.id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/products/{id}/movements
async fn movements(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<InventoryMovement>>> {
    let movements = state.db.activity().list_movements(Some(&id)).await?;
    Ok(Json(movements))
}
