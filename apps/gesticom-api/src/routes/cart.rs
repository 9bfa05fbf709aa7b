//! # Cart Routes
//!
//! Each operator edits their own cart. Every edit that depends on stock
//! fetches a fresh product snapshot first, then applies the change under the
//! cart lock.
//!
//! ```text
//!   POST /api/cart/lines {code: "ABA-001"}      scan
//!   PUT  /api/cart/lines/{id} {quantity: 3}     +/- buttons
//!   DELETE /api/cart/lines/{id}                 remove
//!   POST /api/cart/checkout ──► SaleEngine::process_sale ──► receipt
//!                                    │
//!                                    └─ cart cleared only on success
//! ```

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use gesticom_core::{Cart, CartLine, CoreError, Money, Product, SaleWithItems};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::session::CurrentOperator;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/cart", get(view).delete(clear))
        .route("/api/cart/lines", post(add_line))
        .route("/api/cart/lines/{product_id}", put(set_quantity).delete(remove_line))
        .route("/api/cart/checkout", post(checkout))
}

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CartResponse {
    pub lines: Vec<CartLine>,
    pub line_count: usize,
    pub total_quantity: i64,
    pub total_cents: i64,
    /// e.g. `$12.34`
    pub total_display: String,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        let total = cart.total();
        CartResponse {
            lines: cart.lines().to_vec(),
            line_count: cart.len(),
            total_quantity: cart.total_quantity(),
            total_cents: total.cents(),
            total_display: total.to_string(),
        }
    }
}

/// Add by product id or by scanned code.
#[derive(Debug, Deserialize)]
pub struct AddLineRequest {
    pub product_id: Option<String>,
    pub code: Option<String>,
    #[serde(default = "one")]
    pub quantity: i64,
}

fn one() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    pub store_name: String,
    pub sale_id: String,
    pub operator_name: String,
    pub timestamp: DateTime<Utc>,
    pub lines: Vec<ReceiptLine>,
    pub total_cents: i64,
    pub total_display: String,
}

impl Receipt {
    pub fn new(store_name: &str, sale: &SaleWithItems) -> Self {
        let total = Money::from_cents(sale.sale.total_cents);
        Receipt {
            store_name: store_name.to_string(),
            sale_id: sale.sale.id.clone(),
            operator_name: sale.sale.operator_name.clone(),
            timestamp: sale.sale.created_at,
            lines: sale
                .items
                .iter()
                .map(|item| ReceiptLine {
                    name: item.product_name.clone(),
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price_cents,
                    subtotal_cents: item.subtotal_cents,
                })
                .collect(),
            total_cents: total.cents(),
            total_display: total.to_string(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/cart
async fn view(State(state): State<AppState>, operator: CurrentOperator) -> Json<CartResponse> {
    let cart = state.carts.snapshot(&operator.0.id);
    Json(CartResponse::from(&cart))
}

/// POST /api/cart/lines
async fn add_line(
    State(state): State<AppState>,
    operator: CurrentOperator,
    Json(request): Json<AddLineRequest>,
) -> ApiResult<Json<CartResponse>> {
    let product = fetch_product(&state, &request).await?;
    debug!(operator_id = %operator.0.id, product_id = %product.id, quantity = request.quantity, "Adding cart line");

    let cart = state.carts.with_cart_mut(&operator.0.id, |cart| {
        cart.add_line(&product, request.quantity)?;
        Ok::<_, CoreError>(CartResponse::from(&*cart))
    })?;
    Ok(Json(cart))
}

/// PUT /api/cart/lines/{product_id}
///
/// A quantity of zero or less removes the line.
async fn set_quantity(
    State(state): State<AppState>,
    operator: CurrentOperator,
    Path(product_id): Path<String>,
    Json(request): Json<SetQuantityRequest>,
) -> ApiResult<Json<CartResponse>> {
    let fresh = state.db.products().get_by_id(&product_id).await?;

    let cart = state.carts.with_cart_mut(&operator.0.id, |cart| {
        match &fresh {
            Some(product) => {
                cart.refresh_snapshot(product);
            }
            // Product deleted since it was added: the line can only go away
            None if request.quantity > 0 && cart.line(&product_id).is_some() => {
                return Err(CoreError::ProductNotFound(product_id.clone()));
            }
            None => {}
        }
        cart.set_quantity(&product_id, request.quantity)?;
        Ok(CartResponse::from(&*cart))
    })?;
    Ok(Json(cart))
}

/// DELETE /api/cart/lines/{product_id}
async fn remove_line(
    State(state): State<AppState>,
    operator: CurrentOperator,
    Path(product_id): Path<String>,
) -> ApiResult<Json<CartResponse>> {
    let cart = state.carts.with_cart_mut(&operator.0.id, |cart| {
        cart.remove_line(&product_id)?;
        Ok::<_, CoreError>(CartResponse::from(&*cart))
    })?;
    Ok(Json(cart))
}

/// DELETE /api/cart
async fn clear(State(state): State<AppState>, operator: CurrentOperator) -> StatusCode {
    state.carts.clear(&operator.0.id);
    StatusCode::NO_CONTENT
}

/// POST /api/cart/checkout
///
/// Any failure leaves the cart exactly as it was so the cashier can fix it
/// and retry.
async fn checkout(
    State(state): State<AppState>,
    operator: CurrentOperator,
) -> ApiResult<(StatusCode, Json<Receipt>)> {
    let cart = state.carts.snapshot(&operator.0.id);
    if cart.is_empty() {
        return Err(ApiError::from(gesticom_core::ValidationError::EmptyCart));
    }

    let sale = state
        .engine
        .process_sale(&cart.to_sale_request(), &operator.0)
        .await?;

    if !state.carts.clear_if_unchanged(&operator.0.id, &cart) {
        warn!(operator_id = %operator.0.id, sale_id = %sale.sale.id, "Cart edited during checkout, left in place");
    }

    info!(sale_id = %sale.sale.id, operator_id = %operator.0.id, total = %sale.sale.total(), "Checkout complete");
    Ok((StatusCode::CREATED, Json(Receipt::new(&state.config.store_name, &sale))))
}

async fn fetch_product(state: &AppState, request: &AddLineRequest) -> ApiResult<Product> {
    let products = state.db.products();
    let (found, key) = match (request.product_id.as_deref(), request.code.as_deref()) {
        (Some(id), _) => (products.get_by_id(id).await?, id),
        (None, Some(code)) => (products.get_by_code(code.trim()).await?, code),
        (None, None) => return Err(ApiError::validation("product_id or code is required")),
    };
    found.ok_or_else(|| CoreError::ProductNotFound(key.to_string()).into())
}
