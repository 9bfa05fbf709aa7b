//! # HTTP Routes
//!
//! - [`health`] - Liveness and database check
//! - [`products`] - Inventory
//! - [`cart`] - Per-operator cart and checkout
//! - [`sales`] - Sale history, explicit sales, void and cleanup
//! - [`users`] - User administration
//! - [`activity`] - Activity log
//!
//! Every route except `/health` needs the `x-operator-id` header.

pub mod activity;
pub mod cart;
pub mod health;
pub mod products;
pub mod sales;
pub mod users;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(products::router())
        .merge(cart::router())
        .merge(sales::router())
        .merge(users::router())
        .merge(activity::router())
}
