//! # GestiCom HTTP API
//!
//! JSON service for the store: inventory, per-operator carts and checkout,
//! sale history and voids, user administration.
//!
//! ## Module Organization
//! ```text
//! gesticom_api/
//! ├── lib.rs          ◄─── Router assembly & tracing setup
//! ├── config.rs       ◄─── GESTICOM_* environment configuration
//! ├── state.rs        ◄─── AppState (Database, SaleEngine, CartStore, config)
//! ├── session.rs      ◄─── Operator extractor (x-operator-id)
//! ├── cart_store.rs   ◄─── In-memory carts keyed by operator
//! ├── error.rs        ◄─── ApiError → HTTP status + JSON body
//! └── routes/         ◄─── One module per resource
//! ```
//!
//! Business rules live in `gesticom-core`; anything that touches the
//! database lives in `gesticom-db`. Handlers only parse, check roles and
//! delegate.

pub mod cart_store;
pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod state;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use session::{CurrentOperator, OPERATOR_HEADER};
pub use state::AppState;

/// Builds the complete application router.
pub fn build_app(state: AppState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Initializes the tracing subscriber.
///
/// - `RUST_LOG=debug` - everything at debug
/// - `RUST_LOG=gesticom_db=trace` - ledger reads and writes
/// - Default: `info,gesticom=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gesticom=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
