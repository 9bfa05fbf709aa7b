//! Shared application state handed to every handler.

use std::sync::Arc;

use gesticom_db::{Database, EngineConfig, SaleEngine};

use crate::cart_store::CartStore;
use crate::config::ApiConfig;

/// Cheap to clone: every field is a handle.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub engine: SaleEngine,
    pub carts: CartStore,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let engine = db.sale_engine(EngineConfig::default().commit_timeout(config.commit_timeout));
        AppState {
            db,
            engine,
            carts: CartStore::new(),
            config: Arc::new(config),
        }
    }
}
