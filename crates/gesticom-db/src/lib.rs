//! # gesticom-db: Database Layer for GestiCom
//!
//! SQLite persistence through sqlx, plus the two pieces that need a
//! transaction: the stock ledger and the sale engine.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        GestiCom Data Flow                               │
//! │                                                                         │
//! │  HTTP handler (checkout, void, inventory, users)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   gesticom-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐  ┌──────────────┐  ┌──────────────────────┐ │   │
//! │  │   │   Database   │  │ Repositories │  │      SaleEngine      │ │   │
//! │  │   │   (pool.rs)  │  │ product      │  │  process / void /    │ │   │
//! │  │   │              │  │ sale (read)  │  │  delete voided       │ │   │
//! │  │   │  SqlitePool  │◄─│ user         │  │        │             │ │   │
//! │  │   │  migrations  │  │ activity     │  │  StockLedger (tx)    │ │   │
//! │  │   └──────────────┘  └──────────────┘  └──────────────────────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL)                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`ledger`] - Stock access bound to an open transaction
//! - [`engine`] - Sale transaction engine
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gesticom_core::{Operator, ProcessSaleRequest, Role, SaleLineRequest};
//! use gesticom_db::{Database, DbConfig, EngineConfig};
//!
//! # async fn run() -> Result<(), gesticom_db::DbError> {
//! let db = Database::new(DbConfig::new("./gesticom.db")).await?;
//! let engine = db.sale_engine(EngineConfig::default());
//!
//! let cashier = Operator::new("u1", "Luis", Role::Worker);
//! let request = ProcessSaleRequest {
//!     lines: vec![SaleLineRequest {
//!         product_id: "p1".into(),
//!         quantity: 2,
//!         unit_price_cents: 1000,
//!     }],
//! };
//! let sale = engine.process_sale(&request, &cashier).await?;
//! println!("sale {} total {}", sale.sale.id, sale.sale.total());
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use engine::{EngineConfig, SaleEngine};
pub use error::{DbError, DbResult};
pub use ledger::{StockEntry, StockLedger};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::activity::ActivityRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
pub use repository::user::UserRepository;
