//! # gesticom-core: Pure Business Logic for GestiCom
//!
//! This crate is the **heart** of GestiCom. It contains the domain model and
//! every rule that can be evaluated without touching the database.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        GestiCom Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web front end                                │   │
//! │  │   Inventory ──► POS cart ──► Checkout ──► Sale history / void   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP + JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    gesticom-api (axum)                          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ gesticom-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │   Cart    │  │   rules   │  │   │
//! │  │   │   Sale    │  │           │  │ CartLine  │  │   RUT     │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐                                 │   │
//! │  │   │  session  │  │   stock   │                                 │   │
//! │  │   │ Operator  │  │StockLevel │                                 │   │
//! │  │   └───────────┘  └───────────┘                                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │         gesticom-db (SQLite, stock ledger, sale engine)         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, User, request/response structs)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Cart Aggregator with the per-line stock ceiling
//! - [`session`] - Explicit operator context passed into business logic
//! - [`stock`] - Display-only stock level classification
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use gesticom_core::cart::Cart;
//! use gesticom_core::money::Money;
//!
//! let cart = Cart::new();
//! assert!(cart.is_empty());
//! assert_eq!(cart.total(), Money::zero());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod session;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use session::Operator;
pub use stock::StockLevel;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart or sale request.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single product on one line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Maximum unit price in cents.
///
/// Keeps `price * MAX_LINE_QUANTITY * MAX_CART_LINES` well inside `i64`.
pub const MAX_UNIT_PRICE_CENTS: i64 = 100_000_000_000;

/// Default threshold for the low-stock listing.
pub const DEFAULT_LOW_STOCK_LIMIT: i64 = 5;
