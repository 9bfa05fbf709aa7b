//! # Repository Module
//!
//! Database repository implementations for GestiCom.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                          │
//! │       │  db.products().list(Some("Arr"))                               │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── list(&self, prefix)                                               │
//! │  ├── get_by_id(&self, id) / get_by_code(&self, code)                   │
//! │  ├── insert(&self, input) / update(&self, id, input)                   │
//! │  └── delete(&self, id)                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sale writes are not here: they live in [`crate::engine`], which owns the
//! transaction.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Inventory CRUD and search
//! - [`SaleRepository`](sale::SaleRepository) - Sale history reads
//! - [`UserRepository`](user::UserRepository) - Users and roles
//! - [`ActivityRepository`](activity::ActivityRepository) - Activity log and movements

pub mod activity;
pub mod product;
pub mod sale;
pub mod user;
