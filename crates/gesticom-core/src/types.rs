//! # Domain Types
//!
//! Core domain types used throughout GestiCom.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │      User       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id             │       │
//! │  │  code (scan)    │   │  status         │   │  national_id    │       │
//! │  │  unit_price     │   │  total_cents    │   │  role           │       │
//! │  │  stock_quantity │   │  operator       │   │  active         │       │
//! │  └─────────────────┘   └────────┬────────┘   └─────────────────┘       │
//! │                                 │ 1..N                                  │
//! │                        ┌────────▼────────┐   ┌─────────────────┐       │
//! │                        │    SaleItem     │   │   SaleStatus    │       │
//! │                        │  (denormalized  │   │  Completed      │       │
//! │                        │   name + price) │   │  Voided         │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! - `id`: UUID v4 string - immutable, used for relations
//! - Business ID: `code` on products - human-readable, scannable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::stock::StockLevel;
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

// =============================================================================
// Role
// =============================================================================

/// Authorization role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Elevated role: inventory edits, user administration, voids.
    Admin,
    /// Least-privileged role: sells through the POS.
    #[default]
    Worker,
}

impl Role {
    /// Derives a role from the persisted field.
    ///
    /// The stored value is read verbatim. Anything absent or unrecognised
    /// yields the least-privileged role.
    ///
    /// ## Example
    /// ```rust
    /// use gesticom_core::Role;
    ///
    /// assert_eq!(Role::from_persisted(Some("admin")), Role::Admin);
    /// assert_eq!(Role::from_persisted(Some("owner")), Role::Worker);
    /// assert_eq!(Role::from_persisted(None), Role::Worker);
    /// ```
    pub fn from_persisted(value: Option<&str>) -> Self {
        match value {
            Some("admin") => Role::Admin,
            _ => Role::Worker,
        }
    }

    /// Returns the persisted representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Worker => "worker",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// ## Invariant
/// `stock_quantity >= 0` at all times. The sale engine refuses any mutation
/// that would break it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Unique, scannable business code (barcode / SKU).
    pub code: String,

    /// Display name shown to cashier and on receipts.
    pub name: String,

    /// Optional description for product details.
    pub description: Option<String>,

    /// Unit price in the smallest currency unit.
    pub unit_price_cents: i64,

    /// Units currently in stock.
    pub stock_quantity: i64,

    pub category: Option<String>,

    pub supplier: Option<String>,

    /// When the product was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as a Money type.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Display classification of the current stock.
    #[inline]
    pub fn stock_level(&self) -> StockLevel {
        StockLevel::classify(self.stock_quantity)
    }

    /// Checks if `quantity` units could be taken from the known stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        quantity > 0 && self.stock_quantity >= quantity
    }
}

/// Fields accepted when creating or editing a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductInput {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub unit_price_cents: i64,
    pub stock_quantity: i64,
    pub category: Option<String>,
    pub supplier: Option<String>,
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Sale was committed together with its stock decrements.
    Completed,
    /// Sale was reversed; stock was restored where possible.
    Voided,
}

impl SaleStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Completed => "completed",
            SaleStatus::Voided => "voided",
        }
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale.
///
/// Line items and total are immutable once created. Only the void path
/// changes the record, and only its status fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub total_cents: i64,
    /// Operator who rang up the sale.
    pub operator_id: String,
    pub operator_name: String,
    pub status: SaleStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub voided_at: Option<DateTime<Utc>>,
    pub voided_by: Option<String>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Whether the UI should offer a void action.
    ///
    /// The engine re-checks this regardless of what the UI shows.
    #[inline]
    pub fn is_voidable(&self) -> bool {
        self.status == SaleStatus::Completed
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A denormalized line item of a sale.
///
/// Name and price are frozen at the time of sale so history stays readable
/// after the product is edited or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    /// Line order within the sale.
    pub position: i64,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

impl SaleItem {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// A sale with its line items, as shown in the history view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleWithItems {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    /// Void eligibility for UI gating.
    pub can_void: bool,
}

impl SaleWithItems {
    pub fn new(sale: Sale, items: Vec<SaleItem>) -> Self {
        let can_void = sale.is_voidable();
        SaleWithItems {
            sale,
            items,
            can_void,
        }
    }
}

// =============================================================================
// Engine Requests / Responses
// =============================================================================

/// One requested line of a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLineRequest {
    pub product_id: String,
    pub quantity: i64,
    /// Unit price captured when the line entered the cart.
    pub unit_price_cents: i64,
}

impl SaleLineRequest {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

/// Input of the sale engine's `process_sale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProcessSaleRequest {
    pub lines: Vec<SaleLineRequest>,
}

impl ProcessSaleRequest {
    /// Checks the request shape before any I/O.
    ///
    /// ## Rules
    /// - At least one line (`EmptyCart`)
    /// - No more than `MAX_CART_LINES` lines
    /// - Every quantity in `1..=MAX_LINE_QUANTITY`
    /// - Every unit price in `0..=MAX_UNIT_PRICE_CENTS`
    /// - Every line names a product
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.lines.is_empty() {
            return Err(ValidationError::EmptyCart);
        }

        if self.lines.len() > MAX_CART_LINES {
            return Err(ValidationError::OutOfRange {
                field: "lines".to_string(),
                min: 1,
                max: MAX_CART_LINES as i64,
            });
        }

        for line in &self.lines {
            if line.product_id.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: "product_id".to_string(),
                });
            }
            crate::validation::validate_quantity(line.quantity)?;
            crate::validation::validate_price_cents(line.unit_price_cents)?;
        }

        Ok(())
    }

    /// Sum of line subtotals.
    pub fn total(&self) -> Money {
        self.lines.iter().map(SaleLineRequest::subtotal).sum()
    }

    /// Total requested units per product, in first-seen order.
    ///
    /// Two lines for the same product must be checked against stock together.
    pub fn demand_by_product(&self) -> Vec<(&str, i64)> {
        let mut demand: Vec<(&str, i64)> = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            match demand.iter_mut().find(|(id, _)| *id == line.product_id) {
                Some((_, qty)) => *qty += line.quantity,
                None => demand.push((line.product_id.as_str(), line.quantity)),
            }
        }
        demand
    }
}

/// Input of the sale engine's `void_sale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VoidSaleRequest {
    pub sale_id: String,
}

/// A line whose stock could not be restored because its product is gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UnrestoredLine {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
}

/// Result of a successful void.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VoidOutcome {
    pub sale: Sale,
    /// Lines whose stock was put back.
    pub restored_lines: usize,
    /// Lines skipped because the product no longer exists.
    pub unrestored: Vec<UnrestoredLine>,
}

impl VoidOutcome {
    /// True when the sale was voided but inventory reconciliation is incomplete.
    pub fn is_partial(&self) -> bool {
        !self.unrestored.is_empty()
    }

    /// Message for the operator, distinct for partial restoration.
    pub fn summary(&self) -> String {
        if self.is_partial() {
            format!(
                "Sale {} voided, but {} line item(s) could not be restored because the product no longer exists",
                self.sale.id,
                self.unrestored.len()
            )
        } else {
            format!("Sale {} voided, stock restored", self.sale.id)
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// A GestiCom user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct User {
    pub id: String,
    pub name: String,
    /// Chilean RUT.
    pub national_id: String,
    pub email: String,
    pub role: Role,
    pub active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Fields accepted when creating or editing a user.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserInput {
    pub name: String,
    pub national_id: String,
    pub email: String,
    /// Omitted role means the least-privileged one.
    #[serde(default)]
    pub role: Option<Role>,
}

// =============================================================================
// Inventory Movements / Activity
// =============================================================================

/// Direction of an inventory movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Stock came back (void).
    In,
    /// Stock left (sale).
    Out,
}

/// One stock change written alongside a sale or a void.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryMovement {
    pub id: String,
    pub product_id: String,
    pub kind: MovementKind,
    pub quantity: i64,
    pub operator_name: String,
    pub reason: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// An entry of the system activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ActivityEntry {
    pub id: String,
    pub actor_id: String,
    pub module: String,
    pub message: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: &str, quantity: i64, price: i64) -> SaleLineRequest {
        SaleLineRequest {
            product_id: product_id.to_string(),
            quantity,
            unit_price_cents: price,
        }
    }

    #[test]
    fn test_role_defaults_to_least_privileged() {
        assert_eq!(Role::default(), Role::Worker);
        assert_eq!(Role::from_persisted(Some("admin")), Role::Admin);
        assert_eq!(Role::from_persisted(Some("worker")), Role::Worker);
        assert_eq!(Role::from_persisted(Some("seller")), Role::Worker);
        assert_eq!(Role::from_persisted(Some("ADMIN")), Role::Worker);
        assert_eq!(Role::from_persisted(None), Role::Worker);
    }

    #[test]
    fn test_empty_request_is_rejected() {
        let request = ProcessSaleRequest { lines: vec![] };
        assert!(matches!(request.validate(), Err(ValidationError::EmptyCart)));
    }

    #[test]
    fn test_request_rejects_bad_lines() {
        let zero_qty = ProcessSaleRequest {
            lines: vec![line("p1", 0, 100)],
        };
        assert!(zero_qty.validate().is_err());

        let negative_price = ProcessSaleRequest {
            lines: vec![line("p1", 1, -5)],
        };
        assert!(negative_price.validate().is_err());

        let blank_product = ProcessSaleRequest {
            lines: vec![line("  ", 1, 100)],
        };
        assert!(blank_product.validate().is_err());
    }

    #[test]
    fn test_request_rejects_price_that_would_overflow_total() {
        let request = ProcessSaleRequest {
            lines: vec![line("p1", 2, i64::MAX)],
        };
        assert!(matches!(
            request.validate(),
            Err(ValidationError::OutOfRange { .. })
        ));

        let largest = ProcessSaleRequest {
            lines: vec![line("p1", crate::MAX_LINE_QUANTITY, crate::MAX_UNIT_PRICE_CENTS); 100],
        };
        assert!(largest.validate().is_ok());
        assert!(largest.total().cents() > 0);
    }

    #[test]
    fn test_request_total_and_demand() {
        let request = ProcessSaleRequest {
            lines: vec![line("p1", 3, 1000), line("p2", 1, 250), line("p1", 2, 1000)],
        };
        assert!(request.validate().is_ok());
        assert_eq!(request.total().cents(), 5250);
        assert_eq!(request.demand_by_product(), vec![("p1", 5), ("p2", 1)]);
    }

    #[test]
    fn test_void_outcome_summary_distinguishes_partial() {
        let sale = Sale {
            id: "s1".to_string(),
            total_cents: 3000,
            operator_id: "u1".to_string(),
            operator_name: "Ana".to_string(),
            status: SaleStatus::Voided,
            created_at: Utc::now(),
            voided_at: Some(Utc::now()),
            voided_by: Some("u1".to_string()),
        };

        let full = VoidOutcome {
            sale: sale.clone(),
            restored_lines: 1,
            unrestored: vec![],
        };
        assert!(!full.is_partial());
        assert_eq!(full.summary(), "Sale s1 voided, stock restored");

        let partial = VoidOutcome {
            sale,
            restored_lines: 0,
            unrestored: vec![UnrestoredLine {
                product_id: "gone".to_string(),
                product_name: "Old item".to_string(),
                quantity: 2,
            }],
        };
        assert!(partial.is_partial());
        assert_eq!(
            partial.summary(),
            "Sale s1 voided, but 1 line item(s) could not be restored because the product no longer exists"
        );
    }
}
