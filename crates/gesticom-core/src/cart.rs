//! # Cart Aggregator
//!
//! The per-operator shopping cart of the point of sale.
//!
//! ## Cart Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Scan / click product ──► add_line() ──────► push line or bump qty     │
//! │                                                                         │
//! │  Change quantity ───────► set_quantity() ──► qty <= 0 removes line     │
//! │                                              qty > snapshot rejected    │
//! │                                                                         │
//! │  Click remove ──────────► remove_line()                                │
//! │                                                                         │
//! │  Cancel / after sale ───► clear()                                      │
//! │                                                                         │
//! │  Checkout ──────────────► to_sale_request() ──► SaleEngine             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock Ceiling
//! Every line keeps the stock count of its product as last fetched. Quantity
//! changes beyond that count are rejected, never clamped. The snapshot may be
//! stale; the sale engine re-reads live stock inside its transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{ProcessSaleRequest, Product, SaleLineRequest};
use crate::validation::validate_quantity;
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// One product in the cart.
///
/// Code, name and unit price are frozen when the line is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub code: String,
    pub name: String,
    /// Price at add time.
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// `quantity * unit_price_cents`
    pub subtotal_cents: i64,
    /// Product stock when last fetched.
    pub stock_snapshot: i64,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    fn from_product(product: &Product, quantity: i64) -> Self {
        CartLine {
            product_id: product.id.clone(),
            code: product.code.clone(),
            name: product.name.clone(),
            unit_price_cents: product.unit_price_cents,
            quantity,
            subtotal_cents: product.unit_price().multiply_quantity(quantity).cents(),
            stock_snapshot: product.stock_quantity,
            added_at: Utc::now(),
        }
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    fn apply_quantity(&mut self, quantity: i64) {
        self.quantity = quantity;
        self.subtotal_cents = Money::from_cents(self.unit_price_cents)
            .multiply_quantity(quantity)
            .cents();
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `product_id`
/// - Every line has `0 < quantity <= stock_snapshot`
/// - At most `MAX_CART_LINES` lines
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    lines: Vec<CartLine>,
    #[ts(as = "String")]
    created_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new()
    }
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds `quantity` units of a product.
    ///
    /// ## Behavior
    /// - Product with no stock: `OutOfStock`
    /// - Product already in the cart: same as `set_quantity(existing + quantity)`
    ///   checked against the stock of `product`
    /// - Otherwise appends a new line
    ///
    /// ```rust
    /// use chrono::Utc;
    /// use gesticom_core::{Cart, Product};
    ///
    /// let now = Utc::now();
    /// let product = Product {
    ///     id: "p1".into(),
    ///     code: "P1".into(),
    ///     name: "Arroz".into(),
    ///     description: None,
    ///     unit_price_cents: 1000,
    ///     stock_quantity: 10,
    ///     category: None,
    ///     supplier: None,
    ///     created_at: now,
    ///     updated_at: now,
    /// };
    ///
    /// let mut cart = Cart::new();
    /// cart.add_line(&product, 3).unwrap();
    /// assert_eq!(cart.total().cents(), 3000);
    /// ```
    pub fn add_line(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        if product.stock_quantity <= 0 {
            return Err(CoreError::OutOfStock {
                product: product.name.clone(),
            });
        }

        validate_quantity(quantity)?;

        if let Some(index) = self.position(&product.id) {
            let requested = self.lines[index]
                .quantity
                .checked_add(quantity)
                .ok_or_else(|| ValidationError::OutOfRange {
                    field: "quantity".to_string(),
                    min: 1,
                    max: MAX_LINE_QUANTITY,
                })?;
            return self.set_quantity_at(index, requested, product.stock_quantity);
        }

        if quantity > product.stock_quantity {
            return Err(CoreError::InsufficientStock {
                product: product.name.clone(),
                available: product.stock_quantity,
                requested: quantity,
            });
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(ValidationError::OutOfRange {
                field: "cart lines".to_string(),
                min: 0,
                max: MAX_CART_LINES as i64,
            }
            .into());
        }

        self.lines.push(CartLine::from_product(product, quantity));
        Ok(())
    }

    /// Sets the quantity of an existing line.
    ///
    /// ## Behavior
    /// - `quantity <= 0` removes the line
    /// - `quantity` above the line's stock snapshot fails with
    ///   `InsufficientStock` and leaves the line untouched
    /// - Unknown product: `CartLineNotFound`
    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        let index = self
            .position(product_id)
            .ok_or_else(|| CoreError::CartLineNotFound(product_id.to_string()))?;
        let snapshot = self.lines[index].stock_snapshot;
        self.set_quantity_at(index, quantity, snapshot)
    }

    /// Replaces the stock snapshot of a line with a freshly fetched product.
    ///
    /// Returns `false` when the product has no line.
    pub fn refresh_snapshot(&mut self, product: &Product) -> bool {
        match self.lines.iter_mut().find(|l| l.product_id == product.id) {
            Some(line) => {
                line.stock_snapshot = product.stock_quantity;
                true
            }
            None => false,
        }
    }

    /// Removes a line.
    pub fn remove_line(&mut self, product_id: &str) -> CoreResult<()> {
        let index = self
            .position(product_id)
            .ok_or_else(|| CoreError::CartLineNotFound(product_id.to_string()))?;
        self.lines.remove(index);
        Ok(())
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.created_at = Utc::now();
    }

    /// Sum of line subtotals.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Builds the engine request for checkout.
    pub fn to_sale_request(&self) -> ProcessSaleRequest {
        ProcessSaleRequest {
            lines: self
                .lines
                .iter()
                .map(|l| SaleLineRequest {
                    product_id: l.product_id.clone(),
                    quantity: l.quantity,
                    unit_price_cents: l.unit_price_cents,
                })
                .collect(),
        }
    }

    fn position(&self, product_id: &str) -> Option<usize> {
        self.lines.iter().position(|l| l.product_id == product_id)
    }

    fn set_quantity_at(&mut self, index: usize, quantity: i64, stock: i64) -> CoreResult<()> {
        if quantity <= 0 {
            self.lines.remove(index);
            return Ok(());
        }

        let line = &mut self.lines[index];

        if quantity > stock {
            return Err(CoreError::InsufficientStock {
                product: line.name.clone(),
                available: stock,
                requested: quantity,
            });
        }

        if quantity > MAX_LINE_QUANTITY {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: MAX_LINE_QUANTITY,
            }
            .into());
        }

        line.stock_snapshot = stock;
        line.apply_quantity(quantity);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, price: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            code: id.to_uppercase(),
            name: format!("Product {id}"),
            description: None,
            unit_price_cents: price,
            stock_quantity: stock,
            category: None,
            supplier: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_add_line_computes_subtotal() {
        let p = product("p", 1000, 10);
        let mut cart = Cart::new();

        cart.add_line(&p, 3).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].subtotal_cents, 3000);
        assert_eq!(cart.total().cents(), 3000);
    }

    #[test]
    fn test_add_out_of_stock_product_fails() {
        let p = product("p", 1000, 0);
        let mut cart = Cart::new();

        let err = cart.add_line(&p, 1).unwrap_err();
        assert!(matches!(err, CoreError::OutOfStock { .. }));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_existing_product_merges_lines() {
        let p = product("p", 500, 10);
        let mut cart = Cart::new();

        cart.add_line(&p, 1).unwrap();
        cart.add_line(&p, 1).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(cart.total().cents(), 1000);
    }

    #[test]
    fn test_add_beyond_stock_is_rejected() {
        let p = product("p", 500, 2);
        let mut cart = Cart::new();

        assert!(matches!(
            cart.add_line(&p, 3),
            Err(CoreError::InsufficientStock { .. })
        ));

        cart.add_line(&p, 2).unwrap();
        let err = cart.add_line(&p, 1).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 2,
                requested: 3,
                ..
            }
        ));
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[test]
    fn test_add_non_positive_quantity_is_validation_error() {
        let p = product("p", 500, 2);
        let mut cart = Cart::new();

        assert!(matches!(cart.add_line(&p, 0), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_negative_add_to_existing_line_keeps_line() {
        let p = product("p", 500, 10);
        let mut cart = Cart::new();
        cart.add_line(&p, 2).unwrap();

        assert!(matches!(cart.add_line(&p, -5), Err(CoreError::Validation(_))));
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[test]
    fn test_huge_add_to_existing_line_is_rejected() {
        let p = product("p", 500, 10);
        let mut cart = Cart::new();
        cart.add_line(&p, 2).unwrap();

        assert!(matches!(
            cart.add_line(&p, i64::MAX),
            Err(CoreError::Validation(_))
        ));
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(cart.total().cents(), 1000);
    }

    #[test]
    fn test_set_quantity_above_snapshot_leaves_line_unchanged() {
        let p = product("p", 1000, 4);
        let mut cart = Cart::new();
        cart.add_line(&p, 2).unwrap();

        let err = cart.set_quantity("p", 5).unwrap_err();

        assert!(matches!(err, CoreError::InsufficientStock { .. }));
        let line = cart.line("p").unwrap();
        assert_eq!(line.quantity, 2);
        assert_eq!(line.subtotal_cents, 2000);
    }

    #[test]
    fn test_set_quantity_recomputes_and_removes() {
        let p = product("p", 250, 10);
        let mut cart = Cart::new();
        cart.add_line(&p, 1).unwrap();

        cart.set_quantity("p", 4).unwrap();
        assert_eq!(cart.line("p").unwrap().subtotal_cents, 1000);

        cart.set_quantity("p", 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_missing_line() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.set_quantity("ghost", 1),
            Err(CoreError::CartLineNotFound(_))
        ));
    }

    #[test]
    fn test_refresh_snapshot_moves_ceiling() {
        let mut p = product("p", 100, 3);
        let mut cart = Cart::new();
        cart.add_line(&p, 3).unwrap();
        assert!(cart.set_quantity("p", 5).is_err());

        p.stock_quantity = 8;
        assert!(cart.refresh_snapshot(&p));
        cart.set_quantity("p", 5).unwrap();
        assert_eq!(cart.total().cents(), 500);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add_line(&product("a", 100, 5), 1).unwrap();
        cart.add_line(&product("b", 200, 5), 2).unwrap();

        cart.remove_line("a").unwrap();
        assert_eq!(cart.len(), 1);
        assert!(cart.remove_line("a").is_err());

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Money::zero());
    }

    #[test]
    fn test_to_sale_request_keeps_add_time_price() {
        let mut p = product("p", 1000, 10);
        let mut cart = Cart::new();
        cart.add_line(&p, 3).unwrap();

        p.unit_price_cents = 1500;
        cart.add_line(&p, 1).unwrap();

        let request = cart.to_sale_request();
        assert_eq!(request.lines.len(), 1);
        assert_eq!(request.lines[0].quantity, 4);
        assert_eq!(request.lines[0].unit_price_cents, 1000);
        assert_eq!(request.total().cents(), 4000);
    }
}
