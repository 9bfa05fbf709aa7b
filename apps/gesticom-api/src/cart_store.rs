//! # Cart Sessions
//!
//! One private [`Cart`] per operator, kept in server memory.
//!
//! ```text
//!   CartStore
//!   └── Arc<Mutex<HashMap<operator_id, Cart>>>
//!         ├── "u-ana"  ──► Cart { lines: [Arroz x2, Leche x1] }
//!         └── "u-luis" ──► Cart { lines: [] }
//! ```
//!
//! The mutex is held only for the duration of a closure and never across an
//! `.await`: product snapshots are fetched before locking, and checkout works
//! on a copy of the cart.

use std::collections::HashMap;
use std::sync::Arc;

use gesticom_core::Cart;
use parking_lot::Mutex;

#[derive(Debug, Clone, Default)]
pub struct CartStore {
    carts: Arc<Mutex<HashMap<String, Cart>>>,
}

impl CartStore {
    pub fn new() -> Self {
        CartStore::default()
    }

    /// Copy of the operator's cart (empty if none yet).
    pub fn snapshot(&self, operator_id: &str) -> Cart {
        self.carts
            .lock()
            .get(operator_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Runs `f` against the operator's cart, creating it on first use.
    pub fn with_cart_mut<F, R>(&self, operator_id: &str, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut carts = self.carts.lock();
        let cart = carts.entry(operator_id.to_string()).or_default();
        f(cart)
    }

    pub fn clear(&self, operator_id: &str) {
        if let Some(cart) = self.carts.lock().get_mut(operator_id) {
            cart.clear();
        }
    }

    /// Clears the cart after a checkout, unless it was edited meanwhile.
    ///
    /// Returns `false` when the stored lines no longer match `checked_out`;
    /// the cart is then left alone.
    pub fn clear_if_unchanged(&self, operator_id: &str, checked_out: &Cart) -> bool {
        let mut carts = self.carts.lock();
        match carts.get_mut(operator_id) {
            Some(cart) if cart.lines() == checked_out.lines() => {
                cart.clear();
                true
            }
            Some(_) => false,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gesticom_core::Product;

    fn product(id: &str, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            code: id.to_uppercase(),
            name: format!("Producto {id}"),
            description: None,
            unit_price_cents: 500,
            stock_quantity: stock,
            category: None,
            supplier: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_carts_are_private_per_operator() {
        let store = CartStore::new();
        store
            .with_cart_mut("ana", |c| c.add_line(&product("p1", 10), 2))
            .unwrap();

        assert_eq!(store.snapshot("ana").total_quantity(), 2);
        assert!(store.snapshot("luis").is_empty());
    }

    #[test]
    fn test_clear_if_unchanged() {
        let store = CartStore::new();
        store
            .with_cart_mut("ana", |c| c.add_line(&product("p1", 10), 1))
            .unwrap();
        let checked_out = store.snapshot("ana");

        store
            .with_cart_mut("ana", |c| c.add_line(&product("p2", 10), 1))
            .unwrap();
        assert!(!store.clear_if_unchanged("ana", &checked_out));
        assert_eq!(store.snapshot("ana").len(), 2);

        let checked_out = store.snapshot("ana");
        assert!(store.clear_if_unchanged("ana", &checked_out));
        assert!(store.snapshot("ana").is_empty());
    }
}
