//! # Stock Level Classification
//!
//! Display-only buckets for stock counts. Nothing in the sale path makes a
//! correctness decision from these; the engine always compares raw counts.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Highest count still shown as critical.
pub const CRITICAL_STOCK_MAX: i64 = 5;

/// Highest count still shown as medium.
pub const MEDIUM_STOCK_MAX: i64 = 15;

/// Stock status badge shown next to a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    OutOfStock,
    Critical,
    Medium,
    Normal,
}

impl StockLevel {
    /// Buckets a stock count.
    ///
    /// ```rust
    /// use gesticom_core::StockLevel;
    ///
    /// assert_eq!(StockLevel::classify(0), StockLevel::OutOfStock);
    /// assert_eq!(StockLevel::classify(5), StockLevel::Critical);
    /// assert_eq!(StockLevel::classify(15), StockLevel::Medium);
    /// assert_eq!(StockLevel::classify(16), StockLevel::Normal);
    /// ```
    pub const fn classify(quantity: i64) -> Self {
        if quantity <= 0 {
            StockLevel::OutOfStock
        } else if quantity <= CRITICAL_STOCK_MAX {
            StockLevel::Critical
        } else if quantity <= MEDIUM_STOCK_MAX {
            StockLevel::Medium
        } else {
            StockLevel::Normal
        }
    }

    /// Label used by the inventory table.
    pub const fn label(&self) -> &'static str {
        match self {
            StockLevel::OutOfStock => "Out of stock",
            StockLevel::Critical => "Critical",
            StockLevel::Medium => "Medium",
            StockLevel::Normal => "Normal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        assert_eq!(StockLevel::classify(0), StockLevel::OutOfStock);
        assert_eq!(StockLevel::classify(1), StockLevel::Critical);
        assert_eq!(StockLevel::classify(5), StockLevel::Critical);
        assert_eq!(StockLevel::classify(6), StockLevel::Medium);
        assert_eq!(StockLevel::classify(15), StockLevel::Medium);
        assert_eq!(StockLevel::classify(16), StockLevel::Normal);
        assert_eq!(StockLevel::classify(1_000), StockLevel::Normal);
    }

    #[test]
    fn test_serialized_form() {
        let json = serde_json::to_string(&StockLevel::OutOfStock).unwrap();
        assert_eq!(json, "\"out_of_stock\"");
    }
}
