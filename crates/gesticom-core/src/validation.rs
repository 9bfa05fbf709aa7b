//! # Validation Module
//!
//! Input validation utilities for GestiCom.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Web front end                                                │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (Rust)                                          │
//! │  ├── Type validation (serde deserialization)                           │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE constraints (product code, national id)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use gesticom_core::validation::{validate_code, validate_national_id};
//!
//! assert!(validate_code("COKE-330").is_ok());
//! assert!(validate_national_id("12.345.678-5").is_ok());
//! ```

use crate::error::ValidationError;
use crate::types::{ProductInput, UserInput};
use crate::{MAX_LINE_QUANTITY, MAX_UNIT_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Product Validators
// =============================================================================

/// Validates a product code (barcode / SKU).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only letters, digits, hyphens and underscores
///
/// ## Example
/// ```rust
/// use gesticom_core::validation::validate_code;
///
/// assert!(validate_code("7801234567890").is_ok());
/// assert!(validate_code("").is_err());
/// assert!(validate_code("has space").is_err());
/// ```
pub fn validate_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a search query and returns it trimmed.
///
/// Empty is allowed and means "no filter".
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates every field of a product form.
pub fn validate_product_input(input: &ProductInput) -> ValidationResult<()> {
    validate_code(&input.code)?;
    validate_product_name(&input.name)?;
    validate_price_cents(input.unit_price_cents)?;
    validate_stock_quantity(input.stock_quantity)?;
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed `MAX_LINE_QUANTITY` (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in the smallest currency unit.
///
/// Zero is allowed (free items).
///
/// ```rust
/// use gesticom_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1000).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(i64::MAX).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_UNIT_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "unit_price_cents".to_string(),
            min: 0,
            max: MAX_UNIT_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates an absolute stock count.
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock_quantity".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// User Validators
// =============================================================================

/// Validates an email address.
///
/// ## Rules
/// `local@domain.tld`: no whitespace, exactly one `@`, and a dot inside the
/// domain with text on both sides.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must look like name@domain.tld".to_string(),
    };

    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    let has_inner_dot = domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len());
    if !has_inner_dot {
        return Err(invalid());
    }

    Ok(())
}

/// Validates a Chilean RUT (national id) with its modulo-11 check digit.
///
/// Dots, hyphens and spaces are ignored. The last character is the check
/// digit (`0-9` or `K`).
///
/// ## Example
/// ```rust
/// use gesticom_core::validation::validate_national_id;
///
/// assert!(validate_national_id("12.345.678-5").is_ok());
/// assert!(validate_national_id("12345678-4").is_err());
/// ```
pub fn validate_national_id(rut: &str) -> ValidationResult<()> {
    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "national_id".to_string(),
        reason: reason.to_string(),
    };

    let cleaned = clean_national_id(rut);
    if cleaned.is_empty() {
        return Err(ValidationError::Required {
            field: "national_id".to_string(),
        });
    }
    if cleaned.len() < 2 {
        return Err(invalid("too short"));
    }

    let (body, check) = cleaned.split_at(cleaned.len() - 1);
    if !body.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("body must be numeric"));
    }

    let expected = rut_check_digit(body);
    if check.chars().next() != Some(expected) {
        return Err(invalid("check digit does not match"));
    }

    Ok(())
}

/// Formats a RUT as `12.345.678-5`.
pub fn format_national_id(rut: &str) -> String {
    let cleaned = clean_national_id(rut);
    if cleaned.len() <= 1 {
        return cleaned;
    }

    let (body, check) = cleaned.split_at(cleaned.len() - 1);
    let digits: Vec<char> = body.chars().collect();
    let mut grouped = String::with_capacity(body.len() + body.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*c);
    }

    format!("{grouped}-{check}")
}

/// Validates a user form.
pub fn validate_user_input(input: &UserInput) -> ValidationResult<()> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }
    if name.chars().count() > 120 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 120,
        });
    }

    validate_national_id(&input.national_id)?;
    validate_email(&input.email)?;
    Ok(())
}

fn clean_national_id(rut: &str) -> String {
    rut.chars()
        .filter(|c| c.is_ascii_digit() || *c == 'k' || *c == 'K')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn rut_check_digit(body: &str) -> char {
    let mut sum = 0u32;
    let mut factor = 2u32;

    for digit in body.chars().rev().filter_map(|c| c.to_digit(10)) {
        sum += digit * factor;
        factor = if factor == 7 { 2 } else { factor + 1 };
    }

    match 11 - (sum % 11) {
        11 => '0',
        10 => 'K',
        n => char::from_digit(n, 10).unwrap_or('0'),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_code() {
        assert!(validate_code("COKE-330").is_ok());
        assert!(validate_code("7801234567890").is_ok());
        assert!(validate_code("product_1").is_ok());

        assert!(validate_code("").is_err());
        assert!(validate_code("   ").is_err());
        assert!(validate_code("has space").is_err());
        assert!(validate_code(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Arroz 1kg").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(MAX_UNIT_PRICE_CENTS).is_ok());

        assert!(validate_price_cents(-1).is_err());
        assert!(validate_price_cents(MAX_UNIT_PRICE_CENTS + 1).is_err());
        assert!(validate_price_cents(i64::MAX).is_err());
    }

    #[test]
    fn test_validate_stock_quantity() {
        assert!(validate_stock_quantity(0).is_ok());
        assert!(validate_stock_quantity(-1).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ana@gesticom.cl").is_ok());
        assert!(validate_email("a.b@c.d").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("ana").is_err());
        assert!(validate_email("ana@cl").is_err());
        assert!(validate_email("ana@.cl").is_err());
        assert!(validate_email("ana@gesticom.").is_err());
        assert!(validate_email("an a@gesticom.cl").is_err());
        assert!(validate_email("ana@@gesticom.cl").is_err());
    }

    #[test]
    fn test_validate_national_id() {
        assert!(validate_national_id("12.345.678-5").is_ok());
        assert!(validate_national_id("123456785").is_ok());
        assert!(validate_national_id("11.111.111-1").is_ok());
        assert!(validate_national_id("6-k").is_ok());
        assert!(validate_national_id("6-K").is_ok());

        assert!(validate_national_id("").is_err());
        assert!(validate_national_id("5").is_err());
        assert!(validate_national_id("12.345.678-4").is_err());
        assert!(validate_national_id("1K345678-5").is_err());
    }

    #[test]
    fn test_format_national_id() {
        assert_eq!(format_national_id("123456785"), "12.345.678-5");
        assert_eq!(format_national_id("6k"), "6-K");
        assert_eq!(format_national_id("1"), "1");
    }

    #[test]
    fn test_validate_user_input() {
        let mut input = UserInput {
            name: "Ana Pérez".to_string(),
            national_id: "12.345.678-5".to_string(),
            email: "ana@gesticom.cl".to_string(),
            role: None,
        };
        assert!(validate_user_input(&input).is_ok());

        input.email = "nope".to_string();
        assert!(validate_user_input(&input).is_err());
    }
}
