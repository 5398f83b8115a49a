//! # Validation Module
//!
//! Input checks that run before any storage access.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Orchestrator entry (THIS MODULE)                              │
//! │  ├── required ids, text lengths                                         │
//! │  └── positive quantities and amounts                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Domain rules (status machines, totals, split payments)        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                        │
//! │  ├── NOT NULL / CHECK constraints                                       │
//! │  └── partial UNIQUE indexes (open shift, active table order)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::MAX_TEXT_LENGTH;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Rejects empty or whitespace-only identifiers.
///
/// ## Example
/// ```rust
/// use bistro_core::validation::validate_required;
///
/// assert!(validate_required("outlet_id", "out-1").is_ok());
/// assert!(validate_required("outlet_id", "  ").is_err());
/// ```
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Required free text (void reasons, refund reasons) of bounded length.
///
/// Returns the trimmed text.
pub fn validate_reason(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();
    validate_required(field, value)?;
    validate_max_length(field, value)?;
    Ok(value.to_string())
}

/// Optional free text (notes, modifiers). Empty input becomes `None`.
pub fn validate_optional_text(field: &str, value: Option<&str>) -> ValidationResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => {
            validate_max_length(field, text)?;
            Ok(Some(text.to_string()))
        }
    }
}

fn validate_max_length(field: &str, value: &str) -> ValidationResult<()> {
    if value.chars().count() > MAX_TEXT_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LENGTH,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an item quantity against `1..=max`.
pub fn validate_quantity(qty: i64, max: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if qty > max {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max,
        });
    }
    Ok(())
}

/// Payment and refund amounts must be strictly positive.
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }
    Ok(())
}

/// Tips, starting cash, counted cash.
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Rates are stored in basis points, 0 to 10000.
pub fn validate_rate_bps(field: &str, bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 10_000,
        });
    }
    Ok(())
}

/// Page numbers start at 1; sizes run from 1 to `max_page_size`.
pub fn validate_page(page: u32, page_size: u32, max_page_size: u32) -> ValidationResult<()> {
    if page == 0 {
        return Err(ValidationError::MustBePositive {
            field: "page".to_string(),
        });
    }
    if page_size == 0 || page_size > max_page_size {
        return Err(ValidationError::OutOfRange {
            field: "page_size".to_string(),
            min: 1,
            max: i64::from(max_page_size),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required() {
        assert!(validate_required("server_id", "s-1").is_ok());
        assert!(validate_required("server_id", "").is_err());
        assert!(validate_required("server_id", "  \t").is_err());
    }

    #[test]
    fn test_validate_reason_trims_and_limits() {
        assert_eq!(validate_reason("reason", "  spilled  ").unwrap(), "spilled");
        assert!(validate_reason("reason", "").is_err());
        assert!(validate_reason("reason", &"x".repeat(MAX_TEXT_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_optional_text() {
        assert_eq!(validate_optional_text("notes", None).unwrap(), None);
        assert_eq!(validate_optional_text("notes", Some("  ")).unwrap(), None);
        assert_eq!(
            validate_optional_text("notes", Some(" no onions ")).unwrap(),
            Some("no onions".to_string())
        );
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1, 99).is_ok());
        assert!(validate_quantity(99, 99).is_ok());
        assert!(validate_quantity(0, 99).is_err());
        assert!(validate_quantity(-1, 99).is_err());
        assert!(validate_quantity(100, 99).is_err());
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_payment_amount(Money::from_cents(1)).is_ok());
        assert!(validate_payment_amount(Money::ZERO).is_err());
        assert!(validate_payment_amount(Money::from_cents(-1)).is_err());

        assert!(validate_non_negative("tip", Money::ZERO).is_ok());
        assert!(validate_non_negative("tip", Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_validate_rate_and_page() {
        assert!(validate_rate_bps("tax_rate", 1200).is_ok());
        assert!(validate_rate_bps("tax_rate", 10_001).is_err());

        assert!(validate_page(1, 20, 100).is_ok());
        assert!(validate_page(0, 20, 100).is_err());
        assert!(validate_page(1, 0, 100).is_err());
        assert!(validate_page(1, 101, 100).is_err());
    }
}
