//! # Validation Module
//!
//! Input validation for intake forms, used-item lines and purchases.
//!
//! ## Where Validation Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (form input)                                          │
//! │  └── Type validation (deserialization)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  └── Business rule validation, before the write lock is taken          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity >= 1), NOT NULL                                   │
//! │  ├── UNIQUE (name COLLATE NOCASE, final_invoice_number)                │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use repairdesk_core::types::UsedItemLine;
//! use repairdesk_core::validation::{validate_quantity, validate_used_item_lines};
//!
//! validate_quantity(2).unwrap();
//! assert!(validate_used_item_lines(&[
//!     UsedItemLine::new("p1", 1),
//!     UsedItemLine::new("p1", 2),
//! ])
//! .is_err());
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::types::{
    NewProduct, NewPurchase, NewServiceRecord, ProductDetailsPatch, ServiceRecordPatch,
    UsedItemLine,
};
use crate::{MAX_ITEM_QUANTITY, MAX_NAME_LEN, MAX_PRICE_CENTS, MAX_TEXT_LEN, MAX_USED_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required free-text field.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most `max` characters
pub fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a catalog name.
///
/// ```rust
/// use repairdesk_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Screen iPhone 13").is_ok());
/// assert!(validate_product_name("   ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_required_text("name", name, MAX_NAME_LEN)
}

/// Validates a search query.
///
/// Empty is allowed and means "everything". Returns the trimmed query.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates tag lists: no blank tags.
pub fn validate_tags(tags: &[String]) -> ValidationResult<()> {
    if tags.iter().any(|t| t.trim().is_empty()) {
        return Err(ValidationError::Required {
            field: "tag".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a used-item or purchase quantity.
///
/// ## Rules
/// - Must be positive (> 0); removal is by omission, never by quantity 0
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an amount in cents: `0..=MAX_PRICE_CENTS`. Zero is allowed
/// (free labor, giveaway part).
///
/// ```rust
/// use repairdesk_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents("labor", 15000).is_ok());
/// assert!(validate_price_cents("labor", 0).is_ok());
/// assert!(validate_price_cents("labor", -100).is_err());
/// assert!(validate_price_cents("labor", i64::MAX).is_err());
/// ```
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates an opening stock figure for a new product.
pub fn validate_opening_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "opening_stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates a full used-items list for a job.
///
/// ## Rules
/// - At most MAX_USED_ITEMS lines
/// - Every product id non-empty
/// - Every quantity valid (see [`validate_quantity`])
/// - No product listed twice
pub fn validate_used_item_lines(lines: &[UsedItemLine]) -> ValidationResult<()> {
    if lines.len() > MAX_USED_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "used items".to_string(),
            min: 0,
            max: MAX_USED_ITEMS as i64,
        });
    }

    let mut seen = HashSet::with_capacity(lines.len());
    for line in lines {
        if line.product_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "product_id".to_string(),
            });
        }
        validate_quantity(line.quantity)?;

        if !seen.insert(line.product_id.as_str()) {
            return Err(ValidationError::Duplicate {
                field: "used item".to_string(),
                value: line.product_id.clone(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Form Validators
// =============================================================================

pub fn validate_new_product(input: &NewProduct) -> ValidationResult<()> {
    validate_product_name(&input.name)?;
    validate_price_cents("cost_price", input.cost_price_cents)?;
    validate_price_cents("sale_price", input.sale_price_cents)?;
    validate_opening_stock(input.opening_stock)?;
    validate_tags(&input.tags)
}

pub fn validate_product_patch(patch: &ProductDetailsPatch) -> ValidationResult<()> {
    if let Some(name) = &patch.name {
        validate_product_name(name)?;
    }
    if let Some(cost) = patch.cost_price_cents {
        validate_price_cents("cost_price", cost)?;
    }
    if let Some(price) = patch.sale_price_cents {
        validate_price_cents("sale_price", price)?;
    }
    if let Some(tags) = &patch.tags {
        validate_tags(tags)?;
    }
    Ok(())
}

/// Validates an intake form.
pub fn validate_new_record(input: &NewServiceRecord) -> ValidationResult<()> {
    validate_required_text("employee", &input.employee, MAX_NAME_LEN)?;
    validate_required_text("contact name", &input.contact.name, MAX_NAME_LEN)?;
    validate_required_text("device", &input.device_description, MAX_TEXT_LEN)?;
    validate_required_text("fault", &input.fault_description, MAX_TEXT_LEN)?;
    validate_price_cents("estimated_labor", input.estimated_labor_cents)
}

/// Validates the fields a patch actually sets.
pub fn validate_record_patch(patch: &ServiceRecordPatch) -> ValidationResult<()> {
    if let Some(contact) = &patch.contact {
        validate_required_text("contact name", &contact.name, MAX_NAME_LEN)?;
    }
    if let Some(device) = &patch.device_description {
        validate_required_text("device", device, MAX_TEXT_LEN)?;
    }
    if let Some(fault) = &patch.fault_description {
        validate_required_text("fault", fault, MAX_TEXT_LEN)?;
    }
    if let Some(estimated) = patch.estimated_labor_cents {
        validate_price_cents("estimated_labor", estimated)?;
    }
    if let Some(lines) = &patch.used_items {
        validate_used_item_lines(lines)?;
    }
    Ok(())
}

/// Validates a purchase intake form.
pub fn validate_new_purchase(input: &NewPurchase) -> ValidationResult<()> {
    validate_required_text("supplier", &input.supplier_name, MAX_NAME_LEN)?;
    if input.product_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "product_id".to_string(),
        });
    }
    validate_quantity(input.quantity)?;
    validate_price_cents("unit_price", input.unit_price_cents)
}
