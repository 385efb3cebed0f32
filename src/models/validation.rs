use std::collections::HashSet;

use super::{Cart, ValidationError, ValidationResult};

/// Trait for validating models read from untrusted sources
pub trait Validate {
    fn validate(&self) -> ValidationResult<()>;
}

/// Smallest quantity a line item may hold
pub const MIN_LINE_ITEM_AMOUNT: u32 = 1;

impl Validate for Cart {
    fn validate(&self) -> ValidationResult<()> {
        let mut seen = HashSet::with_capacity(self.len());

        for item in self {
            if !seen.insert(item.id()) {
                return Err(ValidationError::DuplicateProduct {
                    product_id: item.id(),
                });
            }
            validate_line_item_amount(item.amount)?;
        }

        Ok(())
    }
}

pub fn validate_line_item_amount(amount: u32) -> ValidationResult<()> {
    if amount < MIN_LINE_ITEM_AMOUNT {
        return Err(ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: MIN_LINE_ITEM_AMOUNT.to_string(),
            value: amount.to_string(),
        });
    }
    Ok(())
}
