//! # Validation Module
//!
//! Fail-fast request validation for Tally POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Controller (deserialization)                                 │
//! │  ├── Type/enum validation (unknown void codes die here)                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (pure business-rule validation)                  │
//! │  ├── Runs before any database work - nothing is touched on failure     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database constraints                                         │
//! │  ├── UNIQUE idempotency index, FK constraints                          │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{ValidationError, ValidationResult};
use crate::requests::{CreateSaleRequest, DenominationCount, PaymentRequest};
use crate::MAX_ITEM_QUANTITY;

/// Resolves the payment list from a create-sale request.
///
/// Either `payments[]` or the single legacy `payment` object is used -
/// exactly one representation, never merged. Supplying both (or neither)
/// is a validation error.
pub fn resolve_payments(request: &CreateSaleRequest) -> ValidationResult<Vec<PaymentRequest>> {
    match (&request.payments, &request.payment) {
        (Some(_), Some(_)) => Err(ValidationError::InvalidFormat {
            field: "payments".to_string(),
            reason: "supply either payments[] or payment, not both".to_string(),
        }),
        (Some(list), None) => {
            if list.is_empty() {
                return Err(ValidationError::Required {
                    field: "payments".to_string(),
                });
            }
            Ok(list.clone())
        }
        (None, Some(single)) => Ok(vec![single.clone()]),
        (None, None) => Err(ValidationError::Required {
            field: "payments".to_string(),
        }),
    }
}

/// Validates a create-sale request and returns the resolved payment list.
///
/// Checks, in order: at least one item, at least one payment, every payment
/// amount > 0, non-cash payments carry a reference, every item quantity > 0
/// (and within range), every extra quantity > 0. The first violation wins;
/// nothing has touched the database yet.
pub fn validate_create_sale(
    request: &CreateSaleRequest,
) -> ValidationResult<Vec<PaymentRequest>> {
    if request.items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    let payments = resolve_payments(request)?;

    for payment in &payments {
        if payment.amount_cents <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "payments.amountCents".to_string(),
            });
        }
        if payment.method.requires_reference()
            && payment
                .reference
                .as_deref()
                .map(str::trim)
                .unwrap_or("")
                .is_empty()
        {
            return Err(ValidationError::Required {
                field: "payments.reference".to_string(),
            });
        }
    }

    for line in &request.items {
        if line.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "items.quantity".to_string(),
            });
        }
        if line.quantity > MAX_ITEM_QUANTITY {
            return Err(ValidationError::OutOfRange {
                field: "items.quantity".to_string(),
                min: 1,
                max: MAX_ITEM_QUANTITY,
            });
        }
        for extra in &line.extras {
            if extra.quantity <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "items.extras.quantity".to_string(),
                });
            }
        }
    }

    Ok(payments)
}

/// Validates a supplied drawer count: non-empty, each denomination value
/// strictly positive, each count non-negative.
pub fn validate_denominations(denominations: &[DenominationCount]) -> ValidationResult<()> {
    if denominations.is_empty() {
        return Err(ValidationError::Required {
            field: "denominations".to_string(),
        });
    }

    for denomination in denominations {
        if denomination.value_cents <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "denominations.valueCents".to_string(),
            });
        }
        if denomination.count < 0 {
            return Err(ValidationError::MustBeNonNegative {
                field: "denominations.count".to_string(),
            });
        }
    }

    Ok(())
}

/// Opening cash must be zero or greater.
pub fn validate_opening_cash(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "openingCashCents".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requests::{ExtraLineRequest, SaleLineRequest};
    use crate::types::PaymentMethod;

    fn cash(amount_cents: i64) -> PaymentRequest {
        PaymentRequest {
            method: PaymentMethod::Cash,
            amount_cents,
            reference: None,
        }
    }

    fn line(quantity: i64) -> SaleLineRequest {
        SaleLineRequest {
            product_id: "p1".to_string(),
            quantity,
            selections: vec![],
            extras: vec![],
        }
    }

    fn request(items: Vec<SaleLineRequest>, payments: Vec<PaymentRequest>) -> CreateSaleRequest {
        CreateSaleRequest {
            items,
            payments: Some(payments),
            payment: None,
            client_sale_id: None,
            currency: None,
            notes: None,
        }
    }

    #[test]
    fn test_valid_request() {
        let req = request(vec![line(2)], vec![cash(1000)]);
        let payments = validate_create_sale(&req).unwrap();
        assert_eq!(payments.len(), 1);
    }

    #[test]
    fn test_empty_items_rejected() {
        let req = request(vec![], vec![cash(1000)]);
        assert!(matches!(
            validate_create_sale(&req),
            Err(ValidationError::Required { field }) if field == "items"
        ));
    }

    #[test]
    fn test_both_payment_shapes_rejected() {
        let mut req = request(vec![line(1)], vec![cash(1000)]);
        req.payment = Some(cash(1000));
        assert!(matches!(
            validate_create_sale(&req),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_legacy_single_payment_accepted() {
        let mut req = request(vec![line(1)], vec![]);
        req.payments = None;
        req.payment = Some(cash(500));
        let payments = validate_create_sale(&req).unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount_cents, 500);
    }

    #[test]
    fn test_missing_payments_rejected() {
        let mut req = request(vec![line(1)], vec![]);
        req.payments = None;
        assert!(validate_create_sale(&req).is_err());

        let req = request(vec![line(1)], vec![]);
        assert!(matches!(
            validate_create_sale(&req),
            Err(ValidationError::Required { field }) if field == "payments"
        ));
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let req = request(vec![line(1)], vec![cash(0)]);
        assert!(validate_create_sale(&req).is_err());
    }

    #[test]
    fn test_non_cash_requires_reference() {
        let card = PaymentRequest {
            method: PaymentMethod::Card,
            amount_cents: 1000,
            reference: None,
        };
        let req = request(vec![line(1)], vec![card]);
        assert!(matches!(
            validate_create_sale(&req),
            Err(ValidationError::Required { field }) if field == "payments.reference"
        ));

        let card_ok = PaymentRequest {
            method: PaymentMethod::Card,
            amount_cents: 1000,
            reference: Some("AUTH-123".to_string()),
        };
        let req = request(vec![line(1)], vec![card_ok]);
        assert!(validate_create_sale(&req).is_ok());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let req = request(vec![line(0)], vec![cash(1000)]);
        assert!(validate_create_sale(&req).is_err());
    }

    #[test]
    fn test_zero_extra_quantity_rejected() {
        let mut bad_line = line(1);
        bad_line.extras.push(ExtraLineRequest {
            extra_id: "e1".to_string(),
            quantity: 0,
        });
        let req = request(vec![bad_line], vec![cash(1000)]);
        assert!(matches!(
            validate_create_sale(&req),
            Err(ValidationError::MustBePositive { field }) if field == "items.extras.quantity"
        ));
    }

    #[test]
    fn test_denominations() {
        assert!(validate_denominations(&[]).is_err());
        assert!(validate_denominations(&[DenominationCount {
            value_cents: 0,
            count: 1
        }])
        .is_err());
        assert!(validate_denominations(&[DenominationCount {
            value_cents: 100,
            count: -1
        }])
        .is_err());
        assert!(validate_denominations(&[DenominationCount {
            value_cents: 100,
            count: 0
        }])
        .is_ok());
    }

    #[test]
    fn test_opening_cash() {
        assert!(validate_opening_cash(0).is_ok());
        assert!(validate_opening_cash(10000).is_ok());
        assert!(validate_opening_cash(-1).is_err());
    }
}
