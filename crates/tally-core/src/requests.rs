//! # Request Records
//!
//! Plain request records accepted by the engine services. The REST
//! controllers deserialize straight into these; no wire format beyond the
//! field semantics is prescribed here.
//!
//! All records are camelCase on the wire and exported to TypeScript for the
//! admin console.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{AdjustmentReason, ItemKind, PaymentMethod, VoidReasonCode};

// =============================================================================
// Sales
// =============================================================================

/// One tendered payment.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub method: PaymentMethod,
    pub amount_cents: i64,
    /// Required for non-cash methods (auth code, transfer folio).
    pub reference: Option<String>,
}

/// A chosen customization option for a line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRequest {
    pub option_item_id: String,
}

/// A chosen extra for a line, with its own quantity.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ExtraLineRequest {
    pub extra_id: String,
    pub quantity: i64,
}

/// One requested sale line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineRequest {
    pub product_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub selections: Vec<SelectionRequest>,
    #[serde(default)]
    pub extras: Vec<ExtraLineRequest>,
}

/// Request to post a sale.
///
/// Payments arrive either as `payments[]` or as the single legacy `payment`
/// object - exactly one representation is used, never merged.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    pub items: Vec<SaleLineRequest>,
    pub payments: Option<Vec<PaymentRequest>>,
    /// Legacy single-payment shape, still sent by older registers.
    pub payment: Option<PaymentRequest>,
    /// Client-supplied idempotency key; retries with the same key return the
    /// original sale unchanged.
    pub client_sale_id: Option<String>,
    pub currency: Option<String>,
    pub notes: Option<String>,
}

/// Request to void a posted sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct VoidSaleRequest {
    /// Must be one of the fixed codes; serde rejects anything else.
    pub reason_code: VoidReasonCode,
    pub reason_text: Option<String>,
    pub note: Option<String>,
    /// Idempotency key for the void operation.
    pub client_void_id: Option<String>,
}

// =============================================================================
// Shifts
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OpenShiftRequest {
    pub store_id: Option<String>,
    pub opening_cash_cents: i64,
    pub notes: Option<String>,
    /// Idempotency key for the open operation.
    pub client_operation_id: Option<String>,
}

/// One bill/coin denomination line in a drawer count.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DenominationCount {
    pub value_cents: i64,
    pub count: i64,
}

/// Sums a physical drawer count.
pub fn counted_cash_cents(denominations: &[DenominationCount]) -> i64 {
    denominations
        .iter()
        .map(|d| d.value_cents * d.count)
        .sum()
}

/// Read-only close preview; safe to call repeatedly while counting.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ClosePreviewRequest {
    pub store_id: Option<String>,
    pub shift_id: Option<String>,
    /// Hypothetical count; when present the preview also reports the counted
    /// total and signed difference.
    pub denominations: Option<Vec<DenominationCount>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CloseShiftRequest {
    pub store_id: Option<String>,
    pub shift_id: Option<String>,
    pub denominations: Option<Vec<DenominationCount>>,
    /// Mandatory when |counted - expected| exceeds the configured threshold.
    pub close_reason: Option<String>,
    /// Idempotency key for the close operation.
    pub client_operation_id: Option<String>,
}

// =============================================================================
// Inventory
// =============================================================================

/// Manual on-hand override. Always records an adjustment with
/// `delta = new_qty - previous`, whatever the sign.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SetOnHandRequest {
    pub store_id: Option<String>,
    pub item_kind: ItemKind,
    pub item_id: String,
    pub new_qty: i64,
    pub reason: AdjustmentReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counted_cash_cents() {
        let denominations = vec![
            DenominationCount {
                value_cents: 10000,
                count: 1,
            },
            DenominationCount {
                value_cents: 2000,
                count: 1,
            },
        ];
        assert_eq!(counted_cash_cents(&denominations), 12000);
        assert_eq!(counted_cash_cents(&[]), 0);
    }

    #[test]
    fn test_void_reason_code_rejects_unknown() {
        let ok: Result<VoidSaleRequest, _> =
            serde_json::from_str(r#"{"reasonCode":"entry_error"}"#);
        assert!(ok.is_ok());

        let bad: Result<VoidSaleRequest, _> =
            serde_json::from_str(r#"{"reasonCode":"because_i_said_so"}"#);
        assert!(bad.is_err());
    }
}
