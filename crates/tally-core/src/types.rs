//! # Domain Types
//!
//! Core domain types used throughout Tally POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐   ┌─────────────────┐      │
//! │  │      Sale       │   │ InventoryBalance │   │    PosShift     │      │
//! │  │  ─────────────  │   │  ──────────────  │   │  ─────────────  │      │
//! │  │  id (UUID)      │   │  (store, item)   │   │  id (UUID)      │      │
//! │  │  folio          │   │  on_hand         │   │  opened_at/by   │      │
//! │  │  status         │   │  updated_at      │   │  opening_cash   │      │
//! │  │  total_cents    │   └──────────────────┘   │  closed_at/by   │      │
//! │  └────────┬────────┘   ┌──────────────────┐   └─────────────────┘      │
//! │           │            │ InventoryAdjust- │                            │
//! │     SaleItem ×N        │ ment (append-    │   PosSettings              │
//! │     Payment ×N         │ only ledger row) │   (per-tenant policy)      │
//! │                        └──────────────────┘                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where applicable: (folio, client_sale_id, sku) -
//!   human-readable or client-correlated

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Item Identity
// =============================================================================

/// The kind of a sellable/trackable catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Product,
    Extra,
    OptionItem,
}

/// Value-typed composite key for inventory and override lookups.
///
/// Replaces ORM-tracked composite tuples with an explicit, hashable key so
/// movement folding maps own their keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemKey {
    pub kind: ItemKind,
    pub id: String,
}

impl ItemKey {
    pub fn new(kind: ItemKind, id: impl Into<String>) -> Self {
        ItemKey {
            kind,
            id: id.into(),
        }
    }

    pub fn product(id: impl Into<String>) -> Self {
        Self::new(ItemKind::Product, id)
    }

    pub fn extra(id: impl Into<String>) -> Self {
        Self::new(ItemKind::Extra, id)
    }
}

// =============================================================================
// Availability
// =============================================================================

/// Store-level availability override state. An absent override means the
/// store inherits the tenant/manual flags unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StoreOverrideState {
    Enabled,
    Disabled,
}

/// Why an item is (un)available. Order of the unavailable variants mirrors
/// the priority of the control layers: tenant beats store beats manual flag
/// beats stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityReason {
    DisabledByTenant,
    DisabledByStore,
    ManualUnavailable,
    OutOfStock,
    EnabledByStore,
    Available,
}

// =============================================================================
// Sale Status
// =============================================================================

/// The durable status of a sale. Validation/pricing/posting are not persisted
/// states; a sale row only ever exists as Completed or Void.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Sale has been paid and posted.
    Completed,
    /// Sale was cancelled after posting. Never physically deleted.
    Void,
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash. The only method that affects expected drawer cash.
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// Bank transfer.
    Transfer,
}

impl PaymentMethod {
    /// Non-cash tenders must carry an external reference (auth code,
    /// transfer folio) so the back office can reconcile them.
    #[inline]
    pub const fn requires_reference(&self) -> bool {
        !matches!(self, PaymentMethod::Cash)
    }
}

// =============================================================================
// Void Reasons
// =============================================================================

/// Fixed enumeration of accepted void reason codes. Unknown codes are
/// rejected at deserialization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum VoidReasonCode {
    CustomerCancelled,
    EntryError,
    PriceCorrection,
    Fraud,
    Other,
}

// =============================================================================
// Actor
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Cashier,
}

/// The acting user, threaded explicitly through every engine call instead of
/// being pulled from an ambient web-framework accessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Actor {
            user_id: user_id.into(),
            role,
        }
    }

    /// Managers and admins may void any sale; cashiers are scoped to their
    /// own open shift and business date.
    #[inline]
    pub const fn can_void_any_sale(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Manager)
    }

    /// Managers and admins may preview or close any register's shift;
    /// cashiers only their own.
    #[inline]
    pub const fn can_manage_any_shift(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Manager)
    }
}

// =============================================================================
// Catalog (read-only to the core)
// =============================================================================

/// A product as read from the catalog. CRUD lives in the admin console
/// backend; the core only reads active rows.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub tenant_id: String,
    pub sku: String,
    pub name: String,
    pub price_cents: i64,
    pub track_inventory: bool,
    /// Manual "is available" flag toggled by the store manager.
    pub is_available: bool,
    /// Tenant-level enable flag.
    pub is_enabled: bool,
    pub is_active: bool,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// A paid add-on to a line item (e.g. "extra cheese").
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Extra {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub price_cents: i64,
    pub track_inventory: bool,
    pub is_available: bool,
    pub is_enabled: bool,
    pub is_active: bool,
}

impl Extra {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// A customization option (e.g. "no onions"). Carries a price delta snapshot
/// column but is always priced at zero when totalling a line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OptionItem {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub price_delta_cents: i64,
    pub is_active: bool,
}

// =============================================================================
// Sale
// =============================================================================

/// A posted sale. Created atomically with its items and payments; mutated
/// only by void; never physically deleted.
///
/// Invariant: `total_cents == sum(sale_items.line_total_cents)
///                          == sum(payments.amount_cents)` at creation time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub tenant_id: String,
    pub store_id: String,
    /// Human-readable code derived from the posting timestamp.
    pub folio: String,
    #[ts(as = "String")]
    pub occurred_at: DateTime<Utc>,
    pub currency: String,
    pub status: SaleStatus,
    pub subtotal_cents: i64,
    pub total_cents: i64,
    /// Client-supplied idempotency key. Unique per tenant when present.
    pub client_sale_id: Option<String>,
    pub shift_id: Option<String>,
    pub user_id: String,
    /// Loyalty points granted by the (external) points engine. Checked at
    /// void time to request reversal.
    pub points_awarded: i64,
    pub notes: Option<String>,
    pub void_reason_code: Option<VoidReasonCode>,
    pub void_reason_text: Option<String>,
    pub void_note: Option<String>,
    pub voided_by: Option<String>,
    #[ts(as = "Option<String>")]
    pub voided_at: Option<DateTime<Utc>>,
    pub client_void_id: Option<String>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item in a sale.
/// Uses the snapshot pattern to freeze product data at time of sale; catalog
/// price changes never retroactively affect posted sales.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub sku_snapshot: String,
    pub name_snapshot: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// unit_price × quantity + selected extras.
    pub line_total_cents: i64,
}

/// A chosen customization option, snapshotted with its name and price delta.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItemSelection {
    pub id: String,
    pub sale_item_id: String,
    pub option_item_id: String,
    pub name_snapshot: String,
    /// Snapshotted from the catalog but applied as zero when pricing.
    pub price_delta_cents: i64,
}

/// A chosen extra, snapshotted with its name and unit price.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItemExtra {
    pub id: String,
    pub sale_item_id: String,
    pub extra_id: String,
    pub name_snapshot: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
}

/// A payment towards a sale. A sale can carry multiple payments for split
/// tender; their amounts sum to the sale total at creation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub sale_id: String,
    pub method: PaymentMethod,
    pub amount_cents: i64,
    /// Required for non-cash methods.
    pub reference: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Payment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// Per-method totals over a shift's completed sales. Shared by the close
/// preview and the close itself; an all-zero breakdown is a valid result
/// (no sales during the shift), not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBreakdown {
    pub cash_cents: i64,
    pub card_cents: i64,
    pub transfer_cents: i64,
    /// Distinct completed sales in the window.
    pub sale_count: i64,
}

// =============================================================================
// Inventory
// =============================================================================

/// Current on-hand quantity for one (tenant, store, item). The single
/// mutable row concurrent sales contend on.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryBalance {
    pub tenant_id: String,
    pub store_id: String,
    pub item_kind: ItemKind,
    pub item_id: String,
    pub on_hand: i64,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Why an inventory balance moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentReason {
    /// Automatic decrement when a sale posts.
    SaleConsumption,
    /// Automatic credit when a posted sale's consumption is reversed.
    VoidReversal,
    /// Manual stock-take correction.
    ManualCorrection,
    /// Manual goods-received entry.
    Restock,
    /// Manual loss/damage write-off.
    Shrinkage,
}

/// Append-only ledger row recording a balance transition.
/// Never updated or deleted - the audit trail of truth.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryAdjustment {
    pub id: String,
    pub tenant_id: String,
    pub store_id: String,
    pub item_kind: ItemKind,
    pub item_id: String,
    pub qty_before: i64,
    /// Signed: negative for consumption, positive for reversal/restock.
    pub delta: i64,
    pub qty_after: i64,
    pub reason: AdjustmentReason,
    /// 'sale' for automatic movements, 'manual' for operator corrections.
    pub reference_kind: Option<String>,
    pub reference_id: Option<String>,
    pub actor_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Shift
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    Open,
    Closed,
}

/// One cash register session. Exactly one open shift per (user, store).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PosShift {
    pub id: String,
    pub tenant_id: String,
    pub store_id: String,
    pub user_id: String,
    pub status: ShiftStatus,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    pub opened_by: String,
    pub opening_cash_cents: i64,
    /// Idempotency key for the open operation.
    pub open_client_id: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
    pub closed_by: Option<String>,
    pub counted_cash_cents: Option<i64>,
    pub expected_cash_cents: Option<i64>,
    /// counted - expected; negative means the drawer is short.
    pub difference_cents: Option<i64>,
    pub close_reason: Option<String>,
    /// Idempotency key for the close operation.
    pub close_client_id: Option<String>,
}

impl PosShift {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == ShiftStatus::Open
    }
}

// =============================================================================
// Settings & Stores
// =============================================================================

/// A sales location within a tenant. Inventory and shifts are store-scoped.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Store {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub is_active: bool,
}

/// Per-tenant POS policy, read-only to the core. Loaded once per operation
/// by the store context resolver and passed explicitly - never a process
/// singleton.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PosSettings {
    pub tenant_id: String,
    pub multi_store_enabled: bool,
    pub default_store_id: String,
    /// Above this |counted - expected| a close reason becomes mandatory.
    pub cash_difference_threshold_cents: i64,
    /// When set, sales may only post into an open shift.
    pub shift_required: bool,
    /// Tenant-level escape hatch: track stock for every item regardless of
    /// per-item flags.
    pub enforce_stock_all: bool,
    /// Deployment-local timezone offset for business-date arithmetic.
    pub timezone_offset_minutes: i64,
}

impl PosSettings {
    /// The calendar date `at` belongs to under the deployment's configured
    /// local timezone, not UTC.
    pub fn business_date(&self, at: DateTime<Utc>) -> NaiveDate {
        (at + Duration::minutes(self.timezone_offset_minutes)).date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_item_key_equality() {
        let a = ItemKey::product("p1");
        let b = ItemKey::new(ItemKind::Product, "p1");
        assert_eq!(a, b);
        assert_ne!(a, ItemKey::extra("p1"));
    }

    #[test]
    fn test_payment_method_reference_rule() {
        assert!(!PaymentMethod::Cash.requires_reference());
        assert!(PaymentMethod::Card.requires_reference());
        assert!(PaymentMethod::Transfer.requires_reference());
    }

    #[test]
    fn test_actor_void_scope() {
        assert!(Actor::new("u1", Role::Admin).can_void_any_sale());
        assert!(Actor::new("u1", Role::Manager).can_void_any_sale());
        assert!(!Actor::new("u1", Role::Cashier).can_void_any_sale());
    }

    #[test]
    fn test_actor_shift_scope() {
        assert!(Actor::new("u1", Role::Admin).can_manage_any_shift());
        assert!(Actor::new("u1", Role::Manager).can_manage_any_shift());
        assert!(!Actor::new("u1", Role::Cashier).can_manage_any_shift());
    }

    #[test]
    fn test_business_date_crosses_midnight() {
        let settings = PosSettings {
            tenant_id: "t1".to_string(),
            multi_store_enabled: false,
            default_store_id: "s1".to_string(),
            cash_difference_threshold_cents: 0,
            shift_required: false,
            enforce_stock_all: false,
            timezone_offset_minutes: -360, // UTC-6
        };

        // 03:00 UTC is still the previous business day at UTC-6.
        let at = Utc.with_ymd_and_hms(2026, 3, 10, 3, 0, 0).unwrap();
        assert_eq!(
            settings.business_date(at),
            NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()
        );

        let noon = Utc.with_ymd_and_hms(2026, 3, 10, 18, 0, 0).unwrap();
        assert_eq!(
            settings.business_date(noon),
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
        );
    }
}
