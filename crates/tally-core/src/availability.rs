//! # Availability Resolver
//!
//! The pure decision function that gates every consumption: may this item be
//! sold right now, and if not, why not.
//!
//! ## Decision Order (first match wins)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Tenant disabled        → DisabledByTenant                           │
//! │  2. Store override off     → DisabledByStore                            │
//! │  3. Manual flag off        → ManualUnavailable                          │
//! │  4. Tracked, on_hand ≤ 0   → OutOfStock                                 │
//! │  5. Otherwise available    → EnabledByStore if the override explicitly  │
//! │                              enabled it, else Available                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The order encodes the priority of control layers: a store override beats
//! the manual flag, which beats the stock check. Top-to-bottom evaluation is
//! the contract, not an implementation detail.
//!
//! No I/O, no side effects, cannot fail - safe to unit test exhaustively.

use serde::{Deserialize, Serialize};

use crate::types::{AvailabilityReason, ItemKey, StoreOverrideState};

/// Everything the resolver needs to decide, gathered by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityInput {
    pub key: ItemKey,
    pub name: String,
    /// "Enabled by tenant" flag.
    pub tenant_enabled: bool,
    /// Store-level override, absent if the store has none.
    pub store_override: Option<StoreOverrideState>,
    /// Manual "is available" flag.
    pub manual_available: bool,
    /// Whether the item is inventory-tracked.
    pub tracked: bool,
    /// Current stock; None when no balance row exists yet.
    pub on_hand: Option<i64>,
}

/// The resolver's verdict, echoing the inputs the register UI displays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Availability {
    pub available: bool,
    pub reason: AvailabilityReason,
    pub tracked: bool,
    pub on_hand: Option<i64>,
    pub store_override: Option<StoreOverrideState>,
}

/// Decides whether an item may be sold.
pub fn resolve(input: &AvailabilityInput) -> Availability {
    let verdict = |available: bool, reason: AvailabilityReason| Availability {
        available,
        reason,
        tracked: input.tracked,
        on_hand: input.on_hand,
        store_override: input.store_override,
    };

    if !input.tenant_enabled {
        return verdict(false, AvailabilityReason::DisabledByTenant);
    }

    if input.store_override == Some(StoreOverrideState::Disabled) {
        return verdict(false, AvailabilityReason::DisabledByStore);
    }

    if !input.manual_available {
        return verdict(false, AvailabilityReason::ManualUnavailable);
    }

    if input.tracked && input.on_hand.unwrap_or(0) <= 0 {
        return verdict(false, AvailabilityReason::OutOfStock);
    }

    if input.store_override == Some(StoreOverrideState::Enabled) {
        return verdict(true, AvailabilityReason::EnabledByStore);
    }

    verdict(true, AvailabilityReason::Available)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(
        tenant_enabled: bool,
        store_override: Option<StoreOverrideState>,
        manual_available: bool,
        tracked: bool,
        on_hand: Option<i64>,
    ) -> AvailabilityInput {
        AvailabilityInput {
            key: ItemKey::product("p1"),
            name: "Espresso".to_string(),
            tenant_enabled,
            store_override,
            manual_available,
            tracked,
            on_hand,
        }
    }

    #[test]
    fn test_tenant_disabled_wins_over_everything() {
        // Store override Enabled and manual true cannot rescue a
        // tenant-disabled item.
        let result = resolve(&input(
            false,
            Some(StoreOverrideState::Enabled),
            true,
            false,
            None,
        ));
        assert!(!result.available);
        assert_eq!(result.reason, AvailabilityReason::DisabledByTenant);
    }

    #[test]
    fn test_store_disabled_overrides_manual_flag() {
        // Scenario from the product team: store override Disabled beats a
        // manual isAvailable=true on a tenant-enabled product.
        let result = resolve(&input(
            true,
            Some(StoreOverrideState::Disabled),
            true,
            false,
            None,
        ));
        assert!(!result.available);
        assert_eq!(result.reason, AvailabilityReason::DisabledByStore);
    }

    #[test]
    fn test_manual_unavailable_beats_stock_check() {
        // Plenty of stock, but the manager turned the item off.
        let result = resolve(&input(true, None, false, true, Some(50)));
        assert!(!result.available);
        assert_eq!(result.reason, AvailabilityReason::ManualUnavailable);
    }

    #[test]
    fn test_tracked_out_of_stock() {
        let result = resolve(&input(true, None, true, true, Some(0)));
        assert!(!result.available);
        assert_eq!(result.reason, AvailabilityReason::OutOfStock);

        // Negative stock (manual correction path) is still out of stock.
        let result = resolve(&input(true, None, true, true, Some(-3)));
        assert_eq!(result.reason, AvailabilityReason::OutOfStock);

        // Missing balance row counts as zero.
        let result = resolve(&input(true, None, true, true, None));
        assert_eq!(result.reason, AvailabilityReason::OutOfStock);
    }

    #[test]
    fn test_untracked_ignores_stock() {
        let result = resolve(&input(true, None, true, false, Some(0)));
        assert!(result.available);
        assert_eq!(result.reason, AvailabilityReason::Available);
    }

    #[test]
    fn test_enabled_by_store_reason() {
        let result = resolve(&input(
            true,
            Some(StoreOverrideState::Enabled),
            true,
            true,
            Some(5),
        ));
        assert!(result.available);
        assert_eq!(result.reason, AvailabilityReason::EnabledByStore);
    }

    #[test]
    fn test_plain_available() {
        let result = resolve(&input(true, None, true, true, Some(5)));
        assert!(result.available);
        assert_eq!(result.reason, AvailabilityReason::Available);
    }

    #[test]
    fn test_result_echoes_inputs() {
        let result = resolve(&input(
            true,
            Some(StoreOverrideState::Enabled),
            true,
            true,
            Some(7),
        ));
        assert!(result.tracked);
        assert_eq!(result.on_hand, Some(7));
        assert_eq!(result.store_override, Some(StoreOverrideState::Enabled));
    }

    /// The chosen reason must always be the FIRST matching rule, never a
    /// later one, for every combination of the five inputs.
    #[test]
    fn test_first_match_wins_exhaustive() {
        let overrides = [
            None,
            Some(StoreOverrideState::Enabled),
            Some(StoreOverrideState::Disabled),
        ];
        let stocks = [None, Some(-1), Some(0), Some(1)];

        for tenant_enabled in [false, true] {
            for store_override in overrides {
                for manual_available in [false, true] {
                    for tracked in [false, true] {
                        for on_hand in stocks {
                            let result = resolve(&input(
                                tenant_enabled,
                                store_override,
                                manual_available,
                                tracked,
                                on_hand,
                            ));

                            let expected = if !tenant_enabled {
                                AvailabilityReason::DisabledByTenant
                            } else if store_override == Some(StoreOverrideState::Disabled) {
                                AvailabilityReason::DisabledByStore
                            } else if !manual_available {
                                AvailabilityReason::ManualUnavailable
                            } else if tracked && on_hand.unwrap_or(0) <= 0 {
                                AvailabilityReason::OutOfStock
                            } else if store_override == Some(StoreOverrideState::Enabled) {
                                AvailabilityReason::EnabledByStore
                            } else {
                                AvailabilityReason::Available
                            };

                            assert_eq!(result.reason, expected);
                            assert_eq!(
                                result.available,
                                matches!(
                                    expected,
                                    AvailabilityReason::Available
                                        | AvailabilityReason::EnabledByStore
                                )
                            );
                        }
                    }
                }
            }
        }
    }
}
