//! # Inventory Ledger
//!
//! Single source of truth for on-hand quantity and its audit trail, shared
//! by sale posting, void reversal and manual adjustments.
//!
//! ## Movement Folding
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sale lines                         Movements (one per distinct key)    │
//! │  ──────────                         ──────────────────────────────────  │
//! │  2× Espresso  + 1× ExtraShot   ┐                                        │
//! │  1× Espresso                   ├──► (product, espresso)    qty 3        │
//! │  1× Latte     + 2× ExtraShot   ┘    (product, latte)       qty 1        │
//! │                                     (extra,   extra-shot)  qty 3        │
//! │                                                                         │
//! │  An item participates iff it is inventory-tracked OR the tenant's       │
//! │  enforce_stock_all escape hatch is set.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Consumption and reversal run against the caller's open transaction so a
//! multi-line sale either fully consumes stock or not at all.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::{debug, info};
use uuid::Uuid;

use crate::context::StoreContext;
use crate::error::{EngineError, EngineResult};
use tally_core::availability::{self, AvailabilityInput};
use tally_core::requests::{SaleLineRequest, SetOnHandRequest};
use tally_core::{
    Actor, AdjustmentReason, Extra, InventoryAdjustment, InventoryBalance, ItemKey, ItemKind,
    ItemUnavailability, Product, StoreOverrideState, ValidationError,
};
use tally_db::repository::inventory::InventoryRepository;
use tally_db::Database;

/// One folded stock movement for a sale, carrying everything the
/// availability gate needs as-of consumption.
#[derive(Debug, Clone)]
pub struct Movement {
    pub key: ItemKey,
    pub name: String,
    pub quantity: i64,
    pub tenant_enabled: bool,
    pub manual_available: bool,
    pub store_override: Option<StoreOverrideState>,
}

/// Folds a sale's requested lines into one movement per distinct item key.
///
/// Products contribute `line.quantity`; each extra contributes its own
/// absolute quantity per line. Quantities sum across repeated lines so the
/// same item never produces two movements. Items that are neither tracked
/// nor caught by `enforce_stock_all` are left out entirely.
pub fn build_movements(
    lines: &[SaleLineRequest],
    products: &HashMap<String, Product>,
    extras: &HashMap<String, Extra>,
    overrides: &HashMap<ItemKey, StoreOverrideState>,
    enforce_stock_all: bool,
) -> Vec<Movement> {
    let mut folded: HashMap<ItemKey, Movement> = HashMap::new();

    let mut add = |key: ItemKey,
                   name: &str,
                   quantity: i64,
                   tracked: bool,
                   tenant_enabled: bool,
                   manual_available: bool| {
        if !tracked && !enforce_stock_all {
            return;
        }
        let store_override = overrides.get(&key).copied();
        folded
            .entry(key.clone())
            .and_modify(|movement| movement.quantity += quantity)
            .or_insert(Movement {
                key,
                name: name.to_string(),
                quantity,
                tenant_enabled,
                manual_available,
                store_override,
            });
    };

    for line in lines {
        if let Some(product) = products.get(&line.product_id) {
            add(
                ItemKey::product(&product.id),
                &product.name,
                line.quantity,
                product.track_inventory,
                product.is_enabled,
                product.is_available,
            );
        }
        for extra_line in &line.extras {
            if let Some(extra) = extras.get(&extra_line.extra_id) {
                add(
                    ItemKey::extra(&extra.id),
                    &extra.name,
                    extra_line.quantity,
                    extra.track_inventory,
                    extra.is_enabled,
                    extra.is_available,
                );
            }
        }
    }

    let mut movements: Vec<Movement> = folded.into_values().collect();
    movements.sort_by(|a, b| (a.key.kind, &a.key.id).cmp(&(b.key.kind, &b.key.id)));
    movements
}

/// Runs the availability gate over every item a sale references, tracked or
/// not. Only the flag layers apply here (tenant enable, store override,
/// manual flag); stock is checked later against the balance row for the
/// items that produce movements. This is what makes a store `disabled`
/// override block an untracked item too.
pub fn gate_sale_lines(
    lines: &[SaleLineRequest],
    products: &HashMap<String, Product>,
    extras: &HashMap<String, Extra>,
    overrides: &HashMap<ItemKey, StoreOverrideState>,
) -> EngineResult<()> {
    let gate = |key: ItemKey, name: &str, tenant_enabled: bool, manual_available: bool| {
        let verdict = availability::resolve(&AvailabilityInput {
            store_override: overrides.get(&key).copied(),
            key: key.clone(),
            name: name.to_string(),
            tenant_enabled,
            manual_available,
            tracked: false,
            on_hand: None,
        });
        if verdict.available {
            Ok(())
        } else {
            Err(EngineError::ItemUnavailable(ItemUnavailability {
                kind: key.kind,
                item_id: key.id,
                name: name.to_string(),
                reason: verdict.reason,
                on_hand: None,
            }))
        }
    };

    for line in lines {
        if let Some(product) = products.get(&line.product_id) {
            gate(
                ItemKey::product(&product.id),
                &product.name,
                product.is_enabled,
                product.is_available,
            )?;
        }
        for extra_line in &line.extras {
            if let Some(extra) = extras.get(&extra_line.extra_id) {
                gate(
                    ItemKey::extra(&extra.id),
                    &extra.name,
                    extra.is_enabled,
                    extra.is_available,
                )?;
            }
        }
    }

    Ok(())
}

/// Ledger service. Tx-scoped operations are associated functions over the
/// caller's connection; manual and reporting paths own their transactions.
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    db: Database,
}

impl InventoryLedger {
    pub fn new(db: Database) -> Self {
        InventoryLedger { db }
    }

    /// Applies a sale's consumption inside the caller's transaction.
    ///
    /// For each movement: resolve the current balance (zero if absent), run
    /// the availability gate as-of consumption, and reject a tracked
    /// under-run so stock never goes negative on the sale path. Any failure
    /// aborts the whole batch - the caller rolls the transaction back, so a
    /// multi-line sale cannot partially consume.
    pub async fn apply_consumption(
        conn: &mut SqliteConnection,
        ctx: &StoreContext,
        sale_id: &str,
        actor: &Actor,
        movements: &[Movement],
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        for movement in movements {
            let balance = InventoryRepository::get_balance(
                conn,
                &ctx.tenant_id,
                &ctx.store_id,
                &movement.key,
            )
            .await?;
            let on_hand = balance.as_ref().map(|b| b.on_hand);
            let qty_before = on_hand.unwrap_or(0);

            let verdict = availability::resolve(&AvailabilityInput {
                key: movement.key.clone(),
                name: movement.name.clone(),
                tenant_enabled: movement.tenant_enabled,
                store_override: movement.store_override,
                manual_available: movement.manual_available,
                tracked: true,
                on_hand,
            });
            if !verdict.available {
                return Err(EngineError::ItemUnavailable(ItemUnavailability {
                    kind: movement.key.kind,
                    item_id: movement.key.id.clone(),
                    name: movement.name.clone(),
                    reason: verdict.reason,
                    on_hand,
                }));
            }

            let qty_after = qty_before - movement.quantity;
            if qty_after < 0 {
                return Err(EngineError::ItemUnavailable(ItemUnavailability {
                    kind: movement.key.kind,
                    item_id: movement.key.id.clone(),
                    name: movement.name.clone(),
                    reason: tally_core::AvailabilityReason::OutOfStock,
                    on_hand: Some(qty_before),
                }));
            }

            InventoryRepository::upsert_balance(
                conn,
                &ctx.tenant_id,
                &ctx.store_id,
                &movement.key,
                qty_after,
                now,
            )
            .await?;
            InventoryRepository::insert_adjustment(
                conn,
                &InventoryAdjustment {
                    id: Uuid::new_v4().to_string(),
                    tenant_id: ctx.tenant_id.clone(),
                    store_id: ctx.store_id.clone(),
                    item_kind: movement.key.kind,
                    item_id: movement.key.id.clone(),
                    qty_before,
                    delta: -movement.quantity,
                    qty_after,
                    reason: AdjustmentReason::SaleConsumption,
                    reference_kind: Some("sale".to_string()),
                    reference_id: Some(sale_id.to_string()),
                    actor_id: actor.user_id.clone(),
                    created_at: now,
                },
            )
            .await?;

            debug!(
                item = %movement.key.id,
                qty_before,
                qty_after,
                "Consumed stock for sale"
            );
        }

        Ok(())
    }

    /// Credits back a voided sale's consumption. Idempotent: items that
    /// already carry a matching `VoidReversal` adjustment are skipped, so a
    /// crash mid-reversal is recovered by simply calling again. A sale with
    /// nothing to reverse is a no-op, not an error.
    ///
    /// Returns the number of items credited.
    pub async fn reverse_consumption(
        conn: &mut SqliteConnection,
        ctx: &StoreContext,
        sale_id: &str,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> EngineResult<usize> {
        let adjustments = InventoryRepository::adjustments_for_sale(conn, sale_id).await?;

        let mut consumed: HashMap<ItemKey, i64> = HashMap::new();
        for adjustment in &adjustments {
            let key = ItemKey::new(adjustment.item_kind, adjustment.item_id.clone());
            match adjustment.reason {
                AdjustmentReason::SaleConsumption => {
                    *consumed.entry(key).or_insert(0) += adjustment.delta.abs();
                }
                AdjustmentReason::VoidReversal => {
                    consumed.remove(&key);
                }
                _ => {}
            }
        }

        let mut pending: Vec<(ItemKey, i64)> = consumed.into_iter().collect();
        pending.sort_by(|a, b| (a.0.kind, &a.0.id).cmp(&(b.0.kind, &b.0.id)));

        let mut credited = 0;
        for (key, quantity) in pending {
            let qty_before =
                InventoryRepository::get_balance(conn, &ctx.tenant_id, &ctx.store_id, &key)
                    .await?
                    .map(|b| b.on_hand)
                    .unwrap_or(0);
            let qty_after = qty_before + quantity;

            InventoryRepository::upsert_balance(
                conn,
                &ctx.tenant_id,
                &ctx.store_id,
                &key,
                qty_after,
                now,
            )
            .await?;
            InventoryRepository::insert_adjustment(
                conn,
                &InventoryAdjustment {
                    id: Uuid::new_v4().to_string(),
                    tenant_id: ctx.tenant_id.clone(),
                    store_id: ctx.store_id.clone(),
                    item_kind: key.kind,
                    item_id: key.id.clone(),
                    qty_before,
                    delta: quantity,
                    qty_after,
                    reason: AdjustmentReason::VoidReversal,
                    reference_kind: Some("sale".to_string()),
                    reference_id: Some(sale_id.to_string()),
                    actor_id: actor.user_id.clone(),
                    created_at: now,
                },
            )
            .await?;
            credited += 1;
        }

        info!(sale_id, credited, "Reversed sale consumption");
        Ok(credited)
    }

    /// Manual on-hand override. Always records an adjustment with
    /// `delta = new_qty - previous`, whatever the sign, and does not run
    /// the consumption guard: manual corrections may set negative stock.
    pub async fn set_on_hand(
        &self,
        ctx: &StoreContext,
        actor: &Actor,
        request: &SetOnHandRequest,
        now: DateTime<Utc>,
    ) -> EngineResult<InventoryBalance> {
        if matches!(
            request.reason,
            AdjustmentReason::SaleConsumption | AdjustmentReason::VoidReversal
        ) {
            return Err(EngineError::Validation(ValidationError::InvalidFormat {
                field: "reason".to_string(),
                reason: "sale movement reasons are reserved for the sale path".to_string(),
            }));
        }

        let key = ItemKey::new(request.item_kind, request.item_id.clone());
        let mut tx = self.db.begin().await?;

        let qty_before =
            InventoryRepository::get_balance(&mut tx, &ctx.tenant_id, &ctx.store_id, &key)
                .await?
                .map(|b| b.on_hand)
                .unwrap_or(0);
        let delta = request.new_qty - qty_before;

        InventoryRepository::upsert_balance(
            &mut tx,
            &ctx.tenant_id,
            &ctx.store_id,
            &key,
            request.new_qty,
            now,
        )
        .await?;
        InventoryRepository::insert_adjustment(
            &mut tx,
            &InventoryAdjustment {
                id: Uuid::new_v4().to_string(),
                tenant_id: ctx.tenant_id.clone(),
                store_id: ctx.store_id.clone(),
                item_kind: key.kind,
                item_id: key.id.clone(),
                qty_before,
                delta,
                qty_after: request.new_qty,
                reason: request.reason,
                reference_kind: Some("manual".to_string()),
                reference_id: None,
                actor_id: actor.user_id.clone(),
                created_at: now,
            },
        )
        .await?;

        tx.commit().await.map_err(tally_db::DbError::from)?;

        info!(
            item = %key.id,
            qty_before,
            new_qty = request.new_qty,
            reason = ?request.reason,
            "Manual on-hand override"
        );

        Ok(InventoryBalance {
            tenant_id: ctx.tenant_id.clone(),
            store_id: ctx.store_id.clone(),
            item_kind: key.kind,
            item_id: key.id,
            on_hand: request.new_qty,
            updated_at: now,
        })
    }

    /// Read-only balance listing for reporting.
    pub async fn query_balances(
        &self,
        ctx: &StoreContext,
        kind: Option<ItemKind>,
    ) -> EngineResult<Vec<InventoryBalance>> {
        Ok(self
            .db
            .inventory()
            .list_balances(&ctx.tenant_id, &ctx.store_id, kind)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::requests::ExtraLineRequest;

    fn product(id: &str, tracked: bool) -> Product {
        Product {
            id: id.to_string(),
            tenant_id: "t1".to_string(),
            sku: format!("SKU-{id}"),
            name: id.to_string(),
            price_cents: 1000,
            track_inventory: tracked,
            is_available: true,
            is_enabled: true,
            is_active: true,
        }
    }

    fn extra(id: &str, tracked: bool) -> Extra {
        Extra {
            id: id.to_string(),
            tenant_id: "t1".to_string(),
            name: id.to_string(),
            price_cents: 200,
            track_inventory: tracked,
            is_available: true,
            is_enabled: true,
            is_active: true,
        }
    }

    fn line(product_id: &str, quantity: i64, extras: Vec<ExtraLineRequest>) -> SaleLineRequest {
        SaleLineRequest {
            product_id: product_id.to_string(),
            quantity,
            selections: vec![],
            extras,
        }
    }

    #[test]
    fn test_folds_repeated_lines_without_double_counting() {
        let products = HashMap::from([("p1".to_string(), product("p1", true))]);
        let extras = HashMap::new();
        let lines = vec![line("p1", 2, vec![]), line("p1", 1, vec![])];

        let movements = build_movements(&lines, &products, &extras, &HashMap::new(), false);
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].quantity, 3);
        assert_eq!(movements[0].key, ItemKey::product("p1"));
    }

    #[test]
    fn test_extras_fold_across_lines() {
        let products = HashMap::from([
            ("p1".to_string(), product("p1", true)),
            ("p2".to_string(), product("p2", true)),
        ]);
        let extras = HashMap::from([("e1".to_string(), extra("e1", true))]);
        let lines = vec![
            line(
                "p1",
                1,
                vec![ExtraLineRequest {
                    extra_id: "e1".to_string(),
                    quantity: 1,
                }],
            ),
            line(
                "p2",
                1,
                vec![ExtraLineRequest {
                    extra_id: "e1".to_string(),
                    quantity: 2,
                }],
            ),
        ];

        let movements = build_movements(&lines, &products, &extras, &HashMap::new(), false);
        let extra_movement = movements
            .iter()
            .find(|m| m.key == ItemKey::extra("e1"))
            .unwrap();
        assert_eq!(extra_movement.quantity, 3);
    }

    #[test]
    fn test_untracked_items_skipped_unless_enforced() {
        let products = HashMap::from([("p1".to_string(), product("p1", false))]);
        let lines = vec![line("p1", 1, vec![])];

        let without = build_movements(&lines, &products, &HashMap::new(), &HashMap::new(), false);
        assert!(without.is_empty());

        let with = build_movements(&lines, &products, &HashMap::new(), &HashMap::new(), true);
        assert_eq!(with.len(), 1);
    }

    #[test]
    fn test_gate_blocks_untracked_item_disabled_by_store() {
        let products = HashMap::from([("p1".to_string(), product("p1", false))]);
        let overrides = HashMap::from([(ItemKey::product("p1"), StoreOverrideState::Disabled)]);
        let lines = vec![line("p1", 1, vec![])];

        let err = gate_sale_lines(&lines, &products, &HashMap::new(), &overrides).unwrap_err();
        match err {
            EngineError::ItemUnavailable(unavailable) => {
                assert_eq!(
                    unavailable.reason,
                    tally_core::AvailabilityReason::DisabledByStore
                );
                assert_eq!(unavailable.item_id, "p1");
            }
            other => panic!("expected ItemUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_gate_blocks_manually_hidden_extra() {
        let products = HashMap::from([("p1".to_string(), product("p1", false))]);
        let mut hidden = extra("e1", false);
        hidden.is_available = false;
        let extras = HashMap::from([("e1".to_string(), hidden)]);
        let lines = vec![line(
            "p1",
            1,
            vec![ExtraLineRequest {
                extra_id: "e1".to_string(),
                quantity: 1,
            }],
        )];

        let err = gate_sale_lines(&lines, &products, &extras, &HashMap::new()).unwrap_err();
        match err {
            EngineError::ItemUnavailable(unavailable) => {
                assert_eq!(
                    unavailable.reason,
                    tally_core::AvailabilityReason::ManualUnavailable
                );
                assert_eq!(unavailable.item_id, "e1");
            }
            other => panic!("expected ItemUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_gate_ignores_stock_for_untracked_items() {
        // No balance row, no override, flags all up: the gate passes even
        // though the item has never been stocked.
        let products = HashMap::from([("p1".to_string(), product("p1", false))]);
        let lines = vec![line("p1", 5, vec![])];

        assert!(gate_sale_lines(&lines, &products, &HashMap::new(), &HashMap::new()).is_ok());
    }

    #[test]
    fn test_movements_carry_store_override() {
        let products = HashMap::from([("p1".to_string(), product("p1", true))]);
        let overrides = HashMap::from([(ItemKey::product("p1"), StoreOverrideState::Disabled)]);
        let lines = vec![line("p1", 1, vec![])];

        let movements = build_movements(&lines, &products, &HashMap::new(), &overrides, false);
        assert_eq!(
            movements[0].store_override,
            Some(StoreOverrideState::Disabled)
        );
    }
}
