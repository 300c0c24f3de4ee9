//! # Sale Transaction Coordinator
//!
//! Validates a sale request, prices it from the current catalog, gates it
//! through availability/stock, and commits the sale, its line items and
//! payments atomically. Provides idempotent replay and void.
//!
//! ## Posting Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Requested → Validated → Priced → Posted (Completed) → [Voided]         │
//! │                                                                         │
//! │  1  resolve payments[] vs legacy payment                                │
//! │  2  fail-fast validation (no database touched yet)                      │
//! │  3  actor required                                                      │
//! │  4  store context                                                       │
//! │  5  shift gate (policy)                                                 │
//! │  6  idempotency pre-check on clientSaleId                               │
//! │  7  bulk catalog load, active only                                      │
//! │  8  snapshot pricing                                                    │
//! │  9  tender balance check                                                │
//! │  10 inventory consumption      ┐                                        │
//! │  11 sale+items+payments+audit  ├── one transaction                      │
//! │     commit                     ┘                                        │
//! │  12 response                                                            │
//! │                                                                         │
//! │  Only Completed and Void are durable states; nothing between.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The whole pipeline runs under the bounded-retry wrapper; a unique-key
//! race on clientSaleId during commit is resolved by returning the winner's
//! sale instead of erroring.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use crate::clock::Clock;
use crate::context::{resolve_store_context, StoreContext};
use crate::error::{EngineError, EngineResult};
use crate::inventory::{self, InventoryLedger};
use crate::points::PointsReversalNotifier;
use crate::retry;
use tally_core::requests::{CreateSaleRequest, VoidSaleRequest};
use tally_core::{
    folio, validation, Actor, Extra, OptionItem, Payment, Product, Sale, SaleItem,
    SaleItemExtra, SaleItemSelection, SaleStatus, ValidationError, VoidReasonCode,
};
use tally_db::repository::audit::{AuditEntry, AuditRepository};
use tally_db::repository::sale::SaleRepository;
use tally_db::Database;

/// Response for a posted (or idempotently replayed) sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleResponse {
    pub sale_id: String,
    pub folio: String,
    #[ts(as = "String")]
    pub occurred_at: DateTime<Utc>,
    pub status: SaleStatus,
    pub subtotal_cents: i64,
    pub total_cents: i64,
}

impl SaleResponse {
    fn from_sale(sale: &Sale) -> Self {
        SaleResponse {
            sale_id: sale.id.clone(),
            folio: sale.folio.clone(),
            occurred_at: sale.occurred_at,
            status: sale.status,
            subtotal_cents: sale.subtotal_cents,
            total_cents: sale.total_cents,
        }
    }
}

/// Response for a void (or idempotently replayed void).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct VoidResponse {
    pub sale_id: String,
    pub folio: String,
    pub status: SaleStatus,
    pub reason_code: VoidReasonCode,
    #[ts(as = "Option<String>")]
    pub voided_at: Option<DateTime<Utc>>,
}

impl VoidResponse {
    fn from_sale(sale: &Sale, reason_code: VoidReasonCode) -> Self {
        VoidResponse {
            sale_id: sale.id.clone(),
            folio: sale.folio.clone(),
            status: sale.status,
            reason_code: sale.void_reason_code.unwrap_or(reason_code),
            voided_at: sale.voided_at,
        }
    }
}

/// A priced line, ready to persist. Intermediate only - never stored as-is.
struct PricedLine {
    item: SaleItem,
    selections: Vec<SaleItemSelection>,
    extras: Vec<SaleItemExtra>,
}

/// The sale coordinator service.
pub struct SaleCoordinator {
    db: Database,
    clock: Arc<dyn Clock>,
    points: Arc<dyn PointsReversalNotifier>,
}

impl SaleCoordinator {
    pub fn new(
        db: Database,
        clock: Arc<dyn Clock>,
        points: Arc<dyn PointsReversalNotifier>,
    ) -> Self {
        SaleCoordinator { db, clock, points }
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Posts a sale. Safe to retry with the same `clientSaleId`: the
    /// original sale is returned unchanged, stock is decremented once.
    pub async fn create_sale(
        &self,
        actor: Option<&Actor>,
        tenant_id: &str,
        requested_store_id: Option<&str>,
        request: &CreateSaleRequest,
    ) -> EngineResult<SaleResponse> {
        retry::with_retries("create_sale", || {
            self.create_sale_once(actor, tenant_id, requested_store_id, request)
        })
        .await
    }

    async fn create_sale_once(
        &self,
        actor: Option<&Actor>,
        tenant_id: &str,
        requested_store_id: Option<&str>,
        request: &CreateSaleRequest,
    ) -> EngineResult<SaleResponse> {
        // Steps 1-2: fail fast, nothing touched yet.
        let payments = validation::validate_create_sale(request)?;

        // Step 3: actor identity.
        let actor = actor.ok_or(EngineError::Unauthorized)?;

        // Step 4: effective store + policy.
        let ctx = resolve_store_context(&self.db, tenant_id, requested_store_id).await?;

        // Step 5: shift gate.
        let shift = self
            .db
            .shifts()
            .find_open(&ctx.tenant_id, &ctx.store_id, &actor.user_id)
            .await?;
        if ctx.settings.shift_required && shift.is_none() {
            return Err(EngineError::conflict(
                "an open shift is required to post a sale",
            ));
        }

        // Step 6: idempotency pre-check.
        if let Some(client_sale_id) = request.client_sale_id.as_deref() {
            if let Some(existing) = self
                .db
                .sales()
                .get_by_client_sale_id(&ctx.tenant_id, client_sale_id)
                .await?
            {
                debug!(
                    sale_id = %existing.id,
                    client_sale_id,
                    "Idempotent replay, returning existing sale"
                );
                return Ok(SaleResponse::from_sale(&existing));
            }
        }

        // Step 7: bulk catalog load, active only; any miss fails the whole
        // request.
        let (products, extras, options) = self.load_catalog(&ctx, request).await?;
        let overrides = self.db.catalog().overrides_for_store(&ctx.store_id).await?;

        // Flag-layer availability gate over every line, tracked or not.
        // Stock itself is re-checked at consumption time, inside the
        // transaction.
        inventory::gate_sale_lines(&request.items, &products, &extras, &overrides)?;

        // Step 8: snapshot pricing.
        let now = self.clock.now();
        let sale_id = Uuid::new_v4().to_string();
        let (lines, subtotal_cents) =
            price_lines(&sale_id, request, &products, &extras, &options)?;
        let total_cents = subtotal_cents;

        // Step 9: the tender must balance exactly.
        let paid_cents: i64 = payments.iter().map(|p| p.amount_cents).sum();
        if paid_cents != total_cents {
            return Err(EngineError::Validation(ValidationError::TenderMismatch {
                expected_cents: total_cents,
                paid_cents,
            }));
        }

        let sale = Sale {
            id: sale_id.clone(),
            tenant_id: ctx.tenant_id.clone(),
            store_id: ctx.store_id.clone(),
            folio: folio::generate(now),
            occurred_at: now,
            currency: request
                .currency
                .clone()
                .unwrap_or_else(|| "MXN".to_string()),
            status: SaleStatus::Completed,
            subtotal_cents,
            total_cents,
            client_sale_id: request.client_sale_id.clone(),
            shift_id: shift.as_ref().map(|s| s.id.clone()),
            user_id: actor.user_id.clone(),
            points_awarded: 0,
            notes: request.notes.clone(),
            void_reason_code: None,
            void_reason_text: None,
            void_note: None,
            voided_by: None,
            voided_at: None,
            client_void_id: None,
        };

        let movements = inventory::build_movements(
            &request.items,
            &products,
            &extras,
            &overrides,
            ctx.settings.enforce_stock_all,
        );

        // Steps 10-11: one transaction for consumption + persistence.
        let result = self
            .persist_sale(&ctx, actor, &sale, &lines, &payments, &movements, now)
            .await;

        match result {
            Ok(()) => {
                info!(
                    sale_id = %sale.id,
                    folio = %sale.folio,
                    total_cents,
                    "Sale posted"
                );
                Ok(SaleResponse::from_sale(&sale))
            }
            // Lost the idempotency race to a concurrent identical retry:
            // the unique index on clientSaleId fired during commit. Return
            // the winner's sale.
            Err(EngineError::Storage(db_err))
                if db_err.is_unique_violation_on("client_sale_id") =>
            {
                let client_sale_id = request.client_sale_id.as_deref().unwrap_or_default();
                warn!(client_sale_id, "Idempotency race lost, returning winner");
                let existing = self
                    .db
                    .sales()
                    .get_by_client_sale_id(&ctx.tenant_id, client_sale_id)
                    .await?
                    .ok_or_else(|| EngineError::Storage(db_err))?;
                Ok(SaleResponse::from_sale(&existing))
            }
            Err(err) => Err(err),
        }
    }

    async fn load_catalog(
        &self,
        ctx: &StoreContext,
        request: &CreateSaleRequest,
    ) -> EngineResult<(
        HashMap<String, Product>,
        HashMap<String, Extra>,
        HashMap<String, OptionItem>,
    )> {
        let mut product_ids: Vec<String> = request
            .items
            .iter()
            .map(|l| l.product_id.clone())
            .collect();
        product_ids.sort();
        product_ids.dedup();

        let mut extra_ids: Vec<String> = request
            .items
            .iter()
            .flat_map(|l| l.extras.iter().map(|e| e.extra_id.clone()))
            .collect();
        extra_ids.sort();
        extra_ids.dedup();

        let mut option_ids: Vec<String> = request
            .items
            .iter()
            .flat_map(|l| l.selections.iter().map(|s| s.option_item_id.clone()))
            .collect();
        option_ids.sort();
        option_ids.dedup();

        let products: HashMap<String, Product> = self
            .db
            .catalog()
            .products_by_ids(&ctx.tenant_id, &product_ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        if let Some(missing) = product_ids.iter().find(|id| !products.contains_key(*id)) {
            return Err(EngineError::not_found("Product", missing));
        }

        let extras: HashMap<String, Extra> = self
            .db
            .catalog()
            .extras_by_ids(&ctx.tenant_id, &extra_ids)
            .await?
            .into_iter()
            .map(|e| (e.id.clone(), e))
            .collect();
        if let Some(missing) = extra_ids.iter().find(|id| !extras.contains_key(*id)) {
            return Err(EngineError::not_found("Extra", missing));
        }

        let options: HashMap<String, OptionItem> = self
            .db
            .catalog()
            .option_items_by_ids(&ctx.tenant_id, &option_ids)
            .await?
            .into_iter()
            .map(|o| (o.id.clone(), o))
            .collect();
        if let Some(missing) = option_ids.iter().find(|id| !options.contains_key(*id)) {
            return Err(EngineError::not_found("OptionItem", missing));
        }

        Ok((products, extras, options))
    }

    #[allow(clippy::too_many_arguments)]
    async fn persist_sale(
        &self,
        ctx: &StoreContext,
        actor: &Actor,
        sale: &Sale,
        lines: &[PricedLine],
        payments: &[tally_core::requests::PaymentRequest],
        movements: &[inventory::Movement],
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        let mut tx = self.db.begin().await?;

        InventoryLedger::apply_consumption(&mut tx, ctx, &sale.id, actor, movements, now)
            .await?;

        SaleRepository::insert_sale(&mut tx, sale).await?;
        for line in lines {
            SaleRepository::insert_item(&mut tx, &line.item).await?;
            for selection in &line.selections {
                SaleRepository::insert_selection(&mut tx, selection).await?;
            }
            for extra in &line.extras {
                SaleRepository::insert_extra(&mut tx, extra).await?;
            }
        }
        for payment in payments {
            SaleRepository::insert_payment(
                &mut tx,
                &Payment {
                    id: Uuid::new_v4().to_string(),
                    sale_id: sale.id.clone(),
                    method: payment.method,
                    amount_cents: payment.amount_cents,
                    reference: payment.reference.clone(),
                    created_at: now,
                },
            )
            .await?;
        }

        AuditRepository::append(
            &mut tx,
            &AuditEntry {
                tenant_id: &ctx.tenant_id,
                store_id: Some(&ctx.store_id),
                action: "sale.created",
                entity_kind: "sale",
                entity_id: &sale.id,
                actor_id: &actor.user_id,
                detail: serde_json::json!({
                    "folio": sale.folio,
                    "totalCents": sale.total_cents,
                    "itemCount": lines.len(),
                    "paymentCount": payments.len(),
                }),
                at: now,
            },
        )
        .await?;

        tx.commit().await.map_err(tally_db::DbError::from)?;
        Ok(())
    }

    // =========================================================================
    // Void
    // =========================================================================

    /// Voids a posted sale. Idempotent by `clientVoidId`; a second void with
    /// a different request is a conflict. Cashiers may only void sales from
    /// their own open shift on today's business date.
    pub async fn void_sale(
        &self,
        actor: &Actor,
        tenant_id: &str,
        sale_id: &str,
        request: &VoidSaleRequest,
    ) -> EngineResult<VoidResponse> {
        let response = retry::with_retries("void_sale", || {
            self.void_sale_once(actor, tenant_id, sale_id, request)
        })
        .await?;

        Ok(response)
    }

    async fn void_sale_once(
        &self,
        actor: &Actor,
        tenant_id: &str,
        sale_id: &str,
        request: &VoidSaleRequest,
    ) -> EngineResult<VoidResponse> {
        let sale = self
            .db
            .sales()
            .get_by_id(tenant_id, sale_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Sale", sale_id))?;

        if sale.status == SaleStatus::Void {
            return self.replay_or_conflict(&sale, request);
        }

        let ctx = resolve_store_context(&self.db, tenant_id, Some(&sale.store_id)).await?;
        let now = self.clock.now();

        if !actor.can_void_any_sale() {
            self.check_cashier_void_scope(&ctx, actor, &sale, now).await?;
        }

        let mut tx = self.db.begin().await?;
        let flipped = SaleRepository::mark_void(
            &mut tx,
            &sale.id,
            request.reason_code,
            request.reason_text.as_deref(),
            request.note.as_deref(),
            &actor.user_id,
            now,
            request.client_void_id.as_deref(),
        )
        .await?;

        if !flipped {
            // A concurrent void won the race between our read and the
            // guarded update. Re-read and apply the idempotency rule.
            drop(tx);
            let current = self
                .db
                .sales()
                .get_by_id(tenant_id, sale_id)
                .await?
                .ok_or_else(|| EngineError::not_found("Sale", sale_id))?;
            return self.replay_or_conflict(&current, request);
        }

        AuditRepository::append(
            &mut tx,
            &AuditEntry {
                tenant_id: &ctx.tenant_id,
                store_id: Some(&ctx.store_id),
                action: "sale.voided",
                entity_kind: "sale",
                entity_id: &sale.id,
                actor_id: &actor.user_id,
                detail: serde_json::json!({
                    "folio": sale.folio,
                    "totalCents": sale.total_cents,
                    "reasonCode": request.reason_code,
                    "pointsAwarded": sale.points_awarded,
                }),
                at: now,
            },
        )
        .await?;
        tx.commit().await.map_err(tally_db::DbError::from)?;

        // Best-effort, strictly after commit: never inside the transaction.
        if sale.points_awarded > 0 {
            self.points
                .request_reversal(&ctx.tenant_id, &sale.id, sale.points_awarded)
                .await;
        }

        info!(sale_id = %sale.id, reason = ?request.reason_code, "Sale voided");

        Ok(VoidResponse {
            sale_id: sale.id,
            folio: sale.folio,
            status: SaleStatus::Void,
            reason_code: request.reason_code,
            voided_at: Some(now),
        })
    }

    /// Idempotency rule for an already-void sale: same `clientVoidId` means
    /// replay, anything else is a conflict.
    fn replay_or_conflict(
        &self,
        sale: &Sale,
        request: &VoidSaleRequest,
    ) -> EngineResult<VoidResponse> {
        match (&request.client_void_id, &sale.client_void_id) {
            (Some(requested), Some(recorded)) if requested == recorded => {
                debug!(sale_id = %sale.id, "Idempotent void replay");
                Ok(VoidResponse::from_sale(sale, request.reason_code))
            }
            _ => Err(EngineError::conflict("sale is already void")),
        }
    }

    /// A plain cashier may only void a sale posted into their own currently
    /// open shift, on today's business date.
    async fn check_cashier_void_scope(
        &self,
        ctx: &StoreContext,
        actor: &Actor,
        sale: &Sale,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        let shift = self
            .db
            .shifts()
            .find_open(&ctx.tenant_id, &ctx.store_id, &actor.user_id)
            .await?
            .ok_or_else(|| {
                EngineError::forbidden("cashiers may only void sales from their open shift")
            })?;

        if sale.shift_id.as_deref() != Some(shift.id.as_str()) {
            return Err(EngineError::forbidden(
                "cashiers may only void sales from their open shift",
            ));
        }

        if ctx.settings.business_date(sale.occurred_at) != ctx.settings.business_date(now) {
            return Err(EngineError::forbidden(
                "cashiers may only void sales from today's business date",
            ));
        }

        Ok(())
    }

    // =========================================================================
    // Inventory reversal for a voided sale
    // =========================================================================

    /// Credits back a voided sale's stock. A distinct operation from the
    /// void itself; idempotent, so a crash mid-reversal is recovered by
    /// calling it again.
    pub async fn reverse_for_void(
        &self,
        actor: &Actor,
        tenant_id: &str,
        sale_id: &str,
    ) -> EngineResult<usize> {
        retry::with_retries("reverse_for_void", || async {
            let sale = self
                .db
                .sales()
                .get_by_id(tenant_id, sale_id)
                .await?
                .ok_or_else(|| EngineError::not_found("Sale", sale_id))?;

            if sale.status != SaleStatus::Void {
                return Err(EngineError::conflict(
                    "inventory can only be reversed for a void sale",
                ));
            }

            let ctx = resolve_store_context(&self.db, tenant_id, Some(&sale.store_id)).await?;
            let now = self.clock.now();

            let mut tx = self.db.begin().await?;
            let credited =
                InventoryLedger::reverse_consumption(&mut tx, &ctx, &sale.id, actor, now)
                    .await?;
            if credited > 0 {
                AuditRepository::append(
                    &mut tx,
                    &AuditEntry {
                        tenant_id: &ctx.tenant_id,
                        store_id: Some(&ctx.store_id),
                        action: "inventory.reversed",
                        entity_kind: "sale",
                        entity_id: &sale.id,
                        actor_id: &actor.user_id,
                        detail: serde_json::json!({ "itemsCredited": credited }),
                        at: now,
                    },
                )
                .await?;
            }
            tx.commit().await.map_err(tally_db::DbError::from)?;

            Ok(credited)
        })
        .await
    }
}

/// Prices every requested line from the current catalog, snapshotting
/// names/prices so later catalog edits never touch this sale.
///
/// Option selections are snapshotted with their catalog price delta but
/// always applied as zero when totalling - priced options are not a thing
/// at the register today.
fn price_lines(
    sale_id: &str,
    request: &CreateSaleRequest,
    products: &HashMap<String, Product>,
    extras: &HashMap<String, Extra>,
    options: &HashMap<String, OptionItem>,
) -> EngineResult<(Vec<PricedLine>, i64)> {
    let mut lines = Vec::with_capacity(request.items.len());
    let mut subtotal_cents = 0i64;

    for line in &request.items {
        let product = products
            .get(&line.product_id)
            .ok_or_else(|| EngineError::not_found("Product", &line.product_id))?;

        let item_id = Uuid::new_v4().to_string();
        let mut line_total_cents = product.price_cents * line.quantity;

        let mut extra_rows = Vec::with_capacity(line.extras.len());
        for extra_line in &line.extras {
            let extra = extras
                .get(&extra_line.extra_id)
                .ok_or_else(|| EngineError::not_found("Extra", &extra_line.extra_id))?;
            line_total_cents += extra.price_cents * extra_line.quantity;
            extra_rows.push(SaleItemExtra {
                id: Uuid::new_v4().to_string(),
                sale_item_id: item_id.clone(),
                extra_id: extra.id.clone(),
                name_snapshot: extra.name.clone(),
                unit_price_cents: extra.price_cents,
                quantity: extra_line.quantity,
            });
        }

        let mut selection_rows = Vec::with_capacity(line.selections.len());
        for selection in &line.selections {
            let option = options
                .get(&selection.option_item_id)
                .ok_or_else(|| EngineError::not_found("OptionItem", &selection.option_item_id))?;
            selection_rows.push(SaleItemSelection {
                id: Uuid::new_v4().to_string(),
                sale_item_id: item_id.clone(),
                option_item_id: option.id.clone(),
                name_snapshot: option.name.clone(),
                price_delta_cents: option.price_delta_cents,
            });
        }

        subtotal_cents += line_total_cents;
        lines.push(PricedLine {
            item: SaleItem {
                id: item_id,
                sale_id: sale_id.to_string(),
                product_id: product.id.clone(),
                sku_snapshot: product.sku.clone(),
                name_snapshot: product.name.clone(),
                unit_price_cents: product.price_cents,
                quantity: line.quantity,
                line_total_cents,
            },
            selections: selection_rows,
            extras: extra_rows,
        });
    }

    Ok((lines, subtotal_cents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::requests::{ExtraLineRequest, SaleLineRequest, SelectionRequest};

    fn product(id: &str, price_cents: i64) -> Product {
        Product {
            id: id.to_string(),
            tenant_id: "t1".to_string(),
            sku: format!("SKU-{id}"),
            name: id.to_string(),
            price_cents,
            track_inventory: false,
            is_available: true,
            is_enabled: true,
            is_active: true,
        }
    }

    fn request(items: Vec<SaleLineRequest>) -> CreateSaleRequest {
        CreateSaleRequest {
            items,
            payments: None,
            payment: None,
            client_sale_id: None,
            currency: None,
            notes: None,
        }
    }

    #[test]
    fn test_pricing_sums_product_and_extras() {
        let products = HashMap::from([("p1".to_string(), product("p1", 1000))]);
        let extras = HashMap::from([(
            "e1".to_string(),
            Extra {
                id: "e1".to_string(),
                tenant_id: "t1".to_string(),
                name: "Extra shot".to_string(),
                price_cents: 250,
                track_inventory: false,
                is_available: true,
                is_enabled: true,
                is_active: true,
            },
        )]);

        let req = request(vec![SaleLineRequest {
            product_id: "p1".to_string(),
            quantity: 2,
            selections: vec![],
            extras: vec![ExtraLineRequest {
                extra_id: "e1".to_string(),
                quantity: 3,
            }],
        }]);

        let (lines, subtotal) =
            price_lines("s1", &req, &products, &extras, &HashMap::new()).unwrap();
        // 2×1000 + 3×250
        assert_eq!(subtotal, 2750);
        assert_eq!(lines[0].item.line_total_cents, 2750);
        assert_eq!(lines[0].item.unit_price_cents, 1000);
        assert_eq!(lines[0].extras[0].unit_price_cents, 250);
    }

    #[test]
    fn test_option_deltas_snapshotted_but_priced_at_zero() {
        let products = HashMap::from([("p1".to_string(), product("p1", 1000))]);
        let options = HashMap::from([(
            "o1".to_string(),
            OptionItem {
                id: "o1".to_string(),
                tenant_id: "t1".to_string(),
                name: "No onions".to_string(),
                price_delta_cents: 500,
                is_active: true,
            },
        )]);

        let req = request(vec![SaleLineRequest {
            product_id: "p1".to_string(),
            quantity: 1,
            selections: vec![SelectionRequest {
                option_item_id: "o1".to_string(),
            }],
            extras: vec![],
        }]);

        let (lines, subtotal) =
            price_lines("s1", &req, &products, &HashMap::new(), &options).unwrap();
        assert_eq!(subtotal, 1000);
        assert_eq!(lines[0].selections[0].price_delta_cents, 500);
    }

    #[test]
    fn test_conservation_across_lines() {
        let products = HashMap::from([
            ("p1".to_string(), product("p1", 1099)),
            ("p2".to_string(), product("p2", 501)),
        ]);
        let req = request(vec![
            SaleLineRequest {
                product_id: "p1".to_string(),
                quantity: 3,
                selections: vec![],
                extras: vec![],
            },
            SaleLineRequest {
                product_id: "p2".to_string(),
                quantity: 2,
                selections: vec![],
                extras: vec![],
            },
        ]);

        let (lines, subtotal) =
            price_lines("s1", &req, &products, &HashMap::new(), &HashMap::new()).unwrap();
        let line_sum: i64 = lines.iter().map(|l| l.item.line_total_cents).sum();
        assert_eq!(subtotal, line_sum);
        assert_eq!(subtotal, 3 * 1099 + 2 * 501);
    }
}
