//! # Shift Ledger
//!
//! Open/close lifecycle of a cashier's register shift and the cash
//! reconciliation at close.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  (none) ──open──► Open ──close──► Closed                                │
//! │                                                                         │
//! │  open   : idempotent by nature - an existing open shift for the         │
//! │           (user, store) is returned, never an error                     │
//! │  preview: read-only, safe while the cashier is still counting           │
//! │  close  : expected = opening + cash collected                           │
//! │           counted  = Σ(denomination × count), defaults to expected      │
//! │           |counted - expected| > threshold requires a reason            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;
use uuid::Uuid;

use crate::clock::Clock;
use crate::context::{resolve_store_context, StoreContext};
use crate::error::{EngineError, EngineResult};
use crate::retry;
use tally_core::requests::{
    self, ClosePreviewRequest, CloseShiftRequest, OpenShiftRequest,
};
use tally_core::{validation, Actor, PaymentBreakdown, PosShift, ShiftStatus};
use tally_db::repository::audit::{AuditEntry, AuditRepository};
use tally_db::repository::sale::SaleRepository;
use tally_db::repository::shift::ShiftRepository;
use tally_db::Database;

/// An open (or just-opened) shift.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShiftResponse {
    pub shift_id: String,
    pub store_id: String,
    pub user_id: String,
    pub status: ShiftStatus,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    pub opening_cash_cents: i64,
}

impl ShiftResponse {
    fn from_shift(shift: &PosShift) -> Self {
        ShiftResponse {
            shift_id: shift.id.clone(),
            store_id: shift.store_id.clone(),
            user_id: shift.user_id.clone(),
            status: shift.status,
            opened_at: shift.opened_at,
            opening_cash_cents: shift.opening_cash_cents,
        }
    }
}

/// Read-only projection of what a close would record right now.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ClosePreviewResponse {
    pub shift_id: String,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    pub opening_cash_cents: i64,
    pub breakdown: PaymentBreakdown,
    pub expected_cash_cents: i64,
    /// Present only when a hypothetical count was supplied.
    pub counted_cash_cents: Option<i64>,
    pub difference_cents: Option<i64>,
}

/// The recorded close.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CloseShiftResponse {
    pub shift_id: String,
    #[ts(as = "String")]
    pub closed_at: DateTime<Utc>,
    pub opening_cash_cents: i64,
    pub expected_cash_cents: i64,
    pub counted_cash_cents: i64,
    /// counted - expected; negative means the drawer is short.
    pub difference_cents: i64,
    pub close_reason: Option<String>,
    pub breakdown: PaymentBreakdown,
}

/// The shift ledger service.
pub struct ShiftLedger {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl ShiftLedger {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        ShiftLedger { db, clock }
    }

    // =========================================================================
    // Open
    // =========================================================================

    /// Opens a shift for the actor on the effective store, or returns the
    /// one already open. Opening while open is not an error.
    pub async fn open_shift(
        &self,
        actor: &Actor,
        tenant_id: &str,
        request: &OpenShiftRequest,
    ) -> EngineResult<ShiftResponse> {
        retry::with_retries("open_shift", || self.open_shift_once(actor, tenant_id, request))
            .await
    }

    async fn open_shift_once(
        &self,
        actor: &Actor,
        tenant_id: &str,
        request: &OpenShiftRequest,
    ) -> EngineResult<ShiftResponse> {
        validation::validate_opening_cash(request.opening_cash_cents)?;
        let ctx =
            resolve_store_context(&self.db, tenant_id, request.store_id.as_deref()).await?;

        // Replay by client operation id.
        if let Some(operation_id) = request.client_operation_id.as_deref() {
            if let Some(existing) = self
                .db
                .shifts()
                .find_by_open_client_id(&ctx.tenant_id, operation_id)
                .await?
            {
                if existing.user_id == actor.user_id && existing.store_id == ctx.store_id {
                    debug!(shift_id = %existing.id, "Idempotent open replay");
                    return Ok(ShiftResponse::from_shift(&existing));
                }
            }
        }

        // An existing open shift is the answer, not an error.
        if let Some(existing) = self
            .db
            .shifts()
            .find_open(&ctx.tenant_id, &ctx.store_id, &actor.user_id)
            .await?
        {
            return Ok(ShiftResponse::from_shift(&existing));
        }

        let now = self.clock.now();
        let shift = PosShift {
            id: Uuid::new_v4().to_string(),
            tenant_id: ctx.tenant_id.clone(),
            store_id: ctx.store_id.clone(),
            user_id: actor.user_id.clone(),
            status: ShiftStatus::Open,
            opened_at: now,
            opened_by: actor.user_id.clone(),
            opening_cash_cents: request.opening_cash_cents,
            open_client_id: request.client_operation_id.clone(),
            notes: request.notes.clone(),
            closed_at: None,
            closed_by: None,
            counted_cash_cents: None,
            expected_cash_cents: None,
            difference_cents: None,
            close_reason: None,
            close_client_id: None,
        };

        let mut tx = self.db.begin().await?;
        let inserted = ShiftRepository::insert(&mut tx, &shift).await;
        match inserted {
            Ok(()) => {
                AuditRepository::append(
                    &mut tx,
                    &AuditEntry {
                        tenant_id: &ctx.tenant_id,
                        store_id: Some(&ctx.store_id),
                        action: "shift.opened",
                        entity_kind: "shift",
                        entity_id: &shift.id,
                        actor_id: &actor.user_id,
                        detail: serde_json::json!({
                            "openingCashCents": shift.opening_cash_cents,
                        }),
                        at: now,
                    },
                )
                .await?;
                tx.commit().await.map_err(tally_db::DbError::from)?;

                info!(shift_id = %shift.id, user_id = %actor.user_id, "Shift opened");
                Ok(ShiftResponse::from_shift(&shift))
            }
            // Lost a race with a concurrent open by the same user: the
            // partial unique index fired. Return the winner's shift.
            Err(err) if err.is_unique_violation_on("pos_shifts") => {
                drop(tx);
                let winner = self
                    .db
                    .shifts()
                    .find_open(&ctx.tenant_id, &ctx.store_id, &actor.user_id)
                    .await?
                    .ok_or(EngineError::Storage(err))?;
                Ok(ShiftResponse::from_shift(&winner))
            }
            Err(err) => Err(err.into()),
        }
    }

    // =========================================================================
    // Preview
    // =========================================================================

    /// Computes what a close would record right now. Mutates nothing - safe
    /// to call repeatedly while the cashier counts the drawer.
    pub async fn close_preview(
        &self,
        actor: &Actor,
        tenant_id: &str,
        request: &ClosePreviewRequest,
    ) -> EngineResult<ClosePreviewResponse> {
        let ctx =
            resolve_store_context(&self.db, tenant_id, request.store_id.as_deref()).await?;
        let shift = self
            .resolve_open_shift(&ctx, actor, request.shift_id.as_deref())
            .await?;

        let breakdown = self
            .db
            .sales()
            .payment_breakdown_for_shift(&ctx.tenant_id, &shift.id)
            .await?;
        let expected_cash_cents = shift.opening_cash_cents + breakdown.cash_cents;

        let counted_cash_cents = request
            .denominations
            .as_deref()
            .map(requests::counted_cash_cents);
        let difference_cents = counted_cash_cents.map(|counted| counted - expected_cash_cents);

        Ok(ClosePreviewResponse {
            shift_id: shift.id,
            opened_at: shift.opened_at,
            opening_cash_cents: shift.opening_cash_cents,
            breakdown,
            expected_cash_cents,
            counted_cash_cents,
            difference_cents,
        })
    }

    // =========================================================================
    // Close
    // =========================================================================

    /// Closes the actor's open shift, reconciling counted against expected
    /// cash. Idempotent by `clientOperationId`: retrying a completed close
    /// returns the recorded result.
    pub async fn close_shift(
        &self,
        actor: &Actor,
        tenant_id: &str,
        request: &CloseShiftRequest,
    ) -> EngineResult<CloseShiftResponse> {
        retry::with_retries("close_shift", || {
            self.close_shift_once(actor, tenant_id, request)
        })
        .await
    }

    async fn close_shift_once(
        &self,
        actor: &Actor,
        tenant_id: &str,
        request: &CloseShiftRequest,
    ) -> EngineResult<CloseShiftResponse> {
        if let Some(denominations) = request.denominations.as_deref() {
            validation::validate_denominations(denominations)?;
        }

        let ctx =
            resolve_store_context(&self.db, tenant_id, request.store_id.as_deref()).await?;

        let shift = match self
            .resolve_open_shift(&ctx, actor, request.shift_id.as_deref())
            .await
        {
            Ok(shift) => shift,
            // No open shift: a retry of an already-completed close is still
            // answered, from the recorded close.
            Err(err) => {
                if let Some(operation_id) = request.client_operation_id.as_deref() {
                    if let Some(closed) = self
                        .db
                        .shifts()
                        .find_closed_by_close_client_id(&ctx.tenant_id, operation_id)
                        .await?
                    {
                        debug!(shift_id = %closed.id, "Idempotent close replay");
                        return self.replay_close(&ctx, &closed).await;
                    }
                }
                return Err(err);
            }
        };

        let now = self.clock.now();
        let mut tx = self.db.begin().await?;

        // The breakdown is read inside the same transaction as the guarded
        // close, so a sale committing concurrently is either fully counted
        // in `expected` or lands in the next shift - never silently dropped.
        let breakdown =
            SaleRepository::breakdown_for_shift(&mut tx, &ctx.tenant_id, &shift.id).await?;
        let expected_cash_cents = shift.opening_cash_cents + breakdown.cash_cents;

        // No physical count supplied means a self-balancing close.
        let counted_cash_cents = request
            .denominations
            .as_deref()
            .map(requests::counted_cash_cents)
            .unwrap_or(expected_cash_cents);
        let difference_cents = counted_cash_cents - expected_cash_cents;

        let reason = request
            .close_reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());
        if difference_cents.abs() > ctx.settings.cash_difference_threshold_cents
            && reason.is_none()
        {
            return Err(EngineError::Validation(
                tally_core::ValidationError::Required {
                    field: "closeReason".to_string(),
                },
            ));
        }

        let closed = ShiftRepository::close(
            &mut tx,
            &shift.id,
            &actor.user_id,
            now,
            counted_cash_cents,
            expected_cash_cents,
            difference_cents,
            reason,
            request.client_operation_id.as_deref(),
        )
        .await?;

        if !closed {
            // A concurrent close won between our read and the guarded
            // update. Re-read and apply the idempotency rule.
            drop(tx);
            let current = self
                .db
                .shifts()
                .get_by_id(&ctx.tenant_id, &shift.id)
                .await?
                .ok_or_else(|| EngineError::not_found("Shift", &shift.id))?;
            let matches_replay = request.client_operation_id.is_some()
                && current.close_client_id == request.client_operation_id;
            if matches_replay {
                return self.replay_close(&ctx, &current).await;
            }
            return Err(EngineError::conflict("shift is already closed"));
        }

        AuditRepository::append(
            &mut tx,
            &AuditEntry {
                tenant_id: &ctx.tenant_id,
                store_id: Some(&ctx.store_id),
                action: "shift.closed",
                entity_kind: "shift",
                entity_id: &shift.id,
                actor_id: &actor.user_id,
                detail: serde_json::json!({
                    "openingCashCents": shift.opening_cash_cents,
                    "expectedCashCents": expected_cash_cents,
                    "countedCashCents": counted_cash_cents,
                    "differenceCents": difference_cents,
                    "breakdown": breakdown,
                }),
                at: now,
            },
        )
        .await?;
        tx.commit().await.map_err(tally_db::DbError::from)?;

        info!(
            shift_id = %shift.id,
            expected_cash_cents,
            counted_cash_cents,
            difference_cents,
            "Shift closed"
        );

        Ok(CloseShiftResponse {
            shift_id: shift.id,
            closed_at: now,
            opening_cash_cents: shift.opening_cash_cents,
            expected_cash_cents,
            counted_cash_cents,
            difference_cents,
            close_reason: reason.map(str::to_string),
            breakdown,
        })
    }

    /// The actor's currently open shift on the effective store, if any.
    pub async fn current_shift(
        &self,
        actor: &Actor,
        tenant_id: &str,
        store_id: Option<&str>,
    ) -> EngineResult<Option<ShiftResponse>> {
        let ctx = resolve_store_context(&self.db, tenant_id, store_id).await?;
        Ok(self
            .db
            .shifts()
            .find_open(&ctx.tenant_id, &ctx.store_id, &actor.user_id)
            .await?
            .as_ref()
            .map(ShiftResponse::from_shift))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// The open shift a preview/close targets: the given id, or the actor's
    /// open shift on the store.
    ///
    /// An explicit id is ownership-checked: it must belong to the effective
    /// store, and a cashier may only name their own shift. Managers and
    /// admins may close any register on the store.
    async fn resolve_open_shift(
        &self,
        ctx: &StoreContext,
        actor: &Actor,
        shift_id: Option<&str>,
    ) -> EngineResult<PosShift> {
        let shift = match shift_id {
            Some(id) => {
                let shift = self.db.shifts().get_by_id(&ctx.tenant_id, id).await?;
                if let Some(shift) = &shift {
                    if shift.store_id != ctx.store_id {
                        return Err(EngineError::forbidden(
                            "shift belongs to a different store",
                        ));
                    }
                    if shift.user_id != actor.user_id && !actor.can_manage_any_shift() {
                        return Err(EngineError::forbidden(
                            "cashiers may only preview or close their own shift",
                        ));
                    }
                }
                shift
            }
            None => {
                self.db
                    .shifts()
                    .find_open(&ctx.tenant_id, &ctx.store_id, &actor.user_id)
                    .await?
            }
        };

        match shift {
            Some(shift) if shift.is_open() => Ok(shift),
            Some(_) | None => Err(EngineError::conflict("no open shift")),
        }
    }

    /// Rebuilds the close response from an already-closed shift's recorded
    /// figures.
    async fn replay_close(
        &self,
        ctx: &StoreContext,
        shift: &PosShift,
    ) -> EngineResult<CloseShiftResponse> {
        let breakdown = self
            .db
            .sales()
            .payment_breakdown_for_shift(&ctx.tenant_id, &shift.id)
            .await?;

        // Closed shifts always carry these columns; fall back to derived
        // figures rather than failing a replay.
        let expected = shift
            .expected_cash_cents
            .unwrap_or(shift.opening_cash_cents + breakdown.cash_cents);
        let counted = shift.counted_cash_cents.unwrap_or(expected);

        Ok(CloseShiftResponse {
            shift_id: shift.id.clone(),
            closed_at: shift.closed_at.unwrap_or(shift.opened_at),
            opening_cash_cents: shift.opening_cash_cents,
            expected_cash_cents: expected,
            counted_cash_cents: counted,
            difference_cents: shift.difference_cents.unwrap_or(counted - expected),
            close_reason: shift.close_reason.clone(),
            breakdown,
        })
    }
}
