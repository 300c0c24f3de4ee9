//! # Inventory Repository
//!
//! On-hand balances and the append-only adjustment ledger.
//!
//! ## Contention Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  inventory_balances is the hot row under concurrent sales:              │
//! │                                                                         │
//! │  Sale A ──┐                                                             │
//! │           ├──► UPSERT (store, product, on_hand)  ← one writer at a time │
//! │  Sale B ──┘        second writer gets SQLITE_BUSY → engine retries      │
//! │                                                                         │
//! │  Two sales in different stores never touch the same row.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All mutating methods take `&mut SqliteConnection`: consumption must
//! commit or roll back together with the sale that caused it.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tally_core::{InventoryAdjustment, InventoryBalance, ItemKey, ItemKind};

/// Repository for inventory balances and adjustments.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Reads one balance inside the caller's transaction. None means no
    /// row exists yet - treated as zero on hand by the ledger.
    pub async fn get_balance(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        store_id: &str,
        key: &ItemKey,
    ) -> DbResult<Option<InventoryBalance>> {
        let balance = sqlx::query_as::<_, InventoryBalance>(
            "SELECT tenant_id, store_id, item_kind, item_id, on_hand, updated_at \
             FROM inventory_balances \
             WHERE tenant_id = ?1 AND store_id = ?2 AND item_kind = ?3 AND item_id = ?4",
        )
        .bind(tenant_id)
        .bind(store_id)
        .bind(key.kind)
        .bind(&key.id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(balance)
    }

    /// Writes the new on-hand quantity, creating the row if absent.
    pub async fn upsert_balance(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        store_id: &str,
        key: &ItemKey,
        on_hand: i64,
        at: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(item = %key.id, on_hand, "Upserting inventory balance");

        sqlx::query(
            "INSERT INTO inventory_balances \
             (tenant_id, store_id, item_kind, item_id, on_hand, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT (tenant_id, store_id, item_kind, item_id) \
             DO UPDATE SET on_hand = excluded.on_hand, updated_at = excluded.updated_at",
        )
        .bind(tenant_id)
        .bind(store_id)
        .bind(key.kind)
        .bind(&key.id)
        .bind(on_hand)
        .bind(at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Appends one ledger row. The ledger is append-only: there is no
    /// update or delete counterpart, by construction.
    pub async fn insert_adjustment(
        conn: &mut SqliteConnection,
        adjustment: &InventoryAdjustment,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO inventory_adjustments \
             (id, tenant_id, store_id, item_kind, item_id, qty_before, delta, qty_after, \
              reason, reference_kind, reference_id, actor_id, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )
        .bind(&adjustment.id)
        .bind(&adjustment.tenant_id)
        .bind(&adjustment.store_id)
        .bind(adjustment.item_kind)
        .bind(&adjustment.item_id)
        .bind(adjustment.qty_before)
        .bind(adjustment.delta)
        .bind(adjustment.qty_after)
        .bind(adjustment.reason)
        .bind(&adjustment.reference_kind)
        .bind(&adjustment.reference_id)
        .bind(&adjustment.actor_id)
        .bind(adjustment.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Loads the adjustments referencing one sale, oldest first. Used by the
    /// void-reversal path to find what was consumed and what was already
    /// credited back.
    pub async fn adjustments_for_sale(
        conn: &mut SqliteConnection,
        sale_id: &str,
    ) -> DbResult<Vec<InventoryAdjustment>> {
        let adjustments = sqlx::query_as::<_, InventoryAdjustment>(
            "SELECT id, tenant_id, store_id, item_kind, item_id, qty_before, delta, \
             qty_after, reason, reference_kind, reference_id, actor_id, created_at \
             FROM inventory_adjustments \
             WHERE reference_kind = 'sale' AND reference_id = ?1 \
             ORDER BY created_at, id",
        )
        .bind(sale_id)
        .fetch_all(conn)
        .await?;

        Ok(adjustments)
    }

    /// Lists balances for a store, optionally filtered by item kind.
    /// Read-only surface for reporting.
    pub async fn list_balances(
        &self,
        tenant_id: &str,
        store_id: &str,
        kind: Option<ItemKind>,
    ) -> DbResult<Vec<InventoryBalance>> {
        let balances = match kind {
            Some(kind) => {
                sqlx::query_as::<_, InventoryBalance>(
                    "SELECT tenant_id, store_id, item_kind, item_id, on_hand, updated_at \
                     FROM inventory_balances \
                     WHERE tenant_id = ?1 AND store_id = ?2 AND item_kind = ?3 \
                     ORDER BY item_kind, item_id",
                )
                .bind(tenant_id)
                .bind(store_id)
                .bind(kind)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, InventoryBalance>(
                    "SELECT tenant_id, store_id, item_kind, item_id, on_hand, updated_at \
                     FROM inventory_balances \
                     WHERE tenant_id = ?1 AND store_id = ?2 \
                     ORDER BY item_kind, item_id",
                )
                .bind(tenant_id)
                .bind(store_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(balances)
    }
}
