//! # Shift Repository
//!
//! Cash register shift rows. The partial unique index on
//! `(tenant_id, store_id, user_id) WHERE status = 'open'` is the arbiter of
//! "one open shift per user per store": a racing second open hits a unique
//! violation, which the ledger resolves by returning the winner's row.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tally_core::PosShift;

const SHIFT_COLUMNS: &str = "id, tenant_id, store_id, user_id, status, opened_at, opened_by, \
     opening_cash_cents, open_client_id, notes, closed_at, closed_by, counted_cash_cents, \
     expected_cash_cents, difference_cents, close_reason, close_client_id";

/// Repository for register shifts.
#[derive(Debug, Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
}

impl ShiftRepository {
    /// Creates a new ShiftRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRepository { pool }
    }

    /// Inserts a freshly opened shift inside the caller's transaction.
    pub async fn insert(conn: &mut SqliteConnection, shift: &PosShift) -> DbResult<()> {
        debug!(shift_id = %shift.id, user_id = %shift.user_id, "Inserting shift");

        sqlx::query(
            "INSERT INTO pos_shifts (id, tenant_id, store_id, user_id, status, opened_at, \
             opened_by, opening_cash_cents, open_client_id, notes, closed_at, closed_by, \
             counted_cash_cents, expected_cash_cents, difference_cents, close_reason, \
             close_client_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, \
             ?16, ?17)",
        )
        .bind(&shift.id)
        .bind(&shift.tenant_id)
        .bind(&shift.store_id)
        .bind(&shift.user_id)
        .bind(shift.status)
        .bind(shift.opened_at)
        .bind(&shift.opened_by)
        .bind(shift.opening_cash_cents)
        .bind(&shift.open_client_id)
        .bind(&shift.notes)
        .bind(shift.closed_at)
        .bind(&shift.closed_by)
        .bind(shift.counted_cash_cents)
        .bind(shift.expected_cash_cents)
        .bind(shift.difference_cents)
        .bind(&shift.close_reason)
        .bind(&shift.close_client_id)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Stamps the close fields on an open shift. Guarded on `status = 'open'`
    /// so a racing second close affects zero rows.
    #[allow(clippy::too_many_arguments)]
    pub async fn close(
        conn: &mut SqliteConnection,
        shift_id: &str,
        closed_by: &str,
        closed_at: DateTime<Utc>,
        counted_cash_cents: i64,
        expected_cash_cents: i64,
        difference_cents: i64,
        close_reason: Option<&str>,
        close_client_id: Option<&str>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE pos_shifts SET status = 'closed', closed_at = ?2, closed_by = ?3, \
             counted_cash_cents = ?4, expected_cash_cents = ?5, difference_cents = ?6, \
             close_reason = ?7, close_client_id = ?8 \
             WHERE id = ?1 AND status = 'open'",
        )
        .bind(shift_id)
        .bind(closed_at)
        .bind(closed_by)
        .bind(counted_cash_cents)
        .bind(expected_cash_cents)
        .bind(difference_cents)
        .bind(close_reason)
        .bind(close_client_id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Loads a shift by id.
    pub async fn get_by_id(&self, tenant_id: &str, shift_id: &str) -> DbResult<Option<PosShift>> {
        let shift = sqlx::query_as::<_, PosShift>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM pos_shifts WHERE tenant_id = ?1 AND id = ?2"
        ))
        .bind(tenant_id)
        .bind(shift_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shift)
    }

    /// The user's open shift on a store, if any. At most one row can match
    /// thanks to the partial unique index.
    pub async fn find_open(
        &self,
        tenant_id: &str,
        store_id: &str,
        user_id: &str,
    ) -> DbResult<Option<PosShift>> {
        let shift = sqlx::query_as::<_, PosShift>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM pos_shifts \
             WHERE tenant_id = ?1 AND store_id = ?2 AND user_id = ?3 AND status = 'open'"
        ))
        .bind(tenant_id)
        .bind(store_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shift)
    }

    /// Replay lookup for an idempotent open.
    pub async fn find_by_open_client_id(
        &self,
        tenant_id: &str,
        open_client_id: &str,
    ) -> DbResult<Option<PosShift>> {
        let shift = sqlx::query_as::<_, PosShift>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM pos_shifts \
             WHERE tenant_id = ?1 AND open_client_id = ?2"
        ))
        .bind(tenant_id)
        .bind(open_client_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shift)
    }

    /// Replay lookup for an idempotent close.
    pub async fn find_closed_by_close_client_id(
        &self,
        tenant_id: &str,
        close_client_id: &str,
    ) -> DbResult<Option<PosShift>> {
        let shift = sqlx::query_as::<_, PosShift>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM pos_shifts \
             WHERE tenant_id = ?1 AND close_client_id = ?2 AND status = 'closed'"
        ))
        .bind(tenant_id)
        .bind(close_client_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shift)
    }
}
