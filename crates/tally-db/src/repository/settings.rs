//! # Settings Repository
//!
//! POS policy settings and the tenant/store directory. Read-only to the
//! core; loaded at the start of every store-scoped operation by the store
//! context resolver (never cached process-wide).

use sqlx::SqlitePool;

use crate::error::DbResult;
use tally_core::{PosSettings, Store};

/// Repository for settings and store directory reads.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Loads the tenant's POS settings row, None if the deployment was never
    /// configured.
    pub async fn get_pos_settings(&self, tenant_id: &str) -> DbResult<Option<PosSettings>> {
        let settings = sqlx::query_as::<_, PosSettings>(
            "SELECT tenant_id, multi_store_enabled, default_store_id, \
             cash_difference_threshold_cents, shift_required, enforce_stock_all, \
             timezone_offset_minutes \
             FROM pos_settings WHERE tenant_id = ?1",
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings)
    }

    /// Loads a store by id (active or not; the resolver checks the flag).
    pub async fn get_store(&self, store_id: &str) -> DbResult<Option<Store>> {
        let store = sqlx::query_as::<_, Store>(
            "SELECT id, tenant_id, name, is_active FROM stores WHERE id = ?1",
        )
        .bind(store_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(store)
    }
}
