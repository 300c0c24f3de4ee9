//! # Catalog Repository
//!
//! Read-only access to products, extras, customization options and
//! store-level availability overrides.
//!
//! Catalog CRUD lives in the admin console backend; the core only ever
//! bulk-loads **active** rows while pricing a sale. A missing or inactive
//! reference fails the whole sale upstream - there are no partial loads.

use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tally_core::{Extra, ItemKey, ItemKind, OptionItem, Product, StoreOverrideState};

/// Repository for catalog reads.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

#[derive(Debug, sqlx::FromRow)]
struct OverrideRow {
    item_kind: ItemKind,
    item_id: String,
    state: StoreOverrideState,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Bulk-loads active products by id.
    ///
    /// Returns only the rows that exist and are active; the caller compares
    /// against the requested id set and fails the request on any miss.
    pub async fn products_by_ids(
        &self,
        tenant_id: &str,
        ids: &[String],
    ) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = ids.len(), "Loading products");

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT id, tenant_id, sku, name, price_cents, track_inventory, \
             is_available, is_enabled, is_active \
             FROM products WHERE is_active = 1 AND tenant_id = ",
        );
        query.push_bind(tenant_id);
        query.push(" AND id IN (");
        {
            let mut separated = query.separated(", ");
            for id in ids {
                separated.push_bind(id);
            }
        }
        query.push(")");

        Ok(query
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?)
    }

    /// Bulk-loads active extras by id.
    pub async fn extras_by_ids(&self, tenant_id: &str, ids: &[String]) -> DbResult<Vec<Extra>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT id, tenant_id, name, price_cents, track_inventory, \
             is_available, is_enabled, is_active \
             FROM extras WHERE is_active = 1 AND tenant_id = ",
        );
        query.push_bind(tenant_id);
        query.push(" AND id IN (");
        {
            let mut separated = query.separated(", ");
            for id in ids {
                separated.push_bind(id);
            }
        }
        query.push(")");

        Ok(query
            .build_query_as::<Extra>()
            .fetch_all(&self.pool)
            .await?)
    }

    /// Bulk-loads active customization options by id.
    pub async fn option_items_by_ids(
        &self,
        tenant_id: &str,
        ids: &[String],
    ) -> DbResult<Vec<OptionItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT id, tenant_id, name, price_delta_cents, is_active \
             FROM option_items WHERE is_active = 1 AND tenant_id = ",
        );
        query.push_bind(tenant_id);
        query.push(" AND id IN (");
        {
            let mut separated = query.separated(", ");
            for id in ids {
                separated.push_bind(id);
            }
        }
        query.push(")");

        Ok(query
            .build_query_as::<OptionItem>()
            .fetch_all(&self.pool)
            .await?)
    }

    /// Loads every availability override for a store, keyed for O(1) lookup
    /// while gating sale lines. An absent key means "no override".
    pub async fn overrides_for_store(
        &self,
        store_id: &str,
    ) -> DbResult<HashMap<ItemKey, StoreOverrideState>> {
        let rows: Vec<OverrideRow> = sqlx::query_as(
            "SELECT item_kind, item_id, state FROM store_item_overrides WHERE store_id = ?1",
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (ItemKey::new(row.item_kind, row.item_id), row.state))
            .collect())
    }
}
