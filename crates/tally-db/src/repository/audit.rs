//! # Audit Repository
//!
//! Append-only audit log of structured before/after records. Rows are
//! written inside the same transaction as the mutation they describe, so an
//! audit entry exists iff the change committed.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::error::DbResult;

/// One structured audit record, serialized into the `detail` JSON column.
#[derive(Debug, Clone)]
pub struct AuditEntry<'a> {
    pub tenant_id: &'a str,
    pub store_id: Option<&'a str>,
    /// e.g. "sale.created", "sale.voided", "shift.closed", "inventory.set"
    pub action: &'a str,
    pub entity_kind: &'a str,
    pub entity_id: &'a str,
    pub actor_id: &'a str,
    pub detail: serde_json::Value,
    pub at: DateTime<Utc>,
}

/// A persisted audit row, as read back for display.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuditRow {
    pub id: String,
    pub action: String,
    pub entity_kind: String,
    pub entity_id: String,
    pub actor_id: String,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

/// Repository for the audit log.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    /// Creates a new AuditRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AuditRepository { pool }
    }

    /// Appends an audit row inside the caller's transaction.
    pub async fn append(conn: &mut SqliteConnection, entry: &AuditEntry<'_>) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO audit_log (id, tenant_id, store_id, action, entity_kind, \
             entity_id, actor_id, detail, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(entry.tenant_id)
        .bind(entry.store_id)
        .bind(entry.action)
        .bind(entry.entity_kind)
        .bind(entry.entity_id)
        .bind(entry.actor_id)
        .bind(entry.detail.to_string())
        .bind(entry.at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Lists the trail for one entity, newest first.
    pub async fn for_entity(
        &self,
        entity_kind: &str,
        entity_id: &str,
        limit: i64,
    ) -> DbResult<Vec<AuditRow>> {
        let rows = sqlx::query_as::<_, AuditRow>(
            "SELECT id, action, entity_kind, entity_id, actor_id, detail, created_at \
             FROM audit_log WHERE entity_kind = ?1 AND entity_id = ?2 \
             ORDER BY created_at DESC LIMIT ?3",
        )
        .bind(entity_kind)
        .bind(entity_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
