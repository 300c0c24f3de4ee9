//! # Sale Repository
//!
//! Sales, their line items, selections, extras and payments.
//!
//! ## Write Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  One sale = one transaction:                                            │
//! │                                                                         │
//! │    insert_sale                                                          │
//! │      insert_item ×N                                                     │
//! │        insert_selection ×M   insert_extra ×K                            │
//! │      insert_payment ×P                                                  │
//! │    (+ inventory writes, audit row)                  ── commit           │
//! │                                                                         │
//! │  Void never deletes: mark_void flips status and stamps the reason.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tally_core::{
    Payment, PaymentBreakdown, Sale, SaleItem, SaleItemExtra, SaleItemSelection, SaleStatus,
    VoidReasonCode,
};

const SALE_COLUMNS: &str = "id, tenant_id, store_id, folio, occurred_at, currency, status, \
     subtotal_cents, total_cents, client_sale_id, shift_id, user_id, points_awarded, notes, \
     void_reason_code, void_reason_text, void_note, voided_by, voided_at, client_void_id";

const BREAKDOWN_FOR_SHIFT_SQL: &str = "SELECT \
     COALESCE(SUM(CASE WHEN p.method = 'cash' THEN p.amount_cents ELSE 0 END), 0) \
       AS cash_cents, \
     COALESCE(SUM(CASE WHEN p.method = 'card' THEN p.amount_cents ELSE 0 END), 0) \
       AS card_cents, \
     COALESCE(SUM(CASE WHEN p.method = 'transfer' THEN p.amount_cents ELSE 0 END), 0) \
       AS transfer_cents, \
     COUNT(DISTINCT s.id) AS sale_count \
     FROM sales s JOIN payments p ON p.sale_id = s.id \
     WHERE s.tenant_id = ?1 AND s.shift_id = ?2 AND s.status = 'completed'";

/// Repository for sale persistence and lookups.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // =========================================================================
    // Transactional writes
    // =========================================================================

    /// Inserts the sale header row inside the caller's transaction.
    pub async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(sale_id = %sale.id, folio = %sale.folio, "Inserting sale");

        sqlx::query(
            "INSERT INTO sales (id, tenant_id, store_id, folio, occurred_at, currency, status, \
             subtotal_cents, total_cents, client_sale_id, shift_id, user_id, points_awarded, \
             notes, void_reason_code, void_reason_text, void_note, voided_by, voided_at, \
             client_void_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, \
             ?17, ?18, ?19, ?20)",
        )
        .bind(&sale.id)
        .bind(&sale.tenant_id)
        .bind(&sale.store_id)
        .bind(&sale.folio)
        .bind(sale.occurred_at)
        .bind(&sale.currency)
        .bind(sale.status)
        .bind(sale.subtotal_cents)
        .bind(sale.total_cents)
        .bind(&sale.client_sale_id)
        .bind(&sale.shift_id)
        .bind(&sale.user_id)
        .bind(sale.points_awarded)
        .bind(&sale.notes)
        .bind(sale.void_reason_code)
        .bind(&sale.void_reason_text)
        .bind(&sale.void_note)
        .bind(&sale.voided_by)
        .bind(sale.voided_at)
        .bind(&sale.client_void_id)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Inserts one line item.
    pub async fn insert_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO sale_items (id, sale_id, product_id, sku_snapshot, name_snapshot, \
             unit_price_cents, quantity, line_total_cents) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(&item.sku_snapshot)
        .bind(&item.name_snapshot)
        .bind(item.unit_price_cents)
        .bind(item.quantity)
        .bind(item.line_total_cents)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Inserts one customization selection snapshot.
    pub async fn insert_selection(
        conn: &mut SqliteConnection,
        selection: &SaleItemSelection,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO sale_item_selections (id, sale_item_id, option_item_id, \
             name_snapshot, price_delta_cents) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&selection.id)
        .bind(&selection.sale_item_id)
        .bind(&selection.option_item_id)
        .bind(&selection.name_snapshot)
        .bind(selection.price_delta_cents)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Inserts one extra-line snapshot.
    pub async fn insert_extra(conn: &mut SqliteConnection, extra: &SaleItemExtra) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO sale_item_extras (id, sale_item_id, extra_id, name_snapshot, \
             unit_price_cents, quantity) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&extra.id)
        .bind(&extra.sale_item_id)
        .bind(&extra.extra_id)
        .bind(&extra.name_snapshot)
        .bind(extra.unit_price_cents)
        .bind(extra.quantity)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Inserts one payment row.
    pub async fn insert_payment(conn: &mut SqliteConnection, payment: &Payment) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO payments (id, sale_id, method, amount_cents, reference, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&payment.id)
        .bind(&payment.sale_id)
        .bind(payment.method)
        .bind(payment.amount_cents)
        .bind(&payment.reference)
        .bind(payment.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Flips a completed sale to void and stamps the reason. The guard on
    /// `status = 'completed'` makes the flip race-safe: a second voider sees
    /// zero rows affected.
    #[allow(clippy::too_many_arguments)]
    pub async fn mark_void(
        conn: &mut SqliteConnection,
        sale_id: &str,
        reason_code: VoidReasonCode,
        reason_text: Option<&str>,
        note: Option<&str>,
        voided_by: &str,
        voided_at: DateTime<Utc>,
        client_void_id: Option<&str>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE sales SET status = 'void', void_reason_code = ?2, void_reason_text = ?3, \
             void_note = ?4, voided_by = ?5, voided_at = ?6, client_void_id = ?7 \
             WHERE id = ?1 AND status = 'completed'",
        )
        .bind(sale_id)
        .bind(reason_code)
        .bind(reason_text)
        .bind(note)
        .bind(voided_by)
        .bind(voided_at)
        .bind(client_void_id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Loads a sale by primary id.
    pub async fn get_by_id(&self, tenant_id: &str, sale_id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE tenant_id = ?1 AND id = ?2"
        ))
        .bind(tenant_id)
        .bind(sale_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Looks up a sale by its client idempotency key.
    pub async fn get_by_client_sale_id(
        &self,
        tenant_id: &str,
        client_sale_id: &str,
    ) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE tenant_id = ?1 AND client_sale_id = ?2"
        ))
        .bind(tenant_id)
        .bind(client_sale_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Loads the line items of a sale in insertion order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            "SELECT id, sale_id, product_id, sku_snapshot, name_snapshot, unit_price_cents, \
             quantity, line_total_cents \
             FROM sale_items WHERE sale_id = ?1 ORDER BY rowid",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Loads the extras attached to one line item.
    pub async fn get_item_extras(&self, sale_item_id: &str) -> DbResult<Vec<SaleItemExtra>> {
        let extras = sqlx::query_as::<_, SaleItemExtra>(
            "SELECT id, sale_item_id, extra_id, name_snapshot, unit_price_cents, quantity \
             FROM sale_item_extras WHERE sale_item_id = ?1 ORDER BY rowid",
        )
        .bind(sale_item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(extras)
    }

    /// Loads the payments of a sale in insertion order.
    pub async fn get_payments(&self, sale_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT id, sale_id, method, amount_cents, reference, created_at \
             FROM payments WHERE sale_id = ?1 ORDER BY rowid",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Per-method tender totals over a shift's completed sales. Void sales
    /// are excluded; an all-zero breakdown is a valid answer.
    pub async fn payment_breakdown_for_shift(
        &self,
        tenant_id: &str,
        shift_id: &str,
    ) -> DbResult<PaymentBreakdown> {
        let breakdown = sqlx::query_as::<_, PaymentBreakdown>(BREAKDOWN_FOR_SHIFT_SQL)
            .bind(tenant_id)
            .bind(shift_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(breakdown)
    }

    /// Same totals, computed inside the caller's transaction. A close must
    /// use this so the figures it records cover exactly the sales its
    /// guarded update settles; a sale committing concurrently lands either
    /// fully inside or fully outside the close.
    pub async fn breakdown_for_shift(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        shift_id: &str,
    ) -> DbResult<PaymentBreakdown> {
        let breakdown = sqlx::query_as::<_, PaymentBreakdown>(BREAKDOWN_FOR_SHIFT_SQL)
            .bind(tenant_id)
            .bind(shift_id)
            .fetch_one(conn)
            .await?;

        Ok(breakdown)
    }

    /// Lists completed sales posted into a shift, oldest first.
    pub async fn sales_for_shift(&self, tenant_id: &str, shift_id: &str) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE tenant_id = ?1 AND shift_id = ?2 AND status = 'completed' \
             ORDER BY occurred_at, id"
        ))
        .bind(tenant_id)
        .bind(shift_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }
}
