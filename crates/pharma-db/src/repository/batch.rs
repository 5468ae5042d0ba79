//! # Batch Repository
//!
//! Database operations for batch-tracked stock.
//!
//! Two operations matter to settlement:
//!
//! - [`BatchRepository::available_for_product`] - the read contract the
//!   FEFO allocator depends on: batches with quantity > 0, ordered by
//!   expiry ascending.
//! - [`BatchRepository::apply_delta`] - a guarded *relative* quantity
//!   update. Writing `quantity = quantity + δ` instead of an absolute
//!   value means two settlements touching the same batch compose instead
//!   of overwriting each other; the non-negative guard turns a racing
//!   drain into a typed conflict instead of negative stock.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use pharma_core::validation::{validate_batch_number, validate_price_cents, validate_quantity};
use pharma_core::StockBatch;

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct BatchRow {
    id: String,
    product_id: String,
    batch_number: String,
    quantity: i64,
    cost_price_cents: i64,
    selling_price_cents: i64,
    expiry_date: NaiveDate,
    purchase_date: NaiveDate,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BatchRow> for StockBatch {
    fn from(row: BatchRow) -> Self {
        StockBatch {
            id: row.id,
            product_id: row.product_id,
            batch_number: row.batch_number,
            quantity: row.quantity,
            cost_price_cents: row.cost_price_cents,
            selling_price_cents: row.selling_price_cents,
            expiry_date: row.expiry_date,
            purchase_date: row.purchase_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const BATCH_COLUMNS: &str = "id, product_id, batch_number, quantity, cost_price_cents, \
     selling_price_cents, expiry_date, purchase_date, created_at, updated_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for stock batch database operations.
#[derive(Debug, Clone)]
pub struct BatchRepository {
    pool: SqlitePool,
}

impl BatchRepository {
    /// Creates a new BatchRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BatchRepository { pool }
    }

    /// Inserts a new stock batch (inbound stock).
    pub async fn insert(&self, batch: &StockBatch) -> DbResult<()> {
        validate_batch_number(&batch.batch_number)?;
        validate_quantity(batch.quantity)?;
        validate_price_cents(batch.cost_price_cents)?;
        validate_price_cents(batch.selling_price_cents)?;

        debug!(
            id = %batch.id,
            product_id = %batch.product_id,
            batch_number = %batch.batch_number,
            "Inserting stock batch"
        );

        sqlx::query(
            "INSERT INTO stock_batches (id, product_id, batch_number, quantity, \
             cost_price_cents, selling_price_cents, expiry_date, purchase_date, \
             created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&batch.id)
        .bind(&batch.product_id)
        .bind(&batch.batch_number)
        .bind(batch.quantity)
        .bind(batch.cost_price_cents)
        .bind(batch.selling_price_cents)
        .bind(batch.expiry_date)
        .bind(batch.purchase_date)
        .bind(batch.created_at)
        .bind(batch.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a batch by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StockBatch>> {
        let sql = format!("SELECT {BATCH_COLUMNS} FROM stock_batches WHERE id = ?1");

        let row: Option<BatchRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(StockBatch::from))
    }

    /// Batches of one product available for sale.
    ///
    /// The FEFO read contract: quantity > 0, ordered by expiry ascending.
    /// The allocator trusts this ordering and does not re-sort.
    pub async fn available_for_product(&self, product_id: &str) -> DbResult<Vec<StockBatch>> {
        let sql = format!(
            "SELECT {BATCH_COLUMNS} FROM stock_batches \
             WHERE product_id = ?1 AND quantity > 0 \
             ORDER BY expiry_date ASC, created_at ASC"
        );

        let rows: Vec<BatchRow> = sqlx::query_as(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(StockBatch::from).collect())
    }

    /// Point-reads current quantities for a set of batch ids.
    ///
    /// One round trip regardless of how many batches a settlement touched.
    pub async fn quantities(&self, ids: &[String]) -> DbResult<HashMap<String, i64>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = (1..=ids.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql =
            format!("SELECT id, quantity FROM stock_batches WHERE id IN ({placeholders})");

        let mut query = sqlx::query_as::<_, (String, i64)>(&sql);
        for id in ids {
            query = query.bind(id);
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().collect())
    }

    /// Applies a relative quantity change to one batch.
    ///
    /// Negative deltas deduct (sale), positive deltas restore (return).
    /// The update is conditional: it refuses to drive the quantity below
    /// zero and reports [`DbError::StockConflict`] instead, which only
    /// happens when a concurrent writer drained the batch after the
    /// allocation read.
    pub async fn apply_delta(&self, batch_id: &str, delta: i64) -> DbResult<()> {
        debug!(batch_id = %batch_id, delta = %delta, "Applying stock delta");

        let result = sqlx::query(
            "UPDATE stock_batches \
             SET quantity = quantity + ?2, updated_at = ?3 \
             WHERE id = ?1 AND quantity + ?2 >= 0",
        )
        .bind(batch_id)
        .bind(delta)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Distinguish a missing batch from a refused decrement.
            let exists: Option<i64> =
                sqlx::query_scalar("SELECT 1 FROM stock_batches WHERE id = ?1")
                    .bind(batch_id)
                    .fetch_optional(&self.pool)
                    .await?;

            return Err(match exists {
                Some(_) => DbError::StockConflict {
                    batch_id: batch_id.to_string(),
                    delta,
                },
                None => DbError::not_found("StockBatch", batch_id),
            });
        }

        Ok(())
    }

    /// Counts batches with remaining stock (for diagnostics).
    pub async fn count_in_stock(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM stock_batches WHERE quantity > 0")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
