//! # Return Repository
//!
//! Database operations for sales returns and return items.
//!
//! `returned_totals` is the query behind the not-yet-returned ceiling: it
//! sums every restored quantity per sale item across *all* returns of a
//! sale, so callers can compute `max_returnable` before submitting.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use pharma_core::{ReturnItem, SalesReturn};

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SalesReturnRow {
    id: String,
    sale_id: String,
    receipt_number: String,
    reason: Option<String>,
    returned_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<SalesReturnRow> for SalesReturn {
    fn from(row: SalesReturnRow) -> Self {
        SalesReturn {
            id: row.id,
            sale_id: row.sale_id,
            receipt_number: row.receipt_number,
            reason: row.reason,
            returned_by: row.returned_by,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReturnItemRow {
    id: String,
    return_id: String,
    sale_item_id: String,
    product_id: String,
    batch_id: Option<String>,
    quantity: i64,
    created_at: DateTime<Utc>,
}

impl From<ReturnItemRow> for ReturnItem {
    fn from(row: ReturnItemRow) -> Self {
        ReturnItem {
            id: row.id,
            return_id: row.return_id,
            sale_item_id: row.sale_item_id,
            product_id: row.product_id,
            batch_id: row.batch_id,
            quantity: row.quantity,
            created_at: row.created_at,
        }
    }
}

const RETURN_COLUMNS: &str =
    "id, sale_id, receipt_number, reason, returned_by, created_at";

const RETURN_ITEM_COLUMNS: &str =
    "id, return_id, sale_item_id, product_id, batch_id, quantity, created_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for sales return database operations.
#[derive(Debug, Clone)]
pub struct ReturnRepository {
    pool: SqlitePool,
}

impl ReturnRepository {
    /// Creates a new ReturnRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReturnRepository { pool }
    }

    /// Inserts a sales return header.
    pub async fn insert_return(&self, sales_return: &SalesReturn) -> DbResult<()> {
        debug!(
            id = %sales_return.id,
            sale_id = %sales_return.sale_id,
            receipt_number = %sales_return.receipt_number,
            "Inserting sales return"
        );

        sqlx::query(
            "INSERT INTO sales_returns (id, sale_id, receipt_number, reason, returned_by, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&sales_return.id)
        .bind(&sales_return.sale_id)
        .bind(&sales_return.receipt_number)
        .bind(&sales_return.reason)
        .bind(&sales_return.returned_by)
        .bind(sales_return.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts one return item row.
    pub async fn insert_item(&self, item: &ReturnItem) -> DbResult<()> {
        debug!(
            return_id = %item.return_id,
            sale_item_id = %item.sale_item_id,
            batch_id = ?item.batch_id,
            quantity = %item.quantity,
            "Inserting return item"
        );

        sqlx::query(
            "INSERT INTO return_items (id, return_id, sale_item_id, product_id, batch_id, \
             quantity, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&item.id)
        .bind(&item.return_id)
        .bind(&item.sale_item_id)
        .bind(&item.product_id)
        .bind(&item.batch_id)
        .bind(item.quantity)
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All returns settled against one sale, oldest first.
    pub async fn returns_for_sale(&self, sale_id: &str) -> DbResult<Vec<SalesReturn>> {
        let sql = format!(
            "SELECT {RETURN_COLUMNS} FROM sales_returns \
             WHERE sale_id = ?1 ORDER BY created_at, id"
        );

        let rows: Vec<SalesReturnRow> = sqlx::query_as(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(SalesReturn::from).collect())
    }

    /// All items of one return.
    pub async fn items_for_return(&self, return_id: &str) -> DbResult<Vec<ReturnItem>> {
        let sql = format!(
            "SELECT {RETURN_ITEM_COLUMNS} FROM return_items \
             WHERE return_id = ?1 ORDER BY created_at, id"
        );

        let rows: Vec<ReturnItemRow> = sqlx::query_as(&sql)
            .bind(return_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ReturnItem::from).collect())
    }

    /// Total quantity already returned per sale item of one sale.
    ///
    /// Aggregates across all of the sale's returns; sale items with no
    /// returns are absent from the map.
    pub async fn returned_totals(&self, sale_id: &str) -> DbResult<HashMap<String, i64>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT ri.sale_item_id, SUM(ri.quantity) \
             FROM return_items ri \
             JOIN sales_returns sr ON sr.id = ri.return_id \
             WHERE sr.sale_id = ?1 \
             GROUP BY ri.sale_item_id",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }
}
