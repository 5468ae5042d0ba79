//! # Sale Repository
//!
//! Database operations for sales and sale line items.
//!
//! Each line item row carries its FEFO deduction ledger as a JSON array in
//! `batch_deductions`. The ledger is written once at settlement time and
//! replayed by the return flow; it is never updated.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use pharma_core::{BatchDeduction, PaymentMethod, Sale, SaleItem};

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    receipt_number: String,
    total_cents: i64,
    discount_cents: i64,
    payment_method: PaymentMethod,
    cashier_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<SaleRow> for Sale {
    fn from(row: SaleRow) -> Self {
        Sale {
            id: row.id,
            receipt_number: row.receipt_number,
            total_cents: row.total_cents,
            discount_cents: row.discount_cents,
            payment_method: row.payment_method,
            cashier_id: row.cashier_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SaleItemRow {
    id: String,
    sale_id: String,
    product_id: String,
    product_name: String,
    quantity: i64,
    unit_price_cents: i64,
    line_total_cents: i64,
    batch_deductions: String,
    created_at: DateTime<Utc>,
}

impl SaleItemRow {
    /// Decodes the JSON ledger column into domain deductions.
    fn into_item(self) -> DbResult<SaleItem> {
        let deductions: Vec<BatchDeduction> = serde_json::from_str(&self.batch_deductions)
            .map_err(|e| DbError::CorruptLedger {
                sale_item_id: self.id.clone(),
                message: e.to_string(),
            })?;

        Ok(SaleItem {
            id: self.id,
            sale_id: self.sale_id,
            product_id: self.product_id,
            product_name: self.product_name,
            quantity: self.quantity,
            unit_price_cents: self.unit_price_cents,
            line_total_cents: self.line_total_cents,
            deductions,
            created_at: self.created_at,
        })
    }
}

const SALE_COLUMNS: &str =
    "id, receipt_number, total_cents, discount_cents, payment_method, cashier_id, created_at";

const SALE_ITEM_COLUMNS: &str = "id, sale_id, product_id, product_name, quantity, \
     unit_price_cents, line_total_cents, batch_deductions, created_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Inserts a settled sale.
    pub async fn insert_sale(&self, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, receipt_number = %sale.receipt_number, "Inserting sale");

        sqlx::query(
            "INSERT INTO sales (id, receipt_number, total_cents, discount_cents, \
             payment_method, cashier_id, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&sale.id)
        .bind(&sale.receipt_number)
        .bind(sale.total_cents)
        .bind(sale.discount_cents)
        .bind(sale.payment_method)
        .bind(&sale.cashier_id)
        .bind(sale.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a sale line item with its deduction ledger.
    pub async fn insert_item(&self, item: &SaleItem) -> DbResult<()> {
        debug!(sale_id = %item.sale_id, product_id = %item.product_id, "Inserting sale item");

        let ledger = serde_json::to_string(&item.deductions)
            .map_err(|e| DbError::Internal(e.to_string()))?;

        sqlx::query(
            "INSERT INTO sale_items (id, sale_id, product_id, product_name, quantity, \
             unit_price_cents, line_total_cents, batch_deductions, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.line_total_cents)
        .bind(&ledger)
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");

        let row: Option<SaleRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Sale::from))
    }

    /// Looks a sale up by its receipt number.
    ///
    /// `None` means the receipt doesn't exist; that is a lookup miss, not
    /// an error.
    pub async fn find_by_receipt(&self, receipt_number: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE receipt_number = ?1");

        let row: Option<SaleRow> = sqlx::query_as(&sql)
            .bind(receipt_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Sale::from))
    }

    /// All line items of one sale, in insertion order.
    pub async fn items_for_sale(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let sql = format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items \
             WHERE sale_id = ?1 ORDER BY created_at, id"
        );

        let rows: Vec<SaleItemRow> = sqlx::query_as(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(SaleItemRow::into_item).collect()
    }

    /// Most recent sales, newest first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC, id DESC LIMIT ?1"
        );

        let rows: Vec<SaleRow> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Sale::from).collect())
    }

    /// The most recent receipt number for a prefix, if any.
    ///
    /// Feeds sequential receipt numbering; the match is on the
    /// `PREFIX-` shape, ordered by creation time descending.
    pub async fn last_receipt_number(&self, prefix: &str) -> DbResult<Option<String>> {
        let pattern = format!("{prefix}-%");

        let receipt: Option<String> = sqlx::query_scalar(
            "SELECT receipt_number FROM sales \
             WHERE receipt_number LIKE ?1 \
             ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(&pattern)
        .fetch_optional(&self.pool)
        .await?;

        Ok(receipt)
    }

    /// Counts all sales (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
