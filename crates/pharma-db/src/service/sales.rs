//! # Sale Service
//!
//! The sale and return settlement engine.
//!
//! ## Settlement Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Sale Settlement                                │
//! │                                                                     │
//! │  cart ──► fetch batches per product (expiry ascending)              │
//! │                │                                                    │
//! │                ▼                                                    │
//! │  plan_sale (pure): validate cart + FEFO per line                    │
//! │                │         any failure aborts BEFORE any write        │
//! │                ▼                                                    │
//! │  receipt number (sequential, timestamp fallback)                    │
//! │                │                                                    │
//! │                ▼                                                    │
//! │  INSERT sale ──► INSERT items (JSON ledger) ──► batch deltas        │
//! │                │                                                    │
//! │                ▼                                                    │
//! │  refresh cached sale list ──► return persisted sale                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Return settlement mirrors this: validate the request shape, persist
//! the return header and items, then replay each line's deduction ledger
//! additively onto batch stock.
//!
//! ## What this service does NOT check
//! The 2-day eligibility window and the not-yet-returned ceiling are
//! caller-side policy, exposed as pure functions
//! ([`pharma_core::returns::is_return_eligible`],
//! [`pharma_core::returns::max_returnable`]) and the
//! [`SaleService::returnable_quantities`] helper. The engine is
//! mechanically a reversal operation and trusts that callers gated it.
//!
//! ## Failure semantics
//! Any error aborts the operation and is returned as a typed
//! [`SettlementError`]; rows already written before the failing step are
//! not compensated (documented limitation). Batch deltas are applied last,
//! so the common failure mode leaves ledger rows without stock movement.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use pharma_core::returns::{
    max_returnable, plan_restock, validate_return_request, ReturnRequest,
};
use pharma_core::settlement::plan_sale;
use pharma_core::{
    new_id, receipt, AvailableBatch, CartItem, CoreError, PaymentMethod, Sale, SaleItem,
    SalesReturn, DEFAULT_RECEIPT_PREFIX,
};

/// How many recent sales the cached list holds.
const SALES_CACHE_LIMIT: u32 = 100;

// =============================================================================
// Error Type
// =============================================================================

/// Failures surfaced by settlement operations.
///
/// Business rule violations arrive as [`CoreError`]; anything the storage
/// layer failed at arrives as a persistence failure. Callers surface the
/// `Display` message to the end user and take no further action.
#[derive(Debug, Error)]
pub enum SettlementError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] DbError),
}

// =============================================================================
// Read Model
// =============================================================================

/// A sale with its line items and returns, as shown to callers.
#[derive(Debug, Clone)]
pub struct SaleRecord {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub returns: Vec<SalesReturn>,
}

// =============================================================================
// Sale Service
// =============================================================================

/// The settlement engine and sale list state container.
///
/// Holds a read-through cache of recent sales, invalidated by
/// [`SaleService::refresh`] after every settlement. Read failures during
/// the non-critical refresh degrade to an empty list plus a stored error
/// message rather than failing the settlement.
#[derive(Debug)]
pub struct SaleService {
    db: Database,
    receipt_prefix: String,
    cache: RwLock<Option<Vec<SaleRecord>>>,
    last_error: RwLock<Option<String>>,
}

impl SaleService {
    /// Creates a service with the default receipt prefix.
    pub fn new(db: Database) -> Self {
        Self::with_prefix(db, DEFAULT_RECEIPT_PREFIX)
    }

    /// Creates a service with a custom receipt prefix.
    ///
    /// The prefix is configuration, not domain logic; stores running
    /// multiple tills give each its own.
    pub fn with_prefix(db: Database, receipt_prefix: impl Into<String>) -> Self {
        SaleService {
            db,
            receipt_prefix: receipt_prefix.into(),
            cache: RwLock::new(None),
            last_error: RwLock::new(None),
        }
    }

    // =========================================================================
    // Sale Settlement
    // =========================================================================

    /// Settles a cart into a persisted sale with FEFO stock deductions.
    ///
    /// The whole cart is validated and planned before the first write; an
    /// allocation failure on any line aborts the entire sale. The sale
    /// total is the sum of caller-supplied line totals.
    pub async fn settle_sale(
        &self,
        cart: &[CartItem],
        payment_method: PaymentMethod,
        discount_cents: i64,
        cashier_id: Option<&str>,
    ) -> Result<SaleRecord, SettlementError> {
        debug!(lines = cart.len(), "Settling sale");

        // Snapshot available batches per product, expiry ascending.
        let mut stock: HashMap<String, Vec<AvailableBatch>> = HashMap::new();
        for item in cart {
            if item.product_id.is_empty() || stock.contains_key(&item.product_id) {
                continue;
            }
            let batches = self.db.batches().available_for_product(&item.product_id).await?;
            stock.insert(
                item.product_id.clone(),
                batches.iter().map(AvailableBatch::from).collect(),
            );
        }

        // Pure planning phase: validate-all-before-write.
        let plan = plan_sale(cart, |product_id| {
            stock.get(product_id).cloned().unwrap_or_default()
        })?;

        let now = Utc::now();
        let receipt_number = self.next_receipt_number().await;

        let sale = Sale {
            id: new_id(),
            receipt_number,
            total_cents: plan.total_cents(),
            discount_cents,
            payment_method,
            cashier_id: cashier_id.map(str::to_string),
            created_at: now,
        };

        self.db.sales().insert_sale(&sale).await?;

        let mut items = Vec::with_capacity(plan.lines.len());
        for line in &plan.lines {
            let item = SaleItem {
                id: new_id(),
                sale_id: sale.id.clone(),
                product_id: line.item.product_id.clone(),
                product_name: line.item.product_name.clone(),
                quantity: line.item.quantity,
                unit_price_cents: line.item.unit_price_cents,
                line_total_cents: line.item.line_total_cents,
                deductions: line.deductions.clone(),
                created_at: now,
            };
            self.db.sales().insert_item(&item).await?;
            items.push(item);
        }

        // One combined decrement per touched batch.
        for (batch_id, quantity) in plan.batch_deltas() {
            self.db.batches().apply_delta(&batch_id, -quantity).await?;
        }

        info!(
            sale_id = %sale.id,
            receipt_number = %sale.receipt_number,
            total = %sale.total(),
            lines = items.len(),
            "Sale settled"
        );

        self.refresh().await;

        Ok(SaleRecord {
            sale,
            items,
            returns: Vec::new(),
        })
    }

    /// Next sale receipt number, degrading to a timestamp-derived one when
    /// numbering state is unreadable.
    async fn next_receipt_number(&self) -> String {
        match self.db.sales().last_receipt_number(&self.receipt_prefix).await {
            Ok(last) => receipt::next_sale_receipt(&self.receipt_prefix, last.as_deref()),
            Err(e) => {
                warn!(error = %e, "Receipt lookup failed, using timestamp fallback");
                receipt::fallback_receipt(&self.receipt_prefix, Utc::now())
            }
        }
    }

    // =========================================================================
    // Return Settlement
    // =========================================================================

    /// Settles a return against a prior sale, restoring batch stock by
    /// replaying each line's deduction ledger in its original order.
    ///
    /// Lines without a ledger restore unattributed (`batch_id = NULL`) and
    /// adjust no batch quantity. Eligibility window and return ceiling are
    /// the caller's responsibility (see module docs).
    pub async fn settle_return(
        &self,
        request: &ReturnRequest,
    ) -> Result<SalesReturn, SettlementError> {
        validate_return_request(request)?;

        debug!(sale_id = %request.sale_id, lines = request.items.len(), "Settling return");

        let now = Utc::now();

        let sales_return = SalesReturn {
            id: new_id(),
            sale_id: request.sale_id.clone(),
            receipt_number: receipt::return_receipt(now),
            reason: request.reason.clone(),
            returned_by: request.returned_by.clone(),
            created_at: now,
        };

        self.db.returns().insert_return(&sales_return).await?;

        // Running map: restores to the same batch across lines accumulate
        // into a single write.
        let mut restocks: BTreeMap<String, i64> = BTreeMap::new();

        for item in &request.items {
            for entry in plan_restock(&item.deductions, item.quantity) {
                let return_item = pharma_core::ReturnItem {
                    id: new_id(),
                    return_id: sales_return.id.clone(),
                    sale_item_id: item.sale_item_id.clone(),
                    product_id: item.product_id.clone(),
                    batch_id: entry.batch_id.clone(),
                    quantity: entry.quantity,
                    created_at: now,
                };
                self.db.returns().insert_item(&return_item).await?;

                if let Some(batch_id) = entry.batch_id {
                    *restocks.entry(batch_id).or_insert(0) += entry.quantity;
                }
            }
        }

        // One combined increment per touched batch - inverse of settlement.
        for (batch_id, quantity) in restocks {
            self.db.batches().apply_delta(&batch_id, quantity).await?;
        }

        info!(
            return_id = %sales_return.id,
            sale_id = %sales_return.sale_id,
            receipt_number = %sales_return.receipt_number,
            "Return settled"
        );

        self.refresh().await;

        Ok(sales_return)
    }

    /// Remaining returnable quantity per sale item of one sale.
    ///
    /// Convenience for the caller-side ceiling check: original quantity
    /// minus everything already returned, per line.
    pub async fn returnable_quantities(&self, sale_id: &str) -> DbResult<HashMap<String, i64>> {
        let items = self.db.sales().items_for_sale(sale_id).await?;
        let returned = self.db.returns().returned_totals(sale_id).await?;

        Ok(items
            .into_iter()
            .map(|item| {
                let already = returned.get(&item.id).copied().unwrap_or(0);
                (item.id, max_returnable(item.quantity, already))
            })
            .collect())
    }

    // =========================================================================
    // Sale List (read-through cache)
    // =========================================================================

    /// The caller-visible sale list.
    ///
    /// Loads on first access, then serves the cache until [`refresh`]
    /// invalidates it. A failed load degrades to an empty list; the error
    /// is kept for [`last_error`] rather than propagated.
    ///
    /// [`refresh`]: SaleService::refresh
    /// [`last_error`]: SaleService::last_error
    pub async fn sales(&self) -> Vec<SaleRecord> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            return cached.clone();
        }
        self.refresh().await;
        self.cache.read().await.clone().unwrap_or_default()
    }

    /// Reloads the cached sale list from storage.
    ///
    /// Non-critical: failures leave an empty list and a stored error
    /// message instead of propagating.
    pub async fn refresh(&self) {
        match self.load_sales().await {
            Ok(records) => {
                *self.cache.write().await = Some(records);
                *self.last_error.write().await = None;
            }
            Err(e) => {
                warn!(error = %e, "Sale list refresh failed");
                *self.cache.write().await = Some(Vec::new());
                *self.last_error.write().await = Some(e.to_string());
            }
        }
    }

    /// The error from the most recent failed refresh, if any.
    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    /// Looks a sale up by receipt number, with items and returns.
    ///
    /// `Ok(None)` means the receipt doesn't exist - a lookup miss, not a
    /// failure.
    pub async fn find_by_receipt(&self, receipt_number: &str) -> DbResult<Option<SaleRecord>> {
        let Some(sale) = self.db.sales().find_by_receipt(receipt_number).await? else {
            return Ok(None);
        };
        Ok(Some(self.assemble(sale).await?))
    }

    async fn load_sales(&self) -> DbResult<Vec<SaleRecord>> {
        let sales = self.db.sales().list_recent(SALES_CACHE_LIMIT).await?;

        let mut records = Vec::with_capacity(sales.len());
        for sale in sales {
            records.push(self.assemble(sale).await?);
        }
        Ok(records)
    }

    async fn assemble(&self, sale: Sale) -> DbResult<SaleRecord> {
        let items = self.db.sales().items_for_sale(&sale.id).await?;
        let returns = self.db.returns().returns_for_sale(&sale.id).await?;
        Ok(SaleRecord {
            sale,
            items,
            returns,
        })
    }
}
