//! # Domain Types
//!
//! Core domain types used throughout Pharma POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  ┌──────────────┐    ┌──────────────────┐    ┌──────────────────┐   │
//! │  │   Product    │───►│   StockBatch     │    │      Sale        │   │
//! │  │ ───────────  │ 1:n│ ───────────────  │    │ ───────────────  │   │
//! │  │ id (UUID)    │    │ batch_number     │    │ receipt_number   │   │
//! │  │ name         │    │ quantity         │    │ total_cents      │   │
//! │  │ barcode?     │    │ expiry_date      │    │ payment_method   │   │
//! │  │ salt?        │    │ prices (cents)   │    └────────┬─────────┘   │
//! │  └──────────────┘    └──────────────────┘         1:n │             │
//! │                                                       ▼             │
//! │  ┌──────────────┐    ┌──────────────────┐    ┌──────────────────┐   │
//! │  │ SalesReturn  │◄───│    SaleItem      │◄───│  BatchDeduction  │   │
//! │  │ ───────────  │    │ ───────────────  │ own│ ───────────────  │   │
//! │  │ receipt (RET)│    │ product snapshot │    │ batch_id         │   │
//! │  │ reason       │    │ quantity, price  │    │ quantity         │   │
//! │  └──────┬───────┘    │ deduction ledger │    │ expiry_date      │   │
//! │     1:n │            └──────────────────┘    └──────────────────┘   │
//! │         ▼                                                           │
//! │  ┌──────────────┐                                                   │
//! │  │  ReturnItem  │  references SaleItem + (nullable) StockBatch      │
//! │  └──────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every transactional entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (receipt_number) - human-readable, printed on receipts

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

/// Generates a new UUID v4 entity id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Product
// =============================================================================

/// A pharmacy catalog product.
///
/// Identity is immutable; descriptive fields are owned by catalog
/// management. Stock lives in [`StockBatch`], never on the product itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to the cashier and on receipts.
    pub name: String,

    /// Barcode (EAN-13, UPC-A, etc.), if the package carries one.
    pub barcode: Option<String>,

    /// Active-ingredient formula, e.g. "Paracetamol 500mg".
    pub salt_formula: Option<String>,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Stock Batch
// =============================================================================

/// A discrete inbound stock lot with its own expiry and cost.
///
/// Belongs to exactly one [`Product`]. Remaining quantity never goes
/// negative: allocation checks availability before any deduction plan is
/// produced, and the storage layer guards the write as well.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockBatch {
    pub id: String,
    pub product_id: String,
    /// Supplier batch/lot number printed on the package.
    pub batch_number: String,
    /// Remaining units in this batch.
    pub quantity: i64,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    pub expiry_date: NaiveDate,
    pub purchase_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockBatch {
    /// Returns the selling price as Money.
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    /// Returns the cost price as Money.
    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }
}

/// A batch as seen by the FEFO allocator.
///
/// This is the defensive view of whatever the batch collaborator returned:
/// quantity and batch number may be absent on degraded data and are treated
/// as `0` / `""` rather than failing the whole allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableBatch {
    pub id: String,
    pub batch_number: Option<String>,
    pub quantity: Option<i64>,
    pub expiry_date: Option<NaiveDate>,
}

impl AvailableBatch {
    /// Units available for allocation; missing quantity counts as zero.
    #[inline]
    pub fn units(&self) -> i64 {
        self.quantity.unwrap_or(0).max(0)
    }
}

impl From<&StockBatch> for AvailableBatch {
    fn from(batch: &StockBatch) -> Self {
        AvailableBatch {
            id: batch.id.clone(),
            batch_number: Some(batch.batch_number.clone()),
            quantity: Some(batch.quantity),
            expiry_date: Some(batch.expiry_date),
        }
    }
}

// =============================================================================
// Batch Deduction Ledger
// =============================================================================

/// One slice of a sale line's quantity, sourced from a specific batch.
///
/// A [`SaleItem`] owns an ordered sequence of these, summing to the line's
/// quantity. The sequence is the sole ledger the return flow replays to
/// know which batches to restore and in what proportions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDeduction {
    pub batch_id: String,
    pub batch_number: String,
    pub quantity: i64,
    pub expiry_date: Option<NaiveDate>,
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on external terminal.
    Card,
    /// Mobile wallet transfer (JazzCash, Easypaisa, ...).
    MobileWallet,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A settled sale transaction.
///
/// Created once at settlement time; immutable thereafter except for the
/// derived returns association.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    /// Human-readable receipt number, unique per store (`INV-00042`).
    pub receipt_number: String,
    pub total_cents: i64,
    pub discount_cents: i64,
    pub payment_method: PaymentMethod,
    /// Caller identity attributed by the identity collaborator; nullable.
    pub cashier_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the sale total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
///
/// Uses the snapshot pattern: `product_name` is frozen at sale time so the
/// sale history survives later product renames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
    /// Ordered FEFO deduction ledger; quantities sum to `quantity`.
    pub deductions: Vec<BatchDeduction>,
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }

    /// Sum of the deduction ledger quantities.
    pub fn deducted_quantity(&self) -> i64 {
        self.deductions.iter().map(|d| d.quantity).sum()
    }
}

// =============================================================================
// Sales Return
// =============================================================================

/// A return transaction against one sale.
///
/// A sale may accumulate several of these over multiple visits (partial
/// returns); each carries its own receipt number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesReturn {
    pub id: String,
    pub sale_id: String,
    /// Return receipt number (`RET-20260806123456`).
    pub receipt_number: String,
    pub reason: Option<String>,
    /// Caller identity attributed by the identity collaborator; nullable.
    pub returned_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One restored quantity within a [`SalesReturn`].
///
/// References the original sale item and, when the deduction ledger was
/// available, the specific batch the quantity went back into. A `None`
/// batch means "restored without batch attribution" (legacy data path).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnItem {
    pub id: String,
    pub return_id: String,
    pub sale_item_id: String,
    pub product_id: String,
    pub batch_id: Option<String>,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Cart Item (transient)
// =============================================================================

/// A requested line in a cart, as submitted for settlement.
///
/// Not persisted. `available_stock` is a display-only snapshot the UI
/// showed the cashier; allocation always re-reads batches from the
/// collaborator and never trusts this number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// Caller-computed line total; settlement sums these, it does not
    /// recompute unit price × quantity.
    pub line_total_cents: i64,
    pub available_stock: Option<i64>,
}

impl CartItem {
    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_batch_units_defaults_missing_to_zero() {
        let batch = AvailableBatch {
            id: "b1".to_string(),
            batch_number: None,
            quantity: None,
            expiry_date: None,
        };
        assert_eq!(batch.units(), 0);
    }

    #[test]
    fn test_available_batch_units_clamps_negative() {
        let batch = AvailableBatch {
            id: "b1".to_string(),
            batch_number: Some("BN-1".to_string()),
            quantity: Some(-4),
            expiry_date: None,
        };
        assert_eq!(batch.units(), 0);
    }

    #[test]
    fn test_payment_method_default() {
        assert_eq!(PaymentMethod::default(), PaymentMethod::Cash);
    }

    #[test]
    fn test_deduction_ledger_round_trips_as_json() {
        let ledger = vec![BatchDeduction {
            batch_id: "b1".to_string(),
            batch_number: "BN-1".to_string(),
            quantity: 3,
            expiry_date: NaiveDate::from_ymd_opt(2025, 1, 1),
        }];
        let json = serde_json::to_string(&ledger).unwrap();
        let back: Vec<BatchDeduction> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ledger);
    }
}
