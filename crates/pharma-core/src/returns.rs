//! # Return Policy & Reversal Planning
//!
//! The return flow splits policy from mechanism:
//!
//! - **Policy** (this module, pure): the time-boxed eligibility window and
//!   the not-yet-returned ceiling. Both are enforced by the *caller*
//!   before settlement is invoked; the settlement engine itself is
//!   mechanically a reversal operation and does not re-validate them.
//! - **Mechanism** (also here, pure): [`plan_restock`] replays a sale
//!   line's deduction ledger to decide which batches receive stock back.
//!
//! The storage half of return settlement lives in pharma-db.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::BatchDeduction;
use crate::validation::{validate_quantity, validate_uuid};
use crate::RETURN_WINDOW_DAYS;

// =============================================================================
// Request Types
// =============================================================================

/// A return request as submitted by the caller.
///
/// Tagged record shape, validated at the boundary by
/// [`validate_return_request`] before any persistence happens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnRequest {
    /// Sale the return settles against.
    pub sale_id: String,
    pub reason: Option<String>,
    /// Caller identity attributed by the identity collaborator; nullable.
    pub returned_by: Option<String>,
    pub items: Vec<ReturnRequestItem>,
}

/// One requested return line.
///
/// Carries the original sale line's deduction ledger; an empty ledger
/// (legacy data) triggers the unattributed restore fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnRequestItem {
    pub sale_item_id: String,
    pub product_id: String,
    /// Quantity to restore; the caller has already checked it against
    /// [`max_returnable`].
    pub quantity: i64,
    /// The original sale line's FEFO ledger, in its original order.
    pub deductions: Vec<BatchDeduction>,
}

/// One planned stock restoration.
///
/// `batch_id` is `None` when the quantity is restored without batch
/// attribution (no ledger available) - such entries produce a return item
/// row but adjust no batch quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestockEntry {
    pub batch_id: Option<String>,
    pub quantity: i64,
}

// =============================================================================
// Policy Predicates
// =============================================================================

/// Whether a sale is still inside the return window.
///
/// True iff no more than [`RETURN_WINDOW_DAYS`] (48 hours, exact) have
/// elapsed: eligible at exactly 2 days, ineligible one second later.
/// A sale timestamped in the future (clock skew) is treated as eligible.
///
/// Enforced by the caller before invoking return settlement; the engine
/// does not re-check it.
pub fn is_return_eligible(sale_created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(sale_created_at) <= Duration::days(RETURN_WINDOW_DAYS)
}

/// Quantity of a sale item still open for return.
///
/// `original_quantity` minus everything already returned across all prior
/// returns of the sale, floored at zero. Callers must reject any request
/// exceeding this ceiling before invoking settlement.
pub fn max_returnable(original_quantity: i64, already_returned: i64) -> i64 {
    (original_quantity - already_returned).max(0)
}

// =============================================================================
// Request Validation
// =============================================================================

/// Validates the structural shape of a return request.
///
/// ## Errors
/// [`CoreError::InvalidReturnRequest`] when the sale identity is absent or
/// malformed, the item list is empty, or any line has a non-positive
/// quantity or missing sale item reference.
pub fn validate_return_request(request: &ReturnRequest) -> CoreResult<()> {
    if request.sale_id.trim().is_empty() {
        return Err(CoreError::invalid_return("missing sale id"));
    }
    validate_uuid(&request.sale_id)
        .map_err(|e| CoreError::invalid_return(format!("sale id: {e}")))?;

    if request.items.is_empty() {
        return Err(CoreError::invalid_return("no items to return"));
    }

    for item in &request.items {
        if item.sale_item_id.trim().is_empty() {
            return Err(CoreError::invalid_return("missing sale item id"));
        }
        validate_quantity(item.quantity)
            .map_err(|e| CoreError::invalid_return(e.to_string()))?;
    }

    Ok(())
}

// =============================================================================
// Restock Planning
// =============================================================================

/// Plans which batches a returned quantity goes back into.
///
/// Walks the sale line's deduction ledger in its original order, restoring
/// up to each deduction's quantity until the requested quantity is
/// exhausted. This mirrors the sale's consumption order (the batch the
/// sale drew from first is restored first), not expiry order.
///
/// An empty ledger degrades to a single unattributed entry for the full
/// quantity (`batch_id = None`).
pub fn plan_restock(deductions: &[BatchDeduction], quantity: i64) -> Vec<RestockEntry> {
    if deductions.is_empty() {
        return vec![RestockEntry {
            batch_id: None,
            quantity,
        }];
    }

    let mut remaining = quantity;
    let mut entries = Vec::new();

    for deduction in deductions {
        if remaining == 0 {
            break;
        }

        let restore = deduction.quantity.min(remaining);
        if restore <= 0 {
            continue;
        }
        remaining -= restore;

        entries.push(RestockEntry {
            batch_id: Some(deduction.batch_id.clone()),
            quantity: restore,
        });
    }

    entries
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn deduction(batch_id: &str, qty: i64) -> BatchDeduction {
        BatchDeduction {
            batch_id: batch_id.to_string(),
            batch_number: format!("BN-{}", batch_id),
            quantity: qty,
            expiry_date: NaiveDate::from_ymd_opt(2025, 6, 1),
        }
    }

    #[test]
    fn test_eligible_at_exactly_two_days() {
        let sold = Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 8, 3, 10, 0, 0).unwrap();
        assert!(is_return_eligible(sold, now));
    }

    #[test]
    fn test_ineligible_one_second_past_two_days() {
        let sold = Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 8, 3, 10, 0, 1).unwrap();
        assert!(!is_return_eligible(sold, now));
    }

    #[test]
    fn test_future_sale_is_eligible() {
        let sold = Utc.with_ymd_and_hms(2026, 8, 3, 10, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap();
        assert!(is_return_eligible(sold, now));
    }

    #[test]
    fn test_max_returnable() {
        assert_eq!(max_returnable(5, 0), 5);
        assert_eq!(max_returnable(5, 3), 2);
        assert_eq!(max_returnable(5, 5), 0);
        // Over-returned legacy data floors at zero rather than going negative
        assert_eq!(max_returnable(5, 7), 0);
    }

    #[test]
    fn test_restock_follows_ledger_order() {
        let ledger = vec![deduction("b1", 3), deduction("b2", 2)];

        let plan = plan_restock(&ledger, 4);

        assert_eq!(
            plan,
            vec![
                RestockEntry {
                    batch_id: Some("b1".to_string()),
                    quantity: 3
                },
                RestockEntry {
                    batch_id: Some("b2".to_string()),
                    quantity: 1
                },
            ]
        );
    }

    #[test]
    fn test_restock_partial_stays_in_first_batch() {
        let ledger = vec![deduction("b1", 3), deduction("b2", 2)];

        let plan = plan_restock(&ledger, 2);

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].batch_id.as_deref(), Some("b1"));
        assert_eq!(plan[0].quantity, 2);
    }

    #[test]
    fn test_restock_full_quantity_restores_every_batch() {
        let ledger = vec![deduction("b1", 3), deduction("b2", 2)];

        let plan = plan_restock(&ledger, 5);

        let total: i64 = plan.iter().map(|e| e.quantity).sum();
        assert_eq!(total, 5);
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_restock_without_ledger_is_unattributed() {
        let plan = plan_restock(&[], 4);

        assert_eq!(
            plan,
            vec![RestockEntry {
                batch_id: None,
                quantity: 4
            }]
        );
    }

    #[test]
    fn test_validate_rejects_empty_items() {
        let request = ReturnRequest {
            sale_id: uuid::Uuid::new_v4().to_string(),
            reason: None,
            returned_by: None,
            items: Vec::new(),
        };
        assert!(matches!(
            validate_return_request(&request).unwrap_err(),
            CoreError::InvalidReturnRequest { .. }
        ));
    }

    #[test]
    fn test_validate_rejects_missing_sale_id() {
        let request = ReturnRequest {
            sale_id: "".to_string(),
            reason: None,
            returned_by: None,
            items: vec![ReturnRequestItem {
                sale_item_id: uuid::Uuid::new_v4().to_string(),
                product_id: uuid::Uuid::new_v4().to_string(),
                quantity: 1,
                deductions: Vec::new(),
            }],
        };
        assert!(validate_return_request(&request).is_err());
    }

    #[test]
    fn test_validate_rejects_non_positive_quantity() {
        let request = ReturnRequest {
            sale_id: uuid::Uuid::new_v4().to_string(),
            reason: Some("expired".to_string()),
            returned_by: None,
            items: vec![ReturnRequestItem {
                sale_item_id: uuid::Uuid::new_v4().to_string(),
                product_id: uuid::Uuid::new_v4().to_string(),
                quantity: 0,
                deductions: Vec::new(),
            }],
        };
        assert!(validate_return_request(&request).is_err());
    }
}
