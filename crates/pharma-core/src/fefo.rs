//! # FEFO Allocation
//!
//! First-Expiry-First-Out batch allocation.
//!
//! Given a requested quantity and the product's available batches, produce
//! an ordered deduction plan that sums exactly to the request, consuming
//! the earliest-expiring batches first.
//!
//! ## Allocation Walk
//! ```text
//! request: 5                         remaining
//! ┌────────────────────────────┐
//! │ BN-A  qty 3  exp 2025-01-01│ ──► take 3       2
//! │ BN-B  qty 0  exp 2025-03-01│ ──► skip         2
//! │ BN-C  qty 10 exp 2025-06-01│ ──► take 2       0  ✓ stop
//! └────────────────────────────┘
//! plan: [(BN-A, 3), (BN-C, 2)]
//! ```
//!
//! The caller supplies batches already ordered by expiry ascending (the
//! batch collaborator's read contract); this module does not re-sort.
//! Allocation only *computes* the plan - it never mutates batch state.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{AvailableBatch, BatchDeduction};

/// Computes a FEFO deduction plan for one requested quantity.
///
/// ## Contract
/// - `quantity` must be positive.
/// - `batches` is walked in the given order; batches with zero or missing
///   quantity are skipped, and a missing batch number degrades to `""`
///   rather than failing the allocation.
/// - Fails with [`CoreError::InsufficientStock`] (reporting `product_name`
///   and the available total) before emitting any deduction if the batches
///   cannot cover the request.
/// - On success the returned deductions sum exactly to `quantity` and none
///   has a quantity ≤ 0.
pub fn allocate(
    product_name: &str,
    quantity: i64,
    batches: &[AvailableBatch],
) -> CoreResult<Vec<BatchDeduction>> {
    if quantity <= 0 {
        return Err(CoreError::Validation(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }));
    }

    let total_available: i64 = batches.iter().map(AvailableBatch::units).sum();
    if total_available < quantity {
        return Err(CoreError::InsufficientStock {
            product: product_name.to_string(),
            available: total_available,
        });
    }

    let mut remaining = quantity;
    let mut deductions = Vec::new();

    for batch in batches {
        if remaining == 0 {
            break;
        }

        let available = batch.units();
        if available == 0 {
            continue;
        }

        let take = available.min(remaining);
        remaining -= take;

        deductions.push(BatchDeduction {
            batch_id: batch.id.clone(),
            batch_number: batch.batch_number.clone().unwrap_or_default(),
            quantity: take,
            expiry_date: batch.expiry_date,
        });
    }

    Ok(deductions)
}

// =============================================================================
// Unit Tests
// =============================================================================
