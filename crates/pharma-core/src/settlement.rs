//! # Sale Planning
//!
//! Pure planning half of sale settlement: validate the whole cart and
//! compute every line's FEFO deduction plan before anything is persisted
//! (validate-all-before-write). The storage half lives in pharma-db.
//!
//! Batch availability is injected as a synchronous lookup capability, so
//! this module stays free of I/O and is directly unit-testable.

use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult};
use crate::fefo;
use crate::types::{AvailableBatch, BatchDeduction, CartItem};
use crate::validation::validate_quantity;
use crate::MAX_CART_ITEMS;

// =============================================================================
// Plan Types
// =============================================================================

/// One cart line with its computed deduction plan.
#[derive(Debug, Clone)]
pub struct PlannedLine {
    pub item: CartItem,
    /// FEFO deductions summing exactly to `item.quantity`.
    pub deductions: Vec<BatchDeduction>,
}

/// A fully validated, ready-to-persist sale plan.
#[derive(Debug, Clone)]
pub struct SalePlan {
    pub lines: Vec<PlannedLine>,
}

impl SalePlan {
    /// Sale total: the sum of caller-supplied line totals.
    ///
    /// Line totals are trusted as submitted, not recomputed from unit
    /// price × quantity.
    pub fn total_cents(&self) -> i64 {
        self.lines.iter().map(|l| l.item.line_total_cents).sum()
    }

    /// Accumulated deduction per touched batch, across all lines.
    ///
    /// Two lines drawing on the same batch produce a single combined
    /// delta, so the storage layer issues exactly one update per batch.
    /// Ordered map for a deterministic update sequence.
    pub fn batch_deltas(&self) -> BTreeMap<String, i64> {
        let mut deltas: BTreeMap<String, i64> = BTreeMap::new();
        for line in &self.lines {
            for deduction in &line.deductions {
                *deltas.entry(deduction.batch_id.clone()).or_insert(0) += deduction.quantity;
            }
        }
        deltas
    }
}

// =============================================================================
// Planning
// =============================================================================

/// Validates a cart and computes its FEFO deduction plan.
///
/// `batches_for` supplies a product's available batches ordered by expiry
/// ascending (the batch collaborator's read contract). Any failure rejects
/// the entire sale; no partial plans are returned.
///
/// ## Errors
/// - [`CoreError::InvalidCartItem`] - empty cart, missing product id or
///   name, or an out-of-range quantity
/// - [`CoreError::InsufficientStock`] - any line that cannot be covered
pub fn plan_sale<F>(items: &[CartItem], mut batches_for: F) -> CoreResult<SalePlan>
where
    F: FnMut(&str) -> Vec<AvailableBatch>,
{
    if items.is_empty() {
        return Err(CoreError::invalid_cart_item("cart is empty"));
    }

    if items.len() > MAX_CART_ITEMS {
        return Err(CoreError::invalid_cart_item(format!(
            "cart cannot have more than {MAX_CART_ITEMS} lines"
        )));
    }

    let mut lines = Vec::with_capacity(items.len());

    for item in items {
        if item.product_id.trim().is_empty() {
            return Err(CoreError::invalid_cart_item("missing product id"));
        }
        if item.product_name.trim().is_empty() {
            return Err(CoreError::invalid_cart_item(format!(
                "product {} has no display name",
                item.product_id
            )));
        }
        validate_quantity(item.quantity).map_err(|e| {
            CoreError::invalid_cart_item(format!("{}: {}", item.product_name, e))
        })?;

        let batches = batches_for(&item.product_id);
        let deductions = fefo::allocate(&item.product_name, item.quantity, &batches)?;

        lines.push(PlannedLine {
            item: item.clone(),
            deductions,
        });
    }

    Ok(SalePlan { lines })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn cart_item(product_id: &str, name: &str, qty: i64, unit_cents: i64) -> CartItem {
        CartItem {
            product_id: product_id.to_string(),
            product_name: name.to_string(),
            quantity: qty,
            unit_price_cents: unit_cents,
            line_total_cents: unit_cents * qty,
            available_stock: None,
        }
    }

    fn batch(id: &str, qty: i64, expiry: (i32, u32, u32)) -> AvailableBatch {
        AvailableBatch {
            id: id.to_string(),
            batch_number: Some(format!("BN-{}", id)),
            quantity: Some(qty),
            expiry_date: NaiveDate::from_ymd_opt(expiry.0, expiry.1, expiry.2),
        }
    }

    fn lookup(
        map: HashMap<&'static str, Vec<AvailableBatch>>,
    ) -> impl FnMut(&str) -> Vec<AvailableBatch> {
        move |product_id| map.get(product_id).cloned().unwrap_or_default()
    }

    #[test]
    fn test_plan_covers_every_line() {
        let mut stock = HashMap::new();
        stock.insert(
            "p1",
            vec![batch("b1", 3, (2025, 1, 1)), batch("b2", 10, (2025, 6, 1))],
        );
        stock.insert("p2", vec![batch("b3", 4, (2025, 4, 1))]);

        let cart = vec![
            cart_item("p1", "Panadol 500mg", 5, 250),
            cart_item("p2", "Brufen 400mg", 2, 400),
        ];

        let plan = plan_sale(&cart, lookup(stock)).unwrap();

        assert_eq!(plan.lines.len(), 2);
        assert_eq!(plan.lines[0].deductions.len(), 2);
        assert_eq!(plan.lines[1].deductions.len(), 1);
        assert_eq!(plan.total_cents(), 5 * 250 + 2 * 400);
    }

    #[test]
    fn test_total_trusts_caller_line_totals() {
        let mut stock = HashMap::new();
        stock.insert("p1", vec![batch("b1", 10, (2025, 1, 1))]);

        // Caller-supplied line total deliberately disagrees with
        // unit price × quantity (e.g. a line-level discount).
        let mut item = cart_item("p1", "Panadol 500mg", 2, 250);
        item.line_total_cents = 450;

        let plan = plan_sale(&[item], lookup(stock)).unwrap();
        assert_eq!(plan.total_cents(), 450);
    }

    #[test]
    fn test_batch_deltas_accumulate_across_lines() {
        // Two lines of the same product draw on the same batch; the delta
        // map must combine them into a single entry.
        let mut stock = HashMap::new();
        stock.insert(
            "p1",
            vec![batch("b1", 8, (2025, 1, 1)), batch("b2", 10, (2025, 6, 1))],
        );

        let cart = vec![
            cart_item("p1", "Panadol 500mg", 5, 250),
            cart_item("p1", "Panadol 500mg", 2, 250),
        ];

        let plan = plan_sale(&cart, lookup(stock)).unwrap();
        let deltas = plan.batch_deltas();

        // Each line allocates against the same snapshot, so both draw from
        // the earliest-expiring batch first.
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas.get("b1"), Some(&7));
    }

    #[test]
    fn test_rejects_empty_cart() {
        let err = plan_sale(&[], |_| Vec::new()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidCartItem { .. }));
    }

    #[test]
    fn test_rejects_missing_product_identity() {
        let cart = vec![cart_item("", "Panadol 500mg", 1, 250)];
        let err = plan_sale(&cart, |_| Vec::new()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidCartItem { .. }));
    }

    #[test]
    fn test_rejects_missing_display_name() {
        let cart = vec![cart_item("p1", "  ", 1, 250)];
        let err = plan_sale(&cart, |_| Vec::new()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidCartItem { .. }));
    }

    #[test]
    fn test_any_shortfall_rejects_whole_sale() {
        let mut stock = HashMap::new();
        stock.insert("p1", vec![batch("b1", 10, (2025, 1, 1))]);
        stock.insert("p2", vec![batch("b2", 1, (2025, 1, 1))]);

        let cart = vec![
            cart_item("p1", "Panadol 500mg", 2, 250),
            cart_item("p2", "Brufen 400mg", 5, 400),
        ];

        let err = plan_sale(&cart, lookup(stock)).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { .. }));
    }
}
