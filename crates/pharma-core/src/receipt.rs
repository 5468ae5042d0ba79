//! # Receipt Numbering
//!
//! Externally presented transaction identifiers, distinct from internal
//! row identity.
//!
//! Two schemes:
//!
//! - **Sale receipts** are sequential and human-legible (`INV-00042`):
//!   the next number is derived from the most recent persisted receipt.
//!   If numbering state is unreadable the settlement still proceeds with
//!   a timestamp-derived fallback, trading strict sequentiality for
//!   availability.
//! - **Return receipts** (`RET-20260806123456`) are timestamp-derived
//!   outright, optimized for uniqueness under concurrent returns rather
//!   than sequential readability.

use chrono::{DateTime, Utc};

use crate::RECEIPT_SEQUENCE_WIDTH;

// =============================================================================
// Sale Receipts
// =============================================================================

/// Derives the next sale receipt number from the most recent one.
///
/// Parses the numeric suffix after `PREFIX-`; a parseable suffix yields
/// `parsed + 1`, anything else (no prior receipt, foreign prefix, garbage
/// suffix) restarts at 1. Formatted as `PREFIX-` + the number zero-padded
/// to five digits.
///
/// ## Example
/// ```rust
/// use pharma_core::receipt::next_sale_receipt;
///
/// assert_eq!(next_sale_receipt("INV", Some("INV-00007")), "INV-00008");
/// assert_eq!(next_sale_receipt("INV", None), "INV-00001");
/// ```
pub fn next_sale_receipt(prefix: &str, last: Option<&str>) -> String {
    let next = last
        .and_then(|value| value.strip_prefix(prefix))
        .and_then(|rest| rest.strip_prefix('-'))
        .and_then(|digits| digits.parse::<u64>().ok())
        .map(|n| n + 1)
        .unwrap_or(1);

    format!("{prefix}-{next:0width$}", width = RECEIPT_SEQUENCE_WIDTH)
}

/// Timestamp-derived fallback when the receipt lookup itself fails.
///
/// `PREFIX-` + the last five digits of the epoch-millisecond clock. Not
/// sequential, but lets settlement proceed when numbering state is
/// unreadable.
pub fn fallback_receipt(prefix: &str, now: DateTime<Utc>) -> String {
    let suffix = now.timestamp_millis().rem_euclid(100_000);
    format!("{prefix}-{suffix:0width$}", width = RECEIPT_SEQUENCE_WIDTH)
}

// =============================================================================
// Return Receipts
// =============================================================================

/// Builds a return receipt number: `RET-` + compact date + the last six
/// digits of the epoch-millisecond clock.
///
/// ## Example
/// `RET-20260806123456`
pub fn return_receipt(now: DateTime<Utc>) -> String {
    let suffix = now.timestamp_millis().rem_euclid(1_000_000);
    format!("RET-{}{suffix:06}", now.format("%Y%m%d"))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_next_increments_last_receipt() {
        assert_eq!(next_sale_receipt("INV", Some("INV-00007")), "INV-00008");
        assert_eq!(next_sale_receipt("INV", Some("INV-00099")), "INV-00100");
    }

    #[test]
    fn test_first_receipt_is_one() {
        assert_eq!(next_sale_receipt("INV", None), "INV-00001");
    }

    #[test]
    fn test_unparseable_suffix_restarts_at_one() {
        assert_eq!(next_sale_receipt("INV", Some("INV-ABCDE")), "INV-00001");
        assert_eq!(next_sale_receipt("INV", Some("garbage")), "INV-00001");
        assert_eq!(next_sale_receipt("INV", Some("")), "INV-00001");
    }

    #[test]
    fn test_sequence_can_outgrow_padding() {
        assert_eq!(next_sale_receipt("INV", Some("INV-99999")), "INV-100000");
    }

    #[test]
    fn test_custom_prefix() {
        assert_eq!(next_sale_receipt("PHR", Some("PHR-00041")), "PHR-00042");
    }

    #[test]
    fn test_fallback_uses_last_five_millis_digits() {
        let now = Utc.timestamp_millis_opt(1_754_480_012_345).unwrap();
        assert_eq!(fallback_receipt("INV", now), "INV-12345");
    }

    #[test]
    fn test_return_receipt_shape() {
        let now = Utc.with_ymd_and_hms(2026, 8, 6, 12, 30, 45).unwrap();
        let receipt = return_receipt(now);

        assert!(receipt.starts_with("RET-20260806"));
        // RET- + 8 date digits + 6 clock digits
        assert_eq!(receipt.len(), 4 + 8 + 6);
    }
}
