//! # pharma-core: Pure Business Logic for Pharma POS
//!
//! This crate is the **heart** of Pharma POS. It contains the sale and
//! return settlement logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Pharma POS Architecture                        │
//! │                                                                     │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │              Application layer (not in this repo)           │   │
//! │  │     Catalog UI ──► Cart UI ──► Checkout ──► Returns UI      │   │
//! │  └────────────────────────────┬────────────────────────────────┘   │
//! │                               │                                     │
//! │  ┌────────────────────────────▼────────────────────────────────┐   │
//! │  │             ★ pharma-core (THIS CRATE) ★                    │   │
//! │  │                                                             │   │
//! │  │  ┌────────┐ ┌────────────┐ ┌─────────┐ ┌─────────────────┐ │   │
//! │  │  │  fefo  │ │ settlement │ │ returns │ │     receipt     │ │   │
//! │  │  │ alloc  │ │ plan_sale  │ │ policy  │ │    numbering    │ │   │
//! │  │  └────────┘ └────────────┘ └─────────┘ └─────────────────┘ │   │
//! │  │                                                             │   │
//! │  │  NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS         │   │
//! │  └────────────────────────────┬────────────────────────────────┘   │
//! │                               │                                     │
//! │  ┌────────────────────────────▼────────────────────────────────┐   │
//! │  │                  pharma-db (Database Layer)                 │   │
//! │  │        SQLite repositories, migrations, SaleService         │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, StockBatch, Sale, SalesReturn, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//! - [`fefo`] - First-Expiry-First-Out batch allocation
//! - [`settlement`] - Sale planning (validate-all-before-write)
//! - [`returns`] - Return eligibility, ceiling, and restock planning
//! - [`receipt`] - Receipt number generation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output; time is always a parameter
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are in cents (i64)
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod fefo;
pub mod money;
pub mod receipt;
pub mod returns;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default receipt prefix for sale receipts (`INV-00001`, ...).
///
/// The prefix is configuration, not domain logic; services may override it.
pub const DEFAULT_RECEIPT_PREFIX: &str = "INV";

/// Width of the zero-padded sequence in sale receipt numbers.
pub const RECEIPT_SEQUENCE_WIDTH: usize = 5;

/// Days after a sale during which returns are accepted.
pub const RETURN_WINDOW_DAYS: i64 = 2;

/// Maximum quantity of a single item in one cart line.
///
/// Guards against fat-finger quantities (1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum number of lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;
