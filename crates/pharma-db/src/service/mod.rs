//! # Service Module
//!
//! The settlement engine: orchestrates pharma-core's pure planning against
//! the repositories, and owns the caller-visible sale list state.

pub mod sales;

pub use sales::{SaleRecord, SaleService, SettlementError};
