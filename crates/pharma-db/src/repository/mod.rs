//! # Repository Module
//!
//! Database repository implementations for Pharma POS.
//!
//! One repository struct per aggregate, each owning its SQL. Queries use
//! the runtime API (`sqlx::query` / `query_as` with bound parameters) over
//! internal row structs that convert into pharma-core domain types.
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog CRUD and search
//! - [`batch::BatchRepository`] - Batch-tracked stock, guarded quantity deltas
//! - [`sale::SaleRepository`] - Sales, line items, receipt lookups
//! - [`returns::ReturnRepository`] - Returns, return items, returned totals

pub mod batch;
pub mod product;
pub mod returns;
pub mod sale;
