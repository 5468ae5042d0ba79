//! # pharma-db: Database Layer for Pharma POS
//!
//! SQLite storage for the pharmacy POS, plus the settlement service that
//! drives pharma-core's pure logic against the repositories.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Pharma POS Data Flow                          │
//! │                                                                     │
//! │  Application layer (checkout / returns handler)                     │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │                    pharma-db (THIS CRATE)                   │   │
//! │  │                                                             │   │
//! │  │  ┌────────────┐   ┌──────────────┐   ┌──────────────────┐  │   │
//! │  │  │  Database  │   │ Repositories │   │   SaleService    │  │   │
//! │  │  │ (pool.rs)  │◄──│ product      │◄──│ settle_sale      │  │   │
//! │  │  │ SqlitePool │   │ batch        │   │ settle_return    │  │   │
//! │  │  │ migrations │   │ sale, return │   │ cached sale list │  │   │
//! │  │  └────────────┘   └──────────────┘   └──────────────────┘  │   │
//! │  │                                                             │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  SQLite database (WAL mode)                                         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (product, batch, sale, returns)
//! - [`service`] - The sale/return settlement engine
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pharma_db::{Database, DbConfig, SaleService};
//!
//! let db = Database::new(DbConfig::new("path/to/pharma.db")).await?;
//! let service = SaleService::new(db);
//!
//! let sale = service
//!     .settle_sale(&cart, PaymentMethod::Cash, 0, Some("cashier-7"))
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use service::{SaleRecord, SaleService, SettlementError};

// Repository re-exports for convenience
pub use repository::batch::BatchRepository;
pub use repository::product::ProductRepository;
pub use repository::returns::ReturnRepository;
pub use repository::sale::SaleRepository;
