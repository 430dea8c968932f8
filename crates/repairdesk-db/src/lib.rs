//! # repairdesk-db: Storage and Settlement for RepairDesk
//!
//! SQLite persistence (via sqlx) and the write-side services that keep
//! stock, service records and purchases consistent with each other.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        RepairDesk Data Flow                             │
//! │                                                                         │
//! │  Caller (UI command, seed binary, tests)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   repairdesk-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Services    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │  (service/)   │    │ (repository/) │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ Settlement    │───►│ product       │    │ 001_initial  │  │   │
//! │  │   │ Catalog       │    │ record        │    │ _schema.sql  │  │   │
//! │  │   │ PurchaseIntake│    │ purchase      │    │              │  │   │
//! │  │   │ StockLedger   │    │               │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │          │ write lock + transaction per operation              │   │
//! │  └──────────┼──────────────────────────────────────────────────────┘   │
//! │             ▼                                                           │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/repairdesk/repairdesk.db                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - `shop.toml` + environment configuration
//! - [`pool`] - Connection pool creation and the [`Database`] handle
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Row mapping and queries
//! - [`service`] - Atomic write operations (settlement, intake, catalog, ledger)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use repairdesk_db::{Database, ShopConfig};
//!
//! let config = ShopConfig::load(None)?;
//! let db = Database::from_config(&config).await?;
//!
//! let job = db.settlement().create_record(intake).await?;
//! db.settlement().finalize_invoice(&job.id, invoice).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, ShopConfig};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::product::ProductRepository;
pub use repository::purchase::PurchaseRepository;
pub use repository::record::RecordRepository;

pub use service::catalog::Catalog;
pub use service::intake::PurchaseIntake;
pub use service::ledger::StockLedger;
pub use service::settlement::Settlement;
