//! # repairdesk-core: Settlement Rules for RepairDesk
//!
//! Everything that decides what a repair job costs and how it moves stock,
//! as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        RepairDesk Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    UI (jobs, catalog, purchases)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 repairdesk-db (settlement services)             │   │
//! │  │    create / update / finalize / delete, purchase intake         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ calls                                  │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ repairdesk-core (THIS CRATE) ★                  │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ reconcile │  │ numbering │  │ validation│  │   │
//! │  │   │  Product  │  │  deltas   │  │ JOB-/INV- │  │   rules   │  │   │
//! │  │   │  Record   │  │  policy   │  │           │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, ServiceRecord, PurchaseRecord, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`reconcile`] - Used-item reconciliation and the stock policy
//! - [`numbering`] - Job codes and invoice numbers
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use repairdesk_core::numbering::next_job_number;
//! use repairdesk_core::reconcile::reconcile;
//!
//! let job = next_job_number(2024, ["JOB-2024-0001"]);
//! assert_eq!(job.to_string(), "JOB-2024-0002");
//! assert_eq!(job.invoice_number(), "INV-2024-0002");
//!
//! assert!(reconcile(&[], &[]).is_empty());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod numbering;
pub mod reconcile;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use numbering::JobNumber;
pub use reconcile::{reconcile, StockDeltas, StockPolicy};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Prefix of job codes (`JOB-2024-0001`).
pub const JOB_PREFIX: &str = "JOB";

/// Prefix of invoice numbers (`INV-2024-0001`).
pub const INVOICE_PREFIX: &str = "INV";

/// Maximum quantity of a single used item or purchase line.
///
/// Catches typos like 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

/// Maximum distinct lines on one job.
pub const MAX_USED_ITEMS: usize = 100;

/// Maximum unit price or labor amount (100 000 000.00).
///
/// With [`MAX_ITEM_QUANTITY`] and [`MAX_USED_ITEMS`] this keeps every line
/// and invoice total far inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000;

/// Maximum length of names (products, contacts, employees, suppliers).
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length of device and fault descriptions.
pub const MAX_TEXT_LEN: usize = 2_000;
