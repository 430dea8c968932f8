//! # Repository Module
//!
//! All SQL lives here.
//!
//! ## Two Ways In
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Reads (no lock)                      Writes (service layer)            │
//! │  ───────────────                      ──────────────────────            │
//! │  db.records().list()                  settlement.update_record(..)      │
//! │       │                                    │ lock + BEGIN               │
//! │       ▼                                    ▼                            │
//! │  RecordRepository { pool }            record::fetch(&mut *tx, ..)       │
//! │       │ pool.acquire()                product::apply_stock_delta(..)    │
//! │       ▼                               record::update(&mut *tx, ..)      │
//! │  record::list(&mut conn)                   │ COMMIT                     │
//! │                                                                         │
//! │  Every query is a free function over `&mut SqliteConnection`, so the    │
//! │  same SQL runs on a pooled connection or inside a transaction.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog reads
//! - [`RecordRepository`](record::RecordRepository) - Jobs and sales history
//! - [`PurchaseRepository`](purchase::PurchaseRepository) - Purchase history

pub mod product;
pub mod purchase;
pub mod record;

/// Builds a `LIKE` pattern matching `term` anywhere, with `\` as escape.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
