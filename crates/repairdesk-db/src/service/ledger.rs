//! # Stock Ledger
//!
//! The only code path that changes `products.stock`. It knows nothing about
//! why stock moves: jobs, deletions and purchases all arrive as signed
//! deltas.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::{info, warn};

use repairdesk_core::{Product, StockDeltas, StockPolicy};

use crate::error::DbResult;
use crate::repository::product;
use crate::service::Writer;

/// Applies one delta inside the caller's transaction and returns the
/// updated product.
pub(crate) async fn adjust(
    conn: &mut SqliteConnection,
    policy: StockPolicy,
    product_id: &str,
    delta: i64,
    now: DateTime<Utc>,
) -> DbResult<Product> {
    let current = product::fetch_required(conn, product_id).await?;
    if let Err(err) = policy.check(&current, delta) {
        warn!(product_id = %product_id, delta = %delta, error = %err, "Stock adjustment rejected");
        return Err(err.into());
    }

    if delta != 0 {
        product::apply_stock_delta(conn, product_id, delta, now).await?;
    }
    product::fetch_required(conn, product_id).await
}

/// Applies a batch of deltas inside the caller's transaction.
///
/// Every delta is checked before any is written, so a rejected batch leaves
/// stock untouched even before rollback.
pub(crate) async fn apply_all(
    conn: &mut SqliteConnection,
    policy: StockPolicy,
    deltas: &StockDeltas,
    now: DateTime<Utc>,
) -> DbResult<()> {
    for (product_id, delta) in deltas.iter() {
        let current = product::fetch_required(conn, product_id).await?;
        if let Err(err) = policy.check(&current, delta) {
            warn!(product_id = %product_id, delta = %delta, error = %err, "Stock delta rejected");
            return Err(err.into());
        }
    }

    for (product_id, delta) in deltas.iter() {
        product::apply_stock_delta(conn, product_id, delta, now).await?;
    }

    Ok(())
}

/// Standalone stock adjustments (stock counts, write-offs).
///
/// ## Usage
/// ```rust,ignore
/// let screen = db.ledger().adjust_stock(&screen_id, -1).await?;
/// ```
#[derive(Debug, Clone)]
pub struct StockLedger {
    writer: Writer,
}

impl StockLedger {
    pub(crate) fn new(writer: Writer) -> Self {
        StockLedger { writer }
    }

    /// `stock += delta` on one product.
    ///
    /// ## Errors
    /// * `NotFound` - unknown product
    /// * `Domain(ServiceStock)` - non-zero delta on a service
    /// * `Domain(InsufficientStock)` - would go negative (unless allowed)
    pub async fn adjust_stock(&self, product_id: &str, delta: i64) -> DbResult<Product> {
        let mut work = self.writer.begin().await?;
        let product = adjust(&mut work.tx, self.writer.policy(), product_id, delta, Utc::now()).await?;
        work.commit().await?;

        info!(product_id = %product_id, delta = %delta, stock = product.stock, "Stock adjusted");
        Ok(product)
    }
}
