//! # Used-Item Reconciler
//!
//! Turns "what the job used before" and "what it uses now" into the stock
//! movements that bring the catalog in line.
//!
//! ## Delta Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  For every Product-kind id:                                             │
//! │                                                                         │
//! │      delta = Σ old quantity  −  Σ new quantity                          │
//! │                                                                         │
//! │  old: [Screen ×1, Battery ×1]        new: [Screen ×3]                   │
//! │                                                                         │
//! │      Screen   1 − 3 = −2   (two more taken from stock)                  │
//! │      Battery  1 − 0 = +1   (returned to stock)                          │
//! │                                                                         │
//! │  Services are skipped. Zero nets are dropped.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Applying `reconcile(a, b)` then `reconcile(b, c)` moves stock exactly as
//! much as `reconcile(a, c)`, so a job edited many times leaves the same
//! stock as one edited once. The reconciler never looks at on-hand stock;
//! that is [`StockPolicy`]'s job.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::types::{Product, UsedItem};

// =============================================================================
// Stock Deltas
// =============================================================================

/// Signed stock movement per product id, ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StockDeltas(BTreeMap<String, i64>);

impl StockDeltas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delta for `product_id`, 0 if untouched.
    pub fn get(&self, product_id: &str) -> i64 {
        self.0.get(product_id).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(id, delta)| (id.as_str(), *delta))
    }

    /// Adds `delta` to the running total for `product_id`.
    pub fn add(&mut self, product_id: &str, delta: i64) {
        *self.0.entry(product_id.to_string()).or_insert(0) += delta;
    }

    /// Folds another set of deltas into this one.
    pub fn merge(&mut self, other: &StockDeltas) {
        for (id, delta) in other.iter() {
            self.add(id, delta);
        }
        self.prune();
    }

    fn prune(&mut self) {
        self.0.retain(|_, delta| *delta != 0);
    }
}

// =============================================================================
// Reconcile
// =============================================================================

/// Computes the stock deltas that move a job from `old` to `new`.
///
/// Duplicate ids within a list are summed. Callers that need unique lines
/// check that before getting here.
///
/// ```rust
/// use repairdesk_core::reconcile::reconcile;
///
/// let deltas = reconcile(&[], &[]);
/// assert!(deltas.is_empty());
/// ```
pub fn reconcile(old: &[UsedItem], new: &[UsedItem]) -> StockDeltas {
    let mut deltas = StockDeltas::new();

    for item in new.iter().filter(|i| i.kind.tracks_stock()) {
        deltas.add(&item.product_id, -item.quantity);
    }
    for item in old.iter().filter(|i| i.kind.tracks_stock()) {
        deltas.add(&item.product_id, item.quantity);
    }

    deltas.prune();
    deltas
}

/// Deltas that hand every tracked part on a job back to stock.
pub fn release_all(items: &[UsedItem]) -> StockDeltas {
    reconcile(items, &[])
}

// =============================================================================
// Stock Policy
// =============================================================================

/// Rules applied by the ledger before it moves stock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StockPolicy {
    /// Let stock go below zero instead of failing with `InsufficientStock`.
    pub allow_negative_stock: bool,
}

impl StockPolicy {
    pub const fn new(allow_negative_stock: bool) -> Self {
        StockPolicy {
            allow_negative_stock,
        }
    }

    /// Checks that `delta` may be applied to `product`.
    pub fn check(&self, product: &Product, delta: i64) -> CoreResult<()> {
        if delta == 0 {
            return Ok(());
        }

        if !product.kind.tracks_stock() {
            return Err(CoreError::ServiceStock(product.name.clone()));
        }

        if !product.can_apply(delta, self.allow_negative_stock) {
            return Err(CoreError::InsufficientStock {
                product_id: product.id.clone(),
                name: product.name.clone(),
                available: product.stock,
                requested: -delta,
            });
        }

        Ok(())
    }
}
