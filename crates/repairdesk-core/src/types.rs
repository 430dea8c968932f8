//! # Domain Types
//!
//! Core domain types used throughout RepairDesk.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────────┐   ┌─────────────────┐   │
//! │  │    Product      │   │   ServiceRecord     │   │ PurchaseRecord  │   │
//! │  │  ─────────────  │   │  ─────────────────  │   │  ─────────────  │   │
//! │  │  id (UUID)      │──►│  id (JOB-2024-0001) │   │  id (UUID)      │   │
//! │  │  kind           │   │  work_status        │   │  product_id ────┼─► │
//! │  │  sale/cost      │   │  used_items[] ◄─ snapshot of Product     │   │
//! │  │  stock          │   │  final_* totals     │   │  quantity       │   │
//! │  └─────────────────┘   └─────────────────────┘   └─────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A `UsedItem` freezes the catalog entry (name, kind, prices, warranty flag)
//! at the moment it is attached to a job. Later catalog edits never change
//! an existing invoice.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::numbering::JobNumber;

// =============================================================================
// Product Kind
// =============================================================================

/// Whether a catalog entry is a physical part or a billable service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    /// Physical part with tracked stock.
    Product,
    /// Labor-type entry; stock is meaningless.
    Service,
}

impl ProductKind {
    /// Only physical products move stock.
    #[inline]
    pub const fn tracks_stock(&self) -> bool {
        matches!(self, ProductKind::Product)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog entry: a spare part or a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, unique (case-insensitive) across the catalog.
    pub name: String,

    pub kind: ProductKind,

    /// What the shop pays per unit, in cents.
    pub cost_price_cents: i64,

    /// What the customer pays per unit, in cents.
    pub sale_price_cents: i64,

    /// On-hand quantity. Always 0 for services.
    pub stock: i64,

    /// Whether the entry is sold with a warranty.
    pub has_warranty: bool,

    /// Free-form search tags.
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub tags: Vec<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }

    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }

    /// Checks whether `delta` can be applied to the current stock.
    pub fn can_apply(&self, delta: i64, allow_negative_stock: bool) -> bool {
        if delta >= 0 || allow_negative_stock {
            return true;
        }
        self.stock + delta >= 0
    }
}

/// Input for adding a catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub kind: ProductKind,
    pub cost_price_cents: i64,
    pub sale_price_cents: i64,
    /// Opening stock for physical products; ignored for services.
    #[serde(default)]
    pub opening_stock: i64,
    #[serde(default)]
    pub has_warranty: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update of catalog metadata.
///
/// Stock and kind cannot be patched; stock only moves through the ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductDetailsPatch {
    pub name: Option<String>,
    pub cost_price_cents: Option<i64>,
    pub sale_price_cents: Option<i64>,
    pub has_warranty: Option<bool>,
    pub tags: Option<Vec<String>>,
}

// =============================================================================
// Used Item
// =============================================================================

/// A product or service attached to a job, frozen at attach time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct UsedItem {
    pub product_id: String,
    /// Name at attach time (frozen).
    pub name: String,
    /// Kind at attach time (frozen).
    pub kind: ProductKind,
    /// Unit cost at attach time (frozen).
    pub cost_price_cents: i64,
    /// Unit sale price at attach time (frozen).
    pub sale_price_cents: i64,
    /// Warranty flag at attach time (frozen).
    pub has_warranty: bool,
    /// Units used; always >= 1 on a stored record.
    pub quantity: i64,
}

impl UsedItem {
    /// Snapshots a catalog entry for attachment to a job.
    pub fn snapshot(product: &Product, quantity: i64) -> Self {
        UsedItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            kind: product.kind,
            cost_price_cents: product.cost_price_cents,
            sale_price_cents: product.sale_price_cents,
            has_warranty: product.has_warranty,
            quantity,
        }
    }

    /// Sale price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.sale_price_cents).multiply_quantity(self.quantity)
    }

    /// Cost price × quantity.
    #[inline]
    pub fn line_cost(&self) -> Money {
        Money::from_cents(self.cost_price_cents).multiply_quantity(self.quantity)
    }
}

/// What the UI sends to say "this job uses N of product X".
///
/// Snapshots are resolved server-side: an item already on the job keeps its
/// frozen prices, a newly attached one is copied from the live catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UsedItemLine {
    pub product_id: String,
    pub quantity: i64,
}

impl UsedItemLine {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        UsedItemLine {
            product_id: product_id.into(),
            quantity,
        }
    }
}

// =============================================================================
// Contact & Warranty Snapshots
// =============================================================================

/// Customer linked to a job, copied at intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContactRef {
    pub id: String,
    pub name: String,
    pub phone: String,
}

/// Warranty terms granted on an invoice, copied from the warranty catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WarrantySnapshot {
    pub id: String,
    pub name: String,
    pub duration_months: u32,
}

// =============================================================================
// Work Status
// =============================================================================

/// Lifecycle of a repair job.
///
/// ```text
/// InQueue ──► BeingRepaired ──┬──► Repaired ──► RepairedAndDelivered
///                             ├──► CannotBeRepaired
///                             └──► CustomerRefused
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    InQueue,
    BeingRepaired,
    Repaired,
    CannotBeRepaired,
    CustomerRefused,
    /// Terminal. Only reachable by finalizing the invoice.
    RepairedAndDelivered,
}

impl Default for WorkStatus {
    fn default() -> Self {
        WorkStatus::InQueue
    }
}

impl WorkStatus {
    /// Whether the lifecycle graph has an edge `self → next`.
    /// Staying in the same state is always allowed.
    pub fn can_transition_to(self, next: WorkStatus) -> bool {
        use WorkStatus::*;

        if self == next {
            return true;
        }

        matches!(
            (self, next),
            (InQueue, BeingRepaired)
                | (BeingRepaired, Repaired)
                | (BeingRepaired, CannotBeRepaired)
                | (BeingRepaired, CustomerRefused)
                | (Repaired, RepairedAndDelivered)
        )
    }

    /// Jobs that ended without a repair are never invoiced.
    pub fn can_finalize(self) -> bool {
        !matches!(
            self,
            WorkStatus::CannotBeRepaired | WorkStatus::CustomerRefused
        )
    }
}

// =============================================================================
// Service Record
// =============================================================================

/// A repair job from intake to invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ServiceRecord {
    /// Job code, e.g. `JOB-2024-0001`.
    pub id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// Username of the employee who took the job in.
    pub employee: String,
    pub contact: ContactRef,
    pub device_description: String,
    pub fault_description: String,
    pub work_status: WorkStatus,
    pub used_items: Vec<UsedItem>,
    pub warranty: Option<WarrantySnapshot>,
    pub final_invoice_number: Option<String>,
    /// Labor quoted at intake.
    pub estimated_labor_cents: i64,
    pub final_labor_cents: Option<i64>,
    pub final_total_cents: Option<i64>,
    #[ts(as = "Option<String>")]
    pub invoiced_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl ServiceRecord {
    /// Σ sale price × quantity over the used items.
    pub fn parts_total(&self) -> Money {
        self.used_items.iter().map(UsedItem::line_total).sum()
    }

    /// Σ cost price × quantity over the used items.
    pub fn parts_cost(&self) -> Money {
        self.used_items.iter().map(UsedItem::line_cost).sum()
    }

    pub fn is_invoiced(&self) -> bool {
        self.final_invoice_number.is_some()
    }

    /// `final_total == final_labor + parts_total` whenever both are set.
    pub fn totals_consistent(&self) -> bool {
        match (self.final_labor_cents, self.final_total_cents) {
            (Some(labor), Some(total)) => {
                total == (Money::from_cents(labor) + self.parts_total()).cents()
            }
            _ => true,
        }
    }

    /// Applies the non-item fields of a patch.
    ///
    /// Moving into `RepairedAndDelivered` is reserved for finalization.
    pub fn apply_details(&mut self, patch: &ServiceRecordPatch) -> CoreResult<()> {
        if let Some(next) = patch.work_status {
            let reserved = next == WorkStatus::RepairedAndDelivered && self.work_status != next;
            if reserved || !self.work_status.can_transition_to(next) {
                return Err(CoreError::InvalidStatusTransition {
                    record_id: self.id.clone(),
                    from: self.work_status,
                    to: next,
                });
            }
            self.work_status = next;
        }

        if let Some(contact) = &patch.contact {
            self.contact = contact.clone();
        }
        if let Some(device) = &patch.device_description {
            self.device_description = device.clone();
        }
        if let Some(fault) = &patch.fault_description {
            self.fault_description = fault.clone();
        }
        if let Some(estimated) = patch.estimated_labor_cents {
            self.estimated_labor_cents = estimated;
        }
        if let Some(warranty) = &patch.warranty {
            self.warranty = Some(warranty.clone());
        }

        Ok(())
    }

    /// Replaces the used items, keeping an existing invoice total in step.
    pub fn set_used_items(&mut self, items: Vec<UsedItem>) {
        self.used_items = items;
        if let Some(labor) = self.final_labor_cents {
            self.final_total_cents = Some((Money::from_cents(labor) + self.parts_total()).cents());
        }
    }

    /// Locks in final costs and marks the job delivered.
    ///
    /// The total is computed from the current lines; a later
    /// [`set_used_items`](Self::set_used_items) recomputes it against the
    /// final labor. The invoice number is derived from the job code once and
    /// never reallocated.
    pub fn finalize(
        &mut self,
        final_labor_cents: i64,
        warranty: Option<WarrantySnapshot>,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        if !self.work_status.can_finalize() {
            return Err(CoreError::InvalidStatusTransition {
                record_id: self.id.clone(),
                from: self.work_status,
                to: WorkStatus::RepairedAndDelivered,
            });
        }

        if self.final_invoice_number.is_none() {
            let job: JobNumber = self.id.parse()?;
            self.final_invoice_number = Some(job.invoice_number());
        }
        if self.invoiced_at.is_none() {
            self.invoiced_at = Some(now);
        }

        self.final_labor_cents = Some(final_labor_cents);
        self.final_total_cents =
            Some((Money::from_cents(final_labor_cents) + self.parts_total()).cents());
        if warranty.is_some() {
            self.warranty = warranty;
        }
        self.work_status = WorkStatus::RepairedAndDelivered;

        Ok(())
    }

    /// Case-insensitive sales-history search: contact name, invoice number
    /// or any used item's name.
    pub fn matches_sale_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }

        self.contact.name.to_lowercase().contains(&term)
            || self
                .final_invoice_number
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(&term))
            || self
                .used_items
                .iter()
                .any(|i| i.name.to_lowercase().contains(&term))
    }
}

/// Intake form for a new job.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewServiceRecord {
    pub contact: ContactRef,
    pub device_description: String,
    pub fault_description: String,
    pub estimated_labor_cents: i64,
    /// Current session's username, supplied by the caller.
    pub employee: String,
}

/// Partial update of a job. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ServiceRecordPatch {
    pub contact: Option<ContactRef>,
    pub device_description: Option<String>,
    pub fault_description: Option<String>,
    pub estimated_labor_cents: Option<i64>,
    pub work_status: Option<WorkStatus>,
    pub warranty: Option<WarrantySnapshot>,
    /// Full replacement list of parts/services on the job.
    pub used_items: Option<Vec<UsedItemLine>>,
}

/// Finalization request for a job's invoice.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FinalizeInvoice {
    pub final_labor_cents: i64,
    pub used_items: Vec<UsedItemLine>,
    pub warranty: Option<WarrantySnapshot>,
}

// =============================================================================
// Purchase Record
// =============================================================================

/// Stock bought from a supplier. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseRecord {
    pub id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub supplier_id: String,
    /// Supplier name at purchase time (frozen).
    pub supplier_name: String,
    pub product_id: String,
    /// Product name at purchase time (frozen).
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// quantity × unit price.
    pub total_cents: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Purchase intake form.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewPurchase {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub supplier_id: String,
    pub supplier_name: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub notes: Option<String>,
}
