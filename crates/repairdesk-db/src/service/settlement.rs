//! # Service Record Settlement
//!
//! Create, update, finalize and delete repair jobs while keeping stock in
//! step with the parts each job uses.
//!
//! ## Update Path (shared by finalize)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lines [{product_id, qty}]                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  resolve_items        already on the job? keep its snapshot            │
//! │       │               new product?        snapshot the live catalog     │
//! │       ▼                                                                 │
//! │  reconcile(old, new)  ──►  StockDeltas { screen: -2, battery: +1 }      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ledger::apply_all    checks every delta, then writes them              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  record::update       row + lines                                       │
//! │                                                                         │
//! │  One transaction. Any error rolls every step back.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Datelike, Utc};
use sqlx::SqliteConnection;
use tracing::{info, warn};

use repairdesk_core::numbering::next_job_number;
use repairdesk_core::reconcile::{reconcile, release_all};
use repairdesk_core::validation::{
    validate_new_record, validate_price_cents, validate_record_patch, validate_used_item_lines,
};
use repairdesk_core::{
    FinalizeInvoice, NewServiceRecord, ServiceRecord, ServiceRecordPatch, StockPolicy, UsedItem,
    UsedItemLine, WorkStatus,
};

use crate::error::DbResult;
use crate::repository::{product, record};
use crate::service::{ledger, Writer};

#[derive(Debug, Clone)]
pub struct Settlement {
    writer: Writer,
}

impl Settlement {
    pub(crate) fn new(writer: Writer) -> Self {
        Settlement { writer }
    }

    /// Opens a new job in `InQueue` with no used items.
    ///
    /// The job code is `JOB-{year}-{max + 1}`; the scan and the insert run
    /// under the write lock so two intakes never get the same code.
    pub async fn create_record(&self, input: NewServiceRecord) -> DbResult<ServiceRecord> {
        if let Err(err) = validate_new_record(&input) {
            warn!(error = %err, "Intake rejected");
            return Err(err.into());
        }

        let now = Utc::now();
        let mut work = self.writer.begin().await?;

        let issued = record::ids_for_year(&mut work.tx, now.year()).await?;
        let job = next_job_number(now.year(), issued.iter().map(String::as_str));

        let new_record = ServiceRecord {
            id: job.to_string(),
            created_at: now,
            employee: input.employee.trim().to_string(),
            contact: input.contact,
            device_description: input.device_description,
            fault_description: input.fault_description,
            work_status: WorkStatus::InQueue,
            used_items: Vec::new(),
            warranty: None,
            final_invoice_number: None,
            estimated_labor_cents: input.estimated_labor_cents,
            final_labor_cents: None,
            final_total_cents: None,
            invoiced_at: None,
            updated_at: now,
        };

        record::insert(&mut work.tx, &new_record).await?;
        work.commit().await?;

        info!(id = %new_record.id, employee = %new_record.employee, "Service record created");
        Ok(new_record)
    }

    /// Applies a partial update.
    ///
    /// When `used_items` is present it replaces the job's lines and stock is
    /// moved by exactly the difference. An invoiced job keeps
    /// `final_total == final_labor + parts`.
    ///
    /// ## Errors
    /// * `NotFound` - unknown job, or a line naming an unknown product
    /// * `Domain(InvalidStatusTransition)` - lifecycle violation
    /// * `Domain(InsufficientStock)` - not enough parts on hand
    /// * `Domain(Validation(..))` - bad input, duplicate lines
    pub async fn update_record(&self, id: &str, patch: ServiceRecordPatch) -> DbResult<ServiceRecord> {
        if let Err(err) = validate_record_patch(&patch) {
            warn!(id = %id, error = %err, "Update rejected");
            return Err(err.into());
        }

        let now = Utc::now();
        let mut work = self.writer.begin().await?;
        let mut current = record::fetch_required(&mut work.tx, id).await?;

        if let Err(err) = current.apply_details(&patch) {
            warn!(id = %id, error = %err, "Update rejected");
            return Err(err.into());
        }
        if let Some(lines) = &patch.used_items {
            settle_items(&mut work.tx, self.writer.policy(), &mut current, lines).await?;
        }
        current.updated_at = now;

        record::update(&mut work.tx, &current).await?;
        work.commit().await?;

        info!(
            id = %id,
            status = ?current.work_status,
            items = current.used_items.len(),
            "Service record updated"
        );
        Ok(current)
    }

    /// Locks in final labor and parts and marks the job delivered.
    ///
    /// Finalizing again re-prices the job but keeps its invoice number and
    /// first invoice date.
    pub async fn finalize_invoice(&self, id: &str, request: FinalizeInvoice) -> DbResult<ServiceRecord> {
        let checked = validate_price_cents("final_labor", request.final_labor_cents)
            .and_then(|_| validate_used_item_lines(&request.used_items));
        if let Err(err) = checked {
            warn!(id = %id, error = %err, "Finalize rejected");
            return Err(err.into());
        }

        let now = Utc::now();
        let mut work = self.writer.begin().await?;
        let mut current = record::fetch_required(&mut work.tx, id).await?;

        if let Err(err) = current.finalize(request.final_labor_cents, request.warranty, now) {
            warn!(id = %id, error = %err, "Finalize rejected");
            return Err(err.into());
        }
        settle_items(&mut work.tx, self.writer.policy(), &mut current, &request.used_items).await?;
        current.updated_at = now;

        record::update(&mut work.tx, &current).await?;
        work.commit().await?;

        info!(
            id = %id,
            invoice = current.final_invoice_number.as_deref().unwrap_or_default(),
            total_cents = current.final_total_cents.unwrap_or_default(),
            "Invoice finalized"
        );
        Ok(current)
    }

    /// Deletes a job and returns its parts to stock.
    ///
    /// A second delete of the same job is `NotFound` and credits nothing.
    pub async fn delete_record(&self, id: &str) -> DbResult<ServiceRecord> {
        let now = Utc::now();
        let mut work = self.writer.begin().await?;
        let current = record::fetch_required(&mut work.tx, id).await?;

        let deltas = release_all(&current.used_items);
        ledger::apply_all(&mut work.tx, self.writer.policy(), &deltas, now).await?;
        record::delete(&mut work.tx, id).await?;
        work.commit().await?;

        info!(id = %id, returned = deltas.len(), "Service record deleted");
        Ok(current)
    }
}

/// Replaces a job's lines and moves stock by the difference.
async fn settle_items(
    conn: &mut SqliteConnection,
    policy: StockPolicy,
    current: &mut ServiceRecord,
    lines: &[UsedItemLine],
) -> DbResult<()> {
    let items = resolve_items(conn, &current.used_items, lines).await?;
    let deltas = reconcile(&current.used_items, &items);
    ledger::apply_all(conn, policy, &deltas, Utc::now()).await?;
    current.set_used_items(items);
    Ok(())
}

/// Turns lines into snapshots: existing items keep theirs, new products are
/// copied from the catalog.
async fn resolve_items(
    conn: &mut SqliteConnection,
    existing: &[UsedItem],
    lines: &[UsedItemLine],
) -> DbResult<Vec<UsedItem>> {
    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let item = match existing.iter().find(|i| i.product_id == line.product_id) {
            Some(kept) => UsedItem {
                quantity: line.quantity,
                ..kept.clone()
            },
            None => {
                let product = product::fetch_required(conn, &line.product_id).await?;
                UsedItem::snapshot(&product, line.quantity)
            }
        };
        items.push(item);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::service::testing;
    use repairdesk_core::{
        CoreError, ErrorKind, ProductDetailsPatch, ValidationError, WarrantySnapshot,
    };

    fn lines(items: &[(&str, i64)]) -> Vec<UsedItemLine> {
        items
            .iter()
            .map(|(id, qty)| UsedItemLine::new(*id, *qty))
            .collect()
    }

    fn with_items(items: Vec<UsedItemLine>) -> ServiceRecordPatch {
        ServiceRecordPatch {
            used_items: Some(items),
            ..Default::default()
        }
    }

    fn status(next: WorkStatus) -> ServiceRecordPatch {
        ServiceRecordPatch {
            work_status: Some(next),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_codes() {
        let db = testing::db().await;
        let year = Utc::now().year();

        let first = db.settlement().create_record(testing::intake("John")).await.unwrap();
        let second = db.settlement().create_record(testing::intake("Jane")).await.unwrap();

        assert_eq!(first.id, format!("JOB-{year}-0001"));
        assert_eq!(second.id, format!("JOB-{year}-0002"));
        assert_eq!(first.work_status, WorkStatus::InQueue);
        assert!(first.used_items.is_empty());
        assert!(first.final_invoice_number.is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_blank_employee() {
        let db = testing::db().await;
        let mut input = testing::intake("John");
        input.employee = " ".to_string();

        let err = db.settlement().create_record(input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(db.records().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_code_after_highest_even_with_gaps() {
        let db = testing::db().await;
        let year = Utc::now().year();

        let a = db.settlement().create_record(testing::intake("A")).await.unwrap();
        let b = db.settlement().create_record(testing::intake("B")).await.unwrap();
        db.settlement().delete_record(&a.id).await.unwrap();

        let c = db.settlement().create_record(testing::intake("C")).await.unwrap();
        assert_eq!(b.id, format!("JOB-{year}-0002"));
        assert_eq!(c.id, format!("JOB-{year}-0003"));
    }

    #[tokio::test]
    async fn test_concurrent_intake_never_collides() {
        let db = testing::db().await;

        let mut handles = Vec::new();
        for i in 0..8 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                db.settlement()
                    .create_record(testing::intake(&format!("Customer {i}")))
                    .await
                    .unwrap()
                    .id
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }

    /// Screen ×1 + Battery ×1, then Screen ×3 only.
    #[tokio::test]
    async fn test_edit_moves_only_the_difference() {
        let db = testing::db().await;
        let screen = testing::part(&db, "Screen", 5000, 10).await;
        let battery = testing::part(&db, "Battery", 3000, 5).await;
        let job = db.settlement().create_record(testing::intake("John")).await.unwrap();

        db.settlement()
            .update_record(&job.id, with_items(lines(&[(screen.id.as_str(), 1), (battery.id.as_str(), 1)])))
            .await
            .unwrap();
        assert_eq!(testing::stock(&db, &screen).await, 9);
        assert_eq!(testing::stock(&db, &battery).await, 4);

        let updated = db
            .settlement()
            .update_record(&job.id, with_items(lines(&[(screen.id.as_str(), 3)])))
            .await
            .unwrap();
        assert_eq!(testing::stock(&db, &screen).await, 7);
        assert_eq!(testing::stock(&db, &battery).await, 5);
        assert_eq!(updated.used_items.len(), 1);
        assert_eq!(updated.used_items[0].quantity, 3);
    }

    /// Screen ×3 (10 → 7), cut to ×1 (→ 9), then delete (→ 10).
    #[tokio::test]
    async fn test_reducing_quantity_returns_the_difference() {
        let db = testing::db().await;
        let screen = testing::part(&db, "Screen", 5000, 10).await;
        let job = db.settlement().create_record(testing::intake("John")).await.unwrap();

        db.settlement()
            .update_record(&job.id, with_items(lines(&[(screen.id.as_str(), 3)])))
            .await
            .unwrap();
        assert_eq!(testing::stock(&db, &screen).await, 7);

        let reduced = db
            .settlement()
            .update_record(&job.id, with_items(lines(&[(screen.id.as_str(), 1)])))
            .await
            .unwrap();
        assert_eq!(reduced.used_items[0].quantity, 1);
        assert_eq!(testing::stock(&db, &screen).await, 9);

        db.settlement().delete_record(&job.id).await.unwrap();
        assert_eq!(testing::stock(&db, &screen).await, 10);
    }

    /// Two parts and a service on one job: delete credits only the parts.
    #[tokio::test]
    async fn test_delete_credits_parts_but_not_services() {
        let db = testing::db().await;
        let screen = testing::part(&db, "Screen", 5000, 10).await;
        let battery = testing::part(&db, "Battery", 3000, 5).await;
        let labor = testing::service(&db, "Diagnostics", 2000).await;
        let job = db.settlement().create_record(testing::intake("John")).await.unwrap();

        db.settlement()
            .update_record(
                &job.id,
                with_items(lines(&[
                    (screen.id.as_str(), 1),
                    (battery.id.as_str(), 2),
                    (labor.id.as_str(), 4),
                ])),
            )
            .await
            .unwrap();
        assert_eq!(testing::stock(&db, &screen).await, 9);
        assert_eq!(testing::stock(&db, &battery).await, 3);
        assert_eq!(testing::stock(&db, &labor).await, 0);

        let deleted = db.settlement().delete_record(&job.id).await.unwrap();
        assert_eq!(deleted.used_items.len(), 3);
        assert_eq!(testing::stock(&db, &screen).await, 10);
        assert_eq!(testing::stock(&db, &battery).await, 5);
        assert_eq!(testing::stock(&db, &labor).await, 0);
    }

    #[tokio::test]
    async fn test_oversized_labor_rejected() {
        let db = testing::db().await;
        let screen = testing::part(&db, "Screen", 5000, 10).await;
        let job = db.settlement().create_record(testing::intake("John")).await.unwrap();

        let err = db
            .settlement()
            .finalize_invoice(
                &job.id,
                FinalizeInvoice {
                    final_labor_cents: i64::MAX,
                    used_items: lines(&[(screen.id.as_str(), 2)]),
                    warranty: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        let stored = db.records().get_by_id(&job.id).await.unwrap().unwrap();
        assert!(stored.final_total_cents.is_none());
        assert_eq!(testing::stock(&db, &screen).await, 10);
    }

    #[tokio::test]
    async fn test_services_never_touch_stock() {
        let db = testing::db().await;
        let labor = testing::service(&db, "Diagnostics", 2000).await;
        let job = db.settlement().create_record(testing::intake("John")).await.unwrap();

        let updated = db
            .settlement()
            .update_record(&job.id, with_items(lines(&[(labor.id.as_str(), 2)])))
            .await
            .unwrap();
        assert_eq!(updated.parts_total().cents(), 4000);
        assert_eq!(testing::stock(&db, &labor).await, 0);

        db.settlement().delete_record(&job.id).await.unwrap();
        assert_eq!(testing::stock(&db, &labor).await, 0);
    }

    #[tokio::test]
    async fn test_snapshot_survives_catalog_edit() {
        let db = testing::db().await;
        let screen = testing::part(&db, "Screen", 5000, 10).await;
        let job = db.settlement().create_record(testing::intake("John")).await.unwrap();
        db.settlement()
            .update_record(&job.id, with_items(lines(&[(screen.id.as_str(), 1)])))
            .await
            .unwrap();

        db.products()
            .update_details(
                &screen.id,
                ProductDetailsPatch {
                    name: Some("Screen v2".to_string()),
                    sale_price_cents: Some(9000),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // Quantity change on an existing line keeps the old price.
        let updated = db
            .settlement()
            .update_record(&job.id, with_items(lines(&[(screen.id.as_str(), 2)])))
            .await
            .unwrap();
        assert_eq!(updated.used_items[0].name, "Screen");
        assert_eq!(updated.used_items[0].sale_price_cents, 5000);
        assert_eq!(updated.parts_total().cents(), 10000);

        // Dropping and re-adding takes the new snapshot.
        db.settlement()
            .update_record(&job.id, with_items(Vec::new()))
            .await
            .unwrap();
        let readded = db
            .settlement()
            .update_record(&job.id, with_items(lines(&[(screen.id.as_str(), 1)])))
            .await
            .unwrap();
        assert_eq!(readded.used_items[0].sale_price_cents, 9000);
        assert_eq!(testing::stock(&db, &screen).await, 9);
    }

    #[tokio::test]
    async fn test_rejections_leave_stock_untouched() {
        let db = testing::db().await;
        let screen = testing::part(&db, "Screen", 5000, 10).await;
        let battery = testing::part(&db, "Battery", 3000, 1).await;
        let job = db.settlement().create_record(testing::intake("John")).await.unwrap();

        // Zero quantity
        let err = db
            .settlement()
            .update_record(&job.id, with_items(lines(&[(screen.id.as_str(), 0)])))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        // Duplicate lines
        let err = db
            .settlement()
            .update_record(&job.id, with_items(lines(&[(screen.id.as_str(), 1), (screen.id.as_str(), 2)])))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::Duplicate { .. }))
        ));

        // Unknown product
        let err = db
            .settlement()
            .update_record(&job.id, with_items(lines(&[(screen.id.as_str(), 1), ("missing", 1)])))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        // Not enough batteries: the screen delta must not be applied either.
        let err = db
            .settlement()
            .update_record(&job.id, with_items(lines(&[(screen.id.as_str(), 2), (battery.id.as_str(), 2)])))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Consistency);

        assert_eq!(testing::stock(&db, &screen).await, 10);
        assert_eq!(testing::stock(&db, &battery).await, 1);
        let stored = db.records().get_by_id(&job.id).await.unwrap().unwrap();
        assert!(stored.used_items.is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_record() {
        let db = testing::db().await;
        let err = db
            .settlement()
            .update_record("JOB-2024-9999", ServiceRecordPatch::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_lifecycle_enforced() {
        let db = testing::db().await;
        let job = db.settlement().create_record(testing::intake("John")).await.unwrap();

        let err = db
            .settlement()
            .update_record(&job.id, status(WorkStatus::Repaired))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidStatusTransition { .. })
        ));

        db.settlement()
            .update_record(&job.id, status(WorkStatus::BeingRepaired))
            .await
            .unwrap();
        let repaired = db
            .settlement()
            .update_record(&job.id, status(WorkStatus::Repaired))
            .await
            .unwrap();
        assert_eq!(repaired.work_status, WorkStatus::Repaired);

        // Delivered only through finalize.
        assert!(db
            .settlement()
            .update_record(&job.id, status(WorkStatus::RepairedAndDelivered))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_refused_job_cannot_be_finalized() {
        let db = testing::db().await;
        let screen = testing::part(&db, "Screen", 5000, 10).await;
        let job = db.settlement().create_record(testing::intake("John")).await.unwrap();
        db.settlement()
            .update_record(&job.id, status(WorkStatus::BeingRepaired))
            .await
            .unwrap();
        db.settlement()
            .update_record(&job.id, status(WorkStatus::CustomerRefused))
            .await
            .unwrap();

        let err = db
            .settlement()
            .finalize_invoice(
                &job.id,
                FinalizeInvoice {
                    final_labor_cents: 1000,
                    used_items: lines(&[(screen.id.as_str(), 1)]),
                    warranty: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(testing::stock(&db, &screen).await, 10);
    }

    /// Intake, finalize with 2 × 25.00 and 100.00 labor, then finalize again.
    #[tokio::test]
    async fn test_finalize_is_idempotent() {
        let db = testing::db().await;
        let part = testing::part(&db, "Charging Port", 2500, 10).await;
        let job = db.settlement().create_record(testing::intake("John Doe")).await.unwrap();
        let request = FinalizeInvoice {
            final_labor_cents: 10000,
            used_items: lines(&[(part.id.as_str(), 2)]),
            warranty: Some(WarrantySnapshot {
                id: "w1".to_string(),
                name: "90 days".to_string(),
                duration_months: 3,
            }),
        };

        let first = db.settlement().finalize_invoice(&job.id, request.clone()).await.unwrap();
        let expected_invoice = job.id.replacen("JOB", "INV", 1);
        assert_eq!(first.final_invoice_number.as_deref(), Some(expected_invoice.as_str()));
        assert_eq!(first.final_total_cents, Some(15000));
        assert_eq!(first.work_status, WorkStatus::RepairedAndDelivered);
        assert_eq!(first.warranty.as_ref().map(|w| w.duration_months), Some(3));
        assert_eq!(testing::stock(&db, &part).await, 8);

        let second = db.settlement().finalize_invoice(&job.id, request).await.unwrap();
        assert_eq!(second.final_invoice_number, first.final_invoice_number);
        assert_eq!(second.invoiced_at, first.invoiced_at);
        assert_eq!(second.final_total_cents, Some(15000));
        assert_eq!(testing::stock(&db, &part).await, 8);

        let stored = db.records().get_by_id(&job.id).await.unwrap().unwrap();
        assert!(stored.totals_consistent());
        assert_eq!(stored.warranty, first.warranty);
    }

    #[tokio::test]
    async fn test_edit_after_invoice_keeps_total_in_step() {
        let db = testing::db().await;
        let part = testing::part(&db, "Charging Port", 2500, 10).await;
        let job = db.settlement().create_record(testing::intake("John")).await.unwrap();
        db.settlement()
            .finalize_invoice(
                &job.id,
                FinalizeInvoice {
                    final_labor_cents: 10000,
                    used_items: lines(&[(part.id.as_str(), 2)]),
                    warranty: None,
                },
            )
            .await
            .unwrap();

        let updated = db
            .settlement()
            .update_record(&job.id, with_items(lines(&[(part.id.as_str(), 3)])))
            .await
            .unwrap();
        assert_eq!(updated.final_total_cents, Some(17500));
        assert!(updated.totals_consistent());
        assert_eq!(testing::stock(&db, &part).await, 7);
    }

    #[tokio::test]
    async fn test_delete_returns_stock_once() {
        let db = testing::db().await;
        let screen = testing::part(&db, "Screen", 5000, 10).await;
        let job = db.settlement().create_record(testing::intake("John")).await.unwrap();
        db.settlement()
            .update_record(&job.id, with_items(lines(&[(screen.id.as_str(), 2)])))
            .await
            .unwrap();
        assert_eq!(testing::stock(&db, &screen).await, 8);

        let deleted = db.settlement().delete_record(&job.id).await.unwrap();
        assert_eq!(deleted.used_items.len(), 1);
        assert_eq!(testing::stock(&db, &screen).await, 10);
        assert!(db.records().get_by_id(&job.id).await.unwrap().is_none());

        let err = db.settlement().delete_record(&job.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(testing::stock(&db, &screen).await, 10);
    }

    #[tokio::test]
    async fn test_sales_history() {
        let db = testing::db().await;
        let screen = testing::part(&db, "Screen", 5000, 10).await;
        let battery = testing::part(&db, "Battery", 3000, 10).await;

        let john = db.settlement().create_record(testing::intake("John Doe")).await.unwrap();
        let jane = db.settlement().create_record(testing::intake("Jane Roe")).await.unwrap();
        db.settlement().create_record(testing::intake("Open Job")).await.unwrap();

        let john = db
            .settlement()
            .finalize_invoice(
                &john.id,
                FinalizeInvoice {
                    final_labor_cents: 1000,
                    used_items: lines(&[(screen.id.as_str(), 1)]),
                    warranty: None,
                },
            )
            .await
            .unwrap();
        db.settlement()
            .finalize_invoice(
                &jane.id,
                FinalizeInvoice {
                    final_labor_cents: 1000,
                    used_items: lines(&[(battery.id.as_str(), 1)]),
                    warranty: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(db.records().list().await.unwrap().len(), 3);
        assert_eq!(db.records().list_invoiced("").await.unwrap().len(), 2);

        let by_name = db.records().list_invoiced("john").await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, john.id);

        let by_item = db.records().list_invoiced("battery").await.unwrap();
        assert_eq!(by_item.len(), 1);
        assert_eq!(by_item[0].id, jane.id);

        let invoice = john.final_invoice_number.clone().unwrap();
        let found = db.records().get_by_invoice_number(&invoice).await.unwrap().unwrap();
        assert_eq!(found.id, john.id);
        assert!(db.records().get_by_invoice_number("INV-1999-0001").await.unwrap().is_none());
    }
}
