//! # Purchase Intake
//!
//! Records stock bought from a supplier and credits it in the same
//! transaction.
//!
//! ```text
//! NewPurchase ──► validate ──► product exists & is a Product?
//!                                   │
//!                                   ▼
//!                 purchases row (+ name snapshots) ──► ledger +quantity
//! ```

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use repairdesk_core::validation::validate_new_purchase;
use repairdesk_core::{Money, NewPurchase, PurchaseRecord, ValidationError};

use crate::error::DbResult;
use crate::repository::product;
use crate::repository::purchase::{self, PurchaseRepository};
use crate::service::{ledger, Writer};

#[derive(Debug, Clone)]
pub struct PurchaseIntake {
    writer: Writer,
}

impl PurchaseIntake {
    pub(crate) fn new(writer: Writer) -> Self {
        PurchaseIntake { writer }
    }

    fn reads(&self) -> PurchaseRepository {
        PurchaseRepository::new(self.writer.pool().clone())
    }

    /// Records a purchase and adds its quantity to stock.
    ///
    /// ## Errors
    /// * `NotFound` - unknown product
    /// * `Domain(Validation(..))` - bad quantity/price, blank supplier, or the
    ///   product is a service
    pub async fn add_purchase(&self, input: NewPurchase) -> DbResult<PurchaseRecord> {
        if let Err(err) = validate_new_purchase(&input) {
            warn!(error = %err, "Purchase rejected");
            return Err(err.into());
        }

        let now = Utc::now();
        let mut work = self.writer.begin().await?;

        let item = product::fetch_required(&mut work.tx, &input.product_id).await?;
        if !item.kind.tracks_stock() {
            warn!(product_id = %item.id, "Purchase of a service rejected");
            return Err(ValidationError::InvalidFormat {
                field: "product_id".to_string(),
                reason: format!("{} is a service and cannot be purchased", item.name),
            }
            .into());
        }

        let record = PurchaseRecord {
            id: Uuid::new_v4().to_string(),
            date: input.date,
            supplier_id: input.supplier_id,
            supplier_name: input.supplier_name.trim().to_string(),
            product_id: item.id.clone(),
            product_name: item.name.clone(),
            quantity: input.quantity,
            unit_price_cents: input.unit_price_cents,
            total_cents: Money::from_cents(input.unit_price_cents)
                .multiply_quantity(input.quantity)
                .cents(),
            notes: input.notes.filter(|n| !n.trim().is_empty()),
            created_at: now,
        };

        purchase::insert(&mut work.tx, &record).await?;
        let updated = ledger::adjust(
            &mut work.tx,
            self.writer.policy(),
            &record.product_id,
            record.quantity,
            now,
        )
        .await?;
        work.commit().await?;

        info!(
            id = %record.id,
            product_id = %record.product_id,
            quantity = record.quantity,
            stock = updated.stock,
            "Purchase recorded"
        );
        Ok(record)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<PurchaseRecord>> {
        self.reads().get_by_id(id).await
    }

    /// Newest first.
    pub async fn list(&self) -> DbResult<Vec<PurchaseRecord>> {
        self.reads().list().await
    }

    /// Product or supplier name contains `query` (case-insensitive).
    pub async fn search(&self, query: &str) -> DbResult<Vec<PurchaseRecord>> {
        self.reads().search(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing;
    use chrono::NaiveDate;
    use repairdesk_core::{ErrorKind, FinalizeInvoice, UsedItemLine};

    fn purchase(product_id: &str, date: (i32, u32, u32), quantity: i64) -> NewPurchase {
        NewPurchase {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            supplier_id: "s1".to_string(),
            supplier_name: "Parts Wholesale".to_string(),
            product_id: product_id.to_string(),
            quantity,
            unit_price_cents: 1200,
            notes: Some("  ".to_string()),
        }
    }

    #[tokio::test]
    async fn test_purchase_credits_stock() {
        let db = testing::db().await;
        let screen = testing::part(&db, "Screen", 5000, 2).await;

        let record = db
            .purchases()
            .add_purchase(purchase(&screen.id, (2024, 3, 1), 10))
            .await
            .unwrap();

        assert_eq!(record.total_cents, 12000);
        assert_eq!(record.product_name, "Screen");
        assert_eq!(record.notes, None);
        assert_eq!(testing::stock(&db, &screen).await, 12);

        let stored = db.purchases().get_by_id(&record.id).await.unwrap().unwrap();
        assert_eq!(stored, record);
    }

    #[tokio::test]
    async fn test_purchase_rejections() {
        let db = testing::db().await;
        let screen = testing::part(&db, "Screen", 5000, 2).await;
        let labor = testing::service(&db, "Diagnostics", 2000).await;

        let err = db
            .purchases()
            .add_purchase(purchase(&screen.id, (2024, 3, 1), 0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = db
            .purchases()
            .add_purchase(purchase("missing", (2024, 3, 1), 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = db
            .purchases()
            .add_purchase(purchase(&labor.id, (2024, 3, 1), 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert!(db.purchases().list().await.unwrap().is_empty());
        assert_eq!(testing::stock(&db, &screen).await, 2);
        assert_eq!(testing::stock(&db, &labor).await, 0);
    }

    #[tokio::test]
    async fn test_history_order_and_search() {
        let db = testing::db().await;
        let screen = testing::part(&db, "Screen", 5000, 0).await;
        let battery = testing::part(&db, "Battery", 3000, 0).await;

        db.purchases()
            .add_purchase(purchase(&screen.id, (2024, 1, 10), 1))
            .await
            .unwrap();
        db.purchases()
            .add_purchase(purchase(&battery.id, (2024, 2, 10), 1))
            .await
            .unwrap();

        let all = db.purchases().list().await.unwrap();
        let names: Vec<_> = all.iter().map(|p| p.product_name.as_str()).collect();
        assert_eq!(names, vec!["Battery", "Screen"]);

        assert_eq!(db.purchases().search("batt").await.unwrap().len(), 1);
        assert_eq!(db.purchases().search("wholesale").await.unwrap().len(), 2);
        assert_eq!(db.purchases().search("").await.unwrap().len(), 2);
    }

    /// Purchase 10, use 3 on a job, delete the job: back to 10.
    #[tokio::test]
    async fn test_purchase_then_job_then_delete() {
        let db = testing::db().await;
        let screen = testing::part(&db, "Screen", 5000, 0).await;

        db.purchases()
            .add_purchase(purchase(&screen.id, (2024, 3, 1), 10))
            .await
            .unwrap();
        assert_eq!(testing::stock(&db, &screen).await, 10);

        let job = db.settlement().create_record(testing::intake("John")).await.unwrap();
        db.settlement()
            .finalize_invoice(
                &job.id,
                FinalizeInvoice {
                    final_labor_cents: 0,
                    used_items: vec![UsedItemLine::new(&screen.id, 3)],
                    warranty: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(testing::stock(&db, &screen).await, 7);

        db.settlement().delete_record(&job.id).await.unwrap();
        assert_eq!(testing::stock(&db, &screen).await, 10);
    }
}
