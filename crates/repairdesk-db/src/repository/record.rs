//! # Service Record Repository
//!
//! Jobs are stored across two tables: the record row (with the contact and
//! warranty snapshots flattened into columns) and its `record_items` lines.
//!
//! ```text
//! service_records                    record_items
//! ┌──────────────────────┐          ┌──────────────────────────────┐
//! │ JOB-2024-0001        │◄─────────│ record_id, position = 0      │
//! │ contact_* / warranty_*│         │ product_id + frozen snapshot │
//! │ final_* totals       │◄─────────│ record_id, position = 1      │
//! └──────────────────────┘          └──────────────────────────────┘
//! ```
//!
//! Lines are rewritten wholesale on every update; their order is kept in
//! `position`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use repairdesk_core::numbering::JobNumber;
use repairdesk_core::validation::validate_search_query;
use repairdesk_core::{ContactRef, ServiceRecord, UsedItem, WarrantySnapshot, WorkStatus};

const COLUMNS: &str = "id, created_at, employee, contact_id, contact_name, contact_phone, \
                       device_description, fault_description, work_status, \
                       warranty_id, warranty_name, warranty_duration_months, \
                       final_invoice_number, estimated_labor_cents, final_labor_cents, \
                       final_total_cents, invoiced_at, updated_at";

/// Record ids bound per `IN (..)` when loading lines.
const HYDRATE_CHUNK: usize = 500;

const ITEM_COLUMNS: &str = "product_id, name, kind, cost_price_cents, sale_price_cents, \
                            has_warranty, quantity";

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct RecordRow {
    id: String,
    created_at: DateTime<Utc>,
    employee: String,
    contact_id: String,
    contact_name: String,
    contact_phone: String,
    device_description: String,
    fault_description: String,
    work_status: WorkStatus,
    warranty_id: Option<String>,
    warranty_name: Option<String>,
    warranty_duration_months: Option<u32>,
    final_invoice_number: Option<String>,
    estimated_labor_cents: i64,
    final_labor_cents: Option<i64>,
    final_total_cents: Option<i64>,
    invoiced_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl RecordRow {
    fn into_record(self, used_items: Vec<UsedItem>) -> ServiceRecord {
        let warranty = match (self.warranty_id, self.warranty_name) {
            (Some(id), Some(name)) => Some(WarrantySnapshot {
                id,
                name,
                duration_months: self.warranty_duration_months.unwrap_or(0),
            }),
            _ => None,
        };

        ServiceRecord {
            id: self.id,
            created_at: self.created_at,
            employee: self.employee,
            contact: ContactRef {
                id: self.contact_id,
                name: self.contact_name,
                phone: self.contact_phone,
            },
            device_description: self.device_description,
            fault_description: self.fault_description,
            work_status: self.work_status,
            used_items,
            warranty,
            final_invoice_number: self.final_invoice_number,
            estimated_labor_cents: self.estimated_labor_cents,
            final_labor_cents: self.final_labor_cents,
            final_total_cents: self.final_total_cents,
            invoiced_at: self.invoiced_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    record_id: String,
    #[sqlx(flatten)]
    item: UsedItem,
}

async fn items_for(conn: &mut SqliteConnection, record_id: &str) -> DbResult<Vec<UsedItem>> {
    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM record_items WHERE record_id = ?1 ORDER BY position"
    );
    let items = sqlx::query_as::<_, UsedItem>(&sql)
        .bind(record_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(items)
}

/// Attaches lines to a batch of rows, one query per `HYDRATE_CHUNK` records.
async fn hydrate(conn: &mut SqliteConnection, rows: Vec<RecordRow>) -> DbResult<Vec<ServiceRecord>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let mut by_record: HashMap<String, Vec<UsedItem>> = HashMap::new();
    for chunk in rows.chunks(HYDRATE_CHUNK) {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT record_id, {ITEM_COLUMNS} FROM record_items WHERE record_id IN ("
        ));
        let mut ids = query.separated(", ");
        for row in chunk {
            ids.push_bind(row.id.clone());
        }
        ids.push_unseparated(") ORDER BY record_id, position");

        let item_rows = query.build_query_as::<ItemRow>().fetch_all(&mut *conn).await?;
        for row in item_rows {
            by_record.entry(row.record_id).or_default().push(row.item);
        }
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let items = by_record.remove(&row.id).unwrap_or_default();
            row.into_record(items)
        })
        .collect())
}

// =============================================================================
// Queries
// =============================================================================

pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<ServiceRecord>> {
    let sql = format!("SELECT {COLUMNS} FROM service_records WHERE id = ?1");
    let row = sqlx::query_as::<_, RecordRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => {
            let items = items_for(conn, &row.id).await?;
            Ok(Some(row.into_record(items)))
        }
        None => Ok(None),
    }
}

/// Like [`fetch`], but a missing record is an error.
pub async fn fetch_required(conn: &mut SqliteConnection, id: &str) -> DbResult<ServiceRecord> {
    fetch(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("ServiceRecord", id))
}

pub async fn fetch_by_invoice_number(
    conn: &mut SqliteConnection,
    invoice_number: &str,
) -> DbResult<Option<ServiceRecord>> {
    let id: Option<String> =
        sqlx::query_scalar("SELECT id FROM service_records WHERE final_invoice_number = ?1")
            .bind(invoice_number)
            .fetch_optional(&mut *conn)
            .await?;

    match id {
        Some(id) => fetch(conn, &id).await,
        None => Ok(None),
    }
}

/// Every job, newest first.
pub async fn list(conn: &mut SqliteConnection) -> DbResult<Vec<ServiceRecord>> {
    let sql = format!("SELECT {COLUMNS} FROM service_records ORDER BY created_at DESC, id DESC");
    let rows = sqlx::query_as::<_, RecordRow>(&sql)
        .fetch_all(&mut *conn)
        .await?;
    hydrate(conn, rows).await
}

/// Delivered and invoiced jobs, most recently invoiced first.
pub async fn list_invoiced(conn: &mut SqliteConnection) -> DbResult<Vec<ServiceRecord>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM service_records \
         WHERE work_status = 'repaired_and_delivered' AND final_invoice_number IS NOT NULL \
         ORDER BY invoiced_at DESC, id DESC"
    );
    let rows = sqlx::query_as::<_, RecordRow>(&sql)
        .fetch_all(&mut *conn)
        .await?;
    hydrate(conn, rows).await
}

/// Job codes already issued for `year`.
pub async fn ids_for_year(conn: &mut SqliteConnection, year: i32) -> DbResult<Vec<String>> {
    let ids = sqlx::query_scalar("SELECT id FROM service_records WHERE id LIKE ?1")
        .bind(JobNumber::year_pattern(year))
        .fetch_all(&mut *conn)
        .await?;
    Ok(ids)
}

// =============================================================================
// Writes
// =============================================================================

pub async fn insert(conn: &mut SqliteConnection, record: &ServiceRecord) -> DbResult<()> {
    debug!(id = %record.id, "Inserting service record");

    sqlx::query(
        r#"
        INSERT INTO service_records (
            id, created_at, employee, contact_id, contact_name, contact_phone,
            device_description, fault_description, work_status,
            warranty_id, warranty_name, warranty_duration_months,
            final_invoice_number, estimated_labor_cents, final_labor_cents,
            final_total_cents, invoiced_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
        "#,
    )
    .bind(&record.id)
    .bind(record.created_at)
    .bind(&record.employee)
    .bind(&record.contact.id)
    .bind(&record.contact.name)
    .bind(&record.contact.phone)
    .bind(&record.device_description)
    .bind(&record.fault_description)
    .bind(record.work_status)
    .bind(record.warranty.as_ref().map(|w| w.id.as_str()))
    .bind(record.warranty.as_ref().map(|w| w.name.as_str()))
    .bind(record.warranty.as_ref().map(|w| w.duration_months))
    .bind(record.final_invoice_number.as_deref())
    .bind(record.estimated_labor_cents)
    .bind(record.final_labor_cents)
    .bind(record.final_total_cents)
    .bind(record.invoiced_at)
    .bind(record.updated_at)
    .execute(&mut *conn)
    .await?;

    insert_items(conn, &record.id, &record.used_items).await
}

/// Rewrites the record row and replaces its lines.
pub async fn update(conn: &mut SqliteConnection, record: &ServiceRecord) -> DbResult<()> {
    debug!(id = %record.id, items = record.used_items.len(), "Updating service record");

    let result = sqlx::query(
        r#"
        UPDATE service_records SET
            contact_id = ?2,
            contact_name = ?3,
            contact_phone = ?4,
            device_description = ?5,
            fault_description = ?6,
            work_status = ?7,
            warranty_id = ?8,
            warranty_name = ?9,
            warranty_duration_months = ?10,
            final_invoice_number = ?11,
            estimated_labor_cents = ?12,
            final_labor_cents = ?13,
            final_total_cents = ?14,
            invoiced_at = ?15,
            updated_at = ?16
        WHERE id = ?1
        "#,
    )
    .bind(&record.id)
    .bind(&record.contact.id)
    .bind(&record.contact.name)
    .bind(&record.contact.phone)
    .bind(&record.device_description)
    .bind(&record.fault_description)
    .bind(record.work_status)
    .bind(record.warranty.as_ref().map(|w| w.id.as_str()))
    .bind(record.warranty.as_ref().map(|w| w.name.as_str()))
    .bind(record.warranty.as_ref().map(|w| w.duration_months))
    .bind(record.final_invoice_number.as_deref())
    .bind(record.estimated_labor_cents)
    .bind(record.final_labor_cents)
    .bind(record.final_total_cents)
    .bind(record.invoiced_at)
    .bind(record.updated_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("ServiceRecord", &record.id));
    }

    sqlx::query("DELETE FROM record_items WHERE record_id = ?1")
        .bind(&record.id)
        .execute(&mut *conn)
        .await?;

    insert_items(conn, &record.id, &record.used_items).await
}

async fn insert_items(
    conn: &mut SqliteConnection,
    record_id: &str,
    items: &[UsedItem],
) -> DbResult<()> {
    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO record_items (
                record_id, position, product_id, name, kind,
                cost_price_cents, sale_price_cents, has_warranty, quantity
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(record_id)
        .bind(position as i64)
        .bind(&item.product_id)
        .bind(&item.name)
        .bind(item.kind)
        .bind(item.cost_price_cents)
        .bind(item.sale_price_cents)
        .bind(item.has_warranty)
        .bind(item.quantity)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Removes a record; its lines go with it (`ON DELETE CASCADE`).
pub async fn delete(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    debug!(id = %id, "Deleting service record");

    let result = sqlx::query("DELETE FROM service_records WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("ServiceRecord", id));
    }

    Ok(())
}

// =============================================================================
// Read Repository
// =============================================================================

/// Lock-free reads over jobs and the sales history.
#[derive(Debug, Clone)]
pub struct RecordRepository {
    pool: SqlitePool,
}

impl RecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RecordRepository { pool }
    }

    /// ## Returns
    /// * `Ok(Some(ServiceRecord))` - Record found, with its used items
    /// * `Ok(None)` - No such job
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ServiceRecord>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// All jobs, newest first.
    pub async fn list(&self) -> DbResult<Vec<ServiceRecord>> {
        let mut conn = self.pool.acquire().await?;
        list(&mut conn).await
    }

    /// Sales history: invoiced jobs matching `search` on contact name,
    /// invoice number or used-item name. Empty search returns all of them.
    pub async fn list_invoiced(&self, search: &str) -> DbResult<Vec<ServiceRecord>> {
        let search = validate_search_query(search)?;
        let mut conn = self.pool.acquire().await?;
        let sales = list_invoiced(&mut conn).await?;

        let sales: Vec<ServiceRecord> = sales
            .into_iter()
            .filter(|r| r.is_invoiced() && r.matches_sale_search(&search))
            .collect();

        debug!(search = %search, count = sales.len(), "Listed invoiced records");
        Ok(sales)
    }

    pub async fn get_by_invoice_number(&self, invoice_number: &str) -> DbResult<Option<ServiceRecord>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_invoice_number(&mut conn, invoice_number).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing;
    use repairdesk_core::{FinalizeInvoice, ServiceRecordPatch, UsedItemLine};

    #[tokio::test]
    async fn test_hydrate_loads_only_requested_lines() {
        let db = testing::db().await;
        let screen = testing::part(&db, "Screen", 5000, 10).await;
        let battery = testing::part(&db, "Battery", 3000, 10).await;

        let open = db.settlement().create_record(testing::intake("Open")).await.unwrap();
        db.settlement()
            .update_record(
                &open.id,
                ServiceRecordPatch {
                    used_items: Some(vec![UsedItemLine::new(&screen.id, 2)]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let sold = db.settlement().create_record(testing::intake("Sold")).await.unwrap();
        db.settlement()
            .finalize_invoice(
                &sold.id,
                FinalizeInvoice {
                    final_labor_cents: 0,
                    used_items: vec![
                        UsedItemLine::new(&battery.id, 1),
                        UsedItemLine::new(&screen.id, 1),
                    ],
                    warranty: None,
                },
            )
            .await
            .unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let sql = format!("SELECT {COLUMNS} FROM service_records WHERE id = ?1");
        let rows = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(&sold.id)
            .fetch_all(&mut *conn)
            .await
            .unwrap();

        let records = hydrate(&mut conn, rows).await.unwrap();
        assert_eq!(records.len(), 1);
        let names: Vec<_> = records[0].used_items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Battery", "Screen"]);

        let all = list(&mut conn).await.unwrap();
        let open_items = &all.iter().find(|r| r.id == open.id).unwrap().used_items;
        assert_eq!(open_items.len(), 1);
        assert_eq!(open_items[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_hydrate_empty() {
        let db = testing::db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        assert!(hydrate(&mut conn, Vec::new()).await.unwrap().is_empty());
    }
}
