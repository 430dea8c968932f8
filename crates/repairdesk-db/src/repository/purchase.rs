//! # Purchase Repository
//!
//! Append-only supplier purchases. There is no update or delete: a wrong
//! purchase is corrected by a new one.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::like_pattern;
use repairdesk_core::validation::validate_search_query;
use repairdesk_core::PurchaseRecord;

const COLUMNS: &str = "id, date, supplier_id, supplier_name, product_id, product_name, \
                       quantity, unit_price_cents, total_cents, notes, created_at";

pub async fn insert(conn: &mut SqliteConnection, purchase: &PurchaseRecord) -> DbResult<()> {
    debug!(id = %purchase.id, product_id = %purchase.product_id, "Inserting purchase");

    sqlx::query(
        r#"
        INSERT INTO purchases (
            id, date, supplier_id, supplier_name, product_id, product_name,
            quantity, unit_price_cents, total_cents, notes, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&purchase.id)
    .bind(purchase.date)
    .bind(&purchase.supplier_id)
    .bind(&purchase.supplier_name)
    .bind(&purchase.product_id)
    .bind(&purchase.product_name)
    .bind(purchase.quantity)
    .bind(purchase.unit_price_cents)
    .bind(purchase.total_cents)
    .bind(purchase.notes.as_deref())
    .bind(purchase.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<PurchaseRecord>> {
    let sql = format!("SELECT {COLUMNS} FROM purchases WHERE id = ?1");
    let purchase = sqlx::query_as::<_, PurchaseRecord>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(purchase)
}

/// Newest first.
pub async fn list(conn: &mut SqliteConnection) -> DbResult<Vec<PurchaseRecord>> {
    let sql = format!("SELECT {COLUMNS} FROM purchases ORDER BY date DESC, created_at DESC");
    let purchases = sqlx::query_as::<_, PurchaseRecord>(&sql)
        .fetch_all(&mut *conn)
        .await?;
    Ok(purchases)
}

/// Case-insensitive match on the product or supplier name snapshot.
pub async fn search(conn: &mut SqliteConnection, term: &str) -> DbResult<Vec<PurchaseRecord>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM purchases \
         WHERE product_name LIKE ?1 ESCAPE '\\' OR supplier_name LIKE ?1 ESCAPE '\\' \
         ORDER BY date DESC, created_at DESC"
    );
    let purchases = sqlx::query_as::<_, PurchaseRecord>(&sql)
        .bind(like_pattern(term))
        .fetch_all(&mut *conn)
        .await?;
    Ok(purchases)
}

/// Lock-free reads over the purchase history.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<PurchaseRecord>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    pub async fn list(&self) -> DbResult<Vec<PurchaseRecord>> {
        let mut conn = self.pool.acquire().await?;
        list(&mut conn).await
    }

    /// Empty query returns the full history.
    pub async fn search(&self, query: &str) -> DbResult<Vec<PurchaseRecord>> {
        let query = validate_search_query(query)?;
        let mut conn = self.pool.acquire().await?;
        if query.is_empty() {
            return list(&mut conn).await;
        }
        search(&mut conn, &query).await
    }
}
