//! # Product Repository
//!
//! Catalog rows and the raw stock column.
//!
//! ## Stock Column
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Stock is only ever moved by delta:                                 │
//! │                                                                     │
//! │     UPDATE products SET stock = stock + ?delta                      │
//! │                                                                     │
//! │  and only through the ledger. `update_details` never touches it.    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::like_pattern;
use repairdesk_core::validation::validate_search_query;
use repairdesk_core::Product;

const COLUMNS: &str = "id, name, kind, cost_price_cents, sale_price_cents, stock, \
                       has_warranty, tags, created_at, updated_at";

// =============================================================================
// Queries
// =============================================================================

pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {COLUMNS} FROM products WHERE id = ?1");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(product)
}

/// Like [`fetch`], but a missing product is an error.
pub async fn fetch_required(conn: &mut SqliteConnection, id: &str) -> DbResult<Product> {
    fetch(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))
}

/// Whole catalog, ordered by name.
pub async fn list(conn: &mut SqliteConnection) -> DbResult<Vec<Product>> {
    let sql = format!("SELECT {COLUMNS} FROM products ORDER BY name COLLATE NOCASE");
    let products = sqlx::query_as::<_, Product>(&sql)
        .fetch_all(&mut *conn)
        .await?;
    Ok(products)
}

/// Case-insensitive substring match on name or any tag.
pub async fn search(conn: &mut SqliteConnection, term: &str) -> DbResult<Vec<Product>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM products \
         WHERE name LIKE ?1 ESCAPE '\\' \
            OR EXISTS (SELECT 1 FROM json_each(products.tags) t WHERE t.value LIKE ?1 ESCAPE '\\') \
         ORDER BY name COLLATE NOCASE"
    );
    let products = sqlx::query_as::<_, Product>(&sql)
        .bind(like_pattern(term))
        .fetch_all(&mut *conn)
        .await?;
    Ok(products)
}

/// Whether another product already uses `name` (ignoring case).
pub async fn name_taken(
    conn: &mut SqliteConnection,
    name: &str,
    except_id: Option<&str>,
) -> DbResult<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM products WHERE name = ?1 COLLATE NOCASE AND id != COALESCE(?2, '')",
    )
    .bind(name)
    .bind(except_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(count > 0)
}

/// Number of `(job lines, purchases)` pointing at a product.
pub async fn reference_counts(conn: &mut SqliteConnection, id: &str) -> DbResult<(i64, i64)> {
    let lines: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM record_items WHERE product_id = ?1")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    let purchases: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM purchases WHERE product_id = ?1")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    Ok((lines, purchases))
}

// =============================================================================
// Writes
// =============================================================================

pub async fn insert(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    debug!(id = %product.id, name = %product.name, "Inserting product");

    sqlx::query(
        r#"
        INSERT INTO products (
            id, name, kind, cost_price_cents, sale_price_cents,
            stock, has_warranty, tags, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(product.kind)
    .bind(product.cost_price_cents)
    .bind(product.sale_price_cents)
    .bind(product.stock)
    .bind(product.has_warranty)
    .bind(Json(&product.tags))
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Writes catalog metadata. Stock and kind are left alone.
pub async fn update_details(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    debug!(id = %product.id, "Updating product details");

    let result = sqlx::query(
        r#"
        UPDATE products SET
            name = ?2,
            cost_price_cents = ?3,
            sale_price_cents = ?4,
            has_warranty = ?5,
            tags = ?6,
            updated_at = ?7
        WHERE id = ?1
        "#,
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(product.cost_price_cents)
    .bind(product.sale_price_cents)
    .bind(product.has_warranty)
    .bind(Json(&product.tags))
    .bind(product.updated_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", &product.id));
    }

    Ok(())
}

/// `stock = stock + delta`. The caller has already checked the policy.
pub async fn apply_stock_delta(
    conn: &mut SqliteConnection,
    id: &str,
    delta: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    debug!(id = %id, delta = %delta, "Updating stock");

    let result = sqlx::query("UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1")
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }

    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    debug!(id = %id, "Deleting product");

    let result = sqlx::query("DELETE FROM products WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }

    Ok(())
}

// =============================================================================
// Read Repository
// =============================================================================

/// Lock-free catalog reads.
///
/// ## Usage
/// ```rust,ignore
/// let screens = db.products().search("screen").await?;
/// let battery = db.products().get_by_id(&id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let mut conn = self.pool.acquire().await?;
        list(&mut conn).await
    }

    /// Empty query returns the whole catalog.
    pub async fn search(&self, query: &str) -> DbResult<Vec<Product>> {
        let query = validate_search_query(query)?;
        debug!(query = %query, "Searching products");

        let mut conn = self.pool.acquire().await?;
        if query.is_empty() {
            return list(&mut conn).await;
        }

        let products = search(&mut conn, &query).await?;
        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }
}
