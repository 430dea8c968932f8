//! # Settlement Services
//!
//! Every operation that changes stock or a job runs as one unit of work:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  writer.begin()                                                         │
//! │     ├── lock write_lock          (one writer per Database handle)      │
//! │     └── BEGIN                                                           │
//! │                                                                         │
//! │  read ─► check (validation, lifecycle, stock policy) ─► write           │
//! │     all through `&mut *work.tx`, never through the pool                │
//! │                                                                         │
//! │  work.commit()        COMMIT, then unlock                               │
//! │  any `?` before that  drop ─► ROLLBACK, then unlock                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Going through the pool while a transaction is open would wait for a
//! second connection, which an in-memory database never has.

pub mod catalog;
pub mod intake;
pub mod ledger;
pub mod settlement;

use std::sync::Arc;

use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::sync::{Mutex, MutexGuard};

use repairdesk_core::StockPolicy;

use crate::error::{DbError, DbResult};

/// What a service needs to open a unit of work.
#[derive(Debug, Clone)]
pub(crate) struct Writer {
    pool: SqlitePool,
    lock: Arc<Mutex<()>>,
    policy: StockPolicy,
}

/// An open unit of work. Field order matters: the transaction is dropped
/// (rolled back) before the lock is released.
pub(crate) struct UnitOfWork<'a> {
    pub(crate) tx: Transaction<'static, Sqlite>,
    _guard: MutexGuard<'a, ()>,
}

impl Writer {
    pub(crate) fn new(pool: SqlitePool, lock: Arc<Mutex<()>>, policy: StockPolicy) -> Self {
        Writer { pool, lock, policy }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub(crate) fn policy(&self) -> StockPolicy {
        self.policy
    }

    /// Takes the write lock, then opens a transaction.
    pub(crate) async fn begin(&self) -> DbResult<UnitOfWork<'_>> {
        let guard = self.lock.lock().await;
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(UnitOfWork { tx, _guard: guard })
    }
}

impl UnitOfWork<'_> {
    pub(crate) async fn commit(self) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixtures shared by the service tests.

    use repairdesk_core::{ContactRef, NewProduct, NewServiceRecord, Product, ProductKind};

    use crate::pool::{Database, DbConfig};

    pub(crate) async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub(crate) async fn part(db: &Database, name: &str, price_cents: i64, stock: i64) -> Product {
        db.products()
            .insert(NewProduct {
                name: name.to_string(),
                kind: ProductKind::Product,
                cost_price_cents: price_cents / 2,
                sale_price_cents: price_cents,
                opening_stock: stock,
                has_warranty: true,
                tags: Vec::new(),
            })
            .await
            .unwrap()
    }

    pub(crate) async fn service(db: &Database, name: &str, price_cents: i64) -> Product {
        db.products()
            .insert(NewProduct {
                name: name.to_string(),
                kind: ProductKind::Service,
                cost_price_cents: 0,
                sale_price_cents: price_cents,
                opening_stock: 0,
                has_warranty: false,
                tags: Vec::new(),
            })
            .await
            .unwrap()
    }

    pub(crate) fn intake(contact_name: &str) -> NewServiceRecord {
        NewServiceRecord {
            contact: ContactRef {
                id: "c1".to_string(),
                name: contact_name.to_string(),
                phone: "555-1234".to_string(),
            },
            device_description: "iPhone 13".to_string(),
            fault_description: "Cracked screen".to_string(),
            estimated_labor_cents: 15000,
            employee: "employee1".to_string(),
        }
    }

    pub(crate) async fn stock(db: &Database, product: &Product) -> i64 {
        db.products()
            .get_by_id(&product.id)
            .await
            .unwrap()
            .unwrap()
            .stock
    }
}
