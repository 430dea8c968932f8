//! # Database Pool Management
//!
//! Connection pool creation and the shared write lock.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Handle                                    │
//! │                                                                         │
//! │  DbConfig::new(path) ──► Database::new(config).await                   │
//! │                               │                                         │
//! │            ┌──────────────────┼───────────────────────┐                 │
//! │            ▼                  ▼                       ▼                 │
//! │     ┌─────────────┐   ┌──────────────┐       ┌──────────────────┐      │
//! │     │ SqlitePool  │   │ write_lock   │       │ StockPolicy      │      │
//! │     │ (reads run  │   │ Mutex<()>    │       │ allow_negative_  │      │
//! │     │  in parallel)│  │ one writer   │       │ stock            │      │
//! │     └─────────────┘   └──────────────┘       └──────────────────┘      │
//! │            │                  │                       │                 │
//! │            ▼                  ▼                       ▼                 │
//! │   records() / products()   settlement() / ledger() / purchases()       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! File databases run in WAL mode so readers never wait on the writer.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::{debug, info};

use repairdesk_core::StockPolicy;

use crate::config::ShopConfig;
use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::record::RecordRepository;
use crate::service::catalog::Catalog;
use crate::service::intake::PurchaseIntake;
use crate::service::ledger::StockLedger;
use crate::service::settlement::Settlement;
use crate::service::Writer;

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/repairdesk.db")
///     .max_connections(5)
///     .allow_negative_stock(false);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file, or `:memory:`.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Time to wait for a free connection.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,

    /// Let job lines and manual adjustments drive stock below zero.
    /// Default: false
    pub allow_negative_stock: bool,
}

impl DbConfig {
    /// Creates a configuration for the given file. The file is created if
    /// it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
            allow_negative_stock: false,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    pub fn allow_negative_stock(mut self, allow: bool) -> Self {
        self.allow_negative_stock = allow;
        self
    }

    /// Isolated in-memory database (for tests).
    ///
    /// One connection only: every connection to `:memory:` is its own
    /// database.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
            allow_negative_stock: false,
        }
    }

    fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        };

        // SQLite has foreign keys off by default.
        Ok(options.foreign_keys(true))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle.
///
/// Cheap to clone; clones share the pool and the write lock.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
    policy: StockPolicy,
}

impl Database {
    /// Opens the pool and (by default) runs migrations.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let db = Database::new(DbConfig::new("./repairdesk.db")).await?;
    /// ```
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let connect_options = config.connect_options()?;
        debug!("Connection options configured");

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout));
        if config.is_in_memory() {
            // The data lives and dies with the single connection.
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            allow_negative_stock = config.allow_negative_stock,
            "Database pool created"
        );

        let db = Database {
            pool,
            write_lock: Arc::new(Mutex::new(())),
            policy: StockPolicy::new(config.allow_negative_stock),
        };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Opens the database described by a loaded shop configuration.
    pub async fn from_config(config: &ShopConfig) -> DbResult<Self> {
        Self::new(config.db_config()).await
    }

    /// Applies pending migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Raw pool, for queries no repository covers.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn stock_policy(&self) -> StockPolicy {
        self.policy
    }

    fn writer(&self) -> Writer {
        Writer::new(self.pool.clone(), self.write_lock.clone(), self.policy)
    }

    /// Catalog reads and maintenance.
    pub fn products(&self) -> Catalog {
        Catalog::new(self.writer())
    }

    /// Job and sales-history reads.
    pub fn records(&self) -> RecordRepository {
        RecordRepository::new(self.pool.clone())
    }

    /// Purchase intake and history.
    pub fn purchases(&self) -> PurchaseIntake {
        PurchaseIntake::new(self.writer())
    }

    /// Create, update, finalize and delete jobs.
    pub fn settlement(&self) -> Settlement {
        Settlement::new(self.writer())
    }

    /// Direct stock adjustments.
    pub fn ledger(&self) -> StockLedger {
        StockLedger::new(self.writer())
    }

    /// Closes the pool. Every later operation fails.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Whether the database answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
