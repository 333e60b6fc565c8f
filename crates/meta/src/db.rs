//! Database connection and pool management.

use exn::ResultExt;
use filebin_config::{DatabaseConfig, Location};
use sqlx::SqliteConnection;
use sqlx::pool::PoolConnectionMetadata;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::time::Duration;
use tracing::instrument;

use crate::error::{ErrorKind, Result};

/// Embedded migrations that are run automatically on connect.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Handle to the relational store holding file metadata.
///
/// Cheap to clone; every clone shares the same connection pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    async fn new(options: SqliteConnectOptions, pool: SqlitePoolOptions) -> Result<Self> {
        let pool = pool
            // Apply the query-based PRAGMAs to every pooled connection, not
            // just the first one.
            .after_connect(|conn, meta| Box::pin(async move { Self::apply_pragmas(conn, meta).await }))
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Connect to the database file at the given path using default settings.
    ///
    /// Creates the database file if it doesn't exist and runs migrations.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let config = DatabaseConfig {
            path: Some(path.as_ref().to_path_buf()),
            ..DatabaseConfig::default()
        };
        Self::connect_with(&config).await
    }

    /// Connect according to loaded configuration.
    #[instrument("connecting to metadata database", skip_all, fields(path = ?config.path))]
    pub async fn connect_with(config: &DatabaseConfig) -> Result<Self> {
        match config.location().map_err(|err| err.raise(ErrorKind::Config))? {
            Location::Memory => Self::in_memory(config.busy_timeout()).await,
            Location::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).or_raise(|| ErrorKind::Database)?;
                }
                let options = Self::base_options(config.busy_timeout()).filename(&path).create_if_missing(true);
                let pool = SqlitePoolOptions::new().max_connections(config.max_connections);
                Self::new(options, pool).await
            },
        }
    }

    /// Connect to an in-memory database (useful for testing).
    ///
    /// In-memory databases are destroyed when the connection closes.
    pub async fn connect_in_memory() -> Result<Self> {
        Self::in_memory(DatabaseConfig::default().busy_timeout()).await
    }

    async fn in_memory(busy_timeout: Duration) -> Result<Self> {
        let options = Self::base_options(busy_timeout).filename(":memory:");
        // Parallel connections would each see their own, different, database.
        // The single connection must also never be reaped, or the data goes
        // with it.
        let pool = SqlitePoolOptions::new().max_connections(1).idle_timeout(None).max_lifetime(None);
        Self::new(options, pool).await
    }

    /// Base connection options shared between file and in-memory databases.
    fn base_options(busy_timeout: Duration) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            // WAL lets readers proceed while a download counter is being bumped.
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .synchronous(SqliteSynchronous::Normal)
            // Concurrent single-statement writers queue behind each other
            // instead of failing with SQLITE_BUSY.
            .busy_timeout(busy_timeout)
    }

    /// Apply additional PRAGMA settings that aren't exposed via SqliteConnectOptions.
    async fn apply_pragmas(conn: &mut SqliteConnection, _meta: PoolConnectionMetadata) -> sqlx::Result<()> {
        sqlx::query(
            r#"
                PRAGMA cache_size = -8192;
                PRAGMA temp_store = MEMORY;
            "#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Run database migrations.
    ///
    /// This is called automatically on every connect.
    #[instrument("performing database migrations", skip(self))]
    async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.or_raise(|| ErrorKind::Migration)
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    ///
    /// Waits for all connections to be returned to the pool and then closes
    /// them. The Database instance should not be used afterwards.
    pub async fn close(&self) {
        // Let SQLite update query planner statistics
        _ = sqlx::query("PRAGMA optimize").execute(&self.pool).await;
        self.pool.close().await;
    }
}
