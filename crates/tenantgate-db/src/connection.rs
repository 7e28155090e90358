//! SQLite connection pool management.

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use crate::error::DbError;
use crate::repository::SqliteRepositories;

/// Configuration for the storage connection pool.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLx connection URL (e.g. `sqlite://tenantgate.db?mode=rwc`).
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Connections older than this are closed and replaced.
    pub max_lifetime: Duration,
    /// Idle connections above `min_connections` are closed after this.
    pub idle_timeout: Duration,
    /// How long a caller waits for a free connection.
    pub acquire_timeout: Duration,
    /// How long SQLite waits on a locked database before returning BUSY.
    pub busy_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://tenantgate.db?mode=rwc".into(),
            max_connections: 25,
            min_connections: 5,
            max_lifetime: Duration::from_secs(300),
            idle_timeout: Duration::from_secs(60),
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// Owns the connection pool shared by every repository.
#[derive(Clone)]
pub struct DbManager {
    pool: SqlitePool,
}

impl DbManager {
    /// Open the pool described by `config`.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            url = %config.url,
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Connecting to database"
        );

        let options = SqliteConnectOptions::from_str(&config.url)?
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .max_lifetime(config.max_lifetime)
            .idle_timeout(config.idle_timeout)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await?;

        info!("Database pool ready");

        Ok(Self { pool })
    }

    /// A private in-memory database on a single long-lived connection.
    ///
    /// Every SQLite `:memory:` connection is its own database, so the pool
    /// is pinned to one connection that is never recycled.
    pub async fn in_memory() -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .max_lifetime(None)
            .idle_timeout(None)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn repositories(&self) -> SqliteRepositories {
        SqliteRepositories::new(self.pool.clone())
    }
}
