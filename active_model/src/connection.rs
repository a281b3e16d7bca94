//! Database handle
//!
//! `Database` wraps the PostgreSQL pool that every model borrows.
//! `ConnectionAccessor` memoizes one handle for the whole process; first use
//! is guarded, so concurrent callers never open two pools.

use crate::errors::ModelError;
use config::DatabaseConfig;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Duration;
use tokio::sync::OnceCell;

#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Open the pool and verify one connection can be established
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, ModelError> {
        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "connecting to database"
        );

        let pool = Self::pool_options(config)
            .connect_with(Self::connect_options(config))
            .await
            .map_err(ModelError::Connection)?;

        Ok(Self { pool })
    }

    /// Build the pool without opening any connection yet
    pub fn connect_lazy(config: &DatabaseConfig) -> Self {
        let pool = Self::pool_options(config).connect_lazy_with(Self::connect_options(config));
        Self { pool }
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, ModelError> {
        self.pool.begin().await.map_err(ModelError::Connection)
    }

    pub async fn health_check(&self) -> Result<(), ModelError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(ModelError::Connection)?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn connect_options(config: &DatabaseConfig) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.username)
            .password(&config.password)
    }

    fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
        let mut pool_options = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query("SET client_encoding TO 'UTF8'")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            });

        if config.max_lifetime_seconds > 0 {
            pool_options =
                pool_options.max_lifetime(Duration::from_secs(config.max_lifetime_seconds));
        }

        pool_options
    }
}

/// Lazily opened, process-wide database handle
#[derive(Debug)]
pub struct ConnectionAccessor {
    config: DatabaseConfig,
    cell: OnceCell<Database>,
}

impl ConnectionAccessor {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            cell: OnceCell::new(),
        }
    }

    /// Shared handle, opened on first call.
    ///
    /// A failed attempt leaves the accessor empty so the next call retries.
    pub async fn get_connection(&self) -> Result<&Database, ModelError> {
        self.cell
            .get_or_try_init(|| async {
                Database::connect(&self.config).await.inspect_err(|err| {
                    tracing::error!(error = %err, "database connection failed");
                })
            })
            .await
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }
}
