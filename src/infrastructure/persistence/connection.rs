use crate::infrastructure::config::DatabaseConfig;
use anyhow::{Context, Result};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::{info, warn};

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to `dsn` and verify the connection
    ///
    /// # Errors
    /// Returns an error if the database connection fails
    pub async fn connect(dsn: &str, config: &DatabaseConfig) -> Result<Self> {
        info!(max_connections = config.max_connections, "Connecting to PostgreSQL database");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(dsn)
            .await
            .context("failed to open database pool")?;

        let _ = sqlx::query("SELECT 1").fetch_one(&pool).await?;

        info!("Successfully connected to PostgreSQL database");

        Ok(Self { pool })
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("failed to run database migrations")?;
        info!("Database schema is up to date");
        Ok(())
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close the database connection pool
    pub async fn close(&self) {
        if !self.pool.is_closed() {
            info!("Closing database connection pool");
            self.pool.close().await;
        }
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if !self.pool.is_closed() {
            warn!("Database pool dropped without being explicitly closed");
        }
    }
}
