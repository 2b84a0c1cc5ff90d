use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config;

/// Errors raised by the data-access layer. Absence of a row is never an error;
/// lookups return `Ok(None)` for that.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Insert into {0} returned no row")]
    EmptyInsert(&'static str),

    #[error("new row violates row-level security policy for table \"{0}\"")]
    PolicyViolation(&'static str),

    #[error("Failed to encode caller claims: {0}")]
    Claims(#[from] serde_json::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// True when the storage engine itself rejected or failed the call
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            DatabaseError::Sqlx(_) | DatabaseError::EmptyInsert(_) | DatabaseError::PolicyViolation(_)
        )
    }
}

/// Process-wide connection pool for the projects database
pub struct DatabaseManager {
    pool: OnceCell<PgPool>,
}

impl DatabaseManager {
    fn instance() -> &'static DatabaseManager {
        use std::sync::OnceLock;
        static INSTANCE: OnceLock<DatabaseManager> = OnceLock::new();
        INSTANCE.get_or_init(|| DatabaseManager {
            pool: OnceCell::new(),
        })
    }

    /// Get the shared pool, connecting lazily on first use
    pub async fn main_pool() -> Result<PgPool, DatabaseError> {
        let pool = Self::instance()
            .pool
            .get_or_try_init(|| async {
                let cfg = &config::config().database;
                let url = cfg.url.as_deref().ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
                Self::connect(url, cfg.max_connections, cfg.connection_timeout).await
            })
            .await?;
        Ok(pool.clone())
    }

    /// Open a new pool against an explicit connection string
    pub async fn connect(url: &str, max_connections: u32, timeout_secs: u64) -> Result<PgPool, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(timeout_secs))
            .connect(url)
            .await?;

        info!("Created database pool (max_connections={})", max_connections);
        Ok(pool)
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Close the shared pool (e.g., on shutdown)
    pub async fn close_all() {
        if let Some(pool) = Self::instance().pool.get() {
            pool.close().await;
            info!("Closed database pool");
        }
    }
}
