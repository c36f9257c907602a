use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{debug, info, instrument};

use crate::db::{DbError, ReferenceRepository};

/// Store handle created per command and closed when the command finishes
#[derive(Clone)]
pub struct DbPool {
    pool: SqlitePool,
}

impl DbPool {
    /// Open (creating if needed) the SQLite database at `database_url`
    ///
    /// Writes are issued one at a time from a single pass, so the pool holds
    /// one connection. That also keeps `sqlite::memory:` databases coherent.
    #[instrument]
    pub async fn connect(database_url: &str) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating database directory {}", parent.display());
                std::fs::create_dir_all(parent)?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        debug!("Database connection established");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run embedded migrations and seed regions and variable definitions
    #[instrument(skip(self))]
    pub async fn init_store(&self) -> Result<(), DbError> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed");

        ReferenceRepository::new(self.pool.clone()).seed().await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
